//! Context-free grammars.

use crate::{
    first_sets::{FirstSet, FirstSets},
    follow_sets::FollowSets,
    types::Map,
    util::{display_fn, write_joined},
};
use std::fmt;

/// The reserved name of the empty string.
pub const EPSILON: &str = "ε";

/// The reserved name of the end marker.
pub const END_MARKER: &str = "⊣";

// ==== symbols ====

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalID(u16);
impl TerminalID {
    /// Reserved terminal symbol that marks the end of input (`⊣`).
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}
impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

/// A set of terminal symbols.
///
/// The empty string is never a member; sets that may derive it are
/// represented by [`FirstSet`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}
impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    pub fn remove(&mut self, id: TerminalID) -> bool {
        self.inner.remove(id.into_raw().into())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .map(|raw| raw.try_into().map(TerminalID::from_raw).unwrap())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            f.write_str("{")?;
            write_joined(f, ", ", self.iter().map(|t| g.terminal_name(t)))?;
            f.write_str("}")
        })
    }
}
impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalID(u16);
impl NonterminalID {
    /// Reserved nonterminal introduced by augmentation (`S'`).
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}
impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

// ==== productions ====

/// Identifies a production by its head and its position among the
/// productions of that head.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionID {
    pub head: NonterminalID,
    pub rule: usize,
}
impl ProductionID {
    /// `S' -> S` of an augmented grammar.
    pub const ACCEPT: Self = Self {
        head: NonterminalID::START,
        rule: 0,
    };
}
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P({:?},{})", self.head, self.rule)
    }
}

#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    right: Vec<SymbolID>,
}
impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    pub fn head(&self) -> NonterminalID {
        self.id.head
    }

    /// The position of this production in the list of its head.
    pub fn rule(&self) -> usize {
        self.id.rule
    }

    /// The body of this production. An empty slice denotes `ε`.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} -> ", g.nonterminal_name(self.head()))?;
            if self.right.is_empty() {
                f.write_str(EPSILON)
            } else {
                write_joined(f, " ", self.right.iter().map(|s| g.symbol_name(*s)))
            }
        })
    }
}

// ==== grammar ====

/// A sealed context-free grammar together with its FIRST and FOLLOW tables.
///
/// The derived tables are computed once during construction; every query
/// afterwards only reads them.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, String>,
    nonterminals: Map<NonterminalID, String>,
    productions: Map<NonterminalID, Vec<Production>>,
    names: Map<String, SymbolID>,
    start_symbol: NonterminalID,
    augmented: bool,
    first_sets: FirstSets,
    follow_sets: FollowSets,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef),
    {
        let mut def = GrammarDef::default();
        f(&mut def);
        def.end()
    }

    /// Build a grammar from a start symbol and a mapping from each head to
    /// its ordered list of bodies.
    ///
    /// A body is either a list of symbol names or the single name [`EPSILON`].
    pub fn build<I, S>(start: &str, productions: I, augment: bool) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = (S, Vec<Vec<S>>)>,
        S: AsRef<str>,
    {
        Self::define(|g| {
            g.start_symbol(start);
            for (head, bodies) in productions {
                g.nonterminal(head.as_ref());
                for body in bodies {
                    g.rule(head.as_ref(), body);
                }
            }
            g.augment(augment);
        })
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    pub fn is_augmented(&self) -> bool {
        self.augmented
    }

    /// Iterate over the terminal symbols, including `⊣` if augmented.
    pub fn terminals(&self) -> impl Iterator<Item = (TerminalID, &str)> + '_ {
        self.terminals.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Iterate over the nonterminal symbols, including `S'` if augmented.
    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalID, &str)> + '_ {
        self.nonterminals.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Iterate over all grammar symbols, terminals first.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolID> + '_ {
        self.terminals
            .keys()
            .map(|t| SymbolID::T(*t))
            .chain(self.nonterminals.keys().map(|n| SymbolID::N(*n)))
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values().flatten()
    }

    /// The ordered productions of `head`, or an empty slice if unknown.
    pub fn productions_of(&self, head: NonterminalID) -> &[Production] {
        self.productions
            .get(&head)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn production(&self, id: ProductionID) -> Option<&Production> {
        self.productions.get(&id.head)?.get(id.rule)
    }

    pub fn symbol(&self, name: &str) -> Option<SymbolID> {
        self.names.get(name).copied()
    }

    pub fn terminal(&self, name: &str) -> Option<TerminalID> {
        match self.symbol(name)? {
            SymbolID::T(t) => Some(t),
            SymbolID::N(..) => None,
        }
    }

    pub fn nonterminal(&self, name: &str) -> Option<NonterminalID> {
        match self.symbol(name)? {
            SymbolID::N(n) => Some(n),
            SymbolID::T(..) => None,
        }
    }

    pub fn is_terminal(&self, id: TerminalID) -> bool {
        self.terminals.contains_key(&id)
    }

    pub fn is_nonterminal(&self, id: NonterminalID) -> bool {
        self.nonterminals.contains_key(&id)
    }

    pub fn terminal_name(&self, id: TerminalID) -> &str {
        match id {
            TerminalID::EOI => END_MARKER,
            _ => self.terminals.get(&id).map_or("<unknown>", |s| s.as_str()),
        }
    }

    pub fn nonterminal_name(&self, id: NonterminalID) -> &str {
        self.nonterminals
            .get(&id)
            .map_or("<unknown>", |s| s.as_str())
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminal_name(t),
            SymbolID::N(n) => self.nonterminal_name(n),
        }
    }

    /// `FIRST(X)`. Unknown symbols yield the empty set.
    pub fn first(&self, symbol: SymbolID) -> FirstSet {
        self.first_sets.get(symbol).cloned().unwrap_or_default()
    }

    /// `FIRST(X)` looked up by name, where `ε` denotes the empty string.
    pub fn first_of_name(&self, name: &str) -> FirstSet {
        if name == EPSILON {
            return FirstSet::epsilon();
        }
        self.symbol(name)
            .map(|s| self.first(s))
            .unwrap_or_default()
    }

    /// `FIRST(Y1 Y2 ... Ym)`. The empty sequence yields the empty set.
    pub fn first_of_sequence(&self, symbols: &[SymbolID]) -> FirstSet {
        self.first_sets.of_sequence(symbols)
    }

    pub(crate) fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    /// `FOLLOW(A)`. Unknown nonterminals yield the empty set.
    pub fn follow(&self, symbol: NonterminalID) -> TerminalSet {
        self.follow_sets.get(symbol).cloned().unwrap_or_default()
    }

    pub fn follow_of_name(&self, name: &str) -> TerminalSet {
        self.nonterminal(name)
            .map(|n| self.follow(n))
            .unwrap_or_default()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#### terminals: ")?;
        write_joined(f, ", ", self.terminals.values())?;
        write!(f, "\n#### nonterminals: ")?;
        write_joined(f, ", ", self.nonterminals.values())?;
        writeln!(f, "\n#### productions:")?;
        for p in self.productions() {
            writeln!(f, "- {}", p.display(self))?;
        }
        writeln!(f, "#### first:")?;
        for (&n, name) in &self.nonterminals {
            writeln!(f, "- {} -> {}", name, self.first(SymbolID::N(n)).display(self))?;
        }
        writeln!(f, "#### follow:")?;
        for (&n, name) in &self.nonterminals {
            writeln!(f, "- {} -> {}", name, self.follow(n).display(self))?;
        }
        Ok(())
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug, Default)]
pub struct GrammarDef {
    start_symbol: Option<String>,
    productions: Map<String, Vec<Vec<String>>>,
    augment: bool,
}

impl GrammarDef {
    /// Specify the start symbol for this grammar.
    ///
    /// If omitted, the first declared nonterminal is used.
    pub fn start_symbol(&mut self, name: &str) {
        self.start_symbol.replace(name.to_owned());
    }

    /// Declare a nonterminal symbol without adding a production to it.
    pub fn nonterminal(&mut self, name: &str) {
        self.productions.entry(name.to_owned()).or_default();
    }

    /// Append a production rule `left -> right` to this grammar.
    pub fn rule<I>(&mut self, left: &str, right: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let right = right.into_iter().map(|s| s.as_ref().to_owned()).collect();
        self.productions
            .entry(left.to_owned())
            .or_default()
            .push(right);
    }

    /// Introduce `S' -> S` and the end marker when the grammar is sealed.
    pub fn augment(&mut self, enabled: bool) {
        self.augment = enabled;
    }

    #[tracing::instrument(skip_all)]
    fn end(self) -> Result<Grammar, GrammarError> {
        let GrammarDef {
            start_symbol,
            productions: defs,
            augment,
        } = self;

        let start_name = match start_symbol {
            Some(start) => start,
            None => defs.keys().next().cloned().ok_or(GrammarError::EmptyGrammar)?,
        };

        // normalize `[ε]` to the empty body and check the invariants of each body.
        let mut bodies_of = Map::<&str, Vec<Vec<&str>>>::default();
        for (head, bodies) in &defs {
            check_name(head)?;
            if bodies.is_empty() {
                return Err(GrammarError::EmptyProductions { head: head.clone() });
            }
            let mut normalized: Vec<Vec<&str>> = Vec::with_capacity(bodies.len());
            for body in bodies {
                let body: Vec<&str> = match &body[..] {
                    [only] if only == EPSILON => vec![],
                    _ => {
                        if body.iter().any(|s| s == EPSILON) {
                            return Err(GrammarError::MixedEpsilon {
                                head: head.clone(),
                                body: body.join(" "),
                            });
                        }
                        body.iter().map(|s| s.as_str()).collect()
                    }
                };
                for symbol in &body {
                    check_name(symbol)?;
                }
                if normalized.contains(&body) {
                    return Err(GrammarError::DuplicateProduction {
                        head: head.clone(),
                        body: display_body(&body),
                    });
                }
                normalized.push(body);
            }
            bodies_of.insert(head.as_str(), normalized);
        }

        if !bodies_of.contains_key(start_name.as_str()) {
            return Err(GrammarError::UnknownStartSymbol { name: start_name });
        }

        let mut names = Map::<String, SymbolID>::default();
        let mut terminals = Map::default();
        let mut nonterminals = Map::default();

        // heads are nonterminals, in declaration order.
        for (i, head) in bodies_of.keys().enumerate() {
            let id = NonterminalID(offset_id(NonterminalID::OFFSET, i)?);
            nonterminals.insert(id, head.to_string());
            names.insert(head.to_string(), SymbolID::N(id));
        }

        // every other symbol in a body is a terminal, in order of appearance.
        let mut next_terminal = 0;
        for symbol in bodies_of.values().flatten().flatten() {
            if names.contains_key(*symbol) {
                continue;
            }
            let id = TerminalID(offset_id(TerminalID::OFFSET, next_terminal)?);
            next_terminal += 1;
            terminals.insert(id, symbol.to_string());
            names.insert(symbol.to_string(), SymbolID::T(id));
        }

        let mut start_symbol = match names[start_name.as_str()] {
            SymbolID::N(n) => n,
            SymbolID::T(..) => unreachable!("heads are always nonterminals"),
        };

        let mut productions = Map::<NonterminalID, Vec<Production>>::default();
        if augment {
            let augmented_name = format!("{}'", start_name);
            if names.contains_key(&augmented_name) {
                return Err(GrammarError::AugmentedNameCollision {
                    name: augmented_name,
                });
            }
            nonterminals.insert(NonterminalID::START, augmented_name.clone());
            names.insert(augmented_name, SymbolID::N(NonterminalID::START));
            terminals.insert(TerminalID::EOI, END_MARKER.to_owned());
            names.insert(END_MARKER.to_owned(), SymbolID::T(TerminalID::EOI));
            productions.insert(
                NonterminalID::START,
                vec![Production {
                    id: ProductionID {
                        head: NonterminalID::START,
                        rule: 0,
                    },
                    right: vec![SymbolID::N(start_symbol)],
                }],
            );
            start_symbol = NonterminalID::START;

            // keep the reserved symbols first in iteration order.
            nonterminals.sort_keys();
            terminals.sort_keys();
        }

        for (head, bodies) in &bodies_of {
            let head = match names[*head] {
                SymbolID::N(n) => n,
                SymbolID::T(..) => unreachable!("heads are always nonterminals"),
            };
            let bodies = bodies
                .iter()
                .enumerate()
                .map(|(rule, body)| Production {
                    id: ProductionID { head, rule },
                    right: body.iter().map(|s| names[*s]).collect(),
                })
                .collect();
            productions.insert(head, bodies);
        }

        tracing::debug!(
            "sealing grammar: {} terminals, {} nonterminals, {} productions",
            terminals.len(),
            nonterminals.len(),
            productions.values().map(Vec::len).sum::<usize>()
        );

        let mut grammar = Grammar {
            terminals,
            nonterminals,
            productions,
            names,
            start_symbol,
            augmented: augment,
            first_sets: FirstSets::default(),
            follow_sets: FollowSets::default(),
        };
        grammar.first_sets = FirstSets::new(&grammar);
        grammar.follow_sets = FollowSets::new(&grammar);

        Ok(grammar)
    }
}

fn check_name(name: &str) -> Result<(), GrammarError> {
    if name.is_empty() {
        return Err(GrammarError::EmptyName);
    }
    if name == EPSILON || name == END_MARKER {
        return Err(GrammarError::ReservedName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

fn offset_id(offset: u16, index: usize) -> Result<u16, GrammarError> {
    u16::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(offset))
        .ok_or(GrammarError::TooManySymbols)
}

fn display_body(body: &[&str]) -> String {
    if body.is_empty() {
        EPSILON.to_owned()
    } else {
        body.join(" ")
    }
}

/// Static violations of the grammar invariants detected during construction.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("the grammar has no production")]
    EmptyGrammar,

    #[error("empty symbol name")]
    EmptyName,

    #[error("`{name}' is a reserved symbol name")]
    ReservedName { name: String },

    #[error("the augmented start symbol `{name}' collides with a grammar symbol")]
    AugmentedNameCollision { name: String },

    #[error("the nonterminal `{head}' has no production")]
    EmptyProductions { head: String },

    #[error("the start symbol `{name}' is not the head of any production")]
    UnknownStartSymbol { name: String },

    #[error("`ε' mixed with other symbols in `{head} -> {body}'")]
    MixedEpsilon { head: String, body: String },

    #[error("duplicate production `{head} -> {body}'")]
    DuplicateProduction { head: String, body: String },

    #[error("too many symbols")]
    TooManySymbols,
}

/// Grammars used in tests and benchmarks.
pub mod examples {
    use super::*;

    /// `E -> E + T | T`, `T -> T * F | F`, `F -> ( E ) | id`
    pub fn expression(g: &mut GrammarDef) {
        g.start_symbol("E");
        g.rule("E", ["E", "+", "T"]);
        g.rule("E", ["T"]);
        g.rule("T", ["T", "*", "F"]);
        g.rule("T", ["F"]);
        g.rule("F", ["(", "E", ")"]);
        g.rule("F", ["id"]);
    }

    /// `S -> A B c`, `A -> a | ε`, `B -> b | ε`
    pub fn nullable_cascade(g: &mut GrammarDef) {
        g.start_symbol("S");
        g.rule("S", ["A", "B", "c"]);
        g.rule("A", ["a"]);
        g.rule("A", [EPSILON]);
        g.rule("B", ["b"]);
        g.rule("B", [EPSILON]);
    }

    /// `S -> C C`, `C -> c C | d`
    pub fn cc(g: &mut GrammarDef) {
        g.start_symbol("S");
        g.rule("S", ["C", "C"]);
        g.rule("C", ["c", "C"]);
        g.rule("C", ["d"]);
    }

    pub fn with_nullable(g: &mut GrammarDef) {
        // E → E + n | T
        // T → a | ( E n ) | n a
        // n → ϵ | num
        g.start_symbol("E");
        g.rule("E", ["E", "+", "n"]);
        g.rule("E", ["T"]);
        g.rule("T", ["a"]);
        g.rule("T", ["(", "E", "n", ")"]);
        g.rule("T", ["n", "a"]);
        g.rule("n", [EPSILON]);
        g.rule("n", ["num"]);
    }

    pub fn arithmetic(g: &mut GrammarDef) {
        g.start_symbol("expr");
        g.rule("expr", ["expr", "+", "term"]);
        g.rule("expr", ["expr", "-", "term"]);
        g.rule("expr", ["term"]);
        g.rule("term", ["term", "*", "factor"]);
        g.rule("term", ["term", "/", "factor"]);
        g.rule("term", ["factor"]);
        g.rule("factor", ["-", "factor"]);
        g.rule("factor", ["atom"]);
        g.rule("atom", ["NUM"]);
        g.rule("atom", ["(", "expr", ")"]);
    }

    /// Ambiguous binary operators without precedence.
    pub fn ambiguous(g: &mut GrammarDef) {
        g.start_symbol("expr");
        g.rule("expr", ["expr", "+", "expr"]);
        g.rule("expr", ["expr", "*", "expr"]);
        g.rule("expr", ["NUM"]);
    }

    // test grammars described in the IELR(1) paper.

    /// Unambiguous, but not LR(1) without precedence on `a`.
    pub fn fig1(g: &mut GrammarDef) {
        g.start_symbol("S");
        g.rule("S", ["a", "A", "a"]);
        g.rule("S", ["b", "A", "b"]);
        g.rule("A", ["a"]);
        g.rule("A", ["a", "a"]);
    }

    /// Ambiguous; the canonical LR(1) automaton has conflicts as well.
    pub fn fig2(g: &mut GrammarDef) {
        g.start_symbol("S");
        g.rule("S", ["a", "A", "a"]);
        g.rule("S", ["a", "B", "b"]);
        g.rule("S", ["a", "C", "c"]);
        g.rule("S", ["b", "A", "b"]);
        g.rule("S", ["b", "B", "a"]);
        g.rule("S", ["b", "C", "a"]);
        g.rule("A", ["a", "a"]);
        g.rule("B", ["a", "a"]);
        g.rule("C", ["a", "a"]);
    }

    pub fn fig6(g: &mut GrammarDef) {
        g.start_symbol("S");
        g.rule("S", ["a", "A", "a"]);
        g.rule("S", ["a", "a", "b"]);
        g.rule("S", ["b", "A", "b"]);
        g.rule("A", ["B", "C"]);
        g.rule("B", ["a"]);
        g.rule("C", ["D"]);
        g.rule("D", [EPSILON]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        set.iter().map(|t| g.terminal_name(t).to_owned()).collect()
    }

    #[test]
    fn derive_terminals_and_nonterminals() {
        let g = Grammar::define(examples::expression).unwrap();
        eprintln!("{}", g);

        let terminals: Vec<_> = g.terminals().map(|(_, name)| name).collect();
        assert_eq!(terminals, ["+", "*", "(", ")", "id"]);
        let nonterminals: Vec<_> = g.nonterminals().map(|(_, name)| name).collect();
        assert_eq!(nonterminals, ["E", "T", "F"]);

        assert!(!g.is_augmented());
        assert_eq!(g.start_symbol(), g.nonterminal("E").unwrap());
        assert_eq!(g.productions().count(), 6);
        assert_eq!(g.productions_of(g.nonterminal("T").unwrap()).len(), 2);
    }

    #[test]
    fn rule_index_is_position_in_head_list() {
        let g = Grammar::define(examples::expression).unwrap();
        let f = g.nonterminal("F").unwrap();
        for (i, p) in g.productions_of(f).iter().enumerate() {
            assert_eq!(p.rule(), i);
            assert_eq!(p.head(), f);
        }
        let p = g.production(ProductionID { head: f, rule: 1 }).unwrap();
        assert_eq!(p.display(&g).to_string(), "F -> id");
        assert!(g.production(ProductionID { head: f, rule: 2 }).is_none());
    }

    #[test]
    fn augment_introduces_fresh_start() {
        let g = Grammar::define(|g| {
            g.start_symbol("S");
            g.rule("S", ["a"]);
            g.augment(true);
        })
        .unwrap();

        assert!(g.is_augmented());
        assert_eq!(g.start_symbol(), NonterminalID::START);
        assert_eq!(g.nonterminal_name(NonterminalID::START), "S'");
        assert!(g.is_terminal(TerminalID::EOI));
        assert_eq!(g.terminal(END_MARKER), Some(TerminalID::EOI));

        let start = g.productions_of(NonterminalID::START);
        assert_eq!(start.len(), 1);
        assert_eq!(start[0].display(&g).to_string(), "S' -> S");
    }

    #[test]
    fn epsilon_bodies_are_empty() {
        let g = Grammar::define(examples::nullable_cascade).unwrap();
        let a = g.nonterminal("A").unwrap();
        let bodies = g.productions_of(a);
        assert_eq!(bodies[1].right(), &[]);
        assert_eq!(bodies[1].display(&g).to_string(), "A -> ε");
        assert!(g.symbol(EPSILON).is_none());
    }

    #[test]
    fn build_from_mapping() {
        let g = Grammar::build(
            "S",
            [
                ("S", vec![vec!["A", "B", "c"]]),
                ("A", vec![vec!["a"], vec![EPSILON]]),
                ("B", vec![vec!["b"], vec![EPSILON]]),
            ],
            false,
        )
        .unwrap();
        assert_eq!(names(&g, &g.follow_of_name("A")), ["c", "b"]);
    }

    #[test]
    fn reject_reserved_names() {
        let err = Grammar::define(|g| {
            g.rule("S", ["a", END_MARKER]);
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::ReservedName { name } if name == END_MARKER));

        let err = Grammar::define(|g| {
            g.rule(EPSILON, ["a"]);
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::ReservedName { .. }));
    }

    #[test]
    fn reject_augmented_name_collision() {
        let err = Grammar::define(|g| {
            g.rule("S", ["S'"]);
            g.augment(true);
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::AugmentedNameCollision { name } if name == "S'"));
    }

    #[test]
    fn reject_mixed_epsilon() {
        let err = Grammar::define(|g| {
            g.rule("S", ["a", EPSILON]);
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::MixedEpsilon { head, .. } if head == "S"));
    }

    #[test]
    fn reject_empty_production_list() {
        let err = Grammar::build("S", [("S", vec![vec!["X"]]), ("X", vec![])], false).unwrap_err();
        assert!(matches!(err, GrammarError::EmptyProductions { head } if head == "X"));
    }

    #[test]
    fn reject_unknown_start_symbol() {
        let err = Grammar::define(|g| {
            g.start_symbol("a");
            g.rule("S", ["a"]);
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::UnknownStartSymbol { name } if name == "a"));
    }

    #[test]
    fn reject_duplicate_production() {
        let err = Grammar::define(|g| {
            g.rule("S", [EPSILON]);
            g.rule("S", Vec::<&str>::new());
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::DuplicateProduction { .. }));
    }

    #[test]
    fn reject_empty_grammar() {
        let err = Grammar::define(|_| {}).unwrap_err();
        assert!(matches!(err, GrammarError::EmptyGrammar));
    }
}
