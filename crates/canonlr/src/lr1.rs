//! LR(1) items and the CLOSURE/GOTO operators.

use crate::{
    grammar::{Grammar, NonterminalID, Production, ProductionID, SymbolID, TerminalID},
    util::display_fn,
};
use std::{collections::BTreeSet, fmt};

/// The LR(1) item `[head -> alpha . beta, lookahead]`.
///
/// Items are ordered lexicographically by `(head, rule, dot, lookahead)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub head: NonterminalID,
    /// The position of the production among the productions of `head`.
    pub rule: usize,
    /// The marker position in the body, `0..=body.len()`.
    pub dot: usize,
    pub lookahead: TerminalID,
}

impl Item {
    pub const fn new(head: NonterminalID, rule: usize, dot: usize, lookahead: TerminalID) -> Self {
        Self {
            head,
            rule,
            dot,
            lookahead,
        }
    }

    pub fn production(&self) -> ProductionID {
        ProductionID {
            head: self.head,
            rule: self.rule,
        }
    }

    /// Returns whether the marker has reached the end of the body.
    pub fn is_complete(&self, g: &Grammar) -> bool {
        g.production(self.production())
            .map_or(false, |p| self.dot >= p.right().len())
    }

    /// The symbol just after the marker, if any.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production())?
            .right()
            .get(self.dot)
            .copied()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let Some(production) = g.production(self.production()) else {
                return write!(f, "[<invalid item {:?}>]", self);
            };
            write!(f, "[{} ->", g.nonterminal_name(self.head))?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == self.dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.dot == production.right().len() {
                f.write_str(" .")?;
            }
            write!(f, ", {}]", g.terminal_name(self.lookahead))
        })
    }
}

/// A set of LR(1) items in canonical order, usable as a map key.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemSet {
    items: BTreeSet<Item>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: Item) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.contains(item)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.items.is_subset(&other.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for item in &self.items {
                writeln!(f, "- {}", item.display(g))?;
            }
            Ok(())
        })
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Item>,
    {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<Item> for ItemSet {
    fn extend<I: IntoIterator<Item = Item>>(&mut self, iter: I) {
        self.items.extend(iter)
    }
}

impl<'a> IntoIterator for &'a ItemSet {
    type Item = &'a Item;
    type IntoIter = std::collections::btree_set::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A query that refers to something absent from the grammar.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("unknown nonterminal {head:?}")]
    UnknownNonterminal { head: NonterminalID },

    #[error("`{head}' has no production at index {rule} (it has {count})")]
    RuleOutOfRange {
        head: String,
        rule: usize,
        count: usize,
    },

    #[error("dot position {dot} is out of range for `{production}'")]
    DotOutOfRange { production: String, dot: usize },

    #[error("unknown lookahead terminal {lookahead:?}")]
    UnknownLookahead { lookahead: TerminalID },

    #[error("the grammar is not augmented")]
    NotAugmented,

    #[error("too many LR(1) states")]
    TooManyStates,
}

/// Check that `item` refers to an existing production, marker position and
/// lookahead of `g`.
pub fn check_item<'g>(g: &'g Grammar, item: &Item) -> Result<&'g Production, LookupError> {
    if !g.is_nonterminal(item.head) {
        return Err(LookupError::UnknownNonterminal { head: item.head });
    }
    let productions = g.productions_of(item.head);
    let production = productions
        .get(item.rule)
        .ok_or_else(|| LookupError::RuleOutOfRange {
            head: g.nonterminal_name(item.head).to_owned(),
            rule: item.rule,
            count: productions.len(),
        })?;
    if item.dot > production.right().len() {
        return Err(LookupError::DotOutOfRange {
            production: production.display(g).to_string(),
            dot: item.dot,
        });
    }
    if item.lookahead != TerminalID::EOI && !g.is_terminal(item.lookahead) {
        return Err(LookupError::UnknownLookahead {
            lookahead: item.lookahead,
        });
    }
    Ok(production)
}

/// Compute `CLOSURE(I)`.
///
/// For each `[A -> alpha . B beta, a]` in the set, every `[B -> . gamma, b]`
/// with `b` in `First(beta a)` is added until a full pass adds nothing.
pub fn closure(g: &Grammar, seed: &ItemSet) -> Result<ItemSet, LookupError> {
    for item in seed {
        check_item(g, item)?;
    }
    Ok(expand_closure(g, seed.clone()))
}

/// The closure loop itself; `items` must be valid for `g`.
pub(crate) fn expand_closure(g: &Grammar, mut items: ItemSet) -> ItemSet {
    let mut added = vec![];
    loop {
        for item in &items {
            let Some(production) = g.production(item.production()) else {
                continue;
            };

            // [A -> alpha . B beta, a]
            //  B: one nonterminal symbol
            let (b, beta) = match production.right().get(item.dot..) {
                Some([SymbolID::N(b), beta @ ..]) => (*b, beta),
                _ => continue,
            };

            let lookaheads = g.first_sets().of_sequence_then(beta, item.lookahead);
            for p in g.productions_of(b) {
                for lookahead in lookaheads.iter() {
                    added.push(Item::new(b, p.rule(), 0, lookahead));
                }
            }
        }

        let before = items.len();
        items.extend(added.drain(..));
        if items.len() == before {
            break;
        }
    }
    items
}

/// Compute `GOTO(I, X)`, the closure of the items in `CLOSURE(I)` whose
/// marker is moved over `X`.
///
/// Unlike the textbook rule, which moves the marker only over the items of
/// `I` itself, the input is closed first. The two agree whenever `I` is
/// closed (every automaton state is), and for an unclosed `I` this keeps
/// `GOTO(CLOSURE(I), X) = GOTO(I, X)`. For example `GOTO({[S' -> . S, ⊣]}, C)`
/// is non-empty when `S -> C C`. The result is empty if no item has the
/// marker just before `X`.
pub fn goto(g: &Grammar, items: &ItemSet, symbol: SymbolID) -> Result<ItemSet, LookupError> {
    let items = closure(g, items)?;
    let mut kernels = ItemSet::new();
    for item in &items {
        let Some(production) = g.production(item.production()) else {
            continue;
        };
        if production.right().get(item.dot) == Some(&symbol) {
            kernels.insert(Item {
                dot: item.dot + 1,
                ..*item
            });
        }
    }
    Ok(expand_closure(g, kernels))
}

/// Split the items of a closed set by the symbol after their marker,
/// moving the marker over it. Complete items are skipped.
pub(crate) fn kernels_by_symbol(g: &Grammar, items: &ItemSet) -> Vec<(SymbolID, ItemSet)> {
    let mut kernels: Vec<(SymbolID, ItemSet)> = vec![];
    for item in items {
        let Some(symbol) = item.next_symbol(g) else {
            continue;
        };
        let next = Item {
            dot: item.dot + 1,
            ..*item
        };
        match kernels.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, kernel)) => {
                kernel.insert(next);
            }
            None => kernels.push((symbol, Some(next).into_iter().collect())),
        }
    }
    kernels
}
