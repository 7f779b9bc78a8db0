//! Calculation of first set function.

use crate::{
    grammar::{Grammar, SymbolID, TerminalID, TerminalSet, EPSILON},
    types::Map,
    util::{display_fn, write_joined},
};
use std::fmt;

/// The terminals that may begin a string derived from some symbols, and
/// whether the empty string is derivable from them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FirstSet {
    terminals: TerminalSet,
    epsilon: bool,
}

impl FirstSet {
    /// `{ε}`
    pub fn epsilon() -> Self {
        Self {
            terminals: TerminalSet::default(),
            epsilon: true,
        }
    }

    /// The members of this set other than `ε`.
    pub fn terminals(&self) -> &TerminalSet {
        &self.terminals
    }

    pub fn contains(&self, id: TerminalID) -> bool {
        self.terminals.contains(id)
    }

    pub fn contains_epsilon(&self) -> bool {
        self.epsilon
    }

    pub fn is_empty(&self) -> bool {
        !self.epsilon && self.terminals.is_empty()
    }

    /// The number of members, counting `ε`.
    pub fn len(&self) -> usize {
        self.terminals.len() + usize::from(self.epsilon)
    }

    fn union_with(&mut self, other: &Self) {
        self.terminals.union_with(&other.terminals);
        self.epsilon |= other.epsilon;
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            f.write_str("{")?;
            let epsilon = self.epsilon.then_some(EPSILON);
            write_joined(
                f,
                ", ",
                self.terminals.iter().map(|t| g.terminal_name(t)).chain(epsilon),
            )?;
            f.write_str("}")
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct FirstSets {
    map: Map<SymbolID, FirstSet>,
}

impl FirstSets {
    #[tracing::instrument(skip_all)]
    pub(crate) fn new(g: &Grammar) -> Self {
        let mut map = Map::default();

        // First(t) = {t} for terminal symbols
        for (t, _) in g.terminals() {
            map.insert(
                SymbolID::T(t),
                FirstSet {
                    terminals: Some(t).into_iter().collect(),
                    epsilon: false,
                },
            );
        }
        // First(A) = {} for nonterminal symbols, to be grown below
        for (n, _) in g.nonterminals() {
            map.insert(SymbolID::N(n), FirstSet::default());
        }

        let mut sets = Self { map };

        // Every pass but the last one adds at least one member.
        let max_rounds = (g.terminals().count() + 1) * g.nonterminals().count() + 1;
        let mut rounds = 0;
        loop {
            rounds += 1;
            assert!(
                rounds <= max_rounds,
                "FIRST sets did not converge within {} rounds",
                max_rounds
            );

            let mut added = 0;
            for p in g.productions() {
                // A -> Y1 Y2 ... Yn adds First(Y1 ... Yn), and A -> ε adds ε.
                let body = if p.right().is_empty() {
                    FirstSet::epsilon()
                } else {
                    sets.of_sequence(p.right())
                };
                let first = sets.map.entry(SymbolID::N(p.head())).or_default();
                let before = first.len();
                first.union_with(&body);
                added += first.len() - before;
            }

            tracing::trace!("round {}: {} members added", rounds, added);
            if added == 0 {
                break;
            }
        }

        sets
    }

    pub(crate) fn get(&self, symbol: SymbolID) -> Option<&FirstSet> {
        self.map.get(&symbol)
    }

    /// `First(Y1 Y2 ... Ym)`
    ///
    /// The empty sequence yields the empty set rather than `{ε}`.
    pub(crate) fn of_sequence(&self, symbols: &[SymbolID]) -> FirstSet {
        let mut res = FirstSet::default();
        for symbol in symbols {
            let Some(first) = self.map.get(symbol) else {
                return res;
            };
            res.terminals.union_with(&first.terminals);
            if !first.epsilon {
                return res;
            }
        }
        res.epsilon = !symbols.is_empty();
        res
    }

    /// `First(prefix lookahead)` without `ε`, used for LR(1) lookaheads.
    pub(crate) fn of_sequence_then(&self, prefix: &[SymbolID], lookahead: TerminalID) -> TerminalSet {
        let first = self.of_sequence(prefix);
        let nullable = prefix.is_empty() || first.epsilon;
        let mut res = first.terminals;
        if nullable {
            res.insert(lookahead);
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::examples;

    fn seq(g: &Grammar, names: &[&str]) -> Vec<SymbolID> {
        names.iter().map(|name| g.symbol(name).unwrap()).collect()
    }

    #[test]
    fn empty_sequence_is_empty_set() {
        let g = Grammar::define(examples::nullable_cascade).unwrap();
        let first = g.first_of_sequence(&[]);
        assert!(first.is_empty());
        assert!(!first.contains_epsilon());
    }

    #[test]
    fn nullable_sequence_contains_epsilon() {
        let g = Grammar::define(examples::nullable_cascade).unwrap();
        let first = g.first_of_sequence(&seq(&g, &["A", "B"]));
        assert!(first.contains_epsilon());
        assert_eq!(first.display(&g).to_string(), "{a, b, ε}");

        let first = g.first_of_sequence(&seq(&g, &["A", "c", "B"]));
        assert!(!first.contains_epsilon());
        assert_eq!(first.display(&g).to_string(), "{c, a}");
    }

    #[test]
    fn walk_stops_at_first_non_nullable_symbol() {
        let g = Grammar::define(examples::expression).unwrap();
        let first = g.first_of_sequence(&seq(&g, &["+", "T"]));
        assert_eq!(first.len(), 1);
        assert!(first.contains(g.terminal("+").unwrap()));
    }

    #[test]
    fn lookahead_is_appended_only_through_nullable_prefix() {
        let g = Grammar::define(|g| {
            examples::nullable_cascade(g);
            g.augment(true);
        })
        .unwrap();
        let c = g.terminal("c").unwrap();

        let las = g.first_sets().of_sequence_then(&[], TerminalID::EOI);
        assert_eq!(las.iter().collect::<Vec<_>>(), [TerminalID::EOI]);

        let las = g
            .first_sets()
            .of_sequence_then(&seq(&g, &["A", "B"]), TerminalID::EOI);
        assert!(las.contains(TerminalID::EOI));
        assert_eq!(las.len(), 3);

        let las = g
            .first_sets()
            .of_sequence_then(&seq(&g, &["B", "c"]), TerminalID::EOI);
        assert!(!las.contains(TerminalID::EOI));
        assert!(las.contains(c));
    }

    #[test]
    fn left_recursive_nullable_head() {
        let g = Grammar::define(|g| {
            g.rule("L", ["L", "x"]);
            g.rule("L", [EPSILON]);
        })
        .unwrap();
        let first = g.first_of_name("L");
        assert!(first.contains_epsilon());
        assert!(first.contains(g.terminal("x").unwrap()));
        assert_eq!(first.len(), 2);
    }
}
