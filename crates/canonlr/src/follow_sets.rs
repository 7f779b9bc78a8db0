//! Calculation of FOLLOW sets.

use crate::{
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID, TerminalSet},
    types::Map,
};

#[derive(Debug, Default)]
pub(crate) struct FollowSets {
    map: Map<NonterminalID, TerminalSet>,
}

impl FollowSets {
    /// Requires the FIRST sets of `g` to be computed already.
    #[tracing::instrument(skip_all)]
    pub(crate) fn new(g: &Grammar) -> Self {
        let mut map: Map<NonterminalID, TerminalSet> = g
            .nonterminals()
            .map(|(n, _)| (n, TerminalSet::default()))
            .collect();
        map.entry(g.start_symbol())
            .or_default()
            .insert(TerminalID::EOI);

        let max_rounds = (g.terminals().count() + 1) * g.nonterminals().count() + 1;
        let mut rounds = 0;
        loop {
            rounds += 1;
            assert!(
                rounds <= max_rounds,
                "FOLLOW sets did not converge within {} rounds",
                max_rounds
            );

            let mut added = 0;
            for p in g.productions() {
                let right = p.right();
                for (i, symbol) in right.iter().enumerate() {
                    // A -> alpha B beta
                    let &SymbolID::N(b) = symbol else {
                        continue;
                    };
                    let beta = &right[i + 1..];
                    let first = g.first_sets().of_sequence(beta);

                    let mut follow = first.terminals().clone();
                    if beta.is_empty() || first.contains_epsilon() {
                        if let Some(follow_a) = map.get(&p.head()) {
                            follow.union_with(follow_a);
                        }
                    }

                    let follow_b = map.entry(b).or_default();
                    let before = follow_b.len();
                    follow_b.union_with(&follow);
                    added += follow_b.len() - before;
                }
            }

            tracing::trace!("round {}: {} members added", rounds, added);
            if added == 0 {
                break;
            }
        }

        Self { map }
    }

    pub(crate) fn get(&self, symbol: NonterminalID) -> Option<&TerminalSet> {
        self.map.get(&symbol)
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::{examples, Grammar, END_MARKER};

    fn follow(g: &Grammar, name: &str) -> Vec<String> {
        g.follow_of_name(name)
            .iter()
            .map(|t| g.terminal_name(t).to_owned())
            .collect()
    }

    #[test]
    fn start_symbol_is_followed_by_end_marker() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        assert!(follow(&g, "expr").contains(&END_MARKER.to_owned()));
    }

    #[test]
    fn follow_through_nullable_suffix() {
        let g = Grammar::define(examples::with_nullable).unwrap();
        // T occurs at the end of `E -> T`, so it inherits Follow(E).
        assert_eq!(follow(&g, "T"), follow(&g, "E"));
        assert_eq!(follow(&g, "E"), [END_MARKER, "+", ")", "num"]);
        assert_eq!(follow(&g, "n"), [END_MARKER, "+", "a", ")", "num"]);
    }

    #[test]
    fn unknown_nonterminal_has_empty_follow() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        assert!(g.follow_of_name("nothing").is_empty());
        assert!(g.follow_of_name("NUM").is_empty());
    }
}
