//! Calculation of LR(1) parse table from the canonical collection.

use crate::{
    automaton::{Automaton, StateID},
    grammar::{Grammar, NonterminalID, ProductionID, TerminalID},
    types::Map,
    util::display_fn,
};
use std::fmt;

#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, ParseTableRow>,
}

#[derive(Debug)]
#[non_exhaustive]
pub struct ParseTableRow {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(ProductionID),

    Accept,

    /// There are multiple conflicting actions for the lookahead symbol.
    Inconsistent {
        shift: Option<StateID>,
        reduces: Vec<ProductionID>,
        reason: ConflictReason,
    },
}
impl Action {
    pub fn is_consistent(&self) -> bool {
        !matches!(self, Self::Inconsistent { .. })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictReason {
    /// A shift and at least one reduction compete for the lookahead.
    ShiftReduce,

    /// The state has multiple reductions even though it has no shift action
    /// on the target lookahead symbol.
    MultipleReductionWithoutShift,
}

impl ParseTable {
    /// Derive the ACTION and GOTO entries of every state in `automaton`.
    ///
    /// Competing actions are kept as [`Action::Inconsistent`]. Accepting
    /// counts as the reduction of `S' -> S` there.
    #[tracing::instrument(skip_all)]
    pub fn generate(g: &Grammar, automaton: &Automaton) -> Self {
        let mut states = Map::default();
        for (&id, state) in &automaton.states {
            #[derive(Default)]
            struct PendingAction {
                shift: Option<StateID>,
                reduces: Vec<ProductionID>,
                accept: bool,
            }
            let mut pending_actions = Map::<TerminalID, PendingAction>::default();
            for (&t, &next) in &state.shifts {
                pending_actions.entry(t).or_default().shift.replace(next);
            }
            for item in state.items.iter().filter(|item| item.is_complete(g)) {
                let action = pending_actions.entry(item.lookahead).or_default();
                if item.head == NonterminalID::START {
                    action.accept = true;
                } else if !action.reduces.contains(&item.production()) {
                    action.reduces.push(item.production());
                }
            }

            let mut actions = Map::default();
            for (t, pending) in pending_actions {
                let action = match (pending.accept, pending.shift, &pending.reduces[..]) {
                    (true, None, []) => Action::Accept,
                    (false, Some(next), []) => Action::Shift(next),
                    (false, None, [reduce]) => Action::Reduce(*reduce),
                    (accept, shift, reduces) => {
                        let mut reduces = reduces.to_owned();
                        if accept {
                            reduces.insert(0, ProductionID::ACCEPT);
                        }
                        let reason = match shift {
                            Some(..) => ConflictReason::ShiftReduce,
                            None => ConflictReason::MultipleReductionWithoutShift,
                        };
                        tracing::debug!(
                            "conflict in state {:?} on {}: {:?}",
                            id,
                            g.terminal_name(t),
                            reason
                        );
                        Action::Inconsistent {
                            shift,
                            reduces,
                            reason,
                        }
                    }
                };
                actions.insert(t, action);
            }

            states.insert(
                id,
                ParseTableRow {
                    actions,
                    gotos: state.gotos.clone(),
                },
            );
        }

        ParseTable { states }
    }

    /// The state holding `[S' -> . S, ⊣]`.
    pub fn initial_state(&self) -> StateID {
        StateID::START
    }

    pub fn action(&self, state: StateID, lookahead: TerminalID) -> Option<&Action> {
        self.states.get(&state)?.actions.get(&lookahead)
    }

    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.states.get(&state)?.gotos.get(&symbol).copied()
    }

    /// Iterate over the inconsistent entries of this table.
    pub fn conflicts(&self) -> impl Iterator<Item = (StateID, TerminalID, &Action)> + '_ {
        self.states.iter().flat_map(|(&id, row)| {
            row.actions
                .iter()
                .filter(|(_, action)| !action.is_consistent())
                .map(move |(&t, action)| (id, t, action))
        })
    }

    /// Returns whether the grammar is LR(1), that is, no entry is conflicted.
    pub fn is_consistent(&self) -> bool {
        self.conflicts().next().is_none()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }

                writeln!(f, "#### State {:?}", id)?;
                writeln!(f, "## actions")?;
                for (token, action) in &row.actions {
                    let token = g.terminal_name(*token);
                    match action {
                        Action::Shift(n) => {
                            writeln!(f, "- {} => shift({:?})", token, n)?;
                        }
                        Action::Reduce(reduce) => {
                            writeln!(f, "- {} => reduce({})", token, display_production(g, *reduce))?;
                        }
                        Action::Accept => {
                            writeln!(f, "- {} => accept", token)?;
                        }
                        Action::Inconsistent {
                            reason,
                            shift,
                            reduces,
                        } => {
                            writeln!(f, "- {} => inconsistent(reason = {:?})", token, reason)?;
                            writeln!(f, "## conflicted actions on {}", token)?;
                            if let Some(n) = shift {
                                writeln!(f, "  - shift({:?})", n)?;
                            }
                            for reduce in reduces {
                                writeln!(f, "  - reduce({})", display_production(g, *reduce))?;
                            }
                        }
                    }
                }

                writeln!(f, "## gotos")?;
                for (symbol, goto) in &row.gotos {
                    writeln!(f, "- {} => goto({:?})", g.nonterminal_name(*symbol), goto)?;
                }
            }
            Ok(())
        })
    }
}

fn display_production(g: &Grammar, id: ProductionID) -> impl fmt::Display + '_ {
    display_fn(move |f| match g.production(id) {
        Some(p) => write!(f, "{}", p.display(g)),
        None => write!(f, "{:?}", id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        automaton::canonical_collection,
        grammar::{examples, GrammarDef},
    };

    fn generate(f: fn(&mut GrammarDef)) -> (Grammar, ParseTable) {
        let g = Grammar::define(|g| {
            f(g);
            g.augment(true);
        })
        .unwrap();
        let automaton = canonical_collection(&g).unwrap();
        let table = ParseTable::generate(&g, &automaton);
        eprintln!("{}", table.display(&g));
        (g, table)
    }

    #[test]
    fn lr1_grammars_have_no_conflicts() {
        for f in [
            examples::expression,
            examples::cc,
            examples::nullable_cascade,
            examples::arithmetic,
            examples::fig6,
        ] {
            let (_, table) = generate(f);
            assert!(table.is_consistent());
        }
    }

    #[test]
    fn accept_on_end_marker() {
        let (g, table) = generate(examples::cc);
        let s = g.nonterminal("S").unwrap();
        let after_s = table.goto(table.initial_state(), s).unwrap();
        assert_eq!(table.action(after_s, TerminalID::EOI), Some(&Action::Accept));
    }

    #[test]
    fn ambiguous_grammar_reports_shift_reduce_conflicts() {
        let (g, table) = generate(examples::ambiguous);
        let conflicts: Vec<_> = table.conflicts().collect();
        assert!(!conflicts.is_empty());
        for (_, t, action) in conflicts {
            assert!(matches!(
                action,
                Action::Inconsistent {
                    shift: Some(..),
                    reason: ConflictReason::ShiftReduce,
                    ..
                }
            ));
            let name = g.terminal_name(t);
            assert!(name == "+" || name == "*");
        }
    }

    #[test]
    fn fig1_needs_precedence() {
        let (g, table) = generate(examples::fig1);
        let conflicts: Vec<_> = table.conflicts().collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(g.terminal_name(conflicts[0].1), "a");
    }

    #[test]
    fn unit_cycle_on_start_symbol_conflicts_with_accept() {
        let g = Grammar::build("S", [("S", vec![vec!["S"], vec!["a"]])], true).unwrap();
        let automaton = canonical_collection(&g).unwrap();
        let table = ParseTable::generate(&g, &automaton);

        let conflicts: Vec<_> = table.conflicts().collect();
        assert_eq!(conflicts.len(), 1);
        let (_, t, action) = conflicts[0];
        assert_eq!(t, TerminalID::EOI);
        let s = g.nonterminal("S").unwrap();
        assert_eq!(
            *action,
            Action::Inconsistent {
                shift: None,
                reduces: vec![ProductionID::ACCEPT, ProductionID { head: s, rule: 0 }],
                reason: ConflictReason::MultipleReductionWithoutShift,
            }
        );

        let err = table.parse(&g, ["a"]).unwrap_err();
        assert!(matches!(err, crate::parser::ParseError::Conflict { .. }));
    }

    #[test]
    fn fig2_reports_reduce_reduce_conflicts() {
        let (_, table) = generate(examples::fig2);
        assert!(table.conflicts().any(|(_, _, action)| matches!(
            action,
            Action::Inconsistent {
                shift: None,
                reason: ConflictReason::MultipleReductionWithoutShift,
                ..
            }
        )));
    }
}
