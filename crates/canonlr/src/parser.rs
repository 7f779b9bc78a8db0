//! A table-driven LR(1) parse driver, used to exercise generated tables.

use crate::{
    automaton::StateID,
    grammar::{Grammar, ProductionID, SymbolID, TerminalID},
    table::{Action, ParseTable},
    util::display_fn,
};
use std::fmt;

/// The concrete syntax tree built by [`ParseTable::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxTree {
    Leaf(TerminalID),
    Node {
        production: ProductionID,
        children: Vec<SyntaxTree>,
    },
}

impl SyntaxTree {
    /// The grammar symbol at the root of this tree.
    pub fn symbol(&self) -> SymbolID {
        match self {
            Self::Leaf(t) => SymbolID::T(*t),
            Self::Node { production, .. } => SymbolID::N(production.head),
        }
    }

    /// The terminals at the leaves, from left to right.
    pub fn leaves(&self) -> Vec<TerminalID> {
        let mut leaves = vec![];
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            match tree {
                Self::Leaf(t) => leaves.push(*t),
                Self::Node { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        leaves
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| self.fmt_indented(g, 0, f))
    }

    fn fmt_indented(&self, g: &Grammar, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}", "", width = depth * 2)?;
        match self {
            Self::Leaf(t) => writeln!(f, "{}", g.terminal_name(*t)),
            Self::Node {
                production,
                children,
            } => {
                match g.production(*production) {
                    Some(p) => writeln!(f, "{}", p.display(g))?,
                    None => writeln!(f, "{:?}", production)?,
                }
                for child in children {
                    child.fmt_indented(g, depth + 1, f)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("unknown token `{name}` at position {position}")]
    UnknownToken { position: usize, name: String },

    #[error("unexpected token `{found}` at position {position}, expected one of {expected:?}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: Vec<String>,
    },

    #[error("conflicted action in state {state:?} on `{lookahead}`")]
    Conflict { state: StateID, lookahead: String },

    #[error("no goto from state {state:?} on `{symbol}`")]
    MissingGoto { state: StateID, symbol: String },

    #[error("the table refers to an unknown production {production:?}")]
    UnknownProduction { production: ProductionID },

    #[error("too few symbols on the stack to reduce {production:?}")]
    StackUnderflow { production: ProductionID },
}

impl ParseTable {
    /// Run the LR(1) automaton over a sequence of terminal names.
    ///
    /// The end marker is appended implicitly and must not appear in `tokens`.
    #[tracing::instrument(skip_all)]
    pub fn parse<I, S>(&self, g: &Grammar, tokens: I) -> Result<SyntaxTree, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .enumerate()
            .map(|(position, name)| {
                let name = name.as_ref();
                match g.terminal(name) {
                    Some(t) if t != TerminalID::EOI => Ok(t),
                    _ => Err(ParseError::UnknownToken {
                        position,
                        name: name.to_owned(),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut states = vec![self.initial_state()];
        let mut trees: Vec<SyntaxTree> = vec![];
        let mut position = 0;
        loop {
            let current = *states.last().unwrap_or(&StateID::START);
            let lookahead = tokens.get(position).copied().unwrap_or(TerminalID::EOI);

            let action = match self.action(current, lookahead) {
                Some(action) => action,
                None => {
                    return Err(self.unexpected(g, current, position, lookahead));
                }
            };
            tracing::trace!(
                "state {:?}, lookahead {}: {:?}",
                current,
                g.terminal_name(lookahead),
                action
            );

            match action {
                Action::Shift(next) => {
                    trees.push(SyntaxTree::Leaf(lookahead));
                    states.push(*next);
                    position += 1;
                }

                Action::Reduce(production) => {
                    let n = g
                        .production(*production)
                        .ok_or(ParseError::UnknownProduction {
                            production: *production,
                        })?
                        .right()
                        .len();
                    // a table generated from another grammar may pop past the bottom.
                    let underflow = ParseError::StackUnderflow {
                        production: *production,
                    };
                    let at = trees.len().checked_sub(n).ok_or(underflow)?;
                    let children = trees.split_off(at);
                    states.truncate(states.len() - n);

                    let current = *states.last().unwrap_or(&StateID::START);
                    let next = self.goto(current, production.head).ok_or_else(|| {
                        ParseError::MissingGoto {
                            state: current,
                            symbol: g.nonterminal_name(production.head).to_owned(),
                        }
                    })?;
                    trees.push(SyntaxTree::Node {
                        production: *production,
                        children,
                    });
                    states.push(next);
                }

                Action::Accept => {
                    // the stack holds exactly the tree of the start symbol.
                    return match trees.pop() {
                        Some(tree) if trees.is_empty() => Ok(tree),
                        _ => Err(self.unexpected(g, current, position, lookahead)),
                    };
                }

                Action::Inconsistent { .. } => {
                    return Err(ParseError::Conflict {
                        state: current,
                        lookahead: g.terminal_name(lookahead).to_owned(),
                    });
                }
            }
        }
    }

    fn unexpected(
        &self,
        g: &Grammar,
        state: StateID,
        position: usize,
        found: TerminalID,
    ) -> ParseError {
        let expected = self
            .states
            .get(&state)
            .map(|row| {
                row.actions
                    .keys()
                    .map(|t| g.terminal_name(*t).to_owned())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        ParseError::UnexpectedToken {
            position,
            found: g.terminal_name(found).to_owned(),
            expected,
        }
    }
}
