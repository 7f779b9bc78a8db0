//! Grammar analysis and canonical LR(1) automaton construction.

pub mod automaton;
pub mod first_sets;
mod follow_sets;
pub mod grammar;
pub mod lr1;
pub mod parser;
pub mod table;
pub mod types;
pub mod util;

pub use crate::{
    automaton::{canonical_collection, Automaton, StateID},
    first_sets::FirstSet,
    grammar::{Grammar, GrammarDef, GrammarError},
    lr1::{closure, goto, Item, ItemSet, LookupError},
    parser::{ParseError, SyntaxTree},
    table::{Action, ParseTable},
};
