//! The canonical collection of LR(1) item sets.

use crate::{
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID},
    lr1::{self, Item, ItemSet, LookupError},
    types::{Map, Set},
    util::display_fn,
};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl StateID {
    pub const START: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct LR1State {
    pub items: ItemSet,
    pub shifts: Map<TerminalID, StateID>,
    pub gotos: Map<NonterminalID, StateID>,
}

impl LR1State {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## items:")?;
            write!(f, "{}", self.items.display(g))?;
            if !self.shifts.is_empty() {
                writeln!(f, "## shifts:")?;
                for (t, to) in &self.shifts {
                    writeln!(f, "- {} => {:?}", g.terminal_name(*t), to)?;
                }
            }
            if !self.gotos.is_empty() {
                writeln!(f, "## gotos:")?;
                for (n, to) in &self.gotos {
                    writeln!(f, "- {} => {:?}", g.nonterminal_name(*n), to)?;
                }
            }
            Ok(())
        })
    }
}

/// The LR(1) automaton: item sets indexed by discovery order, and the
/// transitions between them.
#[derive(Debug)]
pub struct Automaton {
    pub states: Map<StateID, LR1State>,
}

impl Automaton {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateID) -> Option<&LR1State> {
        self.states.get(&id)
    }

    /// Find the state whose item set is `items`.
    pub fn find(&self, items: &ItemSet) -> Option<StateID> {
        self.states
            .iter()
            .find_map(|(id, state)| (state.items == *items).then_some(*id))
    }

    pub fn transition(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        let state = self.states.get(&from)?;
        match symbol {
            SymbolID::T(t) => state.shifts.get(&t).copied(),
            SymbolID::N(n) => state.gotos.get(&n).copied(),
        }
    }

    /// Iterate over the transition map `(state, symbol) -> state`.
    pub fn transitions(&self) -> impl Iterator<Item = (StateID, SymbolID, StateID)> + '_ {
        self.states.iter().flat_map(|(&from, state)| {
            let shifts = state
                .shifts
                .iter()
                .map(move |(&t, &to)| (from, SymbolID::T(t), to));
            let gotos = state
                .gotos
                .iter()
                .map(move |(&n, &to)| (from, SymbolID::N(n), to));
            shifts.chain(gotos)
        })
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:02}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Construct the canonical collection of LR(1) item sets of an augmented
/// grammar, starting from `CLOSURE({[S' -> . S, ⊣]})`.
#[tracing::instrument(skip_all)]
pub fn canonical_collection(g: &Grammar) -> Result<Automaton, LookupError> {
    if !g.is_augmented() {
        return Err(LookupError::NotAugmented);
    }

    let initial: ItemSet = Some(Item::new(NonterminalID::START, 0, 0, TerminalID::EOI))
        .into_iter()
        .collect();
    let initial = lr1::closure(g, &initial)?;

    // item sets in discovery order; the index is the state number.
    let mut item_sets = Set::<ItemSet>::default();
    item_sets.insert(initial);

    let mut states = Map::<StateID, LR1State>::default();
    let mut current = 0;
    while let Some(items) = item_sets.get_index(current).cloned() {
        let id = state_id(current)?;
        current += 1;

        // GOTO(I, X) is non-empty only for the symbols right after a marker.
        let mut shifts = Map::default();
        let mut gotos = Map::default();
        for (symbol, kernels) in lr1::kernels_by_symbol(g, &items) {
            let next = lr1::expand_closure(g, kernels);
            let (index, inserted) = item_sets.insert_full(next);
            if inserted {
                tracing::trace!("new state {} from {:?} on {}", index, id, g.symbol_name(symbol));
            }
            let next = state_id(index)?;
            match symbol {
                SymbolID::T(t) => {
                    shifts.insert(t, next);
                }
                SymbolID::N(n) => {
                    gotos.insert(n, next);
                }
            }
        }

        states.insert(
            id,
            LR1State {
                items,
                shifts,
                gotos,
            },
        );
    }

    tracing::debug!("canonical collection has {} states", states.len());

    Ok(Automaton { states })
}

fn state_id(index: usize) -> Result<StateID, LookupError> {
    u16::try_from(index)
        .map(StateID)
        .map_err(|_| LookupError::TooManyStates)
}
