//! Canonical LR(1) collection.
//!
//! An item set maps each core `(production, dot)` to its lookahead set, per
//! state. Construction seeds `[S' → •start, $]`, closes it, and explores
//! transitions breadth-first; a freshly closed set is reused when an existing
//! state has the identical item set (cores *and* lookaheads — this is the
//! canonical collection, merging happens later in [`crate::lalr`]).

use crate::display::Scoped;
use crate::first_sets::FirstSets;
use crate::grammar::{Grammar, ProductionID, SymbolID, TerminalID, TerminalSet};
use crate::types::Map;
use std::collections::{btree_map, BTreeMap};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u16);

impl StateId {
    pub(crate) const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The core of an LR item: a production and a dot position. Lookaheads are
/// carried alongside in the item set, so equality and ordering are over the
/// core only.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemCore {
    pub production: ProductionID,
    pub dot: u16,
}

impl fmt::Debug for ItemCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?} @ {})", self.production, self.dot)
    }
}

impl ItemCore {
    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        Scoped::new(grammar, self)
    }
}

impl fmt::Display for Scoped<'_, ItemCore> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.value;
        let production = self.grammar.production(core.production);
        write!(f, "{} ->", self.grammar.nonterminal_name(production.left))?;
        for (i, symbol) in production.right.iter().enumerate() {
            if i == core.dot as usize {
                f.write_str(" .")?;
            }
            write!(f, " {}", self.grammar.symbol_name(*symbol))?;
        }
        if core.dot as usize == production.right.len() {
            f.write_str(" .")?;
        }
        Ok(())
    }
}

/// An LR(1) state: each core carries its set of lookahead terminals.
pub type ItemSet = BTreeMap<ItemCore, TerminalSet>;

#[derive(Debug)]
pub struct Lr1State {
    pub items: ItemSet,
    pub edges: Map<SymbolID, StateId>,
}

/// The canonical collection; state ids are indices into `states` in
/// discovery order.
#[derive(Debug)]
pub struct Lr1Automaton {
    pub states: Vec<Lr1State>,
}

impl Lr1Automaton {
    /// Build the canonical collection of LR(1) item sets for `grammar`.
    pub fn build(grammar: &Grammar) -> Self {
        let first_sets = FirstSets::new(grammar);

        let mut seed = ItemSet::new();
        seed.insert(
            ItemCore {
                production: ProductionID::ACCEPT,
                dot: 0,
            },
            Some(TerminalID::EOI).into_iter().collect(),
        );
        closure(grammar, &first_sets, &mut seed);

        let mut states = vec![Lr1State {
            items: seed,
            edges: Map::default(),
        }];

        let mut pos = 0;
        while pos < states.len() {
            let kernels = transitions(grammar, &states[pos].items);

            let mut edges = Map::default();
            for (symbol, mut item_set) in kernels {
                closure(grammar, &first_sets, &mut item_set);

                let found = states
                    .iter()
                    .position(|state| state.items == item_set)
                    .map(|index| StateId::from_raw(index as u16));
                let target = match found {
                    Some(id) => id,
                    None => {
                        let id = StateId::from_raw(states.len() as u16);
                        states.push(Lr1State {
                            items: item_set,
                            edges: Map::default(),
                        });
                        id
                    }
                };
                edges.insert(symbol, target);
            }

            states[pos].edges = edges;
            pos += 1;
        }

        tracing::debug!("canonical LR(1) collection has {} states", states.len());

        Lr1Automaton { states }
    }

    pub fn state(&self, id: StateId) -> &Lr1State {
        &self.states[id.index()]
    }

    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        Scoped::new(grammar, self)
    }
}

impl fmt::Display for Scoped<'_, Lr1Automaton> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.grammar;
        for (index, state) in self.value.states.iter().enumerate() {
            writeln!(f, "state {:02}:", index)?;
            for (core, lookaheads) in &state.items {
                write!(f, "  [{}, {{", core.display(g))?;
                for (i, lookahead) in lookaheads.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(g.terminal_name(lookahead))?;
                }
                writeln!(f, "}}]")?;
            }
            for (symbol, target) in &state.edges {
                writeln!(f, "  {} => {}", g.symbol_name(*symbol), target)?;
            }
        }
        Ok(())
    }
}

/// Expand `items` to its closure in place.
///
/// For every `[A → α•Bβ, L]` and production `B → γ`, the item `[B → •γ]`
/// gains the lookaheads `First(β L)`. Repeats until no core gains a
/// lookahead.
pub(crate) fn closure(grammar: &Grammar, first_sets: &FirstSets, items: &mut ItemSet) {
    let mut changed = true;
    while changed {
        changed = false;

        let mut added: Map<ItemCore, TerminalSet> = Map::default();
        for (core, lookaheads) in items.iter() {
            let production = grammar.production(core.production);
            let (next, beta) = match &production.right[core.dot as usize..] {
                [SymbolID::N(next), beta @ ..] => (*next, beta),
                _ => continue,
            };

            let follow = first_sets.first_of(beta, lookaheads.iter());
            for (id, p) in grammar.productions() {
                if p.left != next {
                    continue;
                }
                added
                    .entry(ItemCore {
                        production: id,
                        dot: 0,
                    })
                    .or_default()
                    .union_with(&follow);
            }
        }

        for (core, lookaheads) in added {
            match items.entry(core) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(lookaheads);
                    changed = true;
                }
                btree_map::Entry::Occupied(mut entry) => {
                    let before = entry.get().len();
                    entry.get_mut().union_with(&lookaheads);
                    changed |= entry.get().len() != before;
                }
            }
        }
    }
}

/// The unexpanded kernels reachable from `items`, grouped by the symbol
/// after the dot.
pub(crate) fn transitions(grammar: &Grammar, items: &ItemSet) -> Map<SymbolID, ItemSet> {
    let mut kernels: Map<SymbolID, ItemSet> = Map::default();
    for (core, lookaheads) in items {
        let production = grammar.production(core.production);
        let Some(&label) = production.right.get(core.dot as usize) else {
            continue;
        };
        kernels.entry(label).or_default().insert(
            ItemCore {
                production: core.production,
                dot: core.dot + 1,
            },
            lookaheads.clone(),
        );
    }
    kernels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::*;

    fn expression_grammar() -> Grammar {
        Grammar::define(|g| {
            let plus = g.terminal("+")?;
            let star = g.terminal("*")?;
            let lparen = g.terminal("(")?;
            let rparen = g.terminal(")")?;
            let id = g.terminal("id")?;

            let e = g.nonterminal("E")?;
            let t = g.nonterminal("T")?;
            let f = g.nonterminal("F")?;

            g.start_symbol(e);

            g.production(e, [N(e), T(plus), N(t)])?;
            g.production(e, [N(t)])?;
            g.production(t, [N(t), T(star), N(f)])?;
            g.production(t, [N(f)])?;
            g.production(f, [T(lparen), N(e), T(rparen)])?;
            g.production(f, [T(id)])?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn start_state_closure() {
        let grammar = expression_grammar();
        let automaton = Lr1Automaton::build(&grammar);

        let start = &automaton.states[0];
        // the seed plus one item per production whose left side is
        // reachable through the dot: E, T and F productions all appear
        assert_eq!(start.items.len(), 1 + grammar.productions().count() - 1);

        let seed = start
            .items
            .get(&ItemCore {
                production: ProductionID::ACCEPT,
                dot: 0,
            })
            .unwrap();
        assert!(seed.contains(TerminalID::EOI));
        assert_eq!(seed.len(), 1);
    }

    #[test]
    fn discovery_is_deterministic() {
        let grammar = expression_grammar();
        let a = Lr1Automaton::build(&grammar);
        let b = Lr1Automaton::build(&grammar);
        assert_eq!(a.states.len(), b.states.len());
        for (left, right) in a.states.iter().zip(&b.states) {
            assert_eq!(left.items, right.items);
            assert_eq!(
                left.edges.iter().collect::<Vec<_>>(),
                right.edges.iter().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn edges_cover_symbols_after_dot() {
        let grammar = expression_grammar();
        let automaton = Lr1Automaton::build(&grammar);

        for state in &automaton.states {
            for (core, _) in &state.items {
                let production = grammar.production(core.production);
                if let Some(symbol) = production.right.get(core.dot as usize) {
                    assert!(
                        state.edges.contains_key(symbol),
                        "missing edge on {}",
                        grammar.symbol_name(*symbol)
                    );
                }
            }
        }
    }

    #[test]
    fn canonical_collection_distinguishes_contexts() {
        // canonical LR(1) keeps same-core states with different lookaheads
        // apart; for the expression grammar that means strictly more states
        // than the LALR automaton's well-known 12
        let grammar = expression_grammar();
        let automaton = Lr1Automaton::build(&grammar);
        assert!(automaton.states.len() > 12);
    }
}
