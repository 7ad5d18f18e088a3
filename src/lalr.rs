//! LALR(1) automaton and parse table.
//!
//! LR(1) states that share a core set collapse into one LALR state whose
//! lookahead sets are the per-core unions across the group. Two states with
//! identical cores have identical outgoing core transitions, so remapping
//! edges through the merge map is unambiguous.
//!
//! Table fill is first-writer-wins: a cell that would receive a second,
//! different action keeps its existing entry and the collision is recorded
//! in the conflict list. Conflicts are never fatal — the table stays
//! inspectable and callers decide via [`LalrTable::conflicts`].

use crate::display::Scoped;
use crate::grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID};
use crate::lr1::{ItemCore, ItemSet, Lr1Automaton, StateId};
use crate::types::Map;
use indexmap::map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug)]
pub struct LalrState {
    pub items: ItemSet,
    pub edges: Map<SymbolID, StateId>,
}

/// The merged automaton plus the map from LR(1) state index to merged state.
#[derive(Debug)]
pub struct LalrAutomaton {
    pub states: Vec<LalrState>,
    pub state_map: Vec<StateId>,
}

impl LalrAutomaton {
    /// Merge the canonical collection by core set.
    ///
    /// Merged states are numbered by the first LR(1) state of each group, so
    /// the start state of the LR(1) automaton maps to merged state 0.
    pub fn merge(lr1: &Lr1Automaton) -> Self {
        let mut groups: Map<BTreeSet<ItemCore>, StateId> = Map::default();
        let mut states: Vec<LalrState> = Vec::new();
        let mut state_map: Vec<StateId> = Vec::with_capacity(lr1.states.len());

        for state in &lr1.states {
            let cores: BTreeSet<ItemCore> = state.items.keys().copied().collect();
            let merged_id = match groups.entry(cores) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let id = StateId::from_raw(states.len() as u16);
                    states.push(LalrState {
                        items: BTreeMap::new(),
                        edges: Map::default(),
                    });
                    entry.insert(id);
                    id
                }
            };
            state_map.push(merged_id);

            let merged = &mut states[merged_id.index()];
            for (core, lookaheads) in &state.items {
                merged
                    .items
                    .entry(*core)
                    .or_default()
                    .union_with(lookaheads);
            }
        }

        for (index, state) in lr1.states.iter().enumerate() {
            let from = state_map[index];
            for (symbol, target) in &state.edges {
                states[from.index()]
                    .edges
                    .insert(*symbol, state_map[target.index()]);
            }
        }

        tracing::debug!(
            "merged {} LR(1) states into {} LALR(1) states",
            lr1.states.len(),
            states.len()
        );

        LalrAutomaton { states, state_map }
    }
}

/// A parse action stored in the ACTION table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(ProductionID),
    Accept,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    ShiftReduce,
    ReduceReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => f.write_str("Shift/Reduce"),
            Self::ReduceReduce => f.write_str("Reduce/Reduce"),
        }
    }
}

/// A table cell that would have received two different actions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub terminal: TerminalID,
    pub kind: ConflictKind,
}

impl Conflict {
    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        Scoped::new(grammar, self)
    }
}

impl fmt::Display for Scoped<'_, Conflict> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Conflict {
            state,
            terminal,
            kind,
        } = self.value;
        write!(
            f,
            "{} in state {} on '{}'",
            kind,
            state,
            self.grammar.terminal_name(*terminal)
        )
    }
}

/// The LALR(1) parse table. Owns the grammar it was generated from.
#[derive(Debug)]
pub struct LalrTable {
    grammar: Grammar,
    states: Vec<LalrState>,
    actions: Map<(StateId, TerminalID), Action>,
    gotos: Map<(StateId, NonterminalID), StateId>,
    conflicts: Vec<Conflict>,
    start_state: StateId,
}

impl LalrTable {
    /// Build the full pipeline for `grammar`: FIRST sets, canonical LR(1)
    /// collection, core merge, table fill.
    pub fn generate(grammar: Grammar) -> Self {
        let lr1 = Lr1Automaton::build(&grammar);
        let lalr = LalrAutomaton::merge(&lr1);
        Self::fill(grammar, lalr)
    }

    fn fill(grammar: Grammar, lalr: LalrAutomaton) -> Self {
        let start_state = lalr.state_map[0];
        let mut actions: Map<(StateId, TerminalID), Action> = Map::default();
        let mut gotos: Map<(StateId, NonterminalID), StateId> = Map::default();
        let mut conflicts: Vec<Conflict> = Vec::new();

        for (index, state) in lalr.states.iter().enumerate() {
            let id = StateId::from_raw(index as u16);

            for (core, lookaheads) in &state.items {
                let production = grammar.production(core.production);
                match production.right.get(core.dot as usize) {
                    Some(SymbolID::T(t)) => {
                        if let Some(&target) = state.edges.get(&SymbolID::T(*t)) {
                            install(&mut actions, &mut conflicts, id, *t, Action::Shift(target));
                        }
                    }
                    Some(SymbolID::N(_)) => {}
                    None => {
                        if core.production == ProductionID::ACCEPT {
                            // [S' -> start ., $]
                            if lookaheads.contains(TerminalID::EOI) {
                                install(
                                    &mut actions,
                                    &mut conflicts,
                                    id,
                                    TerminalID::EOI,
                                    Action::Accept,
                                );
                            }
                        } else {
                            for lookahead in lookaheads.iter() {
                                install(
                                    &mut actions,
                                    &mut conflicts,
                                    id,
                                    lookahead,
                                    Action::Reduce(core.production),
                                );
                            }
                        }
                    }
                }
            }

            for (symbol, target) in &state.edges {
                if let SymbolID::N(n) = symbol {
                    gotos.insert((id, *n), *target);
                }
            }
        }

        if !conflicts.is_empty() {
            tracing::debug!("table has {} conflict(s)", conflicts.len());
        }

        Self {
            grammar,
            states: lalr.states,
            actions,
            gotos,
            conflicts,
            start_state,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn states(&self) -> &[LalrState] {
        &self.states
    }

    pub fn start_state(&self) -> StateId {
        self.start_state
    }

    pub fn action(&self, state: StateId, terminal: TerminalID) -> Option<Action> {
        self.actions.get(&(state, terminal)).copied()
    }

    pub fn goto(&self, state: StateId, nonterminal: NonterminalID) -> Option<StateId> {
        self.gotos.get(&(state, nonterminal)).copied()
    }

    /// The conflicts recorded while filling the table. A non-empty list
    /// means some cells kept their first action; check before trusting the
    /// table for parsing.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }
}

impl fmt::Display for LalrTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.grammar;
        for (index, state) in self.states.iter().enumerate() {
            let id = StateId::from_raw(index as u16);
            writeln!(f, "state {:02}:", index)?;
            for (core, _) in &state.items {
                writeln!(f, "  {}", core.display(g))?;
            }
            for ((s, t), action) in &self.actions {
                if *s != id {
                    continue;
                }
                match action {
                    Action::Shift(n) => {
                        writeln!(f, "  {} => shift({})", g.terminal_name(*t), n)?
                    }
                    Action::Reduce(p) => writeln!(
                        f,
                        "  {} => reduce({})",
                        g.terminal_name(*t),
                        g.production(*p).display(g)
                    )?,
                    Action::Accept => writeln!(f, "  {} => accept", g.terminal_name(*t))?,
                }
            }
            for ((s, n), target) in &self.gotos {
                if *s == id {
                    writeln!(f, "  {} => goto({})", g.nonterminal_name(*n), target)?;
                }
            }
        }
        for conflict in &self.conflicts {
            writeln!(f, "conflict: {}", conflict.display(g))?;
        }
        Ok(())
    }
}

fn install(
    actions: &mut Map<(StateId, TerminalID), Action>,
    conflicts: &mut Vec<Conflict>,
    state: StateId,
    terminal: TerminalID,
    action: Action,
) {
    match actions.entry((state, terminal)) {
        Entry::Vacant(entry) => {
            entry.insert(action);
        }
        Entry::Occupied(entry) => {
            let existing = *entry.get();
            if existing != action {
                let kind = if matches!(existing, Action::Shift(_))
                    || matches!(action, Action::Shift(_))
                {
                    ConflictKind::ShiftReduce
                } else {
                    ConflictKind::ReduceReduce
                };
                conflicts.push(Conflict {
                    state,
                    terminal,
                    kind,
                });
            }
        }
    }
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

    /// The dangling-else grammar:
    /// S -> if E then S | if E then S else S | a ; E -> e
    fn dangling_else_grammar() -> Grammar {
        Grammar::define(|g| {
            let r#if = g.terminal("if")?;
            let then = g.terminal("then")?;
            let r#else = g.terminal("else")?;
            let a = g.terminal("a")?;
            let e_tok = g.terminal("e")?;

            let s = g.nonterminal("S")?;
            let e = g.nonterminal("E")?;

            g.start_symbol(s);

            g.production(s, [T(r#if), N(e), T(then), N(s)])?;
            g.production(s, [T(r#if), N(e), T(then), N(s), T(r#else), N(s)])?;
            g.production(s, [T(a)])?;
            g.production(e, [T(e_tok)])?;
            Ok(())
        })
        .unwrap()
    }

    #[test]
    fn merge_shrinks_the_canonical_collection() {
        let grammar = expression_grammar();
        let lr1 = Lr1Automaton::build(&grammar);
        let lalr = LalrAutomaton::merge(&lr1);

        assert!(lalr.states.len() < lr1.states.len());
        // the LALR automaton for this grammar is the textbook 12-state one
        assert_eq!(lalr.states.len(), 12);
        assert_eq!(lalr.state_map.len(), lr1.states.len());
    }

    #[test]
    fn merged_lookaheads_are_unions() {
        let grammar = expression_grammar();
        let lr1 = Lr1Automaton::build(&grammar);
        let lalr = LalrAutomaton::merge(&lr1);

        for (index, state) in lr1.states.iter().enumerate() {
            let merged = &lalr.states[lalr.state_map[index].index()];
            for (core, lookaheads) in &state.items {
                let merged_lookaheads = merged.items.get(core).unwrap();
                for lookahead in lookaheads.iter() {
                    assert!(merged_lookaheads.contains(lookahead));
                }
            }
        }
    }

    #[test]
    fn conflict_free_expression_table() {
        let table = LalrTable::generate(expression_grammar());
        assert!(table.conflicts().is_empty());
    }

    #[test]
    fn exactly_one_accept_cell() {
        let table = LalrTable::generate(expression_grammar());
        let accepts: Vec<_> = table
            .actions
            .iter()
            .filter(|(_, action)| matches!(action, Action::Accept))
            .collect();
        assert_eq!(accepts.len(), 1);
        let ((_, terminal), _) = accepts[0];
        assert_eq!(*terminal, TerminalID::EOI);
    }

    #[test]
    fn dangling_else_has_shift_reduce_conflict() {
        let table = LalrTable::generate(dangling_else_grammar());
        let r#else = table.grammar().terminal_by_name("else").unwrap();

        assert!(!table.conflicts().is_empty());
        assert!(table
            .conflicts()
            .iter()
            .any(|c| c.kind == ConflictKind::ShiftReduce && c.terminal == r#else));
    }

    #[test]
    fn first_writer_wins_keeps_table_usable() {
        let table = LalrTable::generate(dangling_else_grammar());
        let r#else = table.grammar().terminal_by_name("else").unwrap();
        let conflict = table
            .conflicts()
            .iter()
            .find(|c| c.terminal == r#else)
            .unwrap();

        // the cell still holds an action despite the conflict
        assert!(table.action(conflict.state, r#else).is_some());
    }

    #[test]
    fn conflict_description_format() {
        let table = LalrTable::generate(dangling_else_grammar());
        let conflict = table.conflicts().first().unwrap();
        let description = conflict.display(table.grammar()).to_string();
        assert!(description.starts_with("Shift/Reduce in state "));
        assert!(description.ends_with("on 'else'"));
    }
}
