//! DFA minimization by table filling.
//!
//! A pair of states is distinguishable if exactly one is final, or if some
//! symbol leads the pair to an already-distinguished pair (or out of the
//! automaton for only one of them). The marking iterates to a fixed point;
//! the unmarked relation is then collapsed into equivalence classes with a
//! union-find and the automaton is rebuilt over the classes.

use crate::dfa::{Dfa, DfaId, DfaState};
use crate::types::{Map, Set};
use std::collections::BTreeSet;

/// Return the minimal DFA equivalent to `dfa`.
///
/// A merged state represents the union of its members' NFA sets and is final
/// iff any member was; all members of a class have equivalent outgoing
/// behaviour, so transitions are remapped through the class map. Automata
/// with at most one state are returned unchanged.
pub fn minimize(dfa: &Dfa) -> Dfa {
    let n = dfa.states.len();
    if n <= 1 {
        return dfa.clone();
    }

    let alphabet: Set<char> = dfa
        .states
        .iter()
        .flat_map(|state| state.transitions.keys().copied())
        .collect();

    // marked[i * n + j] for i < j: pair {i, j} is distinguishable
    let mut marked = vec![false; n * n];
    for i in 0..n {
        for j in i + 1..n {
            if dfa.states[i].is_final != dfa.states[j].is_final {
                marked[i * n + j] = true;
            }
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..n {
            for j in i + 1..n {
                if marked[i * n + j] {
                    continue;
                }
                for &symbol in &alphabet {
                    let p = dfa.states[i].transitions.get(&symbol);
                    let q = dfa.states[j].transitions.get(&symbol);
                    let distinguishes = match (p, q) {
                        (None, None) => false,
                        (Some(_), None) | (None, Some(_)) => true,
                        (Some(&p), Some(&q)) => {
                            let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
                            lo != hi && marked[lo as usize * n + hi as usize]
                        }
                    };
                    if distinguishes {
                        marked[i * n + j] = true;
                        changed = true;
                        break;
                    }
                }
            }
        }
    }

    // equivalence classes: union every unmarked pair
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in i + 1..n {
            if !marked[i * n + j] {
                let ri = find(&mut parent, i);
                let rj = find(&mut parent, j);
                if ri != rj {
                    // keep the smaller index as representative
                    let (lo, hi) = if ri < rj { (ri, rj) } else { (rj, ri) };
                    parent[hi] = lo;
                }
            }
        }
    }

    // one merged state per class, numbered by first occurrence
    let mut class_of: Map<usize, DfaId> = Map::default();
    let mut states: Vec<DfaState> = Vec::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        let id = *class_of.entry(root).or_insert_with(|| {
            let id = states.len() as DfaId;
            states.push(DfaState {
                id,
                nfa_states: BTreeSet::new(),
                transitions: Map::default(),
                is_final: false,
            });
            id
        });
        let merged = &mut states[id as usize];
        merged.nfa_states.extend(dfa.states[i].nfa_states.iter().copied());
        merged.is_final |= dfa.states[i].is_final;
    }

    for i in 0..n {
        let from = class_of[&find(&mut parent, i)];
        for (&symbol, &target) in &dfa.states[i].transitions {
            let to = class_of[&find(&mut parent, target as usize)];
            states[from as usize].transitions.insert(symbol, to);
        }
    }

    let start = class_of[&find(&mut parent, dfa.start as usize)];
    tracing::debug!("minimized {} states down to {}", n, states.len());

    Dfa { states, start }
}

fn find(parent: &mut [usize], x: usize) -> usize {
    if parent[x] != x {
        let root = find(parent, parent[x]);
        parent[x] = root;
    }
    parent[x]
}
