//! DFA model and subset construction.
//!
//! Each DFA state remembers the set of NFA states it stands for; that set is
//! the interning key during subset construction, so equal subsets always
//! collapse onto one state. State ids follow discovery order, which makes the
//! result canonical for a given NFA and alphabet.

use crate::nfa::{Nfa, StateId};
use crate::regex::RegexError;
use crate::types::{Map, Set};
use std::collections::{BTreeSet, VecDeque};

pub type DfaId = u32;

#[derive(Debug, Clone)]
pub struct DfaState {
    pub id: DfaId,
    /// The NFA states this DFA state represents. Doubles as the semantic
    /// identity of the state; the `id` is only a graph pointer.
    pub nfa_states: BTreeSet<StateId>,
    pub transitions: Map<char, DfaId>,
    pub is_final: bool,
}

#[derive(Debug, Clone)]
pub struct Dfa {
    pub states: Vec<DfaState>,
    pub start: DfaId,
}

impl Dfa {
    /// Compile a pattern straight to a DFA, using the pattern's own
    /// characters as the alphabet.
    pub fn compile(pattern: &str) -> Result<Self, RegexError> {
        let nfa = Nfa::parse(pattern)?;
        let alphabet = nfa.alphabet();
        Ok(Self::from_nfa(&nfa, &alphabet))
    }

    /// Build a DFA that matches `text` and nothing else.
    ///
    /// Covers the characters the pattern surface reserves as operators;
    /// there is no escape syntax, so `+` or `(` tokens are built here.
    pub fn literal(text: &str) -> Self {
        let mut states = vec![DfaState {
            id: 0,
            nfa_states: BTreeSet::new(),
            transitions: Map::default(),
            is_final: text.is_empty(),
        }];

        let mut current: DfaId = 0;
        let chars: Vec<char> = text.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            let next = states.len() as DfaId;
            states.push(DfaState {
                id: next,
                nfa_states: BTreeSet::new(),
                transitions: Map::default(),
                is_final: i == chars.len() - 1,
            });
            states[current as usize].transitions.insert(c, next);
            current = next;
        }

        Dfa { states, start: 0 }
    }

    /// Subset construction over the given alphabet.
    ///
    /// The start state is `ε-closure({nfa.start})`; every worklist step
    /// computes `ε-closure(move(D, a))` per symbol, reusing an existing state
    /// when its NFA set matches and creating one otherwise. Missing entries in
    /// a transition map are dead transitions.
    pub fn from_nfa(nfa: &Nfa, alphabet: &Set<char>) -> Self {
        let start_set = nfa.epsilon_closure([nfa.start]);
        let mut states = vec![DfaState {
            id: 0,
            is_final: contains_final(nfa, &start_set),
            nfa_states: start_set.clone(),
            transitions: Map::default(),
        }];

        let mut index: Map<BTreeSet<StateId>, DfaId> = Map::default();
        index.insert(start_set, 0);

        let mut worklist: VecDeque<DfaId> = VecDeque::from([0]);
        while let Some(current) = worklist.pop_front() {
            let current_set = states[current as usize].nfa_states.clone();

            for &symbol in alphabet {
                let moved = nfa.step(&current_set, symbol);
                if moved.is_empty() {
                    continue;
                }
                let closure = nfa.epsilon_closure(moved);

                let target = match index.get(&closure) {
                    Some(&existing) => existing,
                    None => {
                        let id = states.len() as DfaId;
                        states.push(DfaState {
                            id,
                            is_final: contains_final(nfa, &closure),
                            nfa_states: closure.clone(),
                            transitions: Map::default(),
                        });
                        index.insert(closure, id);
                        worklist.push_back(id);
                        id
                    }
                };

                states[current as usize].transitions.insert(symbol, target);
            }
        }

        tracing::debug!("subset construction produced {} states", states.len());

        Dfa { states, start: 0 }
    }

    /// Run the DFA over the whole input.
    pub fn accepts(&self, input: &str) -> bool {
        let mut state = self.start;
        for c in input.chars() {
            match self.states[state as usize].transitions.get(&c) {
                Some(&next) => state = next,
                None => return false,
            }
        }
        self.states[state as usize].is_final
    }

    /// Length of the longest accepting prefix of `chars`, or `None` if no
    /// prefix (not even the empty one) is accepted.
    pub fn longest_match(&self, chars: &[char]) -> Option<usize> {
        let mut state = self.start;
        let mut matched = self.states[state as usize].is_final.then_some(0);

        for (i, c) in chars.iter().enumerate() {
            match self.states[state as usize].transitions.get(c) {
                Some(&next) => {
                    state = next;
                    if self.states[next as usize].is_final {
                        matched = Some(i + 1);
                    }
                }
                None => break,
            }
        }

        matched
    }
}

fn contains_final(nfa: &Nfa, states: &BTreeSet<StateId>) -> bool {
    states
        .iter()
        .any(|&state| nfa.states[state as usize].is_final)
}
