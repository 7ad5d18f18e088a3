//! Hash collection aliases.
//!
//! All maps and sets in this crate preserve insertion order so that every
//! derived structure (DFA state numbering, LR state discovery, table fill)
//! is deterministic for a given input.

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;
