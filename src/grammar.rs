//! Grammar types.
//!
//! Symbols are interned: a [`TerminalID`] or [`NonterminalID`] stands for a
//! name-and-kind pair, and `GrammarDef` hands back the existing id when a
//! name is declared twice with the same kind. Two reserved ids exist —
//! [`TerminalID::EOI`] is the end-of-input terminal `$` and
//! [`NonterminalID::START`] is the augmented start symbol `S'`. Neither can
//! be declared by callers, and names `"$"`/`"ε"` are rejected outright.
//!
//! There is no epsilon symbol: an empty production right-hand side marks a
//! nullable production, and `Grammar::nullables` carries the derived set.

use crate::display::Scoped;
use crate::types::{Map, Set};
use std::collections::VecDeque;
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalID(u16);

impl TerminalID {
    /// Reserved terminal for the end of input, written `$`.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonterminalID(u16);

impl NonterminalID {
    /// Reserved nonterminal for the augmented start symbol `S'`.
    pub const START: Self = Self(0);
    const OFFSET: u16 = 1;
}

impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::START => write!(f, "N#Start"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

/// A set of terminals backed by a bitset over the dense terminal ids.
#[derive(Debug, Default, Clone)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.index())
    }

    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.index())
    }

    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner.iter().map(|raw| TerminalID(raw as u16))
    }
}

impl PartialEq for TerminalSet {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for TerminalSet {}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.index()).collect(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionID(u16);

impl ProductionID {
    /// Reserved id of the augmented production `S' → start`.
    pub const ACCEPT: Self = Self(u16::MAX);
}

impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::ACCEPT => write!(f, "P#Accept"),
            _ => write!(f, "P#{:03}", self.0),
        }
    }
}

/// A production rule `left → right`. An empty `right` is the nullable
/// production `left → ε`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub left: NonterminalID,
    pub right: Vec<SymbolID>,
}

impl Production {
    pub fn display<'g>(&'g self, grammar: &'g Grammar) -> impl fmt::Display + 'g {
        Scoped::new(grammar, self)
    }
}

impl fmt::Display for Scoped<'_, Production> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Production { left, right } = self.value;
        write!(f, "{} ->", self.grammar.nonterminal_name(*left))?;
        if right.is_empty() {
            f.write_str(" ε")?;
        }
        for symbol in right {
            write!(f, " {}", self.grammar.symbol_name(*symbol))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("the grammar has no start symbol")]
    MissingStartSymbol,

    #[error("duplicate production for `{0}`")]
    DuplicateProduction(String),

    #[error("symbol name `{0}` is reserved")]
    ReservedSymbolName(String),

    #[error("symbol `{0}` is already declared with a different kind")]
    SymbolKindConflict(String),

    #[error("symbol names must not be empty")]
    EmptySymbolName,
}

/// The grammar definition used to derive the parser tables.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, String>,
    nonterminals: Map<NonterminalID, String>,
    productions: Map<ProductionID, Production>,
    start_symbol: NonterminalID,
    nullables: Set<NonterminalID>,
}

impl Grammar {
    /// Define a grammar using the specified function.
    ///
    /// On success the grammar is augmented with `S' → start` under
    /// [`ProductionID::ACCEPT`] and the nullable set is computed. If no
    /// start symbol was designated, the first declared nonterminal is used;
    /// a grammar with no nonterminals at all is rejected.
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start_symbol: None,
            next_terminal: TerminalID::OFFSET,
            next_nonterminal: NonterminalID::OFFSET,
            next_production: 0,
        };

        def.terminals.insert(TerminalID::EOI, "$".to_owned());
        def.nonterminals.insert(NonterminalID::START, "S'".to_owned());

        f(&mut def)?;

        let start_symbol = def
            .start_symbol
            .or_else(|| {
                def.nonterminals
                    .keys()
                    .find(|&&n| n != NonterminalID::START)
                    .copied()
            })
            .ok_or(GrammarError::MissingStartSymbol)?;

        def.productions.insert(
            ProductionID::ACCEPT,
            Production {
                left: NonterminalID::START,
                right: vec![SymbolID::N(start_symbol)],
            },
        );

        // Nullability by worklist: empty right-hand sides seed the set, and
        // each newly nullable symbol can discharge further productions whose
        // right-hand side has become all-nullable.
        let mut nullables: Set<NonterminalID> = Set::default();
        let mut pending: VecDeque<NonterminalID> = def
            .productions
            .values()
            .filter(|p| p.right.is_empty())
            .map(|p| p.left)
            .collect();
        while let Some(nullable) = pending.pop_front() {
            if !nullables.insert(nullable) {
                continue;
            }
            for p in def.productions.values() {
                if nullables.contains(&p.left) {
                    continue;
                }
                let discharged = p
                    .right
                    .iter()
                    .all(|s| matches!(s, SymbolID::N(n) if nullables.contains(n)));
                if discharged {
                    pending.push_back(p.left);
                }
            }
        }

        Ok(Self {
            terminals: def.terminals,
            nonterminals: def.nonterminals,
            productions: def.productions,
            start_symbol,
            nullables,
        })
    }

    pub fn terminals(&self) -> impl Iterator<Item = (TerminalID, &str)> + '_ {
        self.terminals.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalID, &str)> + '_ {
        self.nonterminals
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
    }

    pub fn productions(&self) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions.iter().map(|(id, p)| (*id, p))
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    pub fn is_nullable(&self, id: NonterminalID) -> bool {
        self.nullables.contains(&id)
    }

    pub fn nullables(&self) -> impl Iterator<Item = NonterminalID> + '_ {
        self.nullables.iter().copied()
    }

    pub fn terminal_name(&self, id: TerminalID) -> &str {
        &self.terminals[&id]
    }

    pub fn nonterminal_name(&self, id: NonterminalID) -> &str {
        &self.nonterminals[&id]
    }

    pub fn symbol_name(&self, id: SymbolID) -> &str {
        match id {
            SymbolID::T(t) => self.terminal_name(t),
            SymbolID::N(n) => self.nonterminal_name(n),
        }
    }

    pub fn terminal_by_name(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
    }

    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "terminals:")?;
        for (id, name) in self.terminals() {
            if id != TerminalID::EOI {
                write!(f, " {}", name)?;
            }
        }
        write!(f, "\nnonterminals:")?;
        for (id, name) in self.nonterminals() {
            if id != NonterminalID::START {
                write!(f, " {}", name)?;
            }
        }
        writeln!(
            f,
            "\nstart symbol: {}",
            self.nonterminal_name(self.start_symbol)
        )?;
        writeln!(f, "productions:")?;
        for (id, p) in self.productions() {
            writeln!(f, "  [{:?}] {}", id, p.display(self))?;
        }
        Ok(())
    }
}

/// The contextual values for building a [`Grammar`].
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, String>,
    nonterminals: Map<NonterminalID, String>,
    productions: Map<ProductionID, Production>,
    start_symbol: Option<NonterminalID>,
    next_terminal: u16,
    next_nonterminal: u16,
    next_production: u16,
}

impl GrammarDef {
    fn verify_name(&self, name: &str) -> Result<(), GrammarError> {
        if name.is_empty() {
            return Err(GrammarError::EmptySymbolName);
        }
        if matches!(name, "$" | "ε" | "S'") {
            return Err(GrammarError::ReservedSymbolName(name.to_owned()));
        }
        Ok(())
    }

    /// Declare a terminal symbol. Re-declaring the same name returns the
    /// existing id.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarError> {
        self.verify_name(name)?;
        if self.nonterminals.values().any(|n| n == name) {
            return Err(GrammarError::SymbolKindConflict(name.to_owned()));
        }
        if let Some(id) = self
            .terminals
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
        {
            return Ok(id);
        }

        let id = TerminalID(self.next_terminal);
        self.next_terminal += 1;
        self.terminals.insert(id, name.to_owned());
        Ok(id)
    }

    /// Declare a nonterminal symbol. Re-declaring the same name returns the
    /// existing id.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarError> {
        self.verify_name(name)?;
        if self.terminals.values().any(|n| n == name) {
            return Err(GrammarError::SymbolKindConflict(name.to_owned()));
        }
        if let Some(id) = self
            .nonterminals
            .iter()
            .find_map(|(id, n)| (n == name).then_some(*id))
        {
            return Ok(id);
        }

        let id = NonterminalID(self.next_nonterminal);
        self.next_nonterminal += 1;
        self.nonterminals.insert(id, name.to_owned());
        Ok(id)
    }

    /// Add a production rule. Pass an empty `right` for a nullable
    /// production.
    pub fn production<I>(&mut self, left: NonterminalID, right: I) -> Result<ProductionID, GrammarError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let right: Vec<SymbolID> = right.into_iter().collect();
        if self
            .productions
            .values()
            .any(|p| p.left == left && p.right == right)
        {
            return Err(GrammarError::DuplicateProduction(
                self.nonterminals[&left].clone(),
            ));
        }

        let id = ProductionID(self.next_production);
        self.next_production += 1;
        self.productions.insert(id, Production { left, right });
        Ok(id)
    }

    /// Designate the start symbol.
    pub fn start_symbol(&mut self, start: NonterminalID) {
        self.start_symbol.replace(start);
    }
}
