//! Functor interning.
//!
//! Every `(name, arity)` pair is mapped to a dense [`SymbolId`]. Each
//! identifier also owns one auxiliary slot, which the clause database uses
//! to hold the head of that predicate's clause chain.

use indexmap::{Equivalent, IndexMap};
use std::hash::Hash;

use crate::database::ClauseId;

/// Arity reserved for variable names produced by the parser.
///
/// A symbol with this arity never appears as a functor inside a stored
/// clause; renaming replaces every occurrence with a local index.
pub const VARIABLE_ARITY: i32 = -1;

/// Stable identifier of an interned `(name, arity)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Position of the symbol in its table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SymbolKey {
    name: String,
    arity: i32,
}

/// Borrowed form of [`SymbolKey`], hashes identically so lookups don't allocate.
#[derive(Hash)]
struct SymbolRef<'a> {
    name: &'a str,
    arity: i32,
}

impl Equivalent<SymbolKey> for SymbolRef<'_> {
    fn equivalent(&self, key: &SymbolKey) -> bool {
        self.arity == key.arity && self.name == key.name
    }
}

/// Interning table for functor and variable names.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Insertion-ordered, so the entry index is the symbol id.
    /// The value is the auxiliary slot (head of the clause chain).
    entries: IndexMap<SymbolKey, Option<ClauseId>>,
}

impl SymbolTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `(name, arity)`, returning the existing id when already present.
    pub fn intern(&mut self, name: &str, arity: i32) -> SymbolId {
        if let Some(id) = self.lookup(name, arity) {
            return id;
        }
        let (index, _) = self.entries.insert_full(
            SymbolKey {
                name: name.to_owned(),
                arity,
            },
            None,
        );
        SymbolId::from_index(index)
    }

    /// Look up `(name, arity)` without interning it.
    #[must_use]
    pub fn lookup(&self, name: &str, arity: i32) -> Option<SymbolId> {
        self.entries
            .get_index_of(&SymbolRef { name, arity })
            .map(SymbolId::from_index)
    }

    /// Name of an interned symbol.
    #[must_use]
    pub fn name_of(&self, id: SymbolId) -> Option<&str> {
        self.entries
            .get_index(id.index())
            .map(|(key, _)| key.name.as_str())
    }

    /// Arity of an interned symbol, [`VARIABLE_ARITY`] for variable names.
    #[must_use]
    pub fn arity_of(&self, id: SymbolId) -> Option<i32> {
        self.entries.get_index(id.index()).map(|(key, _)| key.arity)
    }

    /// Whether `id` names a parser variable.
    #[must_use]
    pub fn is_variable(&self, id: SymbolId) -> bool {
        self.arity_of(id) == Some(VARIABLE_ARITY)
    }

    /// Mutable access to the auxiliary slot of `id`.
    pub fn aux_slot(&mut self, id: SymbolId) -> Option<&mut Option<ClauseId>> {
        self.entries.get_index_mut(id.index()).map(|(_, slot)| slot)
    }

    /// Current content of the auxiliary slot of `id`.
    #[must_use]
    pub fn aux(&self, id: SymbolId) -> Option<ClauseId> {
        self.entries.get_index(id.index()).and_then(|(_, slot)| *slot)
    }

    /// Number of interned symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(id, name, arity)` in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &str, i32)> {
        self.entries
            .keys()
            .enumerate()
            .map(|(index, key)| (SymbolId::from_index(index), key.name.as_str(), key.arity))
    }
}
