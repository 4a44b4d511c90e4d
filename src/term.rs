//! Tagged-word term store.
//!
//! A [`Word`] uses its low bit as the only discriminant:
//!
//! - odd: functor reference, `(word - 1) / 2` is a [`SymbolId`]
//! - even, non-zero: bound variable, refers to another heap cell
//! - zero: unbound variable
//!
//! A compound of arity `a` occupies `a + 1` consecutive cells of the
//! [`Heap`]: the functor word followed by one reference per argument.

use std::fmt;
use std::ops::Index;

use crate::symbols::SymbolId;

/// Index of a cell in the [`Heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    /// Position of the cell in the heap.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }

    /// Cell `offset` slots after this one; `child(i)` of a compound block
    /// is its `i`-th argument slot (1-based).
    #[must_use]
    pub fn child(self, offset: usize) -> CellId {
        CellId(self.0 + offset)
    }
}

/// One tagged machine word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word(usize);

impl Word {
    /// The unbound variable.
    pub const UNBOUND: Word = Word(0);

    /// Functor reference for `id`.
    #[must_use]
    pub fn functor(id: SymbolId) -> Word {
        Word((id.index() << 1) | 1)
    }

    /// Bound variable pointing at `cell`.
    #[must_use]
    pub fn reference(cell: CellId) -> Word {
        Word((cell.0 + 1) << 1)
    }

    /// Local variable `index` of a clause template.
    #[must_use]
    pub fn local(index: usize) -> Word {
        Word(index << 1)
    }

    /// Odd word.
    #[must_use]
    pub fn is_functor(self) -> bool {
        self.0 & 1 == 1
    }

    /// The zero word.
    #[must_use]
    pub fn is_unbound(self) -> bool {
        self.0 == 0
    }

    /// Symbol of a functor word.
    #[must_use]
    pub fn as_functor(self) -> Option<SymbolId> {
        self.is_functor().then(|| SymbolId::from_index(self.0 >> 1))
    }

    /// Target of a bound-variable word.
    #[must_use]
    pub fn as_reference(self) -> Option<CellId> {
        (!self.is_functor() && !self.is_unbound()).then(|| CellId((self.0 >> 1) - 1))
    }

    /// Local index of an even template word.
    #[must_use]
    pub fn as_local(self) -> Option<usize> {
        (!self.is_functor()).then_some(self.0 >> 1)
    }

    /// Decode a heap word.
    #[must_use]
    pub fn decode(self) -> Cell {
        if let Some(functor) = self.as_functor() {
            Cell::Functor(functor)
        } else if let Some(target) = self.as_reference() {
            Cell::Bound(target)
        } else {
            Cell::Unbound
        }
    }

    /// Raw bit pattern.
    #[must_use]
    pub fn bits(self) -> usize {
        self.0
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Cell::Unbound => write!(f, "Unbound"),
            Cell::Bound(cell) => write!(f, "Bound({})", cell.0),
            Cell::Functor(id) => write!(f, "Functor({})", id.index()),
        }
    }
}

/// Decoded view of a heap [`Word`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Variable with no binding
    Unbound,
    /// Variable bound to another cell
    Bound(CellId),
    /// Start of a compound or atom block
    Functor(SymbolId),
}

/// Position of the heap top, used to release allocations in bulk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HeapMark(usize);

/// Arena of term cells addressed by [`CellId`].
///
/// Cells are only appended; backtracking resets cell contents through the
/// trail, and whole queries are released with [`Heap::truncate`].
#[derive(Debug, Clone, Default)]
pub struct Heap {
    cells: Vec<Word>,
}

impl Heap {
    /// Create an empty heap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` cells
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Allocate `count` contiguous unbound cells and return the first.
    ///
    /// When `count` is zero the returned id is the current top and must not
    /// be dereferenced.
    pub fn alloc(&mut self, count: usize) -> CellId {
        let first = CellId(self.cells.len());
        self.cells.resize(self.cells.len() + count, Word::UNBOUND);
        first
    }

    /// Allocate a single cell holding `word`.
    pub fn push(&mut self, word: Word) -> CellId {
        let cell = CellId(self.cells.len());
        self.cells.push(word);
        cell
    }

    pub(crate) fn set(&mut self, cell: CellId, word: Word) {
        self.cells[cell.0] = word;
    }

    /// Follow bound-variable links from `cell` until an unbound cell or a
    /// functor word is reached.
    #[must_use]
    pub fn rep(&self, mut cell: CellId) -> CellId {
        while let Some(target) = self.cells[cell.0].as_reference() {
            cell = target;
        }
        cell
    }

    /// Number of allocated cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell has been allocated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells, in allocation order.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.cells
    }

    /// Current top of the heap.
    #[must_use]
    pub fn mark(&self) -> HeapMark {
        HeapMark(self.cells.len())
    }

    /// Drop every cell allocated after `mark`.
    pub fn truncate(&mut self, mark: HeapMark) {
        self.cells.truncate(mark.0);
    }
}

impl Index<CellId> for Heap {
    type Output = Word;

    fn index(&self, cell: CellId) -> &Word {
        &self.cells[cell.0]
    }
}
