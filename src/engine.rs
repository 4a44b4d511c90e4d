use indexmap::IndexMap;
use log::debug;

use crate::database::{Clause, ClauseDatabase, ClauseId, RawTerm};
use crate::error::AssertError;
use crate::machine::{Machine, Stats};
use crate::symbols::{SymbolId, SymbolTable};
use crate::term::{CellId, Heap, HeapMark, Word};
use crate::trail::Trail;
use crate::value::{Answer, Value};

/// Zero-arity predicate proved by [`Engine::execute_main`].
pub const MAIN_GOAL: &str = "main";

/// Tuning knobs for an [`Engine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fail calls nested deeper than this; `None` leaves recursion unbounded
    pub max_depth: Option<usize>,
    /// Initial heap capacity, in cells
    pub heap_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            heap_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// Default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the resolution depth
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Preallocate heap cells
    #[must_use]
    pub fn with_heap_capacity(mut self, cells: usize) -> Self {
        self.heap_capacity = cells;
        self
    }
}

/// A concrete term built on the heap from a [`RawTerm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    /// Root cell of the term
    pub root: CellId,
    /// One unbound cell per distinct variable, keyed by variable name
    pub vars: IndexMap<String, CellId>,
}

/// The logic engine: symbols, clauses, the term heap and the trail
#[derive(Debug)]
pub struct Engine {
    symbols: SymbolTable,
    database: ClauseDatabase,
    heap: Heap,
    trail: Trail,
    config: EngineConfig,
    stats: Stats,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create a new engine
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new engine with `config`
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            symbols: SymbolTable::new(),
            database: ClauseDatabase::new(),
            heap: Heap::with_capacity(config.heap_capacity),
            trail: Trail::new(),
            config,
            stats: Stats::default(),
        }
    }

    /// The symbol table
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The symbol table, for interning names of hand-built terms
    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// The clause database
    #[must_use]
    pub fn database(&self) -> &ClauseDatabase {
        &self.database
    }

    /// The term heap
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The binding trail
    #[must_use]
    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Counters accumulated since the engine was created
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Add a fact or rule to the database.
    ///
    /// # Errors
    ///
    /// See [`ClauseDatabase::assert`].
    pub fn assert(&mut self, term: &RawTerm) -> Result<ClauseId, AssertError> {
        self.database.assert(&mut self.symbols, term)
    }

    /// Clauses of `predicate` in trial order
    pub fn clauses(&self, predicate: SymbolId) -> impl Iterator<Item = &Clause> {
        self.database
            .chain(&self.symbols, predicate)
            .map(|(_, clause)| clause)
    }

    /// Parse `source` completely, then assert each clause in order.
    /// Returns the number of clauses asserted.
    ///
    /// # Errors
    ///
    /// A syntax error asserts nothing; an assertion error stops at the
    /// offending clause.
    #[cfg(feature = "parsing")]
    pub fn load(&mut self, source: &[u8]) -> Result<usize, crate::error::Error> {
        let terms = crate::parser::parse_program(source, &mut self.symbols)?;
        for term in &terms {
            self.assert(term)?;
        }
        debug!("loaded {} clause(s)", terms.len());
        Ok(terms.len())
    }

    /// [`Engine::load`] for program text
    ///
    /// # Errors
    ///
    /// See [`Engine::load`].
    #[cfg(feature = "parsing")]
    pub fn consult(&mut self, text: &str) -> Result<usize, crate::error::Error> {
        self.load(text.as_bytes())
    }

    /// Parse a goal such as `parent(tom, X)`.
    ///
    /// # Errors
    ///
    /// Returns the syntax error, if any.
    #[cfg(feature = "parsing")]
    pub fn parse_goal(&mut self, text: &str) -> Result<RawTerm, crate::error::ParseError> {
        crate::parser::parse_term(text.as_bytes(), &mut self.symbols)
    }

    /// Materialize `term` on the heap; every distinct variable becomes one
    /// unbound cell.
    ///
    /// # Errors
    ///
    /// Fails on unknown symbols or argument counts that disagree with arity.
    pub fn build(&mut self, term: &RawTerm) -> Result<Goal, AssertError> {
        let mut vars = IndexMap::new();
        let root = self.build_at(term, &mut vars)?;
        let vars = vars
            .into_iter()
            .map(|(id, cell)| (self.symbols.name_of(id).unwrap_or("_").to_owned(), cell))
            .collect();
        Ok(Goal { root, vars })
    }

    fn build_at(
        &mut self,
        term: &RawTerm,
        vars: &mut IndexMap<SymbolId, CellId>,
    ) -> Result<CellId, AssertError> {
        match term {
            RawTerm::Var(name) => Ok(*vars.entry(*name).or_insert_with(|| self.heap.alloc(1))),
            RawTerm::Compound(functor, args) => {
                let arity = self
                    .symbols
                    .arity_of(*functor)
                    .ok_or(AssertError::UnknownSymbol(*functor))?;
                if usize::try_from(arity).ok() != Some(args.len()) {
                    return Err(AssertError::ArityMismatch {
                        functor: *functor,
                        expected: arity,
                        found: args.len(),
                    });
                }
                let block = self.heap.alloc(args.len() + 1);
                self.heap.set(block, Word::functor(*functor));
                for (i, arg) in args.iter().enumerate() {
                    let child = self.build_at(arg, vars)?;
                    self.heap.set(block.child(i + 1), Word::reference(child));
                }
                Ok(block)
            }
        }
    }

    fn machine(&mut self) -> Machine<'_> {
        Machine {
            symbols: &self.symbols,
            database: &self.database,
            heap: &mut self.heap,
            trail: &mut self.trail,
            stats: &mut self.stats,
            max_depth: self.config.max_depth,
        }
    }

    /// Prove the term at `call`.
    ///
    /// Bindings of a successful proof stay in place; on failure the heap is
    /// restored.
    pub fn execute(&mut self, call: CellId) -> bool {
        self.machine().execute(call)
    }

    /// Unify the terms at `a` and `b`, trailing every binding.
    ///
    /// On failure the bindings made so far are kept; undo them with
    /// [`Engine::undo_bindings`].
    pub fn unify(&mut self, a: CellId, b: CellId) -> bool {
        self.machine().unify(a, b)
    }

    /// Open a choice point on the trail
    pub fn insert_choicepoint(&mut self) {
        self.trail.insert_choicepoint();
    }

    /// Undo every binding since the latest choice point and drop it
    pub fn undo_bindings(&mut self) -> usize {
        self.trail.undo_bindings(&mut self.heap)
    }

    /// Read back the term at `cell`
    #[must_use]
    pub fn read(&self, cell: CellId) -> Value {
        Value::read(&self.heap, &self.symbols, cell)
    }

    /// Prove `main`, then release everything the proof allocated.
    pub fn execute_main(&mut self) -> bool {
        let main = self.symbols.intern(MAIN_GOAL, 0);
        let (heap_mark, trail_len) = (self.heap.mark(), self.trail.len());
        let call = self.heap.push(Word::functor(main));
        let proved = self.execute(call);
        debug!("{MAIN_GOAL} {}", if proved { "succeeded" } else { "failed" });
        self.release(heap_mark, trail_len);
        proved
    }

    /// Prove `goal` and return the bindings of its first solution.
    ///
    /// Heap and trail usage of the query is released before returning.
    ///
    /// # Errors
    ///
    /// See [`Engine::build`].
    pub fn query(&mut self, goal: &RawTerm) -> Result<Option<Answer>, AssertError> {
        let (heap_mark, trail_len) = (self.heap.mark(), self.trail.len());
        let answer = self.build(goal).map(|goal| {
            self.execute(goal.root).then(|| Answer {
                bindings: goal
                    .vars
                    .into_iter()
                    .map(|(name, cell)| (name, self.read(cell)))
                    .collect(),
            })
        });
        self.release(heap_mark, trail_len);
        answer
    }

    /// Whether `goal` is provable
    ///
    /// # Errors
    ///
    /// See [`Engine::build`].
    pub fn ask(&mut self, goal: &RawTerm) -> Result<bool, AssertError> {
        self.query(goal).map(|answer| answer.is_some())
    }

    /// Drop every heap cell and trail entry.
    pub fn reset(&mut self) {
        self.heap.truncate(HeapMark::default());
        self.trail.clear();
    }

    fn release(&mut self, heap_mark: HeapMark, trail_len: usize) {
        self.heap.truncate(heap_mark);
        self.trail.truncate(trail_len);
    }
}
