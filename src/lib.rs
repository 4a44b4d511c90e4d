//! # Picolog
//!
//! A tiny logic programming engine: Horn clauses, depth-first SLD
//! resolution and destructive unification over a flat heap of tagged words.
//!
//! ## Features
//!
//! - Facts and rules (`head :- body`) with renamed clause variables
//! - Chronological backtracking through a binding trail
//! - First-solution queries with variable read-back
//! - Optional clause syntax (`parsing`) and JSON answers (`serde`)
//!
//! ## Example
//!
//! ```rust
//! use picolog::Engine;
//!
//! let mut engine = Engine::new();
//! engine.consult("parent(tom, bob). main :- parent(tom, bob).")?;
//! assert!(engine.execute_main());
//!
//! let goal = engine.parse_goal("parent(tom, X)")?;
//! let answer = engine.query(&goal)?.expect("tom has a child");
//! assert_eq!(answer.to_string(), "X = bob");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Clause storage and predicate chains.
pub mod database;
/// Engine facade.
pub mod engine;
/// Error types.
pub mod error;
mod machine;
/// Clause and goal syntax.
#[cfg(feature = "parsing")]
pub mod parser;
/// Interned functor and variable names.
pub mod symbols;
/// Tagged words and the term heap.
pub mod term;
/// Binding trail.
pub mod trail;
/// Read-back of heap terms.
pub mod value;

pub use database::{Clause, ClauseDatabase, ClauseId, RawTerm, RULE_CONNECTIVE};
pub use engine::{Engine, EngineConfig, Goal, MAIN_GOAL};
pub use error::{AssertError, Error, ParseError};
pub use machine::Stats;
pub use symbols::{SymbolId, SymbolTable, VARIABLE_ARITY};
pub use term::{Cell, CellId, Heap, HeapMark, Word};
pub use trail::Trail;
pub use value::{Answer, Value};
