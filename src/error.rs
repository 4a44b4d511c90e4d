//! Error types.
//!
//! Resolution failure is not an error; these cover malformed programs and terms.

use thiserror::Error;

use crate::symbols::SymbolId;

/// Why a raw term could not be stored as a clause or built on the heap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertError {
    /// The clause head is a variable, so there is no predicate to file it under.
    #[error("clause head is a variable")]
    VariableHead,
    /// A compound carries a different number of arguments than its functor's arity.
    #[error("functor {functor:?} has arity {expected} but {found} argument(s) were given")]
    ArityMismatch {
        /// The offending functor
        functor: SymbolId,
        /// Arity recorded in the symbol table
        expected: i32,
        /// Number of arguments present
        found: usize,
    },
    /// The term references an identifier unknown to the symbol table.
    #[error("unknown symbol {0:?}")]
    UnknownSymbol(SymbolId),
}

/// Syntax error in clause source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    /// 1-based line
    pub line: usize,
    /// 1-based column, in bytes
    pub column: usize,
    /// What went wrong
    pub message: String,
}

impl ParseError {
    /// Build an error positioned at byte `offset` of `source`.
    #[must_use]
    pub fn at(source: &[u8], offset: usize, message: impl Into<String>) -> Self {
        let before = &source[..offset.min(source.len())];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |newline| newline + 1);
        Self {
            line,
            column: before.len() - line_start + 1,
            message: message.into(),
        }
    }
}

/// Anything that can go wrong while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Source text did not parse
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),
    /// A parsed clause was rejected
    #[error("cannot assert clause: {0}")]
    Assert(#[from] AssertError),
}
