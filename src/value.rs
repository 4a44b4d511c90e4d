//! Owned snapshots of heap terms.

use indexmap::IndexMap;
use std::fmt;

use crate::symbols::SymbolTable;
use crate::term::{Cell, CellId, Heap};

/// A term read back from the heap, detached from it.
///
/// Without an occurs check a binding can make a term contain itself; the
/// repeated occurrence reads back as [`Value::Cycle`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Unbound variable, identified by its heap cell
    Var(usize),
    /// Zero-arity functor
    Atom(String),
    /// Functor applied to arguments
    Compound {
        /// Functor name
        functor: String,
        /// Arguments in order
        args: Vec<Value>,
    },
    /// Back-reference to the enclosing compound at this heap cell
    Cycle(usize),
}

impl Value {
    /// Read the term at `cell`, following bindings.
    #[must_use]
    pub fn read(heap: &Heap, symbols: &SymbolTable, cell: CellId) -> Value {
        Value::read_within(heap, symbols, cell, &mut Vec::new())
    }

    /// `path` holds the compounds currently being read, outermost first.
    fn read_within(
        heap: &Heap,
        symbols: &SymbolTable,
        cell: CellId,
        path: &mut Vec<CellId>,
    ) -> Value {
        let cell = heap.rep(cell);
        match heap[cell].decode() {
            Cell::Functor(functor) => {
                let name = symbols.name_of(functor).unwrap_or("?").to_owned();
                let arity = symbols
                    .arity_of(functor)
                    .and_then(|arity| usize::try_from(arity).ok())
                    .unwrap_or(0);
                if arity == 0 {
                    return Value::Atom(name);
                }
                if path.contains(&cell) {
                    return Value::Cycle(cell.index());
                }

                path.push(cell);
                let args = (1..=arity)
                    .map(|i| Value::read_within(heap, symbols, cell.child(i), path))
                    .collect();
                path.pop();
                Value::Compound {
                    functor: name,
                    args,
                }
            }
            Cell::Unbound | Cell::Bound(_) => Value::Var(cell.index()),
        }
    }

    /// Shorthand for an atom value
    #[must_use]
    pub fn atom(name: &str) -> Self {
        Value::Atom(name.to_owned())
    }

    /// Whether the value contains no unbound variable.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        match self {
            Value::Var(_) => false,
            Value::Atom(_) | Value::Cycle(_) => true,
            Value::Compound { args, .. } => args.iter().all(Value::is_ground),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Var(cell) => write!(f, "_G{cell}"),
            Value::Atom(name) => f.write_str(name),
            Value::Cycle(_) => f.write_str("..."),
            Value::Compound { functor, args } => {
                write!(f, "{functor}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Variable bindings of the first solution of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Answer {
    /// Query variables, in order of first appearance
    pub bindings: IndexMap<String, Value>,
}

impl Answer {
    /// Binding of the named query variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Serialize the bindings as a JSON object.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.bindings)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            return f.write_str("true");
        }
        for (i, (name, value)) in self.bindings.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}
