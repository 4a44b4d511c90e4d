//! Clause storage.
//!
//! Asserted terms are renamed so that each distinct variable becomes a small
//! local index, then stored as [`Template`]s and appended to the clause chain
//! of their predicate. The chain head lives in the predicate symbol's
//! auxiliary slot; each [`Clause`] links to the next one.

use indexmap::IndexSet;
use log::debug;
use smallvec::SmallVec;

use crate::error::AssertError;
use crate::symbols::{SymbolId, SymbolTable};
use crate::term::Word;

/// Name of the rule connective, recognized with arity 2.
pub const RULE_CONNECTIVE: &str = ":-";

/// Term tree as produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawTerm {
    /// A variable occurrence; all occurrences of one source variable within
    /// a clause carry the same identity.
    Var(SymbolId),
    /// A functor applied to its arguments (none for atoms).
    Compound(SymbolId, Vec<RawTerm>),
}

impl RawTerm {
    /// Zero-arity term
    #[must_use]
    pub fn atom(functor: SymbolId) -> Self {
        RawTerm::Compound(functor, Vec::new())
    }
}

/// Identifier of a stored clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseId(u32);

impl ClauseId {
    /// Position of the clause in the database.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// A clause head or body in prefix order.
///
/// Odd words are functors, followed by their arguments; even words are
/// local variables (`2 * index`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    words: SmallVec<[Word; 8]>,
}

impl Template {
    /// Encoded words.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

/// A fact or rule.
#[derive(Debug, Clone)]
pub struct Clause {
    vars: usize,
    head: Template,
    body: Option<Template>,
    next: Option<ClauseId>,
}

impl Clause {
    /// Number of distinct local variables.
    #[must_use]
    pub fn vars(&self) -> usize {
        self.vars
    }

    /// Head template.
    #[must_use]
    pub fn head(&self) -> &Template {
        &self.head
    }

    /// Body template; `None` for facts.
    #[must_use]
    pub fn body(&self) -> Option<&Template> {
        self.body.as_ref()
    }

    /// Whether the clause has no body.
    #[must_use]
    pub fn is_fact(&self) -> bool {
        self.body.is_none()
    }

    /// Next clause of the same predicate.
    #[must_use]
    pub fn next(&self) -> Option<ClauseId> {
        self.next
    }
}

/// Every asserted clause, chained per predicate.
#[derive(Debug, Clone, Default)]
pub struct ClauseDatabase {
    clauses: Vec<Clause>,
}

impl ClauseDatabase {
    /// Create an empty database
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the variables of `term`, store it, and append it to its
    /// predicate's chain.
    ///
    /// A term whose functor is `:-`/2 is a rule (head, body); anything else,
    /// including `:-` with another arity, is a fact.
    ///
    /// # Errors
    ///
    /// Fails if the head is a variable, or if `term` references unknown
    /// symbols or has argument counts that disagree with their arity.
    pub fn assert(
        &mut self,
        symbols: &mut SymbolTable,
        term: &RawTerm,
    ) -> Result<ClauseId, AssertError> {
        let (head, body) = split_rule(symbols, term);
        let RawTerm::Compound(predicate, _) = head else {
            return Err(AssertError::VariableHead);
        };

        let mut seen = IndexSet::new();
        let head = encode(symbols, head, &mut seen)?;
        let body = body
            .map(|body| encode(symbols, body, &mut seen))
            .transpose()?;

        let id = ClauseId::from_index(self.clauses.len());
        let first = symbols
            .aux_slot(*predicate)
            .ok_or(AssertError::UnknownSymbol(*predicate))?;
        let tail = match *first {
            Some(head) => Some(self.last_in_chain(head)),
            None => {
                *first = Some(id);
                None
            }
        };
        self.clauses.push(Clause {
            vars: seen.len(),
            head,
            body,
            next: None,
        });
        if let Some(tail) = tail {
            self.clauses[tail.index()].next = Some(id);
        }

        debug!(
            "asserted {} #{} for {}/{} with {} variable(s)",
            if self.clauses[id.index()].is_fact() { "fact" } else { "rule" },
            id.index(),
            symbols.name_of(*predicate).unwrap_or("?"),
            symbols.arity_of(*predicate).unwrap_or_default(),
            seen.len(),
        );
        Ok(id)
    }

    fn last_in_chain(&self, first: ClauseId) -> ClauseId {
        let mut last = first;
        while let Some(next) = self.clauses[last.index()].next {
            last = next;
        }
        last
    }

    /// Clause by id.
    #[must_use]
    pub fn get(&self, id: ClauseId) -> Option<&Clause> {
        self.clauses.get(id.index())
    }

    /// Clauses of `predicate` in assertion order.
    #[must_use]
    pub fn chain<'a>(&'a self, symbols: &SymbolTable, predicate: SymbolId) -> Chain<'a> {
        Chain {
            database: self,
            next: symbols.aux(predicate),
        }
    }

    /// Number of stored clauses
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether nothing has been asserted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Iterator over one predicate's clause chain.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    database: &'a ClauseDatabase,
    next: Option<ClauseId>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (ClauseId, &'a Clause);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let clause = self.database.get(id)?;
        self.next = clause.next;
        Some((id, clause))
    }
}

fn split_rule<'t>(symbols: &SymbolTable, term: &'t RawTerm) -> (&'t RawTerm, Option<&'t RawTerm>) {
    match term {
        RawTerm::Compound(functor, args)
            if args.len() == 2
                && symbols.arity_of(*functor) == Some(2)
                && symbols.name_of(*functor) == Some(RULE_CONNECTIVE) =>
        {
            (&args[0], Some(&args[1]))
        }
        _ => (term, None),
    }
}

/// Encode `term` in prefix order, numbering variables by first occurrence.
///
/// `seen` is shared between head and body so both use the same numbering.
fn encode(
    symbols: &SymbolTable,
    term: &RawTerm,
    seen: &mut IndexSet<SymbolId>,
) -> Result<Template, AssertError> {
    let mut words = SmallVec::new();
    encode_into(symbols, term, seen, &mut words)?;
    Ok(Template { words })
}

fn encode_into(
    symbols: &SymbolTable,
    term: &RawTerm,
    seen: &mut IndexSet<SymbolId>,
    words: &mut SmallVec<[Word; 8]>,
) -> Result<(), AssertError> {
    match term {
        RawTerm::Var(name) => {
            let (index, _) = seen.insert_full(*name);
            words.push(Word::local(index));
        }
        RawTerm::Compound(functor, args) => {
            let arity = symbols
                .arity_of(*functor)
                .ok_or(AssertError::UnknownSymbol(*functor))?;
            if usize::try_from(arity).ok() != Some(args.len()) {
                return Err(AssertError::ArityMismatch {
                    functor: *functor,
                    expected: arity,
                    found: args.len(),
                });
            }
            words.push(Word::functor(*functor));
            for arg in args {
                encode_into(symbols, arg, seen, words)?;
            }
        }
    }
    Ok(())
}
