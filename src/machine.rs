//! Unification, head matching and SLD resolution over the [`Heap`].

use log::{debug, trace, warn};

use crate::database::ClauseDatabase;
use crate::symbols::{SymbolId, SymbolTable};
use crate::term::{CellId, Heap, HeapMark, Word};
use crate::trail::Trail;

/// Counters collected while resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Goals executed, the top-level goal included
    pub calls: u64,
    /// Clause heads tried against a call
    pub clause_trials: u64,
    /// Clause trials that were undone
    pub backtracks: u64,
    /// Cells destructively bound (and trailed)
    pub bindings: u64,
}

/// Borrowed view of an engine for the duration of one resolution.
pub(crate) struct Machine<'a> {
    pub(crate) symbols: &'a SymbolTable,
    pub(crate) database: &'a ClauseDatabase,
    pub(crate) heap: &'a mut Heap,
    pub(crate) trail: &'a mut Trail,
    pub(crate) stats: &'a mut Stats,
    pub(crate) max_depth: Option<usize>,
}

impl Machine<'_> {
    fn arity(&self, functor: SymbolId) -> usize {
        self.symbols
            .arity_of(functor)
            .and_then(|arity| usize::try_from(arity).ok())
            .unwrap_or(0)
    }

    fn bind(&mut self, var: CellId, target: CellId) {
        self.heap.set(var, Word::reference(target));
        self.trail.record(var);
        self.stats.bindings += 1;
    }

    /// Make the terms at `a` and `b` equal, binding unbound cells as needed.
    ///
    /// Bindings made before a failure are left for the caller to undo.
    /// Two distinct unbound cells hold the same (zero) word and unify without
    /// being linked.
    pub(crate) fn unify(&mut self, a: CellId, b: CellId) -> bool {
        self.unify_within(a, b, &mut Vec::new())
    }

    /// `pending` holds the compound pairs currently being unified; meeting
    /// one again means a cyclic term, which agrees with itself there.
    fn unify_within(
        &mut self,
        a: CellId,
        b: CellId,
        pending: &mut Vec<(CellId, CellId)>,
    ) -> bool {
        let a = self.heap.rep(a);
        let b = self.heap.rep(b);
        if a == b {
            return true;
        }
        let (wa, wb) = (self.heap[a], self.heap[b]);

        if wa == wb {
            let arity = wa.as_functor().map_or(0, |functor| self.arity(functor));
            if arity == 0 || pending.contains(&(a, b)) {
                return true;
            }
            pending.push((a, b));
            let unified = (1..=arity).all(|i| self.unify_within(a.child(i), b.child(i), pending));
            pending.pop();
            unified
        } else if wa.is_unbound() {
            self.bind(a, b);
            true
        } else if wb.is_unbound() {
            self.bind(b, a);
            true
        } else {
            false
        }
    }

    /// Build a concrete copy of `template`; local variables become references
    /// to the matching `frame` slots.
    pub(crate) fn copy_template(&mut self, template: &[Word], frame: CellId) -> CellId {
        self.instantiate(template, 0, frame).0
    }

    /// Returns the copy and the position just past the copied subterm.
    fn instantiate(&mut self, template: &[Word], pos: usize, frame: CellId) -> (CellId, usize) {
        let word = template[pos];
        let Some(functor) = word.as_functor() else {
            // frame slots are cells themselves, later bindings show through
            let local = word.as_local().unwrap_or_default();
            return (frame.child(local), pos + 1);
        };

        let arity = self.arity(functor);
        let block = self.heap.alloc(arity + 1);
        self.heap.set(block, word);
        let mut next = pos + 1;
        for i in 1..=arity {
            let (child, after) = self.instantiate(template, next, frame);
            self.heap.set(block.child(i), Word::reference(child));
            next = after;
        }
        (block, next)
    }

    /// Make `term` an instance of `template`, recording local variables in
    /// `frame`.
    pub(crate) fn match_head(&mut self, template: &[Word], term: CellId, frame: CellId) -> bool {
        self.match_at(template, 0, term, frame).is_some()
    }

    /// Returns the position just past the matched subtemplate.
    fn match_at(
        &mut self,
        template: &[Word],
        pos: usize,
        term: CellId,
        frame: CellId,
    ) -> Option<usize> {
        let term = self.heap.rep(term);
        let word = template[pos];

        let Some(functor) = word.as_functor() else {
            let slot = frame.child(word.as_local().unwrap_or_default());
            return match self.heap[slot].as_reference() {
                Some(bound) => self.unify(bound, term).then_some(pos + 1),
                // reached the slot through one of its own copies
                None if term == slot => Some(pos + 1),
                None => {
                    // establishing the frame, not mutating shared structure
                    self.heap.set(slot, Word::reference(term));
                    Some(pos + 1)
                }
            };
        };

        let found = self.heap[term];
        if found == word {
            let mut next = pos + 1;
            for i in 1..=self.arity(functor) {
                next = self.match_at(template, next, term.child(i), frame)?;
            }
            Some(next)
        } else if found.is_unbound() {
            let (copy, next) = self.instantiate(template, pos, frame);
            self.bind(term, copy);
            Some(next)
        } else {
            None
        }
    }

    /// Prove `call`; on failure every binding made on the way is undone.
    pub(crate) fn execute(&mut self, call: CellId) -> bool {
        self.solve(call, 0)
    }

    fn solve(&mut self, call: CellId, depth: usize) -> bool {
        if let Some(max) = self.max_depth.filter(|&max| depth > max) {
            warn!("depth limit of {max} reached, failing branch");
            return false;
        }
        self.stats.calls += 1;

        let call = self.heap.rep(call);
        let Some(predicate) = self.heap[call].as_functor() else {
            debug!("call to an unbound variable fails");
            return false;
        };

        let database = self.database;
        for (id, clause) in database.chain(self.symbols, predicate) {
            trace!(
                "depth {depth}: trying clause #{} for {}/{}",
                id.index(),
                self.symbols.name_of(predicate).unwrap_or("?"),
                self.arity(predicate),
            );
            self.stats.clause_trials += 1;

            let mark = self.heap.mark();
            let frame = self.heap.alloc(clause.vars());
            self.trail.insert_choicepoint();
            if !self.match_head(clause.head().words(), call, frame) {
                self.backtrack(mark);
                continue;
            }

            let Some(body) = clause.body() else {
                return true;
            };
            let goal = self.copy_template(body.words(), frame);
            if self.solve(goal, depth + 1) {
                return true;
            }
            self.backtrack(mark);
        }

        debug!(
            "no clause of {}/{} succeeded",
            self.symbols.name_of(predicate).unwrap_or("?"),
            self.arity(predicate),
        );
        false
    }

    /// Undo the current trial and free everything it allocated.
    fn backtrack(&mut self, mark: HeapMark) {
        self.trail.undo_bindings(self.heap);
        self.heap.truncate(mark);
        self.stats.backtracks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Fixture {
        symbols: SymbolTable,
        database: ClauseDatabase,
        heap: Heap,
        trail: Trail,
        stats: Stats,
    }

    impl Fixture {
        fn machine(&mut self) -> Machine<'_> {
            Machine {
                symbols: &self.symbols,
                database: &self.database,
                heap: &mut self.heap,
                trail: &mut self.trail,
                stats: &mut self.stats,
                max_depth: None,
            }
        }

        fn atom(&mut self, name: &str) -> CellId {
            let id = self.symbols.intern(name, 0);
            self.heap.push(Word::functor(id))
        }

        fn var(&mut self) -> CellId {
            self.heap.alloc(1)
        }

        fn compound(&mut self, name: &str, args: &[CellId]) -> CellId {
            let id = self.symbols.intern(name, i32::try_from(args.len()).unwrap());
            let block = self.heap.alloc(args.len() + 1);
            self.heap.set(block, Word::functor(id));
            for (i, arg) in args.iter().enumerate() {
                self.heap.set(block.child(i + 1), Word::reference(*arg));
            }
            block
        }

        fn functor(&self, name: &str, arity: i32) -> Word {
            Word::functor(self.symbols.lookup(name, arity).unwrap())
        }
    }

    #[test]
    fn test_unify_binds_variable_to_atom() {
        let mut fx = Fixture::default();
        let a = fx.atom("a");
        let x = fx.var();

        assert!(fx.machine().unify(x, a));
        assert_eq!(fx.heap.rep(x), a);
        assert_eq!(fx.trail.len(), 1);
        assert_eq!(fx.stats.bindings, 1);
    }

    #[test]
    fn test_unify_binds_whichever_side_is_unbound() {
        let mut fx = Fixture::default();
        let a = fx.atom("a");
        let x = fx.var();

        assert!(fx.machine().unify(a, x));
        assert_eq!(fx.heap.rep(x), a);
        assert_eq!(fx.heap[a], fx.functor("a", 0));
    }

    #[test]
    fn test_unify_distinct_atoms_fails() {
        let mut fx = Fixture::default();
        let a = fx.atom("a");
        let b = fx.atom("b");
        assert!(!fx.machine().unify(a, b));
        assert!(fx.trail.is_empty());
    }

    #[test]
    fn test_unify_compounds_argument_wise() {
        let mut fx = Fixture::default();
        let x = fx.var();
        let b = fx.atom("b");
        let left = fx.compound("f", &[x, b]);
        let a = fx.atom("a");
        let y = fx.var();
        let right = fx.compound("f", &[a, y]);

        assert!(fx.machine().unify(left, right));
        assert_eq!(fx.heap.rep(x), a);
        assert_eq!(fx.heap.rep(y), b);
    }

    #[test]
    fn test_unify_same_name_different_arity_fails() {
        let mut fx = Fixture::default();
        let a = fx.atom("a");
        let unary = fx.compound("f", &[a]);
        let binary = fx.compound("f", &[a, a]);
        assert!(!fx.machine().unify(unary, binary));
    }

    #[test]
    fn test_unify_leaves_partial_bindings_on_failure() {
        let mut fx = Fixture::default();
        let x = fx.var();
        let b = fx.atom("b");
        let left = fx.compound("g", &[x, b]);
        let a = fx.atom("a");
        let c = fx.atom("c");
        let right = fx.compound("g", &[a, c]);

        fx.trail.insert_choicepoint();
        assert!(!fx.machine().unify(left, right));
        assert_eq!(fx.heap.rep(x), a);

        fx.trail.undo_bindings(&mut fx.heap);
        assert!(fx.heap[x].is_unbound());
    }

    #[test]
    fn test_unify_distinct_unbound_variables_stay_unlinked() {
        let mut fx = Fixture::default();
        let x = fx.var();
        let y = fx.var();

        assert!(fx.machine().unify(x, y));
        assert!(fx.trail.is_empty());
        assert!(fx.heap[x].is_unbound());
        assert!(fx.heap[y].is_unbound());

        // binding one later does not reach the other
        let a = fx.atom("a");
        assert!(fx.machine().unify(x, a));
        assert!(fx.heap[y].is_unbound());
    }

    #[test]
    fn test_unify_follows_existing_bindings() {
        let mut fx = Fixture::default();
        let a = fx.atom("a");
        let x = fx.var();
        let y = fx.var();
        assert!(fx.machine().unify(x, a));
        assert!(fx.machine().unify(y, x));
        assert_eq!(fx.heap.rep(y), a);

        let b = fx.atom("b");
        assert!(!fx.machine().unify(y, b));
    }

    #[test]
    fn test_unify_separate_cyclic_terms_terminates() {
        let mut fx = Fixture::default();
        // X = f(X) and Y = f(Y), built by binding through unify
        let x = fx.var();
        let fx_term = fx.compound("f", &[x]);
        let y = fx.var();
        let fy_term = fx.compound("f", &[y]);
        assert!(fx.machine().unify(x, fx_term));
        assert!(fx.machine().unify(y, fy_term));
        assert_eq!(fx.trail.len(), 2);

        assert!(fx.machine().unify(x, y));
        assert_eq!(fx.trail.len(), 2);

        let a = fx.atom("a");
        let ga = fx.compound("f", &[a]);
        assert!(!fx.machine().unify(x, ga));
    }

    #[test]
    fn test_copy_template_shares_frame_slots() {
        let mut fx = Fixture::default();
        let g = fx.symbols.intern("g", 2);
        let template = [Word::functor(g), Word::local(0), Word::local(0)];
        let frame = fx.heap.alloc(1);

        let copy = fx.machine().copy_template(&template, frame);
        assert_eq!(fx.heap[copy], Word::functor(g));
        assert_eq!(fx.heap.rep(copy.child(1)), frame);
        assert_eq!(fx.heap.rep(copy.child(2)), frame);

        let a = fx.atom("a");
        fx.heap.set(frame, Word::reference(a));
        assert_eq!(fx.heap.rep(copy.child(1)), a);
        assert_eq!(fx.heap.rep(copy.child(2)), a);
    }

    #[test]
    fn test_match_records_frame_without_trailing() {
        let mut fx = Fixture::default();
        let p = fx.symbols.intern("p", 1);
        let template = [Word::functor(p), Word::local(0)];
        let a = fx.atom("a");
        let call = fx.compound("p", &[a]);
        let frame = fx.heap.alloc(1);

        assert!(fx.machine().match_head(&template, call, frame));
        assert_eq!(fx.heap.rep(frame), a);
        assert!(fx.trail.is_empty());
    }

    #[test]
    fn test_match_repeated_variable_unifies() {
        let mut fx = Fixture::default();
        let p = fx.symbols.intern("p", 2);
        let template = [Word::functor(p), Word::local(0), Word::local(0)];

        let a = fx.atom("a");
        let b = fx.atom("b");
        let call = fx.compound("p", &[a, b]);
        let frame = fx.heap.alloc(1);
        fx.trail.insert_choicepoint();
        assert!(!fx.machine().match_head(&template, call, frame));
        fx.trail.undo_bindings(&mut fx.heap);

        let x = fx.var();
        let call = fx.compound("p", &[a, x]);
        let frame = fx.heap.alloc(1);
        assert!(fx.machine().match_head(&template, call, frame));
        assert_eq!(fx.heap.rep(x), a);
    }

    #[test]
    fn test_match_instantiates_template_into_unbound_call_cell() {
        let mut fx = Fixture::default();
        let parent = fx.symbols.intern("parent", 2);
        let tom = fx.symbols.intern("tom", 0);
        let bob = fx.symbols.intern("bob", 0);
        let template = [Word::functor(parent), Word::functor(tom), Word::functor(bob)];

        let tom_cell = fx.heap.push(Word::functor(tom));
        let x = fx.var();
        let call = fx.compound("parent", &[tom_cell, x]);

        let frame = fx.heap.alloc(0);
        assert!(fx.machine().match_head(&template, call, frame));
        assert_eq!(fx.heap[fx.heap.rep(x)], Word::functor(bob));
        assert_eq!(fx.trail.len(), 1);
    }

    #[test]
    fn test_failed_match_is_fully_undone() {
        let mut fx = Fixture::default();
        let p = fx.symbols.intern("p", 2);
        let f = fx.symbols.intern("f", 1);
        let b = fx.symbols.intern("b", 0);
        // p(f(V0), b) against p(X, c)
        let template = [
            Word::functor(p),
            Word::functor(f),
            Word::local(0),
            Word::functor(b),
        ];
        let x = fx.var();
        let c = fx.atom("c");
        let call = fx.compound("p", &[x, c]);
        let frame = fx.heap.alloc(1);

        fx.trail.insert_choicepoint();
        assert!(!fx.machine().match_head(&template, call, frame));
        fx.trail.undo_bindings(&mut fx.heap);
        assert!(fx.heap[x].is_unbound());
        assert!(fx.trail.is_empty());
    }

    #[test]
    fn test_match_reaching_own_frame_slot_does_not_self_bind() {
        let mut fx = Fixture::default();
        let p = fx.symbols.intern("p", 2);
        let f = fx.symbols.intern("f", 1);
        // p(f(V0), f(V0)) against p(X, X)
        let template = [
            Word::functor(p),
            Word::functor(f),
            Word::local(0),
            Word::functor(f),
            Word::local(0),
        ];
        let x = fx.var();
        let call = fx.compound("p", &[x, x]);
        let frame = fx.heap.alloc(1);

        assert!(fx.machine().match_head(&template, call, frame));
        assert!(fx.heap[frame].is_unbound());
        assert_eq!(fx.heap[fx.heap.rep(x)], Word::functor(f));
    }

    #[test]
    fn test_execute_without_clauses_fails() {
        let mut fx = Fixture::default();
        let goal = fx.atom("missing");
        assert!(!fx.machine().execute(goal));
        assert_eq!(fx.stats.calls, 1);
        assert_eq!(fx.stats.clause_trials, 0);
    }

    #[test]
    fn test_execute_unbound_call_fails() {
        let mut fx = Fixture::default();
        let goal = fx.var();
        assert!(!fx.machine().execute(goal));
    }
}
