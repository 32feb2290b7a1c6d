//! Search for concrete derivations of an abstract tree.
//!
//! One attempt walks the tree bottom-up. Each argument's instance is
//! inferred first, then possibly moved up the coercion lattice; the
//! resulting argument tuple selects the productions of the function.
//! Every decision goes through the shared `Choice`, so successive attempts
//! separated by `reset`/`advance` visit all derivations depth-first.
//!
//! Expressions are hash-consed, so one `ExprId` can occur at several
//! argument positions. Each occurrence is inferred on its own and makes
//! its own decisions.

use super::Linearizer;
use crate::choice::Choice;
use crate::expr::{Expr, ExprId, ExprStore, Literal};
use crate::grammar::{FId, FunId};
use crate::symbol::CId;
use crate::trace::{debug_span, trace};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::rc::Rc;

/// A concrete derivation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CncTree {
    App {
        /// Instance of the chosen production.
        fid: FId,
        fun: FunId,
        name: CId,
        args: Vec<Rc<CncTree>>,
    },
    Lit {
        fid: FId,
        value: Literal,
    },
    /// Stands for an unknown argument.
    Meta(u32),
}

impl CncTree {
    /// Instance of the root, None for metas.
    pub fn fid(&self) -> Option<FId> {
        match self {
            CncTree::App { fid, .. } | CncTree::Lit { fid, .. } => Some(*fid),
            CncTree::Meta(_) => None,
        }
    }
}

type Inferred = (Rc<CncTree>, Option<FId>);

impl<'g> Linearizer<'g> {
    /// Choose how far to move `start` up the coercion lattice.
    ///
    /// Staying put is always the first alternative. Returns the chosen
    /// instance and the number of steps taken, or None when the walk
    /// revisits an instance.
    pub(crate) fn walk_up(&self, start: FId, choice: &mut Choice) -> Option<(FId, usize)> {
        let mut fid = start;
        let mut path: SmallVec<[FId; 4]> = SmallVec::new();
        path.push(start);
        loop {
            let supers = self.index.supers(fid);
            match choice.next(supers.len() + 1)? {
                0 => return Some((fid, path.len() - 1)),
                i => {
                    fid = supers[i - 1];
                    if path.contains(&fid) {
                        trace!(fid = fid.0, "coercion_cycle");
                        return None;
                    }
                    path.push(fid);
                }
            }
        }
    }

    pub(crate) fn infer(
        &self,
        exprs: &ExprStore,
        expr: ExprId,
        choice: &mut Choice,
    ) -> Option<Inferred> {
        let inferred = match exprs.resolve(expr)? {
            Expr::Meta(id) => (Rc::new(CncTree::Meta(id)), None),
            Expr::Lit(value) => {
                let fid = match value {
                    Literal::Str(_) => FId::STRING,
                    Literal::Int(_) => FId::INT,
                    Literal::Float(_) => FId::FLOAT,
                };
                (Rc::new(CncTree::Lit { fid, value }), Some(fid))
            }
            Expr::App(fun, args) => {
                let decl = self.grammar.abstract_syntax().function(fun)?;
                if decl.arity() != args.len() {
                    trace!(
                        expected = decl.arity(),
                        found = args.len(),
                        "arity_mismatch"
                    );
                    return None;
                }

                let mut trees = Vec::with_capacity(args.len());
                let mut pattern: SmallVec<[Option<FId>; 4]> = SmallVec::new();
                for &arg in &args {
                    let (tree, fid) = self.infer(exprs, arg, choice)?;
                    let key = match fid {
                        Some(fid) => Some(self.walk_up(fid, choice)?.0),
                        None => None,
                    };
                    trees.push(tree);
                    pattern.push(key);
                }

                let candidates = self.index.matching(fun, &pattern);
                let entry = candidates[choice.next(candidates.len())?];
                let tree = CncTree::App {
                    fid: entry.fid,
                    fun: entry.fun,
                    name: fun,
                    args: trees,
                };
                (Rc::new(tree), Some(entry.fid))
            }
        };
        Some(inferred)
    }
}

/// Concrete derivations of one abstract tree, each yielded once.
pub struct Concretizations<'a, 'g> {
    lin: &'a Linearizer<'g>,
    exprs: &'a ExprStore,
    root: ExprId,
    choice: Choice,
    seen: FxHashSet<Rc<CncTree>>,
    done: bool,
}

impl<'a, 'g> Concretizations<'a, 'g> {
    pub(crate) fn new(lin: &'a Linearizer<'g>, exprs: &'a ExprStore, root: ExprId) -> Self {
        Concretizations {
            lin,
            exprs,
            root,
            choice: Choice::new(),
            seen: FxHashSet::default(),
            done: false,
        }
    }
}

impl<'a, 'g> Iterator for Concretizations<'a, 'g> {
    type Item = Rc<CncTree>;

    fn next(&mut self) -> Option<Rc<CncTree>> {
        let _span = debug_span!("concretize", root = self.root.raw()).entered();
        let metrics = &self.lin.metrics;
        while !self.done {
            let mark = self.choice.mark();
            metrics.record_concretize_attempt();
            let result = self.lin.infer(self.exprs, self.root, &mut self.choice);

            self.choice.reset(mark);
            metrics.record_backtrack();
            if !self.choice.advance() {
                self.done = true;
            }

            match result {
                Some((tree, _)) => {
                    if self.seen.insert(Rc::clone(&tree)) {
                        metrics.record_concrete_tree();
                        return Some(tree);
                    }
                }
                None => {
                    metrics.record_concretize_failure();
                    trace!(depth = self.choice.path().len(), "attempt_failed");
                }
            }
        }
        None
    }
}
