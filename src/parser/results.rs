use super::chart::{CatRef, ChartCatId, ChartProduction};
use super::ParseState;
use crate::choice::Choice;
use crate::expr::{ExprId, ExprStore};
use crate::trace::trace;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Abstract trees of a parse state, in depth-first choice order.
///
/// Each tree is produced once even when the forest holds several
/// derivations of it. Arguments that were never realized in the parsed
/// field come out as metas. The enumeration state lives in this iterator,
/// not in the parse state.
pub struct ParseResults<'s, 'g> {
    state: &'s ParseState<'g>,
    exprs: &'s ExprStore,
    choice: Choice,
    seen: FxHashSet<ExprId>,
    visiting: SmallVec<[ChartCatId; 16]>,
    done: bool,
}

impl<'s, 'g> ParseResults<'s, 'g> {
    pub(crate) fn new(state: &'s ParseState<'g>, exprs: &'s ExprStore) -> Self {
        ParseResults {
            state,
            exprs,
            choice: Choice::new(),
            seen: FxHashSet::default(),
            visiting: SmallVec::new(),
            done: false,
        }
    }

    fn cat_to_expr(&mut self, cat: CatRef) -> Option<ExprId> {
        let id = match cat {
            CatRef::Grammar(_) => return Some(self.exprs.meta(0)),
            CatRef::Chart(id) => id,
        };
        if self.visiting.contains(&id) {
            trace!(step = id.step, idx = id.idx, "cyclic_derivation");
            return None;
        }
        let state = self.state;
        let step = state.step(id.step)?;
        let prods = &step.cats.get(id.idx as usize)?.prods;
        let prod = &prods[self.choice.next(prods.len())?];

        self.visiting.push(id);
        let expr = match prod {
            ChartProduction::Coerce(inner) => self.cat_to_expr(*inner),
            ChartProduction::Apply { fun, args } => {
                let concrete = state.parser().concrete();
                match concrete.fun(*fun) {
                    Some(cf) => {
                        let mut children = SmallVec::new();
                        let mut ok = true;
                        for &arg in args {
                            match self.cat_to_expr(arg) {
                                Some(child) => children.push(child),
                                None => {
                                    ok = false;
                                    break;
                                }
                            }
                        }
                        ok.then(|| self.exprs.app(cf.name, children))
                    }
                    None => None,
                }
            }
        };
        self.visiting.pop();
        expr
    }
}

impl<'s, 'g> Iterator for ParseResults<'s, 'g> {
    type Item = ExprId;

    fn next(&mut self) -> Option<ExprId> {
        let state = self.state;
        let completed = state.completed();
        while !self.done {
            let mark = self.choice.mark();
            let expr = match self.choice.next(completed.len()) {
                Some(i) => self.cat_to_expr(CatRef::Chart(completed[i])),
                None => None,
            };
            self.choice.reset(mark);
            if !self.choice.advance() {
                self.done = true;
            }
            match expr {
                Some(e) if self.seen.insert(e) => {
                    state.parser().metrics().record_parse_tree();
                    return Some(e);
                }
                _ => {}
            }
        }
        None
    }
}
