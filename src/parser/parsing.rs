//! Building one chart step: predict, scan, complete and combine.

use super::chart::{
    CatRef, ChartCat, ChartCatId, Item, ItemProd, ItemRef, ItemSet, ItemSetRef, Step,
};
use crate::grammar::{Concrete, FId, PrefixVariant, Symbol};
use crate::metrics::Metrics;
use crate::symbol::Token;
use crate::trace::trace;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::rc::Rc;

/// What an item needs next.
enum Next<'g> {
    Complete,
    Cat { arg: usize, lin: usize },
    /// Literal and variable symbols are not recognized.
    Stall,
    Tokens(&'g [Token]),
    Prefix(&'g PrefixVariant),
}

pub(crate) struct Parsing<'s, 'g> {
    concrete: &'g Concrete,
    metrics: &'s Metrics,
    history: &'s [Rc<Step>],
    index: u32,
    step: Step,
    conts_map: FxHashMap<(CatRef, usize), u32>,
    generated: FxHashMap<ItemSetRef, u32>,
    agenda: Vec<Item>,
}

impl<'s, 'g> Parsing<'s, 'g> {
    pub fn new(
        concrete: &'g Concrete,
        metrics: &'s Metrics,
        history: &'s [Rc<Step>],
        token: Option<Token>,
    ) -> Self {
        let first_fid = history
            .last()
            .map_or(FId::FIRST_SYNTHETIC, |s| s.next_fid());
        Parsing {
            concrete,
            metrics,
            history,
            index: history.len() as u32,
            step: Step::new(token, first_fid),
            conts_map: FxHashMap::default(),
            generated: FxHashMap::default(),
            agenda: Vec::new(),
        }
    }

    /// Predict field `lin` of every instance in `fids` as a top-level goal.
    pub fn start(&mut self, fids: &[FId], lin: usize) {
        for &fid in fids {
            let cat = CatRef::Grammar(fid);
            if self.conts_map.contains_key(&(cat, lin)) {
                continue;
            }
            let conts = self.new_item_set(cat, lin, true, Vec::new());
            self.expand(conts, cat, lin);
        }
    }

    /// Advance an item of the previous step over the fed token.
    pub fn scan(&mut self, mut item: Item) {
        let len = match self.next_symbol(&item) {
            Next::Tokens(tokens) => tokens.len(),
            Next::Prefix(pv) => pv.variant(item.alt).map_or(0, <[Token]>::len),
            _ => {
                debug_assert!(false, "scanned item is not waiting for a token");
                return;
            }
        };
        self.metrics.record_scan();
        item.tok += 1;
        if item.tok >= len {
            item = item.advanced();
        }
        self.agenda.push(item);
    }

    pub fn run(mut self) -> Step {
        while let Some(item) = self.agenda.pop() {
            self.process(item);
        }
        self.step
    }

    fn process(&mut self, item: Item) {
        self.metrics.record_item();
        match self.next_symbol(&item) {
            Next::Complete => self.complete(item),
            Next::Cat { arg, lin } => self.predict(item, arg, lin),
            Next::Stall => {}
            Next::Tokens(tokens) => match tokens.get(item.tok) {
                Some(&tok) => self.wait_for(tok, item),
                None => self.agenda.push(item.advanced()),
            },
            Next::Prefix(pv) => self.wait_for_prefix(pv, item),
        }
    }

    fn next_symbol(&self, item: &Item) -> Next<'g> {
        let fun = match item.prod {
            ItemProd::Coerce if item.seq == 0 => {
                return Next::Cat {
                    arg: 0,
                    lin: item.lin,
                }
            }
            ItemProd::Coerce => return Next::Complete,
            ItemProd::Apply(fun) => fun,
        };
        let Some(seq) = self.concrete.lin(fun, item.lin) else {
            debug_assert!(false, "field {} missing from function {:?}", item.lin, fun);
            return Next::Stall;
        };
        match seq.get(item.seq) {
            None => Next::Complete,
            Some(Symbol::Cat { arg, lin }) => Next::Cat {
                arg: *arg,
                lin: *lin,
            },
            Some(Symbol::Lit { .. }) | Some(Symbol::Var { .. }) => Next::Stall,
            Some(Symbol::Tokens(tokens)) => Next::Tokens(tokens),
            Some(Symbol::Prefix(pv)) => Next::Prefix(pv),
        }
    }

    fn store(&mut self, item: Item) -> ItemRef {
        let idx = self.step.items.len() as u32;
        self.step.items.push(item);
        ItemRef {
            step: self.index,
            idx,
        }
    }

    fn item(&self, r: ItemRef) -> &Item {
        if r.step == self.index {
            &self.step.items[r.idx as usize]
        } else {
            &self.history[r.step as usize].items[r.idx as usize]
        }
    }

    fn item_set(&self, r: ItemSetRef) -> &ItemSet {
        if r.step == self.index {
            &self.step.item_sets[r.idx as usize]
        } else {
            &self.history[r.step as usize].item_sets[r.idx as usize]
        }
    }

    fn chart_cat(&self, id: ChartCatId) -> &ChartCat {
        if id.step == self.index {
            &self.step.cats[id.idx as usize]
        } else {
            &self.history[id.step as usize].cats[id.idx as usize]
        }
    }

    fn n_fields(&self, cat: CatRef) -> usize {
        match cat {
            CatRef::Grammar(fid) => self.concrete.n_fields(fid).unwrap_or(0),
            CatRef::Chart(id) => self.chart_cat(id).n_fields,
        }
    }

    fn wait_for(&mut self, token: Token, item: Item) {
        let r = self.store(item);
        self.step.transitions.entry(token).or_default().push(r);
    }

    /// Register every distinct form of a prefix symbol under its first token.
    fn wait_for_prefix(&mut self, pv: &'g PrefixVariant, item: Item) {
        if item.tok > 0 {
            if let Some(&tok) = pv.variant(item.alt).and_then(|t| t.get(item.tok)) {
                self.wait_for(tok, item);
            }
            return;
        }
        let mut seen: SmallVec<[&[Token]; 4]> = SmallVec::new();
        for alt in 0..pv.n_variants() {
            let Some(tokens) = pv.variant(alt) else { continue };
            if seen.contains(&tokens) {
                continue;
            }
            seen.push(tokens);
            let mut branch = item.clone();
            branch.alt = alt;
            match tokens.first() {
                Some(&tok) => self.wait_for(tok, branch),
                None => self.agenda.push(branch.advanced()),
            }
        }
    }

    fn new_item_set(
        &mut self,
        cat: CatRef,
        lin: usize,
        top: bool,
        waiting: Vec<ItemRef>,
    ) -> ItemSetRef {
        let idx = self.step.item_sets.len() as u32;
        self.step.item_sets.push(ItemSet {
            cat,
            lin,
            top,
            waiting,
        });
        self.conts_map.insert((cat, lin), idx);
        ItemSetRef {
            step: self.index,
            idx,
        }
    }

    fn predict(&mut self, item: Item, arg: usize, lin: usize) {
        let Some(&cat) = item.args.get(arg) else {
            debug_assert!(false, "symbol refers to missing argument {}", arg);
            return;
        };
        let waiting = self.store(item);

        if let Some(&idx) = self.conts_map.get(&(cat, lin)) {
            self.step.item_sets[idx as usize].waiting.push(waiting);
            let conts = ItemSetRef {
                step: self.index,
                idx,
            };
            if let Some(&done) = self.generated.get(&conts) {
                self.combine(
                    waiting,
                    ChartCatId {
                        step: self.index,
                        idx: done,
                    },
                );
            }
            return;
        }

        let conts = self.new_item_set(cat, lin, false, vec![waiting]);
        self.expand(conts, cat, lin);
    }

    /// Start one item per production of `cat`.
    fn expand(&mut self, conts: ItemSetRef, cat: CatRef, lin: usize) {
        self.metrics.record_prediction();
        trace!(cat = ?cat, lin = lin, "predict");
        match cat {
            CatRef::Grammar(fid) => {
                let concrete = self.concrete;
                // The null set: nothing known, nothing to predict.
                let Some(prods) = concrete.productions(fid) else { return };
                for prod in prods {
                    self.agenda.push(Item::from_grammar(conts, lin, prod));
                }
            }
            CatRef::Chart(id) => {
                let items: Vec<Item> = self
                    .chart_cat(id)
                    .prods
                    .iter()
                    .map(|p| Item::from_chart(conts, lin, p))
                    .collect();
                self.agenda.extend(items);
            }
        }
    }

    fn complete(&mut self, item: Item) {
        self.metrics.record_completion();
        let prod = item.production();
        let conts = item.conts;

        if let Some(&idx) = self.generated.get(&conts) {
            let cat = &mut self.step.cats[idx as usize];
            if cat.prods.contains(&prod) {
                return;
            }
            cat.prods.push(prod.clone());
            let n_fields = cat.n_fields;
            let id = ChartCatId {
                step: self.index,
                idx,
            };
            trace!(fid = cat.fid.0, "pack");
            // Fields of the category already predicted here need the new production.
            for lin in 0..n_fields {
                if let Some(&set) = self.conts_map.get(&(CatRef::Chart(id), lin)) {
                    let set = ItemSetRef {
                        step: self.index,
                        idx: set,
                    };
                    self.agenda.push(Item::from_chart(set, lin, &prod));
                }
            }
            return;
        }

        let set = self.item_set(conts);
        let (cat, lin, top) = (set.cat, set.lin, set.top);
        let waiting = set.waiting.clone();
        let n_fields = self.n_fields(cat);

        let fid = FId(self.step.next_fid());
        let idx = self.step.cats.len() as u32;
        self.step.cats.push(ChartCat {
            fid,
            cat,
            lin,
            n_fields,
            prods: vec![prod],
        });
        self.generated.insert(conts, idx);
        self.metrics.record_synthetic_category();
        trace!(fid = fid.0, lin = lin, top = top, "complete");

        let id = ChartCatId {
            step: self.index,
            idx,
        };
        if top {
            self.step.completed.push(id);
        }
        for w in waiting {
            self.combine(w, id);
        }
    }

    /// Bind a completed category into the argument a waiting item asked for.
    fn combine(&mut self, waiting: ItemRef, done: ChartCatId) {
        let mut item = self.item(waiting).clone();
        let arg = match self.next_symbol(&item) {
            Next::Cat { arg, .. } => arg,
            _ => {
                debug_assert!(false, "waiting item is not at a category symbol");
                return;
            }
        };
        item.args[arg] = CatRef::Chart(done);
        self.metrics.record_combination();
        trace!(arg = arg, "combine");
        self.agenda.push(item.advanced());
    }
}
