//! Chart storage shared by all parse states.
//!
//! Every fed token produces one `Step`. A step is frozen once built and
//! only referenced through `Rc`, so states derived from it can keep
//! pointing at its items and categories.

use crate::grammar::{FId, FunId, Production};
use crate::symbol::Token;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Synthetic category created while parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartCatId {
    pub(crate) step: u32,
    pub(crate) idx: u32,
}

impl ChartCatId {
    /// Input position at which the category was completed.
    pub fn position(self) -> usize {
        self.step as usize
    }
}

/// A category instance, either loaded with the grammar or built by the chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CatRef {
    Grammar(FId),
    Chart(ChartCatId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ItemSetRef {
    pub step: u32,
    pub idx: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ItemRef {
    pub step: u32,
    pub idx: u32,
}

/// Production of a synthetic category, over grammar or chart arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChartProduction {
    Apply {
        fun: FunId,
        args: SmallVec<[CatRef; 4]>,
    },
    Coerce(CatRef),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItemProd {
    Apply(FunId),
    /// Reads field `lin` of the single argument.
    Coerce,
}

/// Position inside one field of one production.
#[derive(Clone, Debug)]
pub(crate) struct Item {
    pub conts: ItemSetRef,
    pub prod: ItemProd,
    pub lin: usize,
    pub args: SmallVec<[CatRef; 4]>,
    /// Symbol within the sequence.
    pub seq: usize,
    /// Token within the current symbol.
    pub tok: usize,
    /// Variant of the current prefix symbol; 0 is the default form.
    pub alt: usize,
}

impl Item {
    pub fn from_grammar(conts: ItemSetRef, lin: usize, prod: &Production) -> Self {
        match prod {
            Production::Apply { fun, args } => Item::start(
                conts,
                ItemProd::Apply(*fun),
                lin,
                args.iter().map(|a| CatRef::Grammar(a.fid)).collect(),
            ),
            Production::Coerce(fid) => Item::start(
                conts,
                ItemProd::Coerce,
                lin,
                smallvec::smallvec![CatRef::Grammar(*fid)],
            ),
        }
    }

    pub fn from_chart(conts: ItemSetRef, lin: usize, prod: &ChartProduction) -> Self {
        match prod {
            ChartProduction::Apply { fun, args } => {
                Item::start(conts, ItemProd::Apply(*fun), lin, args.clone())
            }
            ChartProduction::Coerce(cat) => {
                Item::start(conts, ItemProd::Coerce, lin, smallvec::smallvec![*cat])
            }
        }
    }

    fn start(conts: ItemSetRef, prod: ItemProd, lin: usize, args: SmallVec<[CatRef; 4]>) -> Self {
        Item {
            conts,
            prod,
            lin,
            args,
            seq: 0,
            tok: 0,
            alt: 0,
        }
    }

    /// Move past the current symbol.
    pub fn advanced(mut self) -> Self {
        self.seq += 1;
        self.tok = 0;
        self.alt = 0;
        self
    }

    /// Production recorded in the category this item completes.
    pub fn production(&self) -> ChartProduction {
        match self.prod {
            ItemProd::Apply(fun) => ChartProduction::Apply {
                fun,
                args: self.args.clone(),
            },
            ItemProd::Coerce => ChartProduction::Coerce(self.args[0]),
        }
    }
}

/// Items waiting for one (category, field) predicted at one position.
#[derive(Clone, Debug)]
pub(crate) struct ItemSet {
    pub cat: CatRef,
    pub lin: usize,
    /// Completions also count as whole-input results.
    pub top: bool,
    pub waiting: Vec<ItemRef>,
}

/// Category completed by the items of one `ItemSet`.
#[derive(Clone, Debug)]
pub(crate) struct ChartCat {
    pub fid: FId,
    pub cat: CatRef,
    pub lin: usize,
    pub n_fields: usize,
    pub prods: Vec<ChartProduction>,
}

#[derive(Debug)]
pub(crate) struct Step {
    pub token: Option<Token>,
    pub first_fid: i32,
    pub items: Vec<Item>,
    pub item_sets: Vec<ItemSet>,
    pub cats: Vec<ChartCat>,
    /// Items waiting to scan each token.
    pub transitions: FxHashMap<Token, Vec<ItemRef>>,
    /// Top-level categories spanning the input up to here.
    pub completed: Vec<ChartCatId>,
}

impl Step {
    pub fn new(token: Option<Token>, first_fid: i32) -> Self {
        Step {
            token,
            first_fid,
            items: Vec::new(),
            item_sets: Vec::new(),
            cats: Vec::new(),
            transitions: FxHashMap::default(),
            completed: Vec::new(),
        }
    }

    /// Id the next step starts numbering its categories from.
    pub fn next_fid(&self) -> i32 {
        self.first_fid - self.cats.len() as i32
    }
}
