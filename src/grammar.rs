//! Grammar model: one abstract syntax and its concrete syntaxes.
//!
//! A grammar is immutable once built. Concrete category instances are
//! addressed by `FId`; non-negative ids index the instance arena of their
//! concrete syntax, the four built-in literal categories use fixed negative
//! ids, and the chart parser hands out synthetic ids below those.

use crate::symbol::{CId, SymbolStore, Token};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Handle of a concrete category instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FId(pub i32);

impl FId {
    /// Built-in category of string literals.
    pub const STRING: FId = FId(-1);
    /// Built-in category of integer literals.
    pub const INT: FId = FId(-2);
    /// Built-in category of float literals.
    pub const FLOAT: FId = FId(-3);
    /// Built-in category of bound variables.
    pub const VAR: FId = FId(-4);
    /// First id handed out to synthetic chart categories; later ones decrease.
    pub const FIRST_SYNTHETIC: i32 = -5;

    pub fn is_literal(self) -> bool {
        (FId::VAR.0..=FId::STRING.0).contains(&self.0)
    }

    /// Position in the instance arena, for grammar-loaded instances.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl std::fmt::Display for FId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Index of a concrete function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunId(pub u32);

/// Index of a symbol sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeqId(pub u32);

/// One alternative of a prefix-dependent token choice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alternative {
    pub tokens: Vec<Token>,
    /// The alternative applies when the following token starts with one of these.
    pub prefixes: Vec<String>,
}

/// Tokens chosen by the leading characters of whatever follows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixVariant {
    pub default: Vec<Token>,
    pub alts: Vec<Alternative>,
}

impl PrefixVariant {
    /// Token sequence for a variant index: 0 is the default, `i + 1` is `alts[i]`.
    pub fn variant(&self, alt: usize) -> Option<&[Token]> {
        match alt {
            0 => Some(&self.default),
            i => self.alts.get(i - 1).map(|a| a.tokens.as_slice()),
        }
    }

    pub fn n_variants(&self) -> usize {
        self.alts.len() + 1
    }
}

/// Element of a linearization sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// Field `lin` of argument `arg`.
    Cat { arg: usize, lin: usize },
    /// Field `lin` of a literal argument.
    Lit { arg: usize, lin: usize },
    /// Bound variable `var` of argument `arg`.
    Var { arg: usize, var: usize },
    Tokens(Vec<Token>),
    Prefix(PrefixVariant),
}

impl Symbol {
    pub fn cat(arg: usize, lin: usize) -> Self {
        Symbol::Cat { arg, lin }
    }

    pub fn lit(arg: usize, lin: usize) -> Self {
        Symbol::Lit { arg, lin }
    }

    /// Argument this symbol reads from, if any.
    pub fn arg(&self) -> Option<usize> {
        match self {
            Symbol::Cat { arg, .. } | Symbol::Lit { arg, .. } | Symbol::Var { arg, .. } => {
                Some(*arg)
            }
            Symbol::Tokens(_) | Symbol::Prefix(_) => None,
        }
    }
}

pub type Sequence = Vec<Symbol>;

/// Argument of an `Apply` production.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PArg {
    /// Categories of the hypotheses bound by this argument.
    pub hypos: SmallVec<[FId; 1]>,
    pub fid: FId,
}

impl PArg {
    pub fn new(fid: FId) -> Self {
        Self {
            hypos: SmallVec::new(),
            fid,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Production {
    Apply {
        fun: FunId,
        args: SmallVec<[PArg; 4]>,
    },
    /// Shares the productions of another instance.
    Coerce(FId),
}

/// Concrete function: a name plus one sequence per field.
#[derive(Clone, Debug)]
pub struct CncFun {
    pub name: CId,
    pub lins: Vec<SeqId>,
}

/// Category instance.
///
/// `prods` is None when nothing is known about the instance's productions
/// and `Some(vec![])` when it is known to produce nothing.
#[derive(Clone, Debug)]
pub struct CCat {
    pub fid: FId,
    pub cnccat: Option<CId>,
    pub n_fields: usize,
    pub prods: Option<Vec<Production>>,
}

/// Per-language realization of an abstract category.
#[derive(Clone, Debug)]
pub struct CncCat {
    pub name: CId,
    pub ccats: Vec<FId>,
    pub labels: Vec<String>,
}

impl CncCat {
    pub fn n_fields(&self) -> usize {
        self.labels.len()
    }
}

#[derive(Clone, Debug)]
pub struct AbsCat {
    pub name: CId,
    /// Categories of the hypotheses in the context.
    pub context: Vec<CId>,
    /// Functions producing this category, with their probabilities.
    pub functions: Vec<(CId, f64)>,
}

#[derive(Clone, Debug)]
pub struct AbsFun {
    pub name: CId,
    pub args: Vec<CId>,
    pub cat: CId,
    pub prob: f64,
}

impl AbsFun {
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

#[derive(Clone, Debug)]
pub struct Abstract {
    pub name: CId,
    pub flags: FxHashMap<String, String>,
    pub(crate) cats: Vec<AbsCat>,
    pub(crate) cat_index: FxHashMap<CId, usize>,
    pub(crate) funs: Vec<AbsFun>,
    pub(crate) fun_index: FxHashMap<CId, usize>,
}

impl Abstract {
    pub fn category(&self, name: CId) -> Option<&AbsCat> {
        self.cat_index.get(&name).map(|&i| &self.cats[i])
    }

    pub fn function(&self, name: CId) -> Option<&AbsFun> {
        self.fun_index.get(&name).map(|&i| &self.funs[i])
    }

    pub fn categories(&self) -> &[AbsCat] {
        &self.cats
    }

    pub fn functions(&self) -> &[AbsFun] {
        &self.funs
    }
}

#[derive(Clone, Debug)]
pub struct Concrete {
    pub name: CId,
    pub flags: FxHashMap<String, String>,
    pub(crate) cnccats: Vec<CncCat>,
    pub(crate) cnccat_index: FxHashMap<CId, usize>,
    pub(crate) ccats: Vec<CCat>,
    pub(crate) funs: Vec<CncFun>,
    pub(crate) sequences: Vec<Sequence>,
}

impl Concrete {
    pub fn cnccat(&self, name: CId) -> Option<&CncCat> {
        self.cnccat_index.get(&name).map(|&i| &self.cnccats[i])
    }

    pub fn cnccats(&self) -> &[CncCat] {
        &self.cnccats
    }

    /// Grammar-loaded instance; None for literal and synthetic ids.
    pub fn ccat(&self, fid: FId) -> Option<&CCat> {
        fid.index().and_then(|i| self.ccats.get(i))
    }

    pub fn ccats(&self) -> &[CCat] {
        &self.ccats
    }

    /// Production set of an instance; None is the null set.
    pub fn productions(&self, fid: FId) -> Option<&[Production]> {
        self.ccat(fid).and_then(|c| c.prods.as_deref())
    }

    /// Number of fields of an instance. Literal categories have one.
    pub fn n_fields(&self, fid: FId) -> Option<usize> {
        if fid.is_literal() {
            return Some(1);
        }
        self.ccat(fid).map(|c| c.n_fields)
    }

    /// Whether `fid` names a literal category or a loaded instance.
    pub fn has_instance(&self, fid: FId) -> bool {
        fid.is_literal() || self.ccat(fid).is_some()
    }

    pub fn fun(&self, id: FunId) -> Option<&CncFun> {
        self.funs.get(id.0 as usize)
    }

    pub fn funs(&self) -> &[CncFun] {
        &self.funs
    }

    pub fn sequence(&self, id: SeqId) -> Option<&[Symbol]> {
        self.sequences.get(id.0 as usize).map(|s| s.as_slice())
    }

    /// Sequence realizing field `lin` of a concrete function.
    pub fn lin(&self, fun: FunId, lin: usize) -> Option<&[Symbol]> {
        let seq = *self.fun(fun)?.lins.get(lin)?;
        self.sequence(seq)
    }

    /// Field index of a label within a concrete category.
    pub fn field_index(&self, cat: CId, label: &str) -> Option<usize> {
        self.cnccat(cat)?.labels.iter().position(|l| l == label)
    }

    /// Value of the `language` flag.
    pub fn language(&self) -> Option<&str> {
        self.flags.get("language").map(String::as_str)
    }
}

/// A compiled grammar.
#[derive(Clone, Debug)]
pub struct Grammar {
    pub(crate) symbols: Arc<SymbolStore>,
    pub(crate) abstract_syntax: Abstract,
    pub(crate) concretes: Vec<Concrete>,
}

impl Grammar {
    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    pub fn shared_symbols(&self) -> Arc<SymbolStore> {
        Arc::clone(&self.symbols)
    }

    pub fn abstract_syntax(&self) -> &Abstract {
        &self.abstract_syntax
    }

    pub fn name(&self) -> &str {
        self.symbols.name(self.abstract_syntax.name)
    }

    pub fn concretes(&self) -> &[Concrete] {
        &self.concretes
    }

    /// Concrete syntax by name.
    pub fn concrete(&self, name: &str) -> Option<&Concrete> {
        let id = self.symbols.get(name)?;
        self.concretes.iter().find(|c| c.name == id)
    }

    /// Concrete syntax by its `language` flag.
    pub fn concrete_by_lang(&self, lang: &str) -> Option<&Concrete> {
        self.concretes.iter().find(|c| c.language() == Some(lang))
    }

    /// Concrete syntax by name, then by language code.
    pub fn resolve_concrete(&self, name_or_lang: &str) -> Option<&Concrete> {
        self.concrete(name_or_lang)
            .or_else(|| self.concrete_by_lang(name_or_lang))
    }

    /// Category named by the abstract `startcat` flag.
    pub fn start_cat(&self) -> Option<&str> {
        self.abstract_syntax
            .flags
            .get("startcat")
            .map(String::as_str)
    }
}

#[cfg(test)]
#[path = "tests/grammar.rs"]
mod tests;
