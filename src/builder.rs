//! Assembling grammars in code.
//!
//! ```rust,ignore
//! let mut g = GrammarBuilder::new("Zoo");
//! g.cat("S", &[]).cat("NP", &[]).fun("Cat", &[], "NP");
//! let mut eng = g.concrete("ZooEng");
//! let np = eng.cnccat("NP", 1, &["s"]);
//! let seq = eng.tokens(&["the", "cat"]);
//! let cat = eng.fun("Cat", &[seq]);
//! eng.apply(np[0], cat, &[]);
//! g.add_concrete(eng);
//! let grammar = g.finish()?;
//! ```

use crate::error::GrammarError;
use crate::grammar::{
    AbsCat, AbsFun, Abstract, Alternative, CCat, CncCat, CncFun, Concrete, FId, FunId, Grammar,
    PArg, PrefixVariant, Production, SeqId, Sequence, Symbol,
};
use crate::symbol::{CId, SymbolStore, Token};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

pub struct GrammarBuilder {
    symbols: Arc<SymbolStore>,
    name: CId,
    flags: FxHashMap<String, String>,
    cats: Vec<AbsCat>,
    cat_index: FxHashMap<CId, usize>,
    funs: Vec<AbsFun>,
    fun_index: FxHashMap<CId, usize>,
    explicit_probs: FxHashMap<CId, f64>,
    concretes: Vec<Concrete>,
    /// Errors from concrete builders, reported by `finish`.
    pending: Vec<GrammarError>,
}

impl GrammarBuilder {
    pub fn new(name: &str) -> Self {
        Self::with_symbols(name, Arc::new(SymbolStore::new()))
    }

    pub fn with_symbols(name: &str, symbols: Arc<SymbolStore>) -> Self {
        let name = symbols.intern(name);
        Self {
            symbols,
            name,
            flags: FxHashMap::default(),
            cats: Vec::new(),
            cat_index: FxHashMap::default(),
            funs: Vec::new(),
            fun_index: FxHashMap::default(),
            explicit_probs: FxHashMap::default(),
            concretes: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolStore> {
        &self.symbols
    }

    pub fn flag(&mut self, name: &str, value: &str) -> &mut Self {
        self.flags.insert(name.to_string(), value.to_string());
        self
    }

    /// Declare an abstract category with the categories of its context.
    pub fn cat(&mut self, name: &str, context: &[&str]) -> &mut Self {
        let id = self.symbols.intern(name);
        let context = context.iter().map(|c| self.symbols.intern(c)).collect();
        let cat = AbsCat {
            name: id,
            context,
            functions: Vec::new(),
        };
        match self.cat_index.get(&id) {
            Some(&i) => self.cats[i] = cat,
            None => {
                self.cat_index.insert(id, self.cats.len());
                self.cats.push(cat);
            }
        }
        self
    }

    /// Declare an abstract function `name : args -> cat`.
    pub fn fun(&mut self, name: &str, args: &[&str], cat: &str) -> &mut Self {
        let id = self.symbols.intern(name);
        let fun = AbsFun {
            name: id,
            args: args.iter().map(|a| self.symbols.intern(a)).collect(),
            cat: self.symbols.intern(cat),
            prob: 0.0,
        };
        match self.fun_index.get(&id) {
            Some(&i) => self.funs[i] = fun,
            None => {
                self.fun_index.insert(id, self.funs.len());
                self.funs.push(fun);
            }
        }
        self
    }

    /// Fix the probability of a function. Functions without one share
    /// the mass left over in their category.
    pub fn prob(&mut self, fun: &str, p: f64) -> &mut Self {
        let id = self.symbols.intern(fun);
        self.explicit_probs.insert(id, p);
        self
    }

    /// Start a concrete syntax sharing this grammar's symbol store.
    pub fn concrete(&self, name: &str) -> ConcreteBuilder {
        ConcreteBuilder::new(name, Arc::clone(&self.symbols))
    }

    pub fn add_concrete(&mut self, concrete: ConcreteBuilder) -> &mut Self {
        match concrete.build() {
            Ok(concrete) => self.concretes.push(concrete),
            Err(e) => self.pending.push(e),
        }
        self
    }

    /// Validate and freeze the grammar.
    pub fn finish(self) -> Result<Grammar, GrammarError> {
        let GrammarBuilder {
            symbols,
            name,
            flags,
            mut cats,
            cat_index,
            mut funs,
            fun_index,
            explicit_probs,
            concretes,
            pending,
        } = self;

        if let Some(e) = pending.into_iter().next() {
            return Err(e);
        }

        for fun in &funs {
            for cat in fun.args.iter().chain(std::iter::once(&fun.cat)) {
                if !cat_index.contains_key(cat) {
                    return Err(GrammarError::UndeclaredCategory {
                        owner: symbols.name(fun.name).to_string(),
                        cat: symbols.name(*cat).to_string(),
                    });
                }
            }
        }

        // Spread the probability mass not fixed explicitly over the rest.
        for (ci, cat) in cats.iter_mut().enumerate() {
            let members: Vec<usize> = funs
                .iter()
                .enumerate()
                .filter(|(_, f)| cat_index.get(&f.cat) == Some(&ci))
                .map(|(i, _)| i)
                .collect();
            let fixed: f64 = members
                .iter()
                .filter_map(|&i| explicit_probs.get(&funs[i].name))
                .sum();
            let n_free = members
                .iter()
                .filter(|&&i| !explicit_probs.contains_key(&funs[i].name))
                .count();
            let share = if n_free == 0 {
                0.0
            } else {
                (1.0 - fixed).max(0.0) / n_free as f64
            };
            for &i in &members {
                let p = explicit_probs
                    .get(&funs[i].name)
                    .copied()
                    .unwrap_or(share);
                funs[i].prob = p;
                cat.functions.push((funs[i].name, p));
            }
        }

        let abstract_syntax = Abstract {
            name,
            flags,
            cats,
            cat_index,
            funs,
            fun_index,
        };

        for (i, cnc) in concretes.iter().enumerate() {
            if concretes[..i].iter().any(|c| c.name == cnc.name) {
                return Err(GrammarError::DuplicateConcrete {
                    name: symbols.name(cnc.name).to_string(),
                });
            }
            validate_concrete(cnc, &abstract_syntax, &symbols)?;
        }

        Ok(Grammar {
            symbols,
            abstract_syntax,
            concretes,
        })
    }
}

fn validate_concrete(
    cnc: &Concrete,
    abs: &Abstract,
    symbols: &SymbolStore,
) -> Result<(), GrammarError> {
    let cnc_name = symbols.name(cnc.name);

    for cnccat in &cnc.cnccats {
        if abs.category(cnccat.name).is_none() {
            return Err(GrammarError::UndeclaredCategory {
                owner: cnc_name.to_string(),
                cat: symbols.name(cnccat.name).to_string(),
            });
        }
    }

    for fun in &cnc.funs {
        let fun_name = symbols.name(fun.name);
        let decl = abs
            .function(fun.name)
            .ok_or_else(|| GrammarError::UndeclaredFunction {
                fun: fun_name.to_string(),
            })?;
        for &seq in &fun.lins {
            let symbols_of = cnc
                .sequence(seq)
                .ok_or_else(|| GrammarError::UnknownSequence {
                    fun: fun_name.to_string(),
                    seq: seq.0,
                })?;
            for sym in symbols_of {
                if let Some(arg) = sym.arg() {
                    if arg >= decl.arity() {
                        return Err(GrammarError::SymbolArgOutOfRange {
                            fun: fun_name.to_string(),
                            arg,
                            arity: decl.arity(),
                        });
                    }
                }
            }
        }
    }

    for ccat in &cnc.ccats {
        let Some(prods) = &ccat.prods else { continue };
        for prod in prods {
            match prod {
                Production::Apply { fun, args } => {
                    let cf = cnc.fun(*fun).ok_or(GrammarError::UnknownFunction {
                        fid: ccat.fid.0,
                        fun: fun.0,
                    })?;
                    let fun_name = symbols.name(cf.name);
                    if cf.lins.len() != ccat.n_fields {
                        return Err(GrammarError::FieldArityMismatch {
                            fid: ccat.fid.0,
                            expected: ccat.n_fields,
                            found: cf.lins.len(),
                        });
                    }
                    // Function declarations were checked above.
                    let arity = abs.function(cf.name).map_or(0, AbsFun::arity);
                    if args.len() != arity {
                        return Err(GrammarError::ArgumentCountMismatch {
                            fun: fun_name.to_string(),
                            expected: arity,
                            found: args.len(),
                        });
                    }
                    for arg in args {
                        for fid in arg.hypos.iter().chain(std::iter::once(&arg.fid)) {
                            if !cnc.has_instance(*fid) {
                                return Err(GrammarError::UnknownInstance {
                                    fid: ccat.fid.0,
                                    referenced: fid.0,
                                });
                            }
                        }
                    }
                    // Sequences and argument ranges were checked above.
                    let field_reads = cf
                        .lins
                        .iter()
                        .filter_map(|&seq| cnc.sequence(seq))
                        .flatten()
                        .filter_map(|sym| match sym {
                            Symbol::Cat { arg, lin } | Symbol::Lit { arg, lin } => {
                                Some((*arg, *lin))
                            }
                            _ => None,
                        });
                    for (arg, lin) in field_reads {
                        let n_fields = cnc.n_fields(args[arg].fid).unwrap_or(0);
                        if lin >= n_fields {
                            return Err(GrammarError::SymbolFieldOutOfRange {
                                fun: fun_name.to_string(),
                                arg,
                                field: lin,
                                n_fields,
                            });
                        }
                    }
                }
                Production::Coerce(target) => {
                    let n = cnc.n_fields(*target).ok_or(GrammarError::DanglingCoercion {
                        fid: ccat.fid.0,
                        target: target.0,
                    })?;
                    if n != ccat.n_fields {
                        return Err(GrammarError::FieldArityMismatch {
                            fid: ccat.fid.0,
                            expected: ccat.n_fields,
                            found: n,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Builds one concrete syntax.
pub struct ConcreteBuilder {
    symbols: Arc<SymbolStore>,
    name: CId,
    flags: FxHashMap<String, String>,
    cnccats: Vec<CncCat>,
    cnccat_index: FxHashMap<CId, usize>,
    ccats: Vec<CCat>,
    funs: Vec<CncFun>,
    sequences: Vec<Sequence>,
    errors: Vec<GrammarError>,
}

impl ConcreteBuilder {
    pub fn new(name: &str, symbols: Arc<SymbolStore>) -> Self {
        let name = symbols.intern(name);
        Self {
            symbols,
            name,
            flags: FxHashMap::default(),
            cnccats: Vec::new(),
            cnccat_index: FxHashMap::default(),
            ccats: Vec::new(),
            funs: Vec::new(),
            sequences: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn flag(&mut self, name: &str, value: &str) -> &mut Self {
        self.flags.insert(name.to_string(), value.to_string());
        self
    }

    /// Declare a concrete category with `n_instances` fresh instances,
    /// each with one field per label.
    pub fn cnccat(&mut self, name: &str, n_instances: usize, labels: &[&str]) -> Vec<FId> {
        let id = self.symbols.intern(name);
        let fids: Vec<FId> = (0..n_instances)
            .map(|_| self.new_ccat(Some(id), labels.len(), None))
            .collect();
        let idx = match self.cnccat_index.get(&id) {
            Some(&i) => i,
            None => {
                self.cnccat_index.insert(id, self.cnccats.len());
                self.cnccats.push(CncCat {
                    name: id,
                    ccats: Vec::new(),
                    labels: labels.iter().map(|l| l.to_string()).collect(),
                });
                self.cnccats.len() - 1
            }
        };
        self.cnccats[idx].ccats.extend(fids.iter().copied());
        fids
    }

    /// A new instance whose productions are coercions of `targets`.
    ///
    /// It inherits the concrete category and field count of the first target.
    pub fn coercion(&mut self, targets: &[FId]) -> FId {
        let (cnccat, n_fields) = targets
            .first()
            .and_then(|&t| self.ccat(t))
            .map_or((None, 0), |c| (c.cnccat, c.n_fields));
        let prods = targets.iter().map(|&t| Production::Coerce(t)).collect();
        self.new_ccat(cnccat, n_fields, Some(prods))
    }

    fn new_ccat(&mut self, cnccat: Option<CId>, n_fields: usize, prods: Option<Vec<Production>>) -> FId {
        let fid = FId(self.ccats.len() as i32);
        self.ccats.push(CCat {
            fid,
            cnccat,
            n_fields,
            prods,
        });
        fid
    }

    fn ccat(&self, fid: FId) -> Option<&CCat> {
        fid.index().and_then(|i| self.ccats.get(i))
    }

    /// Production list of `fid`, recording an error when it was never created.
    fn prods_mut(&mut self, fid: FId) -> Option<&mut Vec<Production>> {
        match fid.index().filter(|&i| i < self.ccats.len()) {
            Some(i) => Some(self.ccats[i].prods.get_or_insert_with(Vec::new)),
            None => {
                self.errors.push(GrammarError::UndefinedInstance {
                    concrete: self.symbols.name(self.name).to_string(),
                    fid: fid.0,
                });
                None
            }
        }
    }

    /// Intern a token sequence into a symbol.
    pub fn tokens(&self, words: &[&str]) -> Symbol {
        Symbol::Tokens(self.intern_all(words))
    }

    /// A prefix-dependent choice: `default` unless the next token starts
    /// with one of an alternative's prefixes.
    pub fn prefix(&self, default: &[&str], alts: &[(&[&str], &[&str])]) -> Symbol {
        Symbol::Prefix(PrefixVariant {
            default: self.intern_all(default),
            alts: alts
                .iter()
                .map(|(tokens, prefixes)| Alternative {
                    tokens: self.intern_all(tokens),
                    prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
        })
    }

    fn intern_all(&self, words: &[&str]) -> Vec<Token> {
        words.iter().map(|w| self.symbols.intern(w)).collect()
    }

    pub fn sequence(&mut self, symbols: Vec<Symbol>) -> SeqId {
        if let Some(i) = self.sequences.iter().position(|s| *s == symbols) {
            return SeqId(i as u32);
        }
        self.sequences.push(symbols);
        SeqId(self.sequences.len() as u32 - 1)
    }

    /// Concrete function with one sequence per field.
    pub fn fun(&mut self, name: &str, lins: &[SeqId]) -> FunId {
        let name = self.symbols.intern(name);
        self.funs.push(CncFun {
            name,
            lins: lins.to_vec(),
        });
        FunId(self.funs.len() as u32 - 1)
    }

    /// Shorthand for a function whose fields are each a single sequence.
    pub fn fun_seqs(&mut self, name: &str, fields: Vec<Vec<Symbol>>) -> FunId {
        let lins: Vec<SeqId> = fields.into_iter().map(|s| self.sequence(s)).collect();
        self.fun(name, &lins)
    }

    /// Add `fid := fun(args)`.
    pub fn apply(&mut self, fid: FId, fun: FunId, args: &[FId]) -> &mut Self {
        let args: SmallVec<[PArg; 4]> = args.iter().map(|&a| PArg::new(a)).collect();
        if let Some(prods) = self.prods_mut(fid) {
            prods.push(Production::Apply { fun, args });
        }
        self
    }

    /// Add `fid := target`.
    pub fn coerce(&mut self, fid: FId, target: FId) -> &mut Self {
        if let Some(prods) = self.prods_mut(fid) {
            prods.push(Production::Coerce(target));
        }
        self
    }

    /// Record that an instance is known to have no productions.
    pub fn mark_empty(&mut self, fid: FId) -> &mut Self {
        let _ = self.prods_mut(fid);
        self
    }

    /// Freeze the concrete syntax. Fails with the first production that
    /// was added to an instance this builder never created.
    pub fn build(self) -> Result<Concrete, GrammarError> {
        if let Some(e) = self.errors.into_iter().next() {
            return Err(e);
        }
        Ok(Concrete {
            name: self.name,
            flags: self.flags,
            cnccats: self.cnccats,
            cnccat_index: self.cnccat_index,
            ccats: self.ccats,
            funs: self.funs,
            sequences: self.sequences,
        })
    }
}

#[cfg(test)]
#[path = "tests/builder.rs"]
mod tests;
