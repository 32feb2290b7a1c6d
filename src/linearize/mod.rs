//! Generation: from abstract trees to token streams.
//!
//! `Linearizer::concretize` enumerates the concrete derivations of an
//! abstract tree; `Linearizer::linearize` walks one derivation and pushes
//! its tokens into a [`Presenter`].
//!
//! Prefix-dependent symbols always produce their default form here.
//! Choosing the alternative would need the first token of whatever is
//! realized after the symbol.

mod concretize;
mod index;

pub use concretize::{CncTree, Concretizations};
pub use index::{ArgKey, IndexEntry, LinIndex};

use crate::error::LinearizeError;
use crate::expr::{ExprId, ExprStore, Literal};
use crate::grammar::{Concrete, Grammar, Symbol};
use crate::metrics::Metrics;
use crate::symbol::Token;
use crate::trace::debug_span;
use smallvec::SmallVec;
use std::sync::Arc;

/// Receiver of linearization events.
///
/// Only `tokens` is required; the other hooks let a presenter track
/// phrase structure or render literals and metas its own way.
pub trait Presenter {
    fn tokens(&mut self, tokens: &[&str]);

    /// A function application starts.
    fn begin_apply(&mut self, _fun: &str, _n_args: usize) {}

    /// The application started by the matching `begin_apply` ends.
    fn end_apply(&mut self, _fun: &str) {}

    fn literal(&mut self, value: &Literal) {
        match value {
            Literal::Str(s) => self.tokens(&[s.as_str()]),
            other => self.tokens(&[other.to_string().as_str()]),
        }
    }

    fn meta(&mut self, _id: u32) {
        self.tokens(&["?"]);
    }
}

/// Presenter that keeps the tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenCollector {
    pub tokens: Vec<String>,
}

impl TokenCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    /// Tokens separated by single spaces.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

impl Presenter for TokenCollector {
    fn tokens(&mut self, tokens: &[&str]) {
        self.tokens.extend(tokens.iter().map(|t| t.to_string()));
    }
}

/// Generator for one concrete syntax.
pub struct Linearizer<'g> {
    grammar: &'g Grammar,
    concrete: &'g Concrete,
    index: LinIndex,
    metrics: Arc<Metrics>,
}

impl<'g> Linearizer<'g> {
    pub fn new(grammar: &'g Grammar, lang: &str) -> Result<Self, LinearizeError> {
        let concrete = grammar
            .resolve_concrete(lang)
            .ok_or_else(|| LinearizeError::UnknownLanguage(lang.to_string()))?;
        Ok(Linearizer {
            grammar,
            concrete,
            index: LinIndex::build(concrete),
            metrics: Arc::new(Metrics::new()),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn index(&self) -> &LinIndex {
        &self.index
    }

    pub fn concrete(&self) -> &'g Concrete {
        self.concrete
    }

    /// Lazily enumerate the concrete derivations of `expr`.
    pub fn concretize<'a>(&'a self, expr: ExprId, exprs: &'a ExprStore) -> Concretizations<'a, 'g> {
        Concretizations::new(self, exprs, expr)
    }

    /// Push field `field` of a derivation into `presenter`.
    pub fn linearize(
        &self,
        tree: &CncTree,
        field: usize,
        presenter: &mut dyn Presenter,
    ) -> Result<(), LinearizeError> {
        let _span = debug_span!("linearize", field = field).entered();
        self.walk(tree, field, presenter)
    }

    pub fn linearize_tokens(&self, tree: &CncTree, field: usize) -> Result<Vec<String>, LinearizeError> {
        let mut out = TokenCollector::new();
        self.linearize(tree, field, &mut out)?;
        Ok(out.into_tokens())
    }

    /// Text of the first derivation of `expr`, if it has one.
    pub fn linearize_expr(
        &self,
        expr: ExprId,
        exprs: &ExprStore,
        field: usize,
    ) -> Result<Option<String>, LinearizeError> {
        match self.concretize(expr, exprs).next() {
            Some(tree) => Ok(Some(self.linearize_tokens(&tree, field)?.join(" "))),
            None => Ok(None),
        }
    }

    fn walk(
        &self,
        tree: &CncTree,
        field: usize,
        out: &mut dyn Presenter,
    ) -> Result<(), LinearizeError> {
        match tree {
            CncTree::Meta(id) => {
                out.meta(*id);
                Ok(())
            }
            CncTree::Lit { value, .. } if field == 0 => {
                out.literal(value);
                Ok(())
            }
            CncTree::Lit { value, .. } => Err(LinearizeError::FieldOutOfRange {
                fun: value.to_string(),
                field,
                n_fields: 1,
            }),
            CncTree::App {
                fun, name, args, ..
            } => {
                let fun_name = self.grammar.symbols().name(*name);
                let n_fields = self.concrete.fun(*fun).map_or(0, |f| f.lins.len());
                let seq = self.concrete.lin(*fun, field).ok_or_else(|| {
                    LinearizeError::FieldOutOfRange {
                        fun: fun_name.to_string(),
                        field,
                        n_fields,
                    }
                })?;
                let child = |arg: usize| {
                    args.get(arg).ok_or_else(|| LinearizeError::ArgOutOfRange {
                        fun: fun_name.to_string(),
                        arg,
                        n_args: args.len(),
                    })
                };

                out.begin_apply(fun_name, args.len());
                for sym in seq {
                    match sym {
                        Symbol::Cat { arg, lin } | Symbol::Lit { arg, lin } => {
                            self.walk(child(*arg)?, *lin, out)?;
                        }
                        Symbol::Var { arg, .. } => {
                            child(*arg)?;
                            // Unbound variable name.
                            out.tokens(&["_"]);
                        }
                        Symbol::Tokens(tokens) => self.emit(tokens, out),
                        Symbol::Prefix(pv) => self.emit(&pv.default, out),
                    }
                }
                out.end_apply(fun_name);
                Ok(())
            }
        }
    }

    fn emit(&self, tokens: &[Token], out: &mut dyn Presenter) {
        if tokens.is_empty() {
            return;
        }
        let symbols = self.grammar.symbols();
        let words: SmallVec<[&str; 8]> = tokens.iter().map(|&t| symbols.name(t)).collect();
        out.tokens(&words);
    }
}
