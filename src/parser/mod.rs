//! Incremental chart parser.
//!
//! `Parser::parse` predicts the start category and returns the state for
//! the empty input. Each `feed` builds one new chart step on top of a
//! state and returns a new state; the old one stays valid, so several
//! continuations of the same prefix can be explored side by side.
//!
//! States of one line of input share a single vector of steps and each
//! sees only its own prefix of it. Feeding the newest state appends in
//! place; feeding a state that already has a successor copies its prefix
//! first.
//!
//! Predictions waiting on the same (category instance, field) at the same
//! position share one item set, and everything completed for an item set
//! becomes a single synthetic category. The forest is therefore packed:
//! ambiguity shows up as several productions of one category.

mod chart;
mod parsing;
mod results;

pub use chart::{CatRef, ChartCatId, ChartProduction};
pub use results::ParseResults;

use crate::error::ParseError;
use crate::expr::ExprStore;
use crate::grammar::{Concrete, FId, Grammar};
use crate::metrics::Metrics;
use crate::trace::{debug, debug_span};
use chart::Step;
use parsing::Parsing;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Parser for one concrete syntax of a grammar.
#[derive(Clone)]
pub struct Parser<'g> {
    grammar: &'g Grammar,
    concrete: &'g Concrete,
    metrics: Arc<Metrics>,
}

impl<'g> Parser<'g> {
    /// Parser for the concrete syntax named `lang` (or with that language code).
    pub fn new(grammar: &'g Grammar, lang: &str) -> Result<Self, ParseError> {
        let concrete = grammar
            .resolve_concrete(lang)
            .ok_or_else(|| ParseError::UnknownLanguage(lang.to_string()))?;
        Ok(Parser {
            grammar,
            concrete,
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

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn concrete(&self) -> &'g Concrete {
        self.concrete
    }

    /// State for the empty input, expecting field `field` of category `cat`.
    pub fn parse(&self, cat: &str, field: usize) -> Result<ParseState<'g>, ParseError> {
        let _span = debug_span!("parse", cat = cat, field = field).entered();
        let cnccat = self
            .grammar
            .symbols()
            .get(cat)
            .and_then(|id| self.concrete.cnccat(id))
            .ok_or_else(|| ParseError::UnknownCategory(cat.to_string()))?;
        if field >= cnccat.n_fields() {
            return Err(ParseError::FieldOutOfRange {
                cat: cat.to_string(),
                field,
                n_fields: cnccat.n_fields(),
            });
        }

        let mut parsing = Parsing::new(self.concrete, &self.metrics, &[], None);
        parsing.start(&cnccat.ccats, field);
        let step = parsing.run();
        debug!(items = step.items.len(), "parse_started");
        let step = Rc::new(step);
        Ok(ParseState {
            parser: self.clone(),
            chart: Rc::new(RefCell::new(vec![Rc::clone(&step)])),
            len: 1,
            last: step,
        })
    }

    /// Like [`Parser::parse`], naming the field by its label.
    pub fn parse_label(&self, cat: &str, label: &str) -> Result<ParseState<'g>, ParseError> {
        let field = self
            .grammar
            .symbols()
            .get(cat)
            .and_then(|id| self.concrete.field_index(id, label))
            .ok_or_else(|| ParseError::UnknownCategory(format!("{}.{}", cat, label)))?;
        self.parse(cat, field)
    }
}

/// Summary of one synthetic category, for inspecting the chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartCategory {
    pub id: ChartCatId,
    pub fid: FId,
    /// Instance whose field this category completed.
    pub cat: CatRef,
    pub field: usize,
    pub n_productions: usize,
}

/// Chart after some prefix of the input.
#[derive(Clone)]
pub struct ParseState<'g> {
    parser: Parser<'g>,
    /// Steps, possibly extended past `len` by later states.
    chart: Rc<RefCell<Vec<Rc<Step>>>>,
    len: usize,
    last: Rc<Step>,
}

impl<'g> ParseState<'g> {
    /// Number of tokens consumed.
    pub fn position(&self) -> usize {
        self.len - 1
    }

    fn last(&self) -> &Step {
        &self.last
    }

    pub(crate) fn step(&self, index: u32) -> Option<Rc<Step>> {
        let index = index as usize;
        if index >= self.len {
            return None;
        }
        self.chart.borrow().get(index).cloned()
    }

    /// State after one more token, or None when no item can scan it.
    pub fn feed(&self, token: &str) -> Option<ParseState<'g>> {
        let _span = debug_span!("feed", token = token).entered();
        let last = self.last();
        let waiting = self
            .parser
            .grammar
            .symbols()
            .get(token)
            .and_then(|tok| last.transitions.get(&tok).map(|w| (tok, w)));
        let Some((tok, waiting)) = waiting else {
            self.parser.metrics.record_rejected_token();
            debug!(token = token, "token_rejected");
            return None;
        };

        let step = {
            let chart = self.chart.borrow();
            let mut parsing = Parsing::new(
                self.parser.concrete,
                &self.parser.metrics,
                &chart[..self.len],
                Some(tok),
            );
            for r in waiting {
                parsing.scan(last.items[r.idx as usize].clone());
            }
            parsing.run()
        };
        debug!(
            items = step.items.len(),
            categories = step.cats.len(),
            completed = step.completed.len(),
            "token_fed"
        );

        let step = Rc::new(step);
        let is_newest = self.chart.borrow().len() == self.len;
        let chart = if is_newest {
            self.chart.borrow_mut().push(Rc::clone(&step));
            Rc::clone(&self.chart)
        } else {
            let mut steps = self.chart.borrow()[..self.len].to_vec();
            steps.push(Rc::clone(&step));
            debug!(position = self.len, "chart_branched");
            Rc::new(RefCell::new(steps))
        };
        Some(ParseState {
            parser: self.parser.clone(),
            chart,
            len: self.len + 1,
            last: step,
        })
    }

    /// Top-level categories spanning the whole input so far.
    pub fn completed(&self) -> &[ChartCatId] {
        &self.last().completed
    }

    pub fn is_complete(&self) -> bool {
        !self.completed().is_empty()
    }

    /// Tokens with a transition from this state, sorted.
    pub fn expected_tokens(&self) -> Vec<&'g str> {
        let symbols = self.parser.grammar.symbols();
        let mut tokens: Vec<&'g str> = self
            .last()
            .transitions
            .keys()
            .filter_map(|&t| symbols.resolve(t))
            .collect();
        tokens.sort_unstable();
        tokens
    }

    /// Number of items that would scan `token`.
    pub fn waiting(&self, token: &str) -> usize {
        self.parser
            .grammar
            .symbols()
            .get(token)
            .and_then(|t| self.last().transitions.get(&t))
            .map_or(0, Vec::len)
    }

    /// Synthetic categories created by the last step.
    pub fn categories(&self) -> Vec<ChartCategory> {
        let step = self.position() as u32;
        (0..self.last().cats.len() as u32)
            .filter_map(|idx| self.category(ChartCatId { step, idx }))
            .collect()
    }

    pub fn category(&self, id: ChartCatId) -> Option<ChartCategory> {
        let step = self.step(id.step)?;
        let cat = step.cats.get(id.idx as usize)?;
        Some(ChartCategory {
            id,
            fid: cat.fid,
            cat: cat.cat,
            field: cat.lin,
            n_productions: cat.prods.len(),
        })
    }

    pub fn productions(&self, id: ChartCatId) -> Option<Vec<ChartProduction>> {
        let step = self.step(id.step)?;
        let prods = step.cats.get(id.idx as usize)?.prods.clone();
        Some(prods)
    }

    /// Tokens consumed, in order.
    pub fn tokens(&self) -> Vec<&'g str> {
        let symbols = self.parser.grammar.symbols();
        self.chart.borrow()[..self.len]
            .iter()
            .filter_map(|s| s.token)
            .filter_map(|t| symbols.resolve(t))
            .collect()
    }

    /// Lazily enumerate the abstract trees of the completed categories.
    ///
    /// Every call starts a fresh enumeration from the first tree; the
    /// returned iterator is the one enumerator, and each `next` resumes
    /// it where the previous tree left off. Keep the iterator to page
    /// through the trees rather than calling `results` again.
    pub fn results<'s>(&'s self, exprs: &'s ExprStore) -> ParseResults<'s, 'g> {
        ParseResults::new(self, exprs)
    }

    pub(crate) fn parser(&self) -> &Parser<'g> {
        &self.parser
    }
}

#[cfg(test)]
mod tests;
