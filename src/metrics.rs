//! Aggregate counters for parsing and generation.
//!
//! With the `tracing` feature enabled, `Metrics` holds relaxed atomic
//! counters. Without it, `Metrics` is zero-sized and every method is a
//! no-op, so the parser and linearizer can record unconditionally.
//!
//! ```rust,ignore
//! let parser = Parser::new(&grammar, "FoodsEng")?;
//! // ... parse ...
//! println!("{}", parser.metrics().report());
//! ```

#[cfg(feature = "tracing")]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "tracing")]
pub struct Metrics {
    /// (category, field) pairs predicted for the first time at a position
    pub predictions: AtomicU64,
    /// Items that reached the end of their sequence
    pub completions: AtomicU64,
    /// Items advanced over a token
    pub scans: AtomicU64,
    /// Continuations advanced over a completed category
    pub combinations: AtomicU64,
    /// Items allocated in charts
    pub items: AtomicU64,
    /// Synthetic categories created by completion
    pub synthetic_categories: AtomicU64,
    /// Tokens with no waiting item
    pub rejected_tokens: AtomicU64,
    /// Abstract trees yielded from parse results
    pub parse_trees: AtomicU64,
    /// Full concretization walks started
    pub concretize_attempts: AtomicU64,
    /// Walks that hit an infeasible choice
    pub concretize_failures: AtomicU64,
    /// Calls to advance the choice path
    pub backtracks: AtomicU64,
    /// Concrete trees yielded
    pub concrete_trees: AtomicU64,
}

#[cfg(feature = "tracing")]
impl Metrics {
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            completions: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            combinations: AtomicU64::new(0),
            items: AtomicU64::new(0),
            synthetic_categories: AtomicU64::new(0),
            rejected_tokens: AtomicU64::new(0),
            parse_trees: AtomicU64::new(0),
            concretize_attempts: AtomicU64::new(0),
            concretize_failures: AtomicU64::new(0),
            backtracks: AtomicU64::new(0),
            concrete_trees: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_prediction(&self) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_completion(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_combination(&self) {
        self.combinations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_item(&self) {
        self.items.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_synthetic_category(&self) {
        self.synthetic_categories.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected_token(&self) {
        self.rejected_tokens.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_parse_tree(&self) {
        self.parse_trees.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_concretize_attempt(&self) {
        self.concretize_attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_concretize_failure(&self) {
        self.concretize_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backtrack(&self) {
        self.backtracks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_concrete_tree(&self) {
        self.concrete_trees.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of all counters.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            predictions: self.predictions.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            combinations: self.combinations.load(Ordering::Relaxed),
            items: self.items.load(Ordering::Relaxed),
            synthetic_categories: self.synthetic_categories.load(Ordering::Relaxed),
            rejected_tokens: self.rejected_tokens.load(Ordering::Relaxed),
            parse_trees: self.parse_trees.load(Ordering::Relaxed),
            concretize_attempts: self.concretize_attempts.load(Ordering::Relaxed),
            concretize_failures: self.concretize_failures.load(Ordering::Relaxed),
            backtracks: self.backtracks.load(Ordering::Relaxed),
            concrete_trees: self.concrete_trees.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.predictions,
            &self.completions,
            &self.scans,
            &self.combinations,
            &self.items,
            &self.synthetic_categories,
            &self.rejected_tokens,
            &self.parse_trees,
            &self.concretize_attempts,
            &self.concretize_failures,
            &self.backtracks,
            &self.concrete_trees,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(feature = "tracing")]
impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsReport {
    pub predictions: u64,
    pub completions: u64,
    pub scans: u64,
    pub combinations: u64,
    pub items: u64,
    pub synthetic_categories: u64,
    pub rejected_tokens: u64,
    pub parse_trees: u64,
    pub concretize_attempts: u64,
    pub concretize_failures: u64,
    pub backtracks: u64,
    pub concrete_trees: u64,
}

impl MetricsReport {
    /// Share of concretization walks that produced a tree.
    pub fn attempt_success_rate(&self) -> f64 {
        if self.concretize_attempts == 0 {
            1.0
        } else {
            let ok = self
                .concretize_attempts
                .saturating_sub(self.concretize_failures);
            ok as f64 / self.concretize_attempts as f64
        }
    }
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Chart ===")?;
        writeln!(f, "Items:              {}", self.items)?;
        writeln!(f, "Predictions:        {}", self.predictions)?;
        writeln!(f, "Completions:        {}", self.completions)?;
        writeln!(f, "Scans:              {}", self.scans)?;
        writeln!(f, "Combinations:       {}", self.combinations)?;
        writeln!(f, "Synthetic cats:     {}", self.synthetic_categories)?;
        writeln!(f, "Rejected tokens:    {}", self.rejected_tokens)?;
        writeln!(f, "Parse trees:        {}", self.parse_trees)?;
        writeln!(f, "=== Generation ===")?;
        writeln!(
            f,
            "Attempts:           {} ({} failed, {:.1}% success)",
            self.concretize_attempts,
            self.concretize_failures,
            self.attempt_success_rate() * 100.0
        )?;
        writeln!(f, "Backtracks:         {}", self.backtracks)?;
        writeln!(f, "Concrete trees:     {}", self.concrete_trees)?;
        Ok(())
    }
}

#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct Metrics;

#[cfg(not(feature = "tracing"))]
impl Metrics {
    #[inline]
    pub fn new() -> Self {
        Metrics
    }
    #[inline]
    pub fn record_prediction(&self) {}
    #[inline]
    pub fn record_completion(&self) {}
    #[inline]
    pub fn record_scan(&self) {}
    #[inline]
    pub fn record_combination(&self) {}
    #[inline]
    pub fn record_item(&self) {}
    #[inline]
    pub fn record_synthetic_category(&self) {}
    #[inline]
    pub fn record_rejected_token(&self) {}
    #[inline]
    pub fn record_parse_tree(&self) {}
    #[inline]
    pub fn record_concretize_attempt(&self) {}
    #[inline]
    pub fn record_concretize_failure(&self) {}
    #[inline]
    pub fn record_backtrack(&self) {}
    #[inline]
    pub fn record_concrete_tree(&self) {}
    #[inline]
    pub fn report(&self) -> MetricsReport {
        MetricsReport::default()
    }
    #[inline]
    pub fn reset(&self) {}
}

#[cfg(not(feature = "tracing"))]
impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tracing")]
impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Metrics").field(&self.report()).finish()
    }
}

#[cfg(test)]
#[path = "tests/metrics.rs"]
mod tests;
