//! Choice - replayable record of decisions for depth-first backtracking.
//!
//! A search calls `next(n)` at every decision point. The first time a
//! depth is reached the decision is recorded as "n alternatives remain" and
//! the first alternative is taken; later walks over the same depth replay
//! the recorded decision. Between walks the caller resets to a mark and
//! calls `advance`, which moves the deepest unfinished decision to its
//! next alternative. Repeating this enumerates the whole decision tree in
//! depth-first order without any recursion in the enumerator itself.

use smallvec::SmallVec;

/// A saved depth in a choice path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChoiceMark(usize);

impl ChoiceMark {
    /// The depth this mark refers to.
    pub fn depth(self) -> usize {
        self.0
    }
}

/// Path of recorded decisions plus the current replay position.
///
/// Each recorded element is the number of alternatives that were still
/// untried when the decision was made; `n - remaining` is the index taken.
#[derive(Clone, Debug, Default)]
pub struct Choice {
    path: SmallVec<[u32; 16]>,
    depth: usize,
}

impl Choice {
    pub fn new() -> Self {
        Self {
            path: SmallVec::new(),
            depth: 0,
        }
    }

    /// Current depth, usable with `reset`.
    pub fn mark(&self) -> ChoiceMark {
        debug_assert!(self.depth <= self.path.len());
        ChoiceMark(self.depth)
    }

    /// Return to a previously taken mark.
    ///
    /// Decisions recorded beyond the mark are kept so the next walk replays
    /// (or, after `advance`, varies) them.
    pub fn reset(&mut self, mark: ChoiceMark) {
        assert!(
            mark.0 <= self.depth,
            "choice mark {} is beyond current depth {}",
            mark.0,
            self.depth
        );
        self.depth = mark.0;
    }

    /// Take a decision among `n_alternatives`.
    ///
    /// Returns None when there is nothing to choose from. Otherwise returns
    /// the alternative index and descends one level: a recorded decision is
    /// replayed, a fresh depth records and takes the first alternative.
    pub fn next(&mut self, n_alternatives: usize) -> Option<usize> {
        debug_assert!(self.depth <= self.path.len());
        if n_alternatives == 0 {
            return None;
        }
        let n = u32::try_from(n_alternatives).unwrap_or(u32::MAX);
        let remaining = if self.depth < self.path.len() {
            let recorded = self.path[self.depth];
            debug_assert!(
                recorded <= n,
                "replayed choice {} exceeds {} alternatives",
                recorded,
                n
            );
            recorded.min(n)
        } else {
            self.path.push(n);
            n
        };
        self.depth += 1;
        Some((n - remaining) as usize)
    }

    /// Move to the next untried path below the current depth.
    ///
    /// Exhausted trailing decisions are dropped and the deepest decision
    /// with alternatives left moves on by one. Returns false once every
    /// path below the current depth has been tried.
    pub fn advance(&mut self) -> bool {
        while self.path.len() > self.depth {
            let last = self.path.len() - 1;
            if self.path[last] <= 1 {
                self.path.truncate(last);
            } else {
                self.path[last] -= 1;
                return true;
            }
        }
        false
    }

    /// Recorded decisions, outermost first.
    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// Current replay depth.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
#[path = "tests/choice.rs"]
mod tests;
