//! Outcome records produced by [`Matcher`](crate::Matcher) evaluation.
//!
//! - [`BreakResult`]: the outcome of one case: its index, the kind of
//!   predicate, and either the action's value or a [`CaseError`].
//! - [`AggregatedResult`]: every matched or failed case, ascending by index.

use crate::{CaseError, MatchKind};
use std::slice;

/// The recorded outcome of one case.
///
/// Exactly one of value and error is present; the `Result` encodes that.
#[derive(Debug, Clone)]
pub struct BreakResult<R> {
    index: usize,
    kind: MatchKind,
    outcome: Result<R, CaseError>,
}

impl<R> BreakResult<R> {
    pub(crate) fn new(index: usize, kind: MatchKind, outcome: Result<R, CaseError>) -> Self {
        Self {
            index,
            kind,
            outcome,
        }
    }

    /// Position of the case in the matcher.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Which predicate variant the case used.
    #[must_use]
    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    /// The action's value, if it succeeded.
    #[must_use]
    pub fn value(&self) -> Option<&R> {
        self.outcome.as_ref().ok()
    }

    /// The predicate or action failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&CaseError> {
        self.outcome.as_ref().err()
    }

    /// Returns `true` if the case produced a value.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Borrow the outcome.
    #[must_use]
    pub fn outcome(&self) -> Result<&R, &CaseError> {
        self.outcome.as_ref()
    }

    /// Take the outcome.
    pub fn into_outcome(self) -> Result<R, CaseError> {
        self.outcome
    }
}

/// All matched or failed cases of one evaluation, ascending by index.
///
/// Cases whose predicate returned `false` are absent.
#[derive(Debug, Clone)]
pub struct AggregatedResult<R> {
    results: Vec<BreakResult<R>>,
}

impl<R> AggregatedResult<R> {
    pub(crate) fn new(results: Vec<BreakResult<R>>) -> Self {
        Self { results }
    }

    /// Number of recorded cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if no case matched or failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate the recorded cases in index order.
    pub fn iter(&self) -> slice::Iter<'_, BreakResult<R>> {
        self.results.iter()
    }

    /// The recorded cases as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[BreakResult<R>] {
        &self.results
    }

    /// Indices of the recorded cases.
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.results.iter().map(BreakResult::index).collect()
    }

    /// Values of the cases whose action succeeded, in index order.
    pub fn values(&self) -> impl Iterator<Item = &R> {
        self.results.iter().filter_map(BreakResult::value)
    }

    /// Errors of the cases that failed, in index order.
    pub fn errors(&self) -> impl Iterator<Item = &CaseError> {
        self.results.iter().filter_map(BreakResult::error)
    }

    /// Returns `true` if any recorded case carries an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| !r.is_ok())
    }
}

impl<'a, R> IntoIterator for &'a AggregatedResult<R> {
    type Item = &'a BreakResult<R>;
    type IntoIter = slice::Iter<'a, BreakResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl<R> IntoIterator for AggregatedResult<R> {
    type Item = BreakResult<R>;
    type IntoIter = std::vec::IntoIter<BreakResult<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
