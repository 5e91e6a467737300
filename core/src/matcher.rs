//! Matcher: A subject bound to an ordered list of cases
//!
//! Construction and evaluation are separate phases:
//!
//! 1. [`Matcher::match_for`] returns a [`MatcherBuilder`]. Cases are appended
//!    with `match_*` + [`CaseAppender::action`], in priority order.
//! 2. [`MatcherBuilder::build`] validates and freezes the case list into a
//!    [`Matcher`].
//! 3. The `Matcher` is evaluated any number of times. Results are memoized.
//!
//! # Example
//!
//! ```
//! use casematch::Matcher;
//!
//! let matcher = Matcher::match_for(5_i32)
//!     .match_type::<String>()
//!     .action(|_| "str")
//!     .match_type::<i32>()
//!     .action(|_| "int")
//!     .match_when(|_| true)
//!     .action(|_| "any")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(matcher.get().unwrap(), Some(&"int"));
//! assert_eq!(matcher.all_matches().indices(), vec![1, 2]);
//! ```

use crate::{
    AggregatedResult, BoxError, BreakResult, Case, CaseError, DestructuredMatch,
    FieldRequirement, MatchPredicate, MatcherError, PredicateMatch, Reflect, TypeMatch,
    ValueMatch, MAX_CASES,
};
use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::OnceLock;
use tracing::debug;

/// A subject and its frozen, ordered cases.
///
/// # Evaluators
///
/// - [`first_match`](Self::first_match): stops at the first case whose
///   predicate matches or fails
/// - [`all_matches`](Self::all_matches): records every case whose predicate
///   matches or fails
/// - [`get`](Self::get) / [`get_or_else`](Self::get_or_else): first match,
///   with a carried failure returned as `Err`
///
/// The first two never fail: predicate and action failures are data inside
/// the returned [`BreakResult`]s.
///
/// # Memoization
///
/// Each evaluator computes its result once and publishes it atomically
/// through a [`OnceLock`]; every later call, from any thread, sees that same
/// result. Callers racing on the first evaluation wait for the single
/// computation, so an action runs at most once per case per evaluator. The
/// two evaluators cache independently.
///
/// # Type Parameters
///
/// - `S`: The subject type
/// - `R`: The value produced by actions
pub struct Matcher<S, R> {
    subject: S,
    cases: Vec<Case<S, R>>,
    first_match: OnceLock<Option<BreakResult<R>>>,
    all_matches: OnceLock<AggregatedResult<R>>,
}

impl<S: Reflect, R> Matcher<S, R> {
    /// Start building a matcher for `subject`.
    pub fn match_for(subject: S) -> MatcherBuilder<S, R> {
        MatcherBuilder {
            subject,
            cases: Vec::new(),
        }
    }

    /// Create a matcher directly from a list of cases.
    ///
    /// # Errors
    ///
    /// Same as [`MatcherBuilder::build`].
    pub fn new(subject: S, cases: Vec<Case<S, R>>) -> Result<Self, MatcherError> {
        MatcherBuilder { subject, cases }.build()
    }

    /// Every case whose predicate matched or failed, ascending by index.
    ///
    /// Predicate failures are recorded and scanning continues; the action of
    /// a failed predicate is not invoked. Computed once, then cached.
    pub fn all_matches(&self) -> &AggregatedResult<R> {
        self.all_matches.get_or_init(|| {
            let results: Vec<BreakResult<R>> = self
                .cases
                .iter()
                .enumerate()
                .filter_map(|(index, case)| case.evaluate(index, &self.subject))
                .collect();
            debug!(
                cases = self.cases.len(),
                recorded = results.len(),
                "all-matches evaluation complete"
            );
            AggregatedResult::new(results)
        })
    }

    /// The first case whose predicate matched or failed.
    ///
    /// `None` if no case matched and none failed. Computed once, then cached.
    pub fn first_match(&self) -> Option<&BreakResult<R>> {
        self.first_match
            .get_or_init(|| {
                let first = self
                    .cases
                    .iter()
                    .enumerate()
                    .find_map(|(index, case)| case.evaluate(index, &self.subject));
                debug!(
                    cases = self.cases.len(),
                    index = first.as_ref().map(BreakResult::index),
                    "first-match evaluation complete"
                );
                first
            })
            .as_ref()
    }

    /// The first match's value.
    ///
    /// # Errors
    ///
    /// Returns the [`CaseError`] carried by the first match, if it failed.
    pub fn get(&self) -> Result<Option<&R>, CaseError> {
        match self.first_match() {
            None => Ok(None),
            Some(result) => result.outcome().map(Some).map_err(CaseError::clone),
        }
    }

    /// The first match's value, or `default` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns the [`CaseError`] carried by the first match, if it failed.
    pub fn get_or_else(&self, default: R) -> Result<R, CaseError>
    where
        R: Clone,
    {
        Ok(self.get()?.cloned().unwrap_or(default))
    }

    /// The subject being matched.
    #[must_use]
    pub fn subject(&self) -> &S {
        &self.subject
    }

    /// The cases in evaluation order.
    #[must_use]
    pub fn cases(&self) -> &[Case<S, R>] {
        &self.cases
    }

    /// Returns the number of cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns `true` if there are no cases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl<S: Debug, R> Debug for Matcher<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("subject", &self.subject)
            .field("cases_len", &self.cases.len())
            .field("first_match_cached", &self.first_match.get().is_some())
            .field("all_matches_cached", &self.all_matches.get().is_some())
            .finish()
    }
}

// Note: No unsafe impl needed: `Matcher<S, R>` is `Send + Sync` whenever
// `S` and `R` are: cases are always `Send + Sync` and `OnceLock<T>` is
// `Sync` for `T: Send + Sync`.

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Construction phase of a [`Matcher`]: append-only list of cases.
pub struct MatcherBuilder<S, R> {
    subject: S,
    cases: Vec<Case<S, R>>,
}

impl<S: Reflect, R> MatcherBuilder<S, R> {
    /// Start a case with any predicate.
    pub fn match_case(self, predicate: impl Into<MatchPredicate>) -> CaseAppender<S, R> {
        CaseAppender {
            builder: self,
            predicate: predicate.into(),
        }
    }

    /// Start a case matching subjects whose exact type is `T`.
    pub fn match_type<T: Any>(self) -> CaseAppender<S, R> {
        self.match_case(TypeMatch::of::<T>())
    }

    /// Start a case matching subjects whose declared fields satisfy
    /// `fields`.
    pub fn match_fields(
        self,
        fields: impl IntoIterator<Item = FieldRequirement>,
    ) -> CaseAppender<S, R> {
        self.match_case(DestructuredMatch::new(fields))
    }

    /// Start a case matching when `f` returns `true`.
    pub fn match_when<F>(self, f: F) -> CaseAppender<S, R>
    where
        F: Fn(Option<&dyn Reflect>) -> bool + Send + Sync + 'static,
    {
        self.match_case(PredicateMatch::new(f))
    }

    /// Start a case matching subjects equal to `value`.
    pub fn match_value<T>(self, value: T) -> CaseAppender<S, R>
    where
        T: Reflect + PartialEq,
    {
        self.match_case(ValueMatch::of(value))
    }

    /// Start a case matching a null subject.
    pub fn match_null(self) -> CaseAppender<S, R> {
        self.match_case(ValueMatch::null())
    }

    /// Number of cases appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns `true` if no case has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Validate and freeze the cases.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::TooManyCases`] if more than [`MAX_CASES`] cases
    /// - any error from [`MatchPredicate::validate`]
    pub fn build(self) -> Result<Matcher<S, R>, MatcherError> {
        if self.cases.len() > MAX_CASES {
            return Err(MatcherError::TooManyCases {
                count: self.cases.len(),
                max: MAX_CASES,
            });
        }
        for case in &self.cases {
            case.predicate().validate()?;
        }
        debug!(cases = self.cases.len(), subject = ?self.subject, "matcher built");
        Ok(Matcher {
            subject: self.subject,
            cases: self.cases,
            first_match: OnceLock::new(),
            all_matches: OnceLock::new(),
        })
    }
}

impl<S: Debug, R> Debug for MatcherBuilder<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherBuilder")
            .field("subject", &self.subject)
            .field("cases_len", &self.cases.len())
            .finish()
    }
}

/// A pending case: the predicate is chosen, the action is not.
#[must_use = "a case is only appended once an action is supplied"]
pub struct CaseAppender<S, R> {
    builder: MatcherBuilder<S, R>,
    predicate: MatchPredicate,
}

impl<S: Reflect, R> CaseAppender<S, R> {
    /// Append the case with an infallible action.
    pub fn action<F>(self, f: F) -> MatcherBuilder<S, R>
    where
        F: Fn(&S) -> R + Send + Sync + 'static,
    {
        self.try_action(move |s: &S| Ok::<_, BoxError>(f(s)))
    }

    /// Append the case with a fallible action.
    ///
    /// An `Err` is recorded as an [`ActionError`](crate::ActionError)
    /// carrying the case index and subject.
    pub fn try_action<F, E>(self, f: F) -> MatcherBuilder<S, R>
    where
        F: Fn(&S) -> Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let mut builder = self.builder;
        builder.cases.push(Case::new(self.predicate, f));
        builder
    }
}

impl<S, R> Debug for CaseAppender<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseAppender")
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MatchKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn int_matcher(subject: i32) -> Matcher<i32, &'static str> {
        Matcher::match_for(subject)
            .match_type::<String>()
            .action(|_| "str")
            .match_type::<i32>()
            .action(|_| "int")
            .match_when(|_| true)
            .action(|_| "any")
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let matcher = int_matcher(5);
        let first = matcher.first_match().unwrap();
        assert_eq!(first.index(), 1);
        assert_eq!(first.kind(), MatchKind::Type);
        assert_eq!(first.value(), Some(&"int"));
    }

    #[test]
    fn test_all_matches_omits_false_cases() {
        let matcher = int_matcher(5);
        let all = matcher.all_matches();
        assert_eq!(all.indices(), vec![1, 2]);
        assert_eq!(all.values().copied().collect::<Vec<_>>(), vec!["int", "any"]);
    }

    #[test]
    fn test_no_match() {
        let matcher: Matcher<i32, ()> = Matcher::match_for(5)
            .match_value(6_i32)
            .action(|_| ())
            .build()
            .unwrap();
        assert!(matcher.first_match().is_none());
        assert!(matcher.all_matches().is_empty());
        assert_eq!(matcher.get().unwrap(), None);
    }

    #[test]
    fn test_empty_matcher() {
        let matcher: Matcher<i32, ()> = Matcher::match_for(5).build().unwrap();
        assert!(matcher.is_empty());
        assert!(matcher.first_match().is_none());
        assert!(matcher.all_matches().is_empty());
    }

    #[test]
    fn test_get_or_else_default() {
        let matcher: Matcher<i32, &str> = Matcher::match_for(5)
            .match_value(1_i32)
            .action(|_| "one")
            .build()
            .unwrap();
        assert_eq!(matcher.get_or_else("other").unwrap(), "other");
    }

    #[test]
    fn test_get_or_else_match() {
        assert_eq!(int_matcher(5).get_or_else("other").unwrap(), "int");
    }

    #[test]
    fn test_action_failure() {
        let matcher: Matcher<i32, i32> = Matcher::match_for(5)
            .match_type::<i32>()
            .try_action(|_| Err::<i32, _>("boom"))
            .match_when(|_| true)
            .action(|n| *n)
            .build()
            .unwrap();

        let first = matcher.first_match().unwrap();
        assert_eq!(first.index(), 0);
        assert!(first.value().is_none());
        assert!(matches!(first.error(), Some(CaseError::Action(_))));

        let err = matcher.get().unwrap_err();
        assert_eq!(err.index(), 0);
        let msg = err.to_string();
        assert!(msg.contains("index 0"), "got: {msg}");
        assert!(msg.contains("subject 5"), "got: {msg}");

        assert!(matcher.get_or_else(0).is_err());
    }

    #[test]
    fn test_predicate_failure_stops_first_match() {
        let matcher: Matcher<i32, &str> = Matcher::match_for(5)
            .match_case(PredicateMatch::try_new(|_| Err::<Option<bool>, _>("nope")))
            .action(|_| "unreachable")
            .match_type::<i32>()
            .action(|_| "int")
            .build()
            .unwrap();

        let first = matcher.first_match().unwrap();
        assert_eq!(first.index(), 0);
        assert!(first.error().is_some_and(CaseError::is_predicate));
        assert!(matcher.get().unwrap_err().is_predicate());
    }

    #[test]
    fn test_predicate_failure_does_not_abort_all_matches() {
        let matcher: Matcher<i32, &str> = Matcher::match_for(5)
            .match_case(PredicateMatch::try_new(|_| Err::<Option<bool>, _>("nope")))
            .action(|_| "unreachable")
            .match_type::<String>()
            .action(|_| "str")
            .match_type::<i32>()
            .action(|_| "int")
            .build()
            .unwrap();

        let all = matcher.all_matches();
        assert_eq!(all.indices(), vec![0, 2]);
        assert!(all.as_slice()[0].error().is_some());
        assert_eq!(all.as_slice()[1].value(), Some(&"int"));
    }

    #[test]
    fn test_memoized_first_match_runs_action_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let matcher: Matcher<i32, usize> = Matcher::match_for(5)
            .match_type::<i32>()
            .action(move |_| counter.fetch_add(1, Ordering::SeqCst))
            .build()
            .unwrap();

        let a = matcher.first_match().unwrap();
        let b = matcher.first_match().unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memoized_all_matches_runs_action_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let matcher: Matcher<i32, usize> = Matcher::match_for(5)
            .match_when(|_| true)
            .action(move |_| counter.fetch_add(1, Ordering::SeqCst))
            .build()
            .unwrap();

        let a = matcher.all_matches();
        let b = matcher.all_matches();
        assert!(std::ptr::eq(a, b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_null_subject() {
        let matcher: Matcher<Option<i32>, &str> = Matcher::match_for(None)
            .match_type::<i32>()
            .action(|_| "int")
            .match_null()
            .action(|_| "null")
            .build()
            .unwrap();
        assert_eq!(matcher.get().unwrap(), Some(&"null"));
    }

    #[test]
    fn test_some_subject_matches_inner_type() {
        let matcher: Matcher<Option<i32>, i32> = Matcher::match_for(Some(4))
            .match_type::<i32>()
            .action(|n| n.unwrap_or_default() * 2)
            .build()
            .unwrap();
        assert_eq!(matcher.get().unwrap(), Some(&8));
    }

    #[test]
    fn test_match_value_wrapped_expected() {
        let matcher: Matcher<Option<i32>, &str> = Matcher::match_for(None)
            .match_value(Some(0_i32))
            .action(|_| "zero")
            .match_value(None::<i32>)
            .action(|_| "none")
            .build()
            .unwrap();
        assert_eq!(matcher.get().unwrap(), Some(&"none"));

        let matcher: Matcher<Option<i32>, &str> = Matcher::match_for(Some(0))
            .match_value(None::<i32>)
            .action(|_| "none")
            .match_value(Some(0_i32))
            .action(|_| "zero")
            .build()
            .unwrap();
        assert_eq!(matcher.get().unwrap(), Some(&"zero"));
    }

    #[test]
    fn test_build_rejects_incomparable_value() {
        #[derive(Debug, PartialEq)]
        struct Token {
            id: u32,
        }
        crate::reflect_struct!(Token { id });

        let result: Result<Matcher<Token, ()>, _> = Matcher::match_for(Token { id: 1 })
            .match_value(Arc::new(Token { id: 1 }))
            .action(|_| ())
            .build();
        assert!(matches!(
            result,
            Err(MatcherError::IncomparableValue { .. })
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_fields() {
        let result: Result<Matcher<i32, ()>, _> = Matcher::match_for(5)
            .match_fields([
                FieldRequirement::new("x", TypeMatch::of::<i32>()),
                FieldRequirement::new("x", TypeMatch::of::<i32>()),
            ])
            .action(|_| ())
            .build();
        assert_eq!(
            result.unwrap_err(),
            MatcherError::DuplicateField { field: "x".into() }
        );
    }

    #[test]
    fn test_build_rejects_too_many_cases() {
        let mut builder: MatcherBuilder<i32, ()> = Matcher::match_for(5);
        for _ in 0..=MAX_CASES {
            builder = builder.match_when(|_| false).action(|_| ());
        }
        assert_eq!(builder.len(), MAX_CASES + 1);
        assert!(matches!(
            builder.build(),
            Err(MatcherError::TooManyCases { .. })
        ));
    }

    #[test]
    fn test_new_from_cases() {
        let matcher = Matcher::new(
            "hi",
            vec![Case::new(TypeMatch::of::<&str>(), |s: &&str| {
                Ok::<_, BoxError>(s.len())
            })],
        )
        .unwrap();
        assert_eq!(matcher.len(), 1);
        assert_eq!(matcher.get().unwrap(), Some(&2));
    }

    #[test]
    fn test_matcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Matcher<i32, String>>();
    }
}
