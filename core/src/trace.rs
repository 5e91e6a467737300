//! Evaluation trace types for debugging matcher behavior.
//!
//! [`Matcher::evaluate_with_trace`](crate::Matcher::evaluate_with_trace)
//! tests every case's predicate against the subject and records what
//! happened, without invoking any action and without touching the memoized
//! results.
//!
//! # Example
//!
//! ```
//! use casematch::{CaseOutcome, Matcher};
//!
//! let matcher = Matcher::match_for(5_i32)
//!     .match_type::<String>()
//!     .action(|_| "str")
//!     .match_value(5_i32)
//!     .action(|_| "five")
//!     .build()
//!     .unwrap();
//!
//! let trace = matcher.evaluate_with_trace();
//! assert_eq!(trace.first_match, Some(1));
//! assert_eq!(trace.steps[0].outcome, CaseOutcome::NotMatched);
//! for step in &trace.steps {
//!     println!("  case[{}] ({}): {:?}", step.index, step.kind, step.outcome);
//! }
//! ```

use crate::{Matcher, MatchKind, Reflect};
use std::fmt;

/// What a case's predicate did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "outcome", content = "error", rename_all = "snake_case")
)]
pub enum CaseOutcome {
    /// The predicate matched; the action would run.
    Matched,
    /// The predicate returned `false`.
    NotMatched,
    /// The predicate could not be evaluated (error message).
    PredicateFailed(String),
}

impl CaseOutcome {
    /// Returns `true` if this case would be recorded by
    /// [`Matcher::all_matches`](crate::Matcher::all_matches).
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        !matches!(self, Self::NotMatched)
    }
}

/// Trace of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CaseTrace {
    /// Position of the case.
    pub index: usize,
    /// Predicate variant.
    pub kind: MatchKind,
    /// What the predicate did.
    pub outcome: CaseOutcome,
}

/// Trace of a full [`Matcher`] evaluation.
///
/// # INV: `recorded()` == `all_matches()` indices
///
/// The indices of steps that matched or failed are exactly the indices
/// [`Matcher::all_matches`] records, and `first_match` is the index
/// [`Matcher::first_match`] stops at.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EvalTrace {
    /// `Debug` rendering of the subject.
    pub subject: String,
    /// One step per case, in order. No short-circuit.
    pub steps: Vec<CaseTrace>,
    /// Index of the first matched or failed case.
    pub first_match: Option<usize>,
}

impl EvalTrace {
    /// Indices of the cases that matched or failed.
    #[must_use]
    pub fn recorded(&self) -> Vec<usize> {
        self.steps
            .iter()
            .filter(|s| s.outcome.is_recorded())
            .map(|s| s.index)
            .collect()
    }
}

impl fmt::Display for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "subject: {}", self.subject)?;
        for step in &self.steps {
            let marker = if Some(step.index) == self.first_match {
                "*"
            } else {
                " "
            };
            match &step.outcome {
                CaseOutcome::Matched => {
                    writeln!(f, "{marker} [{}] {}: matched", step.index, step.kind)?;
                }
                CaseOutcome::NotMatched => {
                    writeln!(f, "{marker} [{}] {}: no match", step.index, step.kind)?;
                }
                CaseOutcome::PredicateFailed(e) => {
                    writeln!(f, "{marker} [{}] {}: failed: {e}", step.index, step.kind)?;
                }
            }
        }
        Ok(())
    }
}

impl<S: Reflect, R> Matcher<S, R> {
    /// Evaluate every predicate with a full trace.
    ///
    /// Unlike [`first_match`](Self::first_match) this never short-circuits,
    /// never runs actions, and is recomputed on each call.
    #[must_use]
    pub fn evaluate_with_trace(&self) -> EvalTrace {
        let subject = self.subject();
        let steps: Vec<CaseTrace> = self
            .cases()
            .iter()
            .enumerate()
            .map(|(index, case)| {
                let predicate = case.predicate();
                let outcome = match predicate.evaluate(subject.as_subject()) {
                    Ok(true) => CaseOutcome::Matched,
                    Ok(false) => CaseOutcome::NotMatched,
                    Err(e) => CaseOutcome::PredicateFailed(e.to_string()),
                };
                CaseTrace {
                    index,
                    kind: predicate.kind(),
                    outcome,
                }
            })
            .collect();
        let first_match = steps
            .iter()
            .find(|s| s.outcome.is_recorded())
            .map(|s| s.index);
        EvalTrace {
            subject: format!("{subject:?}"),
            steps,
            first_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PredicateMatch;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn matcher(calls: Arc<AtomicUsize>) -> Matcher<i32, ()> {
        Matcher::match_for(5)
            .match_type::<String>()
            .action(|_| ())
            .match_case(PredicateMatch::try_new(|_| Err::<Option<bool>, _>("nope")))
            .action(|_| ())
            .match_type::<i32>()
            .action(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_trace_records_every_case() {
        let calls = Arc::new(AtomicUsize::new(0));
        let trace = matcher(Arc::clone(&calls)).evaluate_with_trace();

        assert_eq!(trace.subject, "5");
        assert_eq!(trace.steps.len(), 3);
        assert_eq!(trace.steps[0].outcome, CaseOutcome::NotMatched);
        assert!(matches!(
            trace.steps[1].outcome,
            CaseOutcome::PredicateFailed(ref e) if e.contains("nope")
        ));
        assert_eq!(trace.steps[2].outcome, CaseOutcome::Matched);
        assert_eq!(trace.steps[2].kind, MatchKind::Type);
        assert_eq!(trace.first_match, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trace_agrees_with_evaluators() {
        let calls = Arc::new(AtomicUsize::new(0));
        let m = matcher(calls);
        let trace = m.evaluate_with_trace();
        assert_eq!(trace.recorded(), m.all_matches().indices());
        assert_eq!(trace.first_match, m.first_match().map(|r| r.index()));
    }

    #[test]
    fn test_trace_display_marks_first_match() {
        let calls = Arc::new(AtomicUsize::new(0));
        let rendered = matcher(calls).evaluate_with_trace().to_string();
        assert!(rendered.contains("* [1] predicate: failed"), "got:\n{rendered}");
        assert!(rendered.contains("  [2] type: matched"), "got:\n{rendered}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_trace_serializes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let trace = matcher(calls).evaluate_with_trace();
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["first_match"], 1);
        assert_eq!(json["steps"][2]["kind"], "type");
        assert_eq!(json["steps"][2]["outcome"]["outcome"], "matched");
        assert_eq!(json["steps"][1]["outcome"]["outcome"], "predicate_failed");
    }
}
