//! `Case`: Predicate + action combination
//!
//! A `Case` binds a [`MatchPredicate`] to the action that runs when it
//! matches. A [`Matcher`](crate::Matcher) holds an ordered list of cases;
//! position in the list is evaluation priority.

use crate::{ActionError, BoxError, BreakResult, CaseError, MatchPredicate, Reflect};
use std::fmt::{self, Debug};
use std::sync::Arc;
use tracing::{debug, trace};

type ActionFn<S, R> = dyn Fn(&S) -> Result<R, BoxError> + Send + Sync;

/// A case: predicate + action.
///
/// # Type Parameters
///
/// - `S`: The subject type
/// - `R`: The value the action produces
pub struct Case<S, R> {
    predicate: MatchPredicate,
    action: Arc<ActionFn<S, R>>,
}

impl<S, R> Case<S, R> {
    /// Create a case from a predicate and a fallible action.
    pub fn new<F, E>(predicate: impl Into<MatchPredicate>, action: F) -> Self
    where
        F: Fn(&S) -> Result<R, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            predicate: predicate.into(),
            action: Arc::new(move |s: &S| action(s).map_err(Into::<BoxError>::into)),
        }
    }

    /// The predicate of this case.
    #[must_use]
    pub fn predicate(&self) -> &MatchPredicate {
        &self.predicate
    }
}

impl<S: Reflect, R> Case<S, R> {
    /// Run this case against the subject.
    ///
    /// Returns `None` when the predicate is plainly `false`. Otherwise returns
    /// the recorded outcome: the action's value, the action's failure, or the
    /// predicate's failure (in which case the action is not invoked).
    pub(crate) fn evaluate(&self, index: usize, subject: &S) -> Option<BreakResult<R>> {
        let kind = self.predicate.kind();
        match self.predicate.evaluate(subject.as_subject()) {
            Ok(false) => {
                trace!(index, %kind, "case did not match");
                None
            }
            Ok(true) => {
                let outcome = (self.action)(subject).map_err(|source| {
                    let err = ActionError::new(index, subject, source);
                    debug!(index, %kind, error = %err, "action failed");
                    CaseError::Action(err)
                });
                trace!(index, %kind, ok = outcome.is_ok(), "case matched");
                Some(BreakResult::new(index, kind, outcome))
            }
            Err(source) => {
                debug!(index, %kind, error = %source, "predicate failed");
                Some(BreakResult::new(
                    index,
                    kind,
                    Err(CaseError::Predicate { index, source }),
                ))
            }
        }
    }
}

impl<S, R> Clone for Case<S, R> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            action: Arc::clone(&self.action),
        }
    }
}

impl<S, R> Debug for Case<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}
