//! Evaluation errors: the two failure tiers recorded per case
//!
//! A case can fail in two observably different ways:
//!
//! - [`PredicateError`]: the match test itself could not be computed
//!   (a predicate function returned an error, a field read was denied).
//! - [`ActionError`]: the predicate matched but the bound action failed.
//!
//! Both are carried as data inside a [`BreakResult`](crate::BreakResult) as a
//! [`CaseError`]. Only [`Matcher::get`](crate::Matcher::get) and
//! [`Matcher::get_or_else`](crate::Matcher::get_or_else) hand them back as `Err`.
//!
//! User errors are stored behind `Arc` so every error here is `Clone`: the
//! memoized result owns the original and callers receive copies.

use std::error::Error;
use std::fmt::Debug;
use std::sync::Arc;

/// Boxed error returned by user predicate and action functions.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Shared form of [`BoxError`] kept inside cached results.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// A field could not be read from a subject.
///
/// Returned by [`Reflect::read_field`](crate::Reflect::read_field).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldAccessError {
    /// The type does not declare a field with this name.
    #[error("field `{field}` is not declared")]
    Undeclared {
        /// The requested field name.
        field: String,
    },
    /// The field is declared but its value cannot be produced.
    #[error("field `{field}` cannot be read: {reason}")]
    Denied {
        /// The requested field name.
        field: String,
        /// Why the read was refused.
        reason: String,
    },
}

impl FieldAccessError {
    /// Create a [`FieldAccessError::Denied`].
    pub fn denied(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Denied {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The field name the failed read was for.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Undeclared { field } | Self::Denied { field, .. } => field,
        }
    }
}

/// The match test could not be computed.
///
/// Never conflated with a plain non-match: a predicate that returns `false`
/// produces no entry at all, a predicate that fails produces an entry
/// carrying this error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PredicateError {
    /// A user predicate function returned an error.
    #[error("predicate function failed: {source}")]
    Function {
        /// The error returned by the function.
        source: SharedError,
    },
    /// Reading a required field during destructuring failed.
    #[error("failed to read field `{field}` of `{type_name}`: {source}")]
    FieldAccess {
        /// Concrete type of the value being destructured.
        type_name: &'static str,
        /// The field that could not be read.
        field: String,
        /// The underlying access failure.
        source: FieldAccessError,
    },
}

impl PredicateError {
    pub(crate) fn function(source: BoxError) -> Self {
        Self::Function {
            source: Arc::from(source),
        }
    }
}

/// The action bound to a matched case failed.
///
/// Carries the case index and a `Debug` rendering of the subject so the
/// failure can be diagnosed without access to the matcher.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to evaluate action at index {index} for subject {subject}: {source}")]
pub struct ActionError {
    /// Position of the case in the matcher.
    pub index: usize,
    /// `Debug` rendering of the subject the action ran on.
    pub subject: String,
    /// The error returned by the action.
    pub source: SharedError,
}

impl ActionError {
    pub(crate) fn new(index: usize, subject: &dyn Debug, source: BoxError) -> Self {
        Self {
            index,
            subject: format!("{subject:?}"),
            source: Arc::from(source),
        }
    }
}

/// The error carried by a [`BreakResult`](crate::BreakResult).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaseError {
    /// The predicate of case `index` could not be evaluated; its action was
    /// not invoked.
    #[error("predicate at index {index} failed to evaluate: {source}")]
    Predicate {
        /// Position of the case in the matcher.
        index: usize,
        /// The predicate failure.
        source: PredicateError,
    },
    /// The predicate matched but the action failed.
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl CaseError {
    /// Position of the failing case.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Predicate { index, .. } => *index,
            Self::Action(e) => e.index,
        }
    }

    /// Returns `true` if the predicate failed.
    #[must_use]
    pub fn is_predicate(&self) -> bool {
        matches!(self, Self::Predicate { .. })
    }

    /// Returns `true` if the action failed.
    #[must_use]
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }
}
