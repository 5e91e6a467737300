//! casematch - Structural pattern matching over runtime values
//!
//! Bind a subject to an ordered list of cases, each a predicate paired with
//! an action, and evaluate them first-match-wins or all-matches.
//!
//! # Architecture
//!
//! - [`Reflect`]: The introspection capability subjects provide: exact type,
//!   null normalization, declared fields
//! - [`MatchPredicate`]: Closed set of tests: [`TypeMatch`], [`ValueMatch`],
//!   [`PredicateMatch`], [`DestructuredMatch`]
//! - [`Case<S, R>`]: Predicate + action
//! - [`MatcherBuilder<S, R>`]: Construction phase, append-only
//! - [`Matcher<S, R>`]: Frozen subject + cases, memoized evaluation
//! - [`BreakResult<R>`] / [`AggregatedResult<R>`]: Outcome records
//!
//! # Key Design Insights
//!
//! 1. **Failures are data**: [`Matcher::first_match`] and
//!    [`Matcher::all_matches`] never fail. A case whose predicate cannot be
//!    evaluated, or whose action fails, is recorded with a [`CaseError`].
//!
//! 2. **Failure is not `false`**: a predicate returning `false` leaves no
//!    record; a predicate that fails (including a denied field read) always
//!    does.
//!
//! 3. **Build, then evaluate**: cases are frozen by [`MatcherBuilder::build`];
//!    a built matcher cannot change, so its memoized results cannot go stale.
//!
//! # Example
//!
//! ```
//! use casematch::prelude::*;
//!
//! #[derive(Debug)]
//! struct Point { x: i32, y: i32 }
//! reflect_struct!(Point { x, y });
//!
//! let matcher = Matcher::match_for(Point { x: 0, y: 7 })
//!     .match_type::<String>()
//!     .action(|_| "a string".to_string())
//!     .match_fields([FieldRequirement::new("x", ValueMatch::of(0_i32))])
//!     .action(|p| format!("on the y axis at {}", p.y))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(matcher.get().unwrap().map(String::as_str), Some("on the y axis at 7"));
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod case;
mod destructure;
mod error;
mod matcher;
mod predicate;
mod reflect;
mod result;
mod trace;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use case::Case;
pub use destructure::{DestructuredMatch, FieldRequirement};
pub use matcher::{CaseAppender, Matcher, MatcherBuilder};
pub use predicate::{MatchKind, MatchPredicate, PredicateMatch, TypeMatch, ValueMatch};
pub use reflect::Reflect;
pub use result::{AggregatedResult, BreakResult};

// Evaluation errors
pub use error::{
    ActionError, BoxError, CaseError, FieldAccessError, PredicateError, SharedError,
};

// Trace types
pub use trace::{CaseOutcome, CaseTrace, EvalTrace};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use casematch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        reflect_struct,
        reflect_value,
        // Results
        AggregatedResult,
        BreakResult,
        // Core types
        Case,
        CaseAppender,
        // Errors
        CaseError,
        DestructuredMatch,
        FieldRequirement,
        MatchKind,
        MatchPredicate,
        Matcher,
        MatcherBuilder,
        MatcherError,
        PredicateMatch,
        Reflect,
        TypeMatch,
        ValueMatch,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth of a predicate.
///
/// Leaves count 1; each destructuring level adds 1. Protects the recursive
/// evaluator from stack overflow. Checked by [`MatcherBuilder::build`].
pub const MAX_DEPTH: usize = 32;

/// Maximum number of cases in a single [`Matcher`].
pub const MAX_CASES: usize = 256;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from matcher construction and validation.
///
/// These are caught by [`MatcherBuilder::build`], before any evaluation.
/// Fix the cases and rebuild.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatcherError {
    /// A destructured match requires the same field more than once.
    #[error("destructured match requires field `{field}` more than once")]
    DuplicateField {
        /// The repeated field name.
        field: String,
    },
    /// Predicate nesting exceeds [`MAX_DEPTH`].
    #[error(
        "predicate nesting depth is {depth}, but maximum allowed is {max}; \
         reduce destructuring depth"
    )]
    DepthExceeded {
        /// Actual depth of the predicate.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },
    /// A wrapped expected value (`Some(x)`, `Box<X>`, `Arc<X>`) whose
    /// contents provide no [`Reflect::eq_value`].
    #[error(
        "expected value of type `{type_name}` has no equality; \
         implement `Reflect::eq_value` or use `reflect_struct!(.., PartialEq)`"
    )]
    IncomparableValue {
        /// Type of the wrapped contents.
        type_name: String,
    },
    /// Too many cases in a single `Matcher`.
    #[error("matcher has {count} cases, but maximum allowed is {max}")]
    TooManyCases {
        /// Actual count of cases.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
}
