//! `MatchPredicate`: The four ways a case can test its subject
//!
//! A predicate is evaluated against a null-normalized subject
//! (`Option<&dyn Reflect>`) and yields one of three observable outcomes:
//!
//! - `Ok(true)`: the subject satisfies the predicate
//! - `Ok(false)`: it does not
//! - `Err(PredicateError)`: the test could not be computed
//!
//! Only [`PredicateMatch`] and [`DestructuredMatch`] can fail.

use crate::{
    BoxError, DestructuredMatch, MatcherError, PredicateError, Reflect, MAX_DEPTH,
};
use std::any::{Any, TypeId};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Which variant of [`MatchPredicate`] produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum MatchKind {
    /// Exact runtime type.
    Type,
    /// Value equality.
    Value,
    /// User function.
    Predicate,
    /// Named fields.
    Destructured,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Type => "type",
            Self::Value => "value",
            Self::Predicate => "predicate",
            Self::Destructured => "destructured",
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TypeMatch
// ═══════════════════════════════════════════════════════════════════════════════

/// Matches when the subject's exact runtime type is `T`.
///
/// This is type identity, not compatibility: a newtype wrapping `T` does not
/// match `TypeMatch::of::<T>()`. A null subject never matches.
///
/// ```
/// use casematch::{Reflect, TypeMatch};
///
/// let m = TypeMatch::of::<i32>();
/// assert!(m.matches(Some(&5_i32 as &dyn Reflect)));
/// assert!(!m.matches(Some(&5_i64 as &dyn Reflect)));
/// assert!(!m.matches(None));
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TypeMatch {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeMatch {
    /// Match subjects whose concrete type is exactly `T`.
    ///
    /// Subjects are null-normalized before the comparison, so `Option<T>`,
    /// `Box<T>` and `Arc<T>` are never seen as such: name the contained type
    /// instead. `TypeMatch::of::<Option<i32>>()` matches nothing, while
    /// `TypeMatch::of::<i32>()` matches `Some(5)`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The expected type's name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the subject is non-null and exactly the expected type.
    #[must_use]
    pub fn matches(&self, subject: Option<&dyn Reflect>) -> bool {
        subject.is_some_and(|s| s.concrete_type_id() == self.type_id)
    }
}

impl Debug for TypeMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeMatch").field(&self.type_name).finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ValueMatch
// ═══════════════════════════════════════════════════════════════════════════════

/// Erased expected value.
trait ExpectedValue: Send + Sync + Debug {
    fn as_reflect(&self) -> &dyn Reflect;

    /// `expected` is `self` after null normalization; `subject` has the
    /// same concrete type.
    fn eq_normalized(&self, expected: &dyn Reflect, subject: &dyn Reflect) -> bool;
}

impl<T: Reflect + PartialEq> ExpectedValue for T {
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    fn eq_normalized(&self, expected: &dyn Reflect, subject: &dyn Reflect) -> bool {
        match subject.downcast_ref::<T>() {
            Some(subject) => subject == self,
            None => expected.eq_value(subject).unwrap_or(false),
        }
    }
}

/// Matches when the subject equals an expected value.
///
/// Null-safe and symmetric: the expected value is normalized exactly like
/// the subject, so `None` is null and `Some(x)`, `Box<X>` and `Arc<X>`
/// compare as `x`. Null equals null, null never equals a value, and two
/// values are equal only if they have the same exact type and that type's
/// `PartialEq` says so.
///
/// ```
/// use casematch::{Reflect, ValueMatch};
///
/// assert!(ValueMatch::of(5_i32).matches(Some(&5_i32 as &dyn Reflect)));
/// assert!(ValueMatch::of(Some(5_i32)).matches(Some(&5_i32 as &dyn Reflect)));
/// assert!(ValueMatch::of(None::<i32>).matches(None));
/// assert!(!ValueMatch::null().matches(Some(&5_i32 as &dyn Reflect)));
/// ```
#[derive(Clone)]
pub struct ValueMatch {
    expected: Arc<dyn ExpectedValue>,
}

impl ValueMatch {
    /// Match subjects equal to `value`.
    pub fn of<T: Reflect + PartialEq>(value: T) -> Self {
        Self {
            expected: Arc::new(value),
        }
    }

    /// Match null subjects only.
    #[must_use]
    pub fn null() -> Self {
        Self::of(None::<()>)
    }

    /// `Some(v)` behaves like [`of`](Self::of), `None` like [`null`](Self::null).
    pub fn from_option<T: Reflect + PartialEq>(value: Option<T>) -> Self {
        Self::of(value)
    }

    /// Returns `true` if the expected value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.expected.as_reflect().as_subject().is_none()
    }

    /// Null-safe equality against the subject.
    #[must_use]
    pub fn matches(&self, subject: Option<&dyn Reflect>) -> bool {
        match (self.expected.as_reflect().as_subject(), subject) {
            (None, None) => true,
            (Some(expected), Some(subject)) => {
                expected.concrete_type_id() == subject.concrete_type_id()
                    && self.expected.eq_normalized(expected, subject)
            }
            _ => false,
        }
    }

    /// Wrapped expected values compare through [`Reflect::eq_value`]; reject
    /// those whose contents have no equality, since they could never match.
    pub(crate) fn validate(&self) -> Result<(), MatcherError> {
        let outer = self.expected.as_reflect();
        match outer.as_subject() {
            Some(inner)
                if inner.concrete_type_id() != outer.concrete_type_id()
                    && inner.eq_value(inner).is_none() =>
            {
                Err(MatcherError::IncomparableValue {
                    type_name: inner.type_name().to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Debug for ValueMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected.as_reflect().as_subject() {
            Some(v) => f.debug_tuple("ValueMatch").field(&v).finish(),
            None => f.write_str("ValueMatch(null)"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PredicateMatch
// ═══════════════════════════════════════════════════════════════════════════════

type PredicateFn = dyn Fn(Option<&dyn Reflect>) -> Result<Option<bool>, BoxError> + Send + Sync;

/// Matches when a user function says so.
///
/// The function sees the null-normalized subject. Returning an absent result
/// (`Ok(None)`) counts as `false`; returning `Err` is a predicate failure,
/// never a silent non-match.
///
/// ```
/// use casematch::{PredicateMatch, Reflect};
///
/// let even = PredicateMatch::on(|n: &i32| n % 2 == 0);
/// assert_eq!(even.evaluate(Some(&4_i32 as &dyn Reflect)).unwrap(), true);
/// assert_eq!(even.evaluate(Some(&"4" as &dyn Reflect)).unwrap(), false);
/// ```
#[derive(Clone)]
pub struct PredicateMatch {
    f: Arc<PredicateFn>,
}

impl PredicateMatch {
    /// Infallible predicate.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&dyn Reflect>) -> bool + Send + Sync + 'static,
    {
        Self::try_new(move |s| Ok::<_, BoxError>(Some(f(s))))
    }

    /// Predicate that may have no answer; `None` counts as `false`.
    pub fn partial<F>(f: F) -> Self
    where
        F: Fn(Option<&dyn Reflect>) -> Option<bool> + Send + Sync + 'static,
    {
        Self::try_new(move |s| Ok::<_, BoxError>(f(s)))
    }

    /// Fallible predicate. `Err` is recorded as a [`PredicateError::Function`].
    pub fn try_new<F, E>(f: F) -> Self
    where
        F: Fn(Option<&dyn Reflect>) -> Result<Option<bool>, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            f: Arc::new(move |s: Option<&dyn Reflect>| f(s).map_err(Into::<BoxError>::into)),
        }
    }

    /// Typed predicate: subjects that are null or not exactly `T` do not match.
    pub fn on<T, F>(f: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::new(move |s| s.and_then(<dyn Reflect>::downcast_ref::<T>).is_some_and(&f))
    }

    /// Apply the function.
    ///
    /// # Errors
    ///
    /// [`PredicateError::Function`] if the function returned an error.
    pub fn evaluate(&self, subject: Option<&dyn Reflect>) -> Result<bool, PredicateError> {
        match (self.f)(subject) {
            Ok(answer) => Ok(answer.unwrap_or(false)),
            Err(e) => Err(PredicateError::function(e)),
        }
    }
}

impl Debug for PredicateMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateMatch(<fn>)")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MatchPredicate
// ═══════════════════════════════════════════════════════════════════════════════

/// The test half of a case.
///
/// A closed set of variants dispatched with `match`; there is no downcasting
/// of predicate payloads.
///
/// # Variants
///
/// - `Type`: exact runtime type ([`TypeMatch`])
/// - `Value`: null-safe equality ([`ValueMatch`])
/// - `Predicate`: user function ([`PredicateMatch`])
/// - `Destructured`: named fields with nested predicates ([`DestructuredMatch`])
#[derive(Clone)]
pub enum MatchPredicate {
    /// Exact runtime type.
    Type(TypeMatch),
    /// Value equality.
    Value(ValueMatch),
    /// User function.
    Predicate(PredicateMatch),
    /// Named fields.
    Destructured(DestructuredMatch),
}

impl MatchPredicate {
    /// Evaluate against a null-normalized subject.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError`] when the test cannot be computed: a
    /// predicate function failed, or a required field could not be read.
    pub fn evaluate(&self, subject: Option<&dyn Reflect>) -> Result<bool, PredicateError> {
        match self {
            Self::Type(m) => Ok(m.matches(subject)),
            Self::Value(m) => Ok(m.matches(subject)),
            Self::Predicate(m) => m.evaluate(subject),
            Self::Destructured(m) => m.evaluate(subject),
        }
    }

    /// Evaluate against any subject, normalizing null first.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate`](Self::evaluate).
    pub fn matches<S: Reflect + ?Sized>(&self, subject: &S) -> Result<bool, PredicateError> {
        self.evaluate(subject.as_subject())
    }

    /// Which variant this is.
    #[must_use]
    pub fn kind(&self) -> MatchKind {
        match self {
            Self::Type(_) => MatchKind::Type,
            Self::Value(_) => MatchKind::Value,
            Self::Predicate(_) => MatchKind::Predicate,
            Self::Destructured(_) => MatchKind::Destructured,
        }
    }

    /// Nesting depth: 1 for leaves, 1 + deepest field for destructured.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Destructured(m) => m.depth(),
            _ => 1,
        }
    }

    /// Check construction constraints.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::DepthExceeded`] if nesting is deeper than [`MAX_DEPTH`]
    /// - [`MatcherError::DuplicateField`] if a destructured match requires the
    ///   same field twice at any level
    /// - [`MatcherError::IncomparableValue`] if a wrapped expected value has
    ///   no equality
    pub fn validate(&self) -> Result<(), MatcherError> {
        let depth = self.depth();
        if depth > MAX_DEPTH {
            return Err(MatcherError::DepthExceeded {
                depth,
                max: MAX_DEPTH,
            });
        }
        match self {
            Self::Value(m) => m.validate(),
            Self::Destructured(m) => m.validate_fields(),
            _ => Ok(()),
        }
    }
}

impl Debug for MatchPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(m) => Debug::fmt(m, f),
            Self::Value(m) => Debug::fmt(m, f),
            Self::Predicate(m) => Debug::fmt(m, f),
            Self::Destructured(m) => Debug::fmt(m, f),
        }
    }
}

impl From<TypeMatch> for MatchPredicate {
    fn from(m: TypeMatch) -> Self {
        Self::Type(m)
    }
}

impl From<ValueMatch> for MatchPredicate {
    fn from(m: ValueMatch) -> Self {
        Self::Value(m)
    }
}

impl From<PredicateMatch> for MatchPredicate {
    fn from(m: PredicateMatch) -> Self {
        Self::Predicate(m)
    }
}

impl From<DestructuredMatch> for MatchPredicate {
    fn from(m: DestructuredMatch) -> Self {
        Self::Destructured(m)
    }
}

// Note: No unsafe impl needed: every payload is `Send + Sync` (function
// payloads are `Arc<dyn Fn + Send + Sync>`).
