//! `DestructuredMatch`: Matching on named fields
//!
//! A destructured match asserts "the subject declares these fields, and each
//! of them satisfies its nested predicate"; fields it does not mention are
//! ignored.
//!
//! # Evaluation
//!
//! 1. Null subject → `false`.
//! 2. A required field the subject's type does not declare → `false`.
//! 3. Each declared field that has requirements is read and its nested
//!    predicates evaluated, in declaration order. The first `false` or
//!    failure ends evaluation.
//!
//! A field read that fails is a [`PredicateError::FieldAccess`], not a
//! non-match.

use crate::{MatchPredicate, MatcherError, PredicateError, Reflect};
use std::collections::HashSet;
use std::fmt::{self, Debug};

/// A named sub-pattern: the field `name` must satisfy `predicate`.
#[derive(Clone)]
pub struct FieldRequirement {
    name: String,
    predicate: MatchPredicate,
}

impl FieldRequirement {
    /// Require field `name` to satisfy `predicate`.
    pub fn new(name: impl Into<String>, predicate: impl Into<MatchPredicate>) -> Self {
        Self {
            name: name.into(),
            predicate: predicate.into(),
        }
    }

    /// The required field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nested predicate.
    #[must_use]
    pub fn predicate(&self) -> &MatchPredicate {
        &self.predicate
    }
}

impl Debug for FieldRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.name, self.predicate)
    }
}

/// Matches subjects whose declared fields satisfy per-field predicates.
///
/// # Example
///
/// ```
/// use casematch::{reflect_struct, DestructuredMatch, FieldRequirement, MatchPredicate, TypeMatch};
///
/// #[derive(Debug)]
/// struct Point { x: i32, y: String }
/// reflect_struct!(Point { x, y });
///
/// let m = MatchPredicate::from(DestructuredMatch::new([
///     FieldRequirement::new("x", TypeMatch::of::<i32>()),
/// ]));
///
/// assert!(m.matches(&Point { x: 5, y: "a".into() }).unwrap());
/// ```
#[derive(Clone, Default)]
pub struct DestructuredMatch {
    fields: Vec<FieldRequirement>,
}

impl DestructuredMatch {
    /// Create a destructured match from field requirements.
    ///
    /// Requirement names should be unique; [`MatchPredicate::validate`]
    /// reports duplicates.
    pub fn new(fields: impl IntoIterator<Item = FieldRequirement>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Add one more requirement.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, predicate: impl Into<MatchPredicate>) -> Self {
        self.fields.push(FieldRequirement::new(name, predicate));
        self
    }

    /// The field requirements in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[FieldRequirement] {
        &self.fields
    }

    /// Evaluate against a null-normalized subject.
    ///
    /// # Errors
    ///
    /// [`PredicateError::FieldAccess`] if a required field could not be read,
    /// or any error raised by a nested predicate.
    pub fn evaluate(&self, subject: Option<&dyn Reflect>) -> Result<bool, PredicateError> {
        let Some(subject) = subject else {
            return Ok(false);
        };

        let declared = subject.declared_fields();
        if self
            .fields
            .iter()
            .any(|req| !declared.iter().any(|&name| name == req.name))
        {
            return Ok(false);
        }

        for &name in declared {
            for req in self.fields.iter().filter(|req| req.name == name) {
                let value =
                    subject
                        .read_field(name)
                        .map_err(|source| PredicateError::FieldAccess {
                            type_name: subject.type_name(),
                            field: name.to_string(),
                            source,
                        })?;
                if !req.predicate.evaluate(value.as_subject())? {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    /// 1 + the deepest nested predicate.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|req| req.predicate.depth())
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn validate_fields(&self) -> Result<(), MatcherError> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        for req in &self.fields {
            if !seen.insert(req.name.as_str()) {
                return Err(MatcherError::DuplicateField {
                    field: req.name.clone(),
                });
            }
            req.predicate.validate()?;
        }
        Ok(())
    }
}

impl Debug for DestructuredMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DestructuredMatch")
            .field(&self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldAccessError, PredicateMatch, TypeMatch, ValueMatch, MAX_DEPTH};
    use std::any::Any;

    #[derive(Debug)]
    struct Pair<T> {
        x: T,
        y: &'static str,
    }

    crate::reflect_struct!(Pair<i32> { x, y });
    crate::reflect_struct!(Pair<&'static str> { x, y });

    #[derive(Debug)]
    struct Other {
        y: &'static str,
    }

    crate::reflect_struct!(Other { y });

    #[derive(Debug)]
    struct Line {
        start: Pair<i32>,
        end: Option<Pair<i32>>,
    }

    crate::reflect_struct!(Line { start, end });

    #[derive(Debug)]
    struct Locked;

    impl Reflect for Locked {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_subject(&self) -> Option<&dyn Reflect> {
            Some(self)
        }

        fn declared_fields(&self) -> &'static [&'static str] {
            &["x"]
        }

        fn read_field(&self, name: &str) -> Result<&dyn Reflect, FieldAccessError> {
            Err(FieldAccessError::denied(name, "locked"))
        }
    }

    fn x_is_int() -> MatchPredicate {
        DestructuredMatch::new([FieldRequirement::new("x", TypeMatch::of::<i32>())]).into()
    }

    #[test]
    fn test_matching_field() {
        assert!(x_is_int().matches(&Pair { x: 5_i32, y: "a" }).unwrap());
    }

    #[test]
    fn test_mismatching_field() {
        assert!(!x_is_int().matches(&Pair { x: "no", y: "a" }).unwrap());
    }

    #[test]
    fn test_missing_field_is_false() {
        assert!(!x_is_int().matches(&Other { y: "a" }).unwrap());
    }

    #[test]
    fn test_null_subject_is_false() {
        assert!(!x_is_int().matches(&None::<Pair<i32>>).unwrap());
    }

    #[test]
    fn test_leaf_subject_has_no_fields() {
        assert!(!x_is_int().matches(&5_i32).unwrap());
    }

    #[test]
    fn test_empty_requirements_match_any_non_null() {
        let any = MatchPredicate::from(DestructuredMatch::default());
        assert!(any.matches(&5_i32).unwrap());
        assert!(!any.matches(&None::<i32>).unwrap());
    }

    #[test]
    fn test_all_required_fields_must_match() {
        let m = MatchPredicate::from(
            DestructuredMatch::default()
                .field("x", ValueMatch::of(1_i32))
                .field("y", ValueMatch::of("b")),
        );
        assert!(m.matches(&Pair { x: 1_i32, y: "b" }).unwrap());
        assert!(!m.matches(&Pair { x: 1_i32, y: "c" }).unwrap());
        assert!(!m.matches(&Pair { x: 2_i32, y: "b" }).unwrap());
    }

    #[test]
    fn test_read_failure_is_predicate_error() {
        let err = x_is_int().matches(&Locked).unwrap_err();
        match err {
            PredicateError::FieldAccess {
                type_name,
                field,
                source,
            } => {
                assert!(type_name.ends_with("Locked"));
                assert_eq!(field, "x");
                assert_eq!(source, FieldAccessError::denied("x", "locked"));
            }
            other => panic!("expected FieldAccess, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_destructuring() {
        let m = MatchPredicate::from(DestructuredMatch::default().field(
            "start",
            DestructuredMatch::default().field("x", ValueMatch::of(0_i32)),
        ));
        let line = Line {
            start: Pair { x: 0, y: "o" },
            end: None,
        };
        assert!(m.matches(&line).unwrap());
        assert_eq!(m.depth(), 3);
    }

    #[test]
    fn test_null_field_value() {
        let line = Line {
            start: Pair { x: 0, y: "o" },
            end: None,
        };
        let end_is_null =
            MatchPredicate::from(DestructuredMatch::default().field("end", ValueMatch::null()));
        assert!(end_is_null.matches(&line).unwrap());

        let end_is_pair = MatchPredicate::from(
            DestructuredMatch::default().field("end", TypeMatch::of::<Pair<i32>>()),
        );
        assert!(!end_is_pair.matches(&line).unwrap());
    }

    #[test]
    fn test_nested_predicate_error_propagates() {
        let m = MatchPredicate::from(
            DestructuredMatch::default()
                .field("x", PredicateMatch::try_new(|_| Err::<Option<bool>, _>("bad x"))),
        );
        let err = m.matches(&Pair { x: 1_i32, y: "a" }).unwrap_err();
        assert!(matches!(err, PredicateError::Function { .. }));
    }

    #[test]
    fn test_short_circuits_on_first_false() {
        // `x` is declared first and fails, so `y`'s erroring predicate never runs.
        let m = MatchPredicate::from(
            DestructuredMatch::default()
                .field("y", PredicateMatch::try_new(|_| Err::<Option<bool>, _>("bad y")))
                .field("x", ValueMatch::of(9_i32)),
        );
        assert!(!m.matches(&Pair { x: 1_i32, y: "a" }).unwrap());
    }

    #[test]
    fn test_validate_duplicate_field() {
        let m = MatchPredicate::from(
            DestructuredMatch::default()
                .field("x", TypeMatch::of::<i32>())
                .field("x", ValueMatch::of(1_i32)),
        );
        assert_eq!(
            m.validate(),
            Err(MatcherError::DuplicateField { field: "x".into() })
        );
    }

    #[test]
    fn test_validate_nested_duplicate_field() {
        let m = MatchPredicate::from(DestructuredMatch::default().field(
            "start",
            DestructuredMatch::default()
                .field("y", TypeMatch::of::<&str>())
                .field("y", TypeMatch::of::<&str>()),
        ));
        assert!(matches!(
            m.validate(),
            Err(MatcherError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_validate_depth_exceeded() {
        let mut m = MatchPredicate::from(TypeMatch::of::<i32>());
        for _ in 0..MAX_DEPTH {
            m = DestructuredMatch::default().field("x", m).into();
        }
        assert_eq!(m.depth(), MAX_DEPTH + 1);
        assert!(matches!(
            m.validate(),
            Err(MatcherError::DepthExceeded { .. })
        ));
    }

    #[test]
    fn test_validate_at_max_depth_ok() {
        let mut m = MatchPredicate::from(TypeMatch::of::<i32>());
        for _ in 0..(MAX_DEPTH - 1) {
            m = DestructuredMatch::default().field("x", m).into();
        }
        assert_eq!(m.depth(), MAX_DEPTH);
        assert!(m.validate().is_ok());
    }
}
