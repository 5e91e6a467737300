//! `Reflect`: Structural introspection of match subjects
//!
//! Matching by exact type, by value and by named fields needs three things
//! from a runtime value, and nothing more:
//!
//! 1. its exact type identity (via [`Any`]),
//! 2. whether it is null (`None` after normalization),
//! 3. its directly-declared fields, readable by name.
//!
//! [`Reflect`] is that narrow capability. Predicates only ever see
//! `Option<&dyn Reflect>`, so the destructuring algorithm does not depend on
//! how a type exposes its fields.
//!
//! # Implementing
//!
//! Leaf values use [`reflect_value!`](crate::reflect_value), structs use
//! [`reflect_struct!`](crate::reflect_struct):
//!
//! ```
//! use casematch::{reflect_struct, Reflect};
//!
//! #[derive(Debug)]
//! struct Point { x: i32, y: i32 }
//!
//! reflect_struct!(Point { x, y });
//!
//! let p = Point { x: 1, y: 2 };
//! assert_eq!(p.declared_fields(), &["x", "y"]);
//! let x = p.read_field("x").unwrap();
//! assert_eq!(x.downcast_ref::<i32>(), Some(&1));
//! ```
//!
//! Because the macro expands inside the module that defines the struct, it
//! reads private fields as well as public ones.

use crate::FieldAccessError;
use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::sync::Arc;

/// A value that can be the subject of a match.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so matchers holding them can be
/// evaluated from several threads.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Reflect`",
    label = "this type cannot be matched against",
    note = "use `reflect_struct!` for structs with named fields or `reflect_value!` for leaf values"
)]
pub trait Reflect: Any + Send + Sync + Debug {
    /// Returns `self` as `&dyn Any`.
    ///
    /// Used for exact type identity and downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Normalize null.
    ///
    /// Returns `None` when this value represents null (e.g. `Option::None`),
    /// otherwise the value to match against. Wrappers such as `Option`,
    /// `Box` and `Arc` forward to their contents.
    fn as_subject(&self) -> Option<&dyn Reflect>;

    /// Names of the fields declared directly on this type, in declaration
    /// order.
    fn declared_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Read the current value of a declared field.
    ///
    /// # Errors
    ///
    /// [`FieldAccessError::Undeclared`] if the field does not exist,
    /// [`FieldAccessError::Denied`] if it exists but cannot be produced.
    fn read_field(&self, name: &str) -> Result<&dyn Reflect, FieldAccessError> {
        Err(FieldAccessError::Undeclared {
            field: name.to_string(),
        })
    }

    /// Name of the concrete type, for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Compare with another value of the same concrete type.
    ///
    /// `None` means this type has no equality. [`ValueMatch`](crate::ValueMatch)
    /// relies on this when the expected value is wrapped (`Some(x)`,
    /// `Box<X>`, `Arc<X>`) and so cannot be compared as its own type.
    /// Wrappers forward to their contents.
    fn eq_value(&self, _other: &dyn Reflect) -> Option<bool> {
        None
    }
}

impl dyn Reflect {
    /// [`TypeId`] of the concrete type behind this reference.
    #[must_use]
    pub fn concrete_type_id(&self) -> TypeId {
        Any::type_id(self.as_any())
    }

    /// Returns `true` if the concrete type is exactly `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Implement [`Reflect`] for leaf types that have no fields.
///
/// The types must implement `PartialEq`; it backs
/// [`Reflect::eq_value`].
///
/// ```
/// use casematch::{reflect_value, Reflect};
///
/// #[derive(Debug, PartialEq)]
/// struct Meters(f64);
///
/// reflect_value!(Meters);
///
/// assert!(Meters(1.0).declared_fields().is_empty());
/// ```
#[macro_export]
macro_rules! reflect_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Reflect for $ty {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_subject(&self) -> ::std::option::Option<&dyn $crate::Reflect> {
                    ::std::option::Option::Some(self)
                }

                fn eq_value(&self, other: &dyn $crate::Reflect) -> ::std::option::Option<bool> {
                    ::std::option::Option::Some(
                        other.downcast_ref::<Self>().is_some_and(|other| other == self),
                    )
                }
            }
        )*
    };
}

/// Implement [`Reflect`] for a struct with named fields.
///
/// List the fields to expose in declaration order. Every listed field's
/// type must itself implement [`Reflect`]. Append `, PartialEq` to also
/// provide [`Reflect::eq_value`], so wrapped values of the struct
/// (`Some(user)`, `Box::new(user)`) can be used with
/// [`ValueMatch`](crate::ValueMatch).
///
/// ```
/// use casematch::{reflect_struct, Reflect};
///
/// #[derive(Debug, PartialEq)]
/// struct User { name: String, age: u32 }
///
/// reflect_struct!(User { name, age }, PartialEq);
///
/// let user = User { name: "ada".into(), age: 36 };
/// assert!(user.read_field("age").is_ok());
/// assert!(user.read_field("email").is_err());
/// assert_eq!(user.eq_value(&User { name: "ada".into(), age: 36 }), Some(true));
/// ```
#[macro_export]
macro_rules! reflect_struct {
    (@impl $ty:ty { $($field:ident),* } { $($extra:tt)* }) => {
        impl $crate::Reflect for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_subject(&self) -> ::std::option::Option<&dyn $crate::Reflect> {
                ::std::option::Option::Some(self)
            }

            fn declared_fields(&self) -> &'static [&'static str] {
                &[$(::std::stringify!($field)),*]
            }

            fn read_field(
                &self,
                name: &str,
            ) -> ::std::result::Result<&dyn $crate::Reflect, $crate::FieldAccessError> {
                match name {
                    $(::std::stringify!($field) => ::std::result::Result::Ok(&self.$field),)*
                    _ => ::std::result::Result::Err($crate::FieldAccessError::Undeclared {
                        field: ::std::string::ToString::to_string(name),
                    }),
                }
            }

            $($extra)*
        }
    };
    ($ty:ty { $($field:ident),* $(,)? }, PartialEq) => {
        $crate::reflect_struct!(@impl $ty { $($field),* } {
            fn eq_value(&self, other: &dyn $crate::Reflect) -> ::std::option::Option<bool> {
                ::std::option::Option::Some(
                    other.downcast_ref::<Self>().is_some_and(|other| other == self),
                )
            }
        });
    };
    ($ty:ty { $($field:ident),* $(,)? }) => {
        $crate::reflect_struct!(@impl $ty { $($field),* } {});
    };
}

reflect_value!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: Reflect> Reflect for Vec<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_subject(&self) -> Option<&dyn Reflect> {
        Some(self)
    }
}

// `None` is null; `Some` is transparent so `Some(5)` matches like `5`.
impl<T: Reflect> Reflect for Option<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_subject(&self) -> Option<&dyn Reflect> {
        self.as_ref().and_then(Reflect::as_subject)
    }

    fn declared_fields(&self) -> &'static [&'static str] {
        match self {
            Some(inner) => inner.declared_fields(),
            None => &[],
        }
    }

    fn read_field(&self, name: &str) -> Result<&dyn Reflect, FieldAccessError> {
        match self {
            Some(inner) => inner.read_field(name),
            None => Err(FieldAccessError::Undeclared {
                field: name.to_string(),
            }),
        }
    }

    fn type_name(&self) -> &'static str {
        self.as_ref()
            .map_or(std::any::type_name::<Self>(), Reflect::type_name)
    }

    fn eq_value(&self, other: &dyn Reflect) -> Option<bool> {
        self.as_ref().and_then(|inner| inner.eq_value(other))
    }
}

macro_rules! reflect_pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Reflect + ?Sized> Reflect for $ptr<T> {
                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_subject(&self) -> Option<&dyn Reflect> {
                    (**self).as_subject()
                }

                fn declared_fields(&self) -> &'static [&'static str] {
                    (**self).declared_fields()
                }

                fn read_field(&self, name: &str) -> Result<&dyn Reflect, FieldAccessError> {
                    (**self).read_field(name)
                }

                fn type_name(&self) -> &'static str {
                    (**self).type_name()
                }

                fn eq_value(&self, other: &dyn Reflect) -> Option<bool> {
                    (**self).eq_value(other)
                }
            }
        )*
    };
}

reflect_pointer!(Box, Arc);
