//! The boxed payload carried by every stream.
//!
//! Streams are type-erased: every item is a [`Var`]. Typed values enter a
//! stream through [`IntoVar`] and leave it through [`FromVar`]. Wrapping moves
//! the source into the payload, unwrapping always produces a fresh copy so a
//! payload can be read any number of times.
//!
//! Primitives, strings, arrays and observables are built in. Any other type
//! has to register both directions, usually with [`impl_var_object!`]:
//!
//! ```rust
//! use rxvar::{impl_var_object, prelude::*};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Point {
//!   x: i32,
//!   y: i32,
//! }
//! impl_var_object!(Point);
//!
//! let var = to_var(Point { x: 13, y: 556 });
//! assert_eq!(from_var::<Point>(&var).unwrap(), Point { x: 13, y: 556 });
//! ```

use std::{
  any::{type_name, Any},
  fmt,
  sync::Arc,
};

use crate::{
  error::{Error, Result},
  observable::Observable,
};

/// Reference counted dynamic value.
#[derive(Clone, Default)]
pub enum Var {
  #[default]
  Undefined,
  Bool(bool),
  Int(i64),
  Double(f64),
  String(Arc<str>),
  Array(Arc<Vec<Var>>),
  Object(VarObject),
  Observable(Observable),
}

/// A user type stored in a [`Var`].
#[derive(Clone)]
pub struct VarObject {
  value: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl VarObject {
  pub fn type_name(&self) -> &'static str { self.type_name }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> { self.value.downcast_ref::<T>() }

  fn ptr_eq(&self, other: &VarObject) -> bool { Arc::ptr_eq(&self.value, &other.value) }
}

impl Var {
  /// Boxes an arbitrary value. Equality on the result compares identity.
  pub fn object<T: Any + Send + Sync>(value: T) -> Self {
    Var::Object(VarObject { value: Arc::new(value), type_name: type_name::<T>() })
  }

  /// Name of the held kind, used in error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      Var::Undefined => "undefined",
      Var::Bool(_) => "bool",
      Var::Int(_) => "int",
      Var::Double(_) => "double",
      Var::String(_) => "string",
      Var::Array(_) => "array",
      Var::Object(o) => o.type_name,
      Var::Observable(_) => "observable",
    }
  }

  pub fn is_undefined(&self) -> bool { matches!(self, Var::Undefined) }

  pub fn is_double(&self) -> bool { matches!(self, Var::Double(_)) }

  pub fn is_observable(&self) -> bool { matches!(self, Var::Observable(_)) }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Var::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_array(&self) -> Option<&[Var]> {
    match self {
      Var::Array(items) => Some(items),
      _ => None,
    }
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    match self {
      Var::Object(o) => o.downcast_ref::<T>(),
      _ => None,
    }
  }

  /// Unwraps a copy of the held value as `T`.
  #[inline]
  pub fn get<T: FromVar>(&self) -> Result<T> { T::from_var(self) }

  fn as_f64(&self) -> Option<f64> {
    match self {
      Var::Bool(b) => Some(if *b { 1. } else { 0. }),
      Var::Int(i) => Some(*i as f64),
      Var::Double(d) => Some(*d),
      _ => None,
    }
  }

  pub(crate) fn mismatch<T>(&self) -> Error {
    Error::TypeMismatch { expected: type_name::<T>(), found: self.kind() }
  }
}

impl PartialEq for Var {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Var::Undefined, Var::Undefined) => true,
      (Var::String(a), Var::String(b)) => a == b,
      (Var::Array(a), Var::Array(b)) => a == b,
      (Var::Object(a), Var::Object(b)) => a.ptr_eq(b),
      (Var::Observable(a), Var::Observable(b)) => a.ptr_eq(b),
      (a, b) => match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
      },
    }
  }
}

impl fmt::Debug for Var {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Var::Undefined => f.write_str("Undefined"),
      Var::Bool(b) => write!(f, "Bool({b})"),
      Var::Int(i) => write!(f, "Int({i})"),
      Var::Double(d) => write!(f, "Double({d})"),
      Var::String(s) => write!(f, "String({s:?})"),
      Var::Array(items) => f.debug_list().entries(items.iter()).finish(),
      Var::Object(o) => write!(f, "Object({})", o.type_name),
      Var::Observable(_) => f.write_str("Observable"),
    }
  }
}

impl fmt::Display for Var {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Var::Undefined => Ok(()),
      Var::Bool(b) => write!(f, "{b}"),
      Var::Int(i) => write!(f, "{i}"),
      Var::Double(d) => write!(f, "{d}"),
      Var::String(s) => f.write_str(s),
      Var::Array(items) => {
        f.write_str("[")?;
        for (i, item) in items.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{item}")?;
        }
        f.write_str("]")
      }
      Var::Object(o) => f.write_str(o.type_name),
      Var::Observable(_) => f.write_str("<observable>"),
    }
  }
}

/// Wraps a typed value into a payload, moving it.
pub trait IntoVar {
  fn into_var(self) -> Var;
}

/// Unwraps a payload into a freshly constructed typed value.
pub trait FromVar: Sized {
  fn from_var(var: &Var) -> Result<Self>;
}

/// Free function form of [`IntoVar::into_var`].
#[inline]
pub fn to_var<T: IntoVar>(value: T) -> Var { value.into_var() }

/// Free function form of [`FromVar::from_var`].
#[inline]
pub fn from_var<T: FromVar>(var: &Var) -> Result<T> { T::from_var(var) }

impl IntoVar for Var {
  #[inline]
  fn into_var(self) -> Var { self }
}

impl IntoVar for &Var {
  #[inline]
  fn into_var(self) -> Var { self.clone() }
}

impl FromVar for Var {
  #[inline]
  fn from_var(var: &Var) -> Result<Self> { Ok(var.clone()) }
}

impl IntoVar for () {
  fn into_var(self) -> Var { Var::Undefined }
}

impl IntoVar for bool {
  fn into_var(self) -> Var { Var::Bool(self) }
}

impl FromVar for bool {
  fn from_var(var: &Var) -> Result<Self> {
    match var {
      Var::Bool(b) => Ok(*b),
      Var::Int(i) => Ok(*i != 0),
      Var::Double(d) => Ok(*d != 0.),
      _ => Err(var.mismatch::<bool>()),
    }
  }
}

macro_rules! impl_int_var {
  ($($t: ty),*) => {
    $(
      impl IntoVar for $t {
        #[inline]
        fn into_var(self) -> Var { Var::Int(self as i64) }
      }

      impl FromVar for $t {
        fn from_var(var: &Var) -> Result<Self> {
          match var {
            Var::Int(i) => <$t>::try_from(*i).map_err(|_| var.mismatch::<$t>()),
            Var::Double(d) if d.is_finite() => Ok(*d as $t),
            Var::Bool(b) => Ok(*b as $t),
            _ => Err(var.mismatch::<$t>()),
          }
        }
      }
    )*
  };
}

impl_int_var!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_float_var {
  ($($t: ty),*) => {
    $(
      impl IntoVar for $t {
        #[inline]
        fn into_var(self) -> Var { Var::Double(self as f64) }
      }

      impl FromVar for $t {
        fn from_var(var: &Var) -> Result<Self> {
          var.as_f64().map(|v| v as $t).ok_or_else(|| var.mismatch::<$t>())
        }
      }
    )*
  };
}

impl_float_var!(f32, f64);

impl IntoVar for usize {
  fn into_var(self) -> Var { Var::Int(i64::try_from(self).unwrap_or(i64::MAX)) }
}

impl FromVar for usize {
  fn from_var(var: &Var) -> Result<Self> {
    match var {
      Var::Int(i) => usize::try_from(*i).map_err(|_| var.mismatch::<usize>()),
      _ => Err(var.mismatch::<usize>()),
    }
  }
}

impl IntoVar for &str {
  fn into_var(self) -> Var { Var::String(self.into()) }
}

impl IntoVar for String {
  fn into_var(self) -> Var { Var::String(self.into()) }
}

impl IntoVar for Arc<str> {
  fn into_var(self) -> Var { Var::String(self) }
}

impl FromVar for String {
  fn from_var(var: &Var) -> Result<Self> {
    var.as_str().map(str::to_owned).ok_or_else(|| var.mismatch::<String>())
  }
}

impl FromVar for Arc<str> {
  fn from_var(var: &Var) -> Result<Self> {
    match var {
      Var::String(s) => Ok(s.clone()),
      _ => Err(var.mismatch::<Arc<str>>()),
    }
  }
}

impl<T: IntoVar> IntoVar for Vec<T> {
  fn into_var(self) -> Var { Var::Array(Arc::new(self.into_iter().map(IntoVar::into_var).collect())) }
}

impl<T: FromVar> FromVar for Vec<T> {
  fn from_var(var: &Var) -> Result<Self> {
    match var {
      Var::Array(items) => items.iter().map(T::from_var).collect(),
      _ => Err(var.mismatch::<Vec<T>>()),
    }
  }
}

impl<A: IntoVar, B: IntoVar> IntoVar for (A, B) {
  fn into_var(self) -> Var { Var::Array(Arc::new(vec![self.0.into_var(), self.1.into_var()])) }
}

impl<A: FromVar, B: FromVar> FromVar for (A, B) {
  fn from_var(var: &Var) -> Result<Self> {
    match var.as_array() {
      Some([a, b]) => Ok((A::from_var(a)?, B::from_var(b)?)),
      _ => Err(var.mismatch::<(A, B)>()),
    }
  }
}

impl IntoVar for Observable {
  fn into_var(self) -> Var { Var::Observable(self) }
}

impl FromVar for Observable {
  fn from_var(var: &Var) -> Result<Self> {
    match var {
      Var::Observable(o) => Ok(o.clone()),
      _ => Err(Error::NotAnObservable { found: var.kind() }),
    }
  }
}

/// Registers a custom type with the payload conversion protocol.
///
/// The type must be `Clone + Send + Sync + 'static`. Equality between two
/// payloads of a registered type compares identity; pass an explicit
/// comparator to `distinct_until_changed_by` when value equality matters.
#[macro_export]
macro_rules! impl_var_object {
  ($($t: ty),+ $(,)?) => {
    $(
      impl $crate::var::IntoVar for $t {
        fn into_var(self) -> $crate::var::Var { $crate::var::Var::object(self) }
      }

      impl $crate::var::FromVar for $t {
        fn from_var(var: &$crate::var::Var) -> $crate::error::Result<Self> {
          var.downcast_ref::<$t>().cloned().ok_or_else(|| $crate::error::Error::TypeMismatch {
            expected: ::std::any::type_name::<$t>(),
            found: var.kind(),
          })
        }
      }
    )+
  };
}
