//! The operator algebra.
//!
//! Every operator is an inherent method on [`Observable`] returning a new
//! observable. Operators capture their sources without owning them, so a
//! derived stream never keeps a `from_value` watcher alive on its own.
//! Except for `observe_on`, operators run on whichever thread delivered the
//! upstream event.
//!
//! Typed callbacks unwrap items with [`FromVar`]; a payload of the wrong
//! type, or a panic inside a callback, terminates the subscription with
//! `onError`.
//!
//! [`Observable`]: crate::observable::Observable

use crate::{
  error::catch_callback,
  observer::Subscriber,
  var::{FromVar, Var},
};

mod combine_latest;
mod concat;
#[cfg(feature = "timer")]
mod debounce;
mod distinct_until_changed;
mod element_at;
mod filter;
mod map;
mod merge_all;
mod observe_on;
mod reduce;
#[cfg(feature = "timer")]
mod sample;
mod scan;
mod skip;
mod skip_until;
mod start_with;
mod switch_on_next;
mod take;
mod take_last;
mod take_until;
mod take_while;
mod with_latest_from;
mod zip;

/// Unwraps `value` as `T`, or terminates `downstream` with the mismatch.
pub(crate) fn unwrap_or_report<T: FromVar>(value: &Var, downstream: &Subscriber) -> Option<T> {
  match T::from_var(value) {
    Ok(v) => Some(v),
    Err(err) => {
      downstream.error(err);
      None
    }
  }
}

/// Runs a user callback, or terminates `downstream` if it panics.
pub(crate) fn call_or_report<R>(downstream: &Subscriber, f: impl FnOnce() -> R) -> Option<R> {
  match catch_callback(f) {
    Ok(v) => Some(v),
    Err(err) => {
      downstream.error(err);
      None
    }
  }
}

/// Combinator used when `combine_latest`, `with_latest_from` or `zip` get
/// none: packs the values into a `Var::Array`.
pub(crate) fn pack(values: &[Var]) -> Var { Var::Array(std::sync::Arc::new(values.to_vec())) }
