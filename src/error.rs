//! Error type shared by every stream in the runtime.
//!
//! Errors travel through `Observer::error` and may be delivered to many
//! observers at once (subjects replay their terminal error, fan-out operators
//! forward one error to several branches), so [`Error`] is cheap to clone.

use std::{any::Any, sync::Arc};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for stream creation and delivery.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
  /// `range` was called with `first > last` or with a zero step.
  #[error("Invalid range: {first} .. {last} (step {step})")]
  InvalidRange { first: String, last: String, step: u32 },

  /// A payload was unwrapped as a type it does not hold.
  #[error("Type mismatch: expected {expected}, found {found}")]
  TypeMismatch { expected: &'static str, found: &'static str },

  /// A higher-order operator received an item that is not an observable.
  #[error("Expected an observable item, found {found}")]
  NotAnObservable { found: &'static str },

  /// `element_at` saw its source complete before reaching the index.
  #[error("Index {index} is out of range")]
  ArgumentOutOfRange { index: usize },

  /// A user supplied callback panicked.
  #[error("Callback panicked: {context}")]
  CallbackPanic { context: String },

  /// The stream was torn down without delivering a terminal event.
  #[error("Stream ended without a terminal event")]
  Disconnected,

  #[error("{0}")]
  Message(Arc<str>),

  #[error(transparent)]
  Custom(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Creates an error carrying a plain message.
  pub fn msg(message: impl Into<String>) -> Self { Error::Message(message.into().into()) }

  /// Wraps any standard error.
  pub fn custom(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Custom(Arc::new(err))
  }

  pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
    let context = if let Some(s) = payload.downcast_ref::<&'static str>() {
      (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "non-string panic payload".to_string()
    };
    Error::CallbackPanic { context }
  }
}

/// Panic payload raised by the default error handler.
///
/// Boundaries that convert callback panics into `onError` re-raise this
/// payload untouched, so an unhandled error escapes to whoever delivered it.
#[derive(Debug, Clone)]
pub struct UnhandledError(pub Error);

/// Default `onError` handler: an error nobody handles is fatal.
pub(crate) fn escalate(err: Error) -> ! {
  tracing::error!(error = %err, "unhandled error in observable");
  std::panic::panic_any(UnhandledError(err))
}

/// Runs `f`, turning a panic into [`Error::CallbackPanic`].
///
/// Panics raised by [`escalate`] keep unwinding.
pub(crate) fn catch_callback<R>(f: impl FnOnce() -> R) -> Result<R> {
  match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
    Ok(value) => Ok(value),
    Err(payload) if payload.is::<UnhandledError>() => std::panic::resume_unwind(payload),
    Err(payload) => {
      let err = Error::from_panic(payload.as_ref());
      tracing::warn!(error = %err, "callback panicked, forwarding as error");
      Err(err)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn panic_becomes_callback_error() {
    let result: Result<()> = catch_callback(|| panic!("boom"));
    match result {
      Err(Error::CallbackPanic { context }) => assert_eq!(context, "boom"),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn formatted_panic_keeps_message() {
    let n = 3;
    let result: Result<()> = catch_callback(|| panic!("failed at {n}"));
    assert_eq!(result.unwrap_err().to_string(), "Callback panicked: failed at 3");
  }

  #[test]
  fn unhandled_error_keeps_unwinding() {
    let outer = std::panic::catch_unwind(|| {
      let _ = catch_callback(|| escalate(Error::msg("fatal")));
    });
    let payload = outer.unwrap_err();
    let unhandled = payload.downcast_ref::<UnhandledError>().unwrap();
    assert_eq!(unhandled.0.to_string(), "fatal");
  }

  #[test]
  fn range_error_mentions_invalid_range() {
    let err = Error::InvalidRange { first: "10".into(), last: "9".into(), step: 1 };
    assert!(err.to_string().contains("Invalid range"));
  }
}
