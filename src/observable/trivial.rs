use crate::{error::Error, observable::Observable, observer::Subscriber};

impl Observable {
  /// Creates an observable that produces no values.
  ///
  /// Completes immediately. Never emits an error.
  pub fn empty() -> Observable { Observable::from_fn(|subscriber: Subscriber| subscriber.complete()) }

  /// Creates an observable that emits no items, just terminates with an
  /// error.
  pub fn error(err: Error) -> Observable {
    Observable::from_fn(move |subscriber: Subscriber| subscriber.error(err.clone()))
  }

  /// Creates an observable that never emits anything and never terminates.
  pub fn never() -> Observable { Observable::from_fn(|_| {}) }
}
