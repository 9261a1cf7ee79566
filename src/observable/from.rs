use std::sync::Arc;

use crate::{
  observable::Observable,
  observer::Subscriber,
  var::{IntoVar, Var},
};

impl Observable {
  /// Creates an observable that emits every item of `items`, in order, then
  /// completes.
  ///
  /// The items are converted once; each subscription replays the same
  /// sequence.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::from(vec!["a", "b"]);
  /// assert_eq!(o.to_vec::<String>().unwrap(), vec!["a", "b"]);
  /// ```
  pub fn from<I>(items: I) -> Observable
  where
    I: IntoIterator,
    I::Item: IntoVar,
  {
    let items: Arc<[Var]> = items.into_iter().map(IntoVar::into_var).collect();
    Observable::from_fn(move |subscriber: Subscriber| {
      for item in items.iter() {
        if subscriber.is_disposed() {
          return;
        }
        subscriber.next(item);
      }
      subscriber.complete();
    })
  }

  /// Creates an observable that emits `value` once, then completes.
  pub fn just(value: impl IntoVar) -> Observable {
    let value = value.into_var();
    Observable::from_fn(move |subscriber: Subscriber| {
      subscriber.next(&value);
      subscriber.complete();
    })
  }

  /// Creates an observable that emits `value` over and over until the
  /// subscription is disposed or the downstream stops taking items.
  pub fn repeat(value: impl IntoVar) -> Observable {
    let value = value.into_var();
    Observable::from_fn(move |subscriber: Subscriber| {
      while !subscriber.is_disposed() {
        subscriber.next(&value);
      }
    })
  }

  /// Creates an observable that emits `value` `times` times, then completes.
  pub fn repeat_n(value: impl IntoVar, times: usize) -> Observable {
    let value = value.into_var();
    Observable::from_fn(move |subscriber: Subscriber| {
      for _ in 0..times {
        if subscriber.is_disposed() {
          return;
        }
        subscriber.next(&value);
      }
      subscriber.complete();
    })
  }
}
