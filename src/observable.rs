//! The `Observable` handle and the subscribe protocol.
//!
//! An [`Observable`] is an immutable, cloneable handle to a shared stream
//! definition: a function that, for each subscription, drives a
//! [`Subscriber`] with zero or more items followed by at most one terminal
//! event. Cloning the handle shares the definition; it never re-runs side
//! effects.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rxvar::prelude::*;
//!
//! let items = Arc::new(Mutex::new(vec![]));
//! let sink = items.clone();
//! Observable::from(vec![1, 2, 3, 4])
//!   .filter(|v: i32| v % 2 == 0)
//!   .map(|v: i32| v * 10)
//!   .subscribe(move |v: i32| sink.lock().unwrap().push(v));
//! assert_eq!(*items.lock().unwrap(), vec![20, 40]);
//! ```

use std::{any::Any, fmt, sync::Arc};

use futures::{channel::oneshot, executor::block_on};
use parking_lot::Mutex;

use crate::{
  error::{Error, Result},
  observer::{empty_on_completed, terminate_on_error, FnObserver, Observer, Subscriber},
  subscription::{Disposable, Subscription},
  var::{FromVar, Var},
};

mod create;
mod defer;
mod from;
mod from_value;
#[cfg(feature = "timer")]
mod interval;
mod range;
mod trivial;

pub use range::RangeValue;

type OnSubscribe = dyn Fn(Subscriber) + Send + Sync;

/// Handle to a shareable push stream definition.
#[derive(Clone)]
pub struct Observable {
  on_subscribe: Arc<OnSubscribe>,
  // Keeps a stream source alive for as long as any copy of this handle
  // exists. Derived observables never hold it.
  owner: Option<Arc<dyn Any + Send + Sync>>,
}

impl Observable {
  /// Builds an observable straight from a subscribe function, without the
  /// panic boundary `create` adds. Used by the operators.
  pub(crate) fn from_fn(f: impl Fn(Subscriber) + Send + Sync + 'static) -> Self {
    Observable { on_subscribe: Arc::new(f), owner: None }
  }

  pub(crate) fn with_owner(mut self, owner: Arc<dyn Any + Send + Sync>) -> Self {
    self.owner = Some(owner);
    self
  }

  /// A copy of this stream definition that does not keep the source owner
  /// alive.
  pub(crate) fn detached(&self) -> Observable {
    Observable { on_subscribe: self.on_subscribe.clone(), owner: None }
  }

  pub(crate) fn ptr_eq(&self, other: &Observable) -> bool {
    Arc::ptr_eq(&self.on_subscribe, &other.on_subscribe)
  }

  /// Drives `subscriber` with this stream's events.
  #[inline]
  pub(crate) fn actual_subscribe(&self, subscriber: Subscriber) { (self.on_subscribe)(subscriber) }

  /// Subscribes with an `on_next` closure only.
  ///
  /// The `on_next` function may be called synchronously before `subscribe`
  /// returns. **If the observable signals an error, it is escalated as an
  /// unhandled error** (the default `onError` unwinds); use
  /// [`Observable::subscribe_all`] to handle errors.
  ///
  /// The returned [`Disposable`] keeps delivering until it is disposed or the
  /// stream terminates. Dropping it does not unsubscribe.
  pub fn subscribe<T, N>(&self, on_next: N) -> Disposable
  where
    T: FromVar + 'static,
    N: FnMut(T) + Send + 'static,
  {
    self.subscribe_with(FnObserver::new(on_next, terminate_on_error, empty_on_completed))
  }

  /// Subscribes with `on_next`, `on_error` and `on_completed` closures.
  pub fn subscribe_all<T, N, E, C>(&self, on_next: N, on_error: E, on_completed: C) -> Disposable
  where
    T: FromVar + 'static,
    N: FnMut(T) + Send + 'static,
    E: FnOnce(Error) + Send + 'static,
    C: FnOnce() + Send + 'static,
  {
    self.subscribe_with(FnObserver::new(on_next, on_error, on_completed))
  }

  /// Subscribes an [`Observer`].
  pub fn subscribe_with(&self, observer: impl Observer) -> Disposable {
    let subscription = Subscription::default();
    self.actual_subscribe(Subscriber::new(observer, subscription.clone()));
    Disposable::new(subscription)
  }

  /// Blocks until the observable completes and returns every emitted item.
  ///
  /// Be careful when calling this on a run loop thread: if the observable
  /// needs that run loop to make progress, this deadlocks.
  pub fn to_array(&self) -> Result<Vec<Var>> {
    let (sender, receiver) = oneshot::channel();
    let sender = Arc::new(Mutex::new(Some(sender)));
    let items = Arc::new(Mutex::new(Vec::new()));
    let (on_error, on_complete) = (sender.clone(), sender);
    let collected = items.clone();
    let _subscription = self.subscribe_all(
      move |v: Var| items.lock().push(v),
      move |err| {
        if let Some(tx) = on_error.lock().take() {
          let _ = tx.send(Err(err));
        }
      },
      move || {
        if let Some(tx) = on_complete.lock().take() {
          let _ = tx.send(Ok(()));
        }
      },
    );
    block_on(receiver).unwrap_or(Err(Error::Disconnected))?;
    let items = std::mem::take(&mut *collected.lock());
    Ok(items)
  }

  /// Typed variant of [`Observable::to_array`].
  pub fn to_vec<T: FromVar>(&self) -> Result<Vec<T>> {
    self.to_array()?.iter().map(T::from_var).collect()
  }
}

impl fmt::Debug for Observable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Observable").field("owned", &self.owner.is_some()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_array_collects_items() {
    let items = Observable::from(vec![1, 2, 3]).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![1, 2, 3]);
  }

  #[test]
  fn to_array_returns_error() {
    let err = Observable::error(Error::msg("nope")).to_array().unwrap_err();
    assert_eq!(err.to_string(), "nope");
  }

  #[test]
  #[should_panic]
  fn missing_error_handler_escalates() {
    Observable::error(Error::msg("fatal")).subscribe(|_: Var| {});
  }

  #[test]
  fn clones_share_the_definition() {
    let o = Observable::just(1);
    let copy = o.clone();
    assert!(o.ptr_eq(&copy));
    assert!(!o.ptr_eq(&Observable::just(1)));
  }
}
