//! Observer trait and the per-subscription sink.
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).

use std::{
  collections::VecDeque,
  marker::PhantomData,
  sync::Arc,
  thread::{self, ThreadId},
};

use parking_lot::Mutex;

use crate::{
  error::{escalate, Error},
  subscription::{Subscription, SubscriptionLike},
  var::{FromVar, IntoVar, Var},
};

/// Observer trait: The consumer of data in reactive programming
///
/// An Observer receives values, errors, and completion notifications from
/// an Observable. After `error` or `complete` it receives nothing further.
pub trait Observer: Send + 'static {
  /// Receive the next value from the observable
  fn next(&mut self, value: Var);

  /// Handle an error from the observable
  fn error(&mut self, err: Error);

  /// Handle completion of the observable
  fn complete(&mut self);

  /// Checks if the observer is closed.
  ///
  /// Sources and operators consult this after each delivery to stop early
  /// (e.g., due to a `take` operator).
  fn is_closed(&self) -> bool { false }
}

/// Observer built from three closures.
///
/// The `next` closure receives a typed value unwrapped with [`FromVar`]; a
/// payload of the wrong type is routed to the error closure and closes the
/// observer.
pub struct FnObserver<T, N, E, C> {
  next: N,
  error: Option<E>,
  complete: Option<C>,
  closed: bool,
  _hint: PhantomData<fn(T)>,
}

impl<T, N, E, C> FnObserver<T, N, E, C>
where
  T: FromVar,
  N: FnMut(T) + Send + 'static,
  E: FnOnce(Error) + Send + 'static,
  C: FnOnce() + Send + 'static,
{
  pub fn new(next: N, error: E, complete: C) -> Self {
    FnObserver { next, error: Some(error), complete: Some(complete), closed: false, _hint: PhantomData }
  }
}

impl<T, N, E, C> Observer for FnObserver<T, N, E, C>
where
  T: FromVar + 'static,
  N: FnMut(T) + Send + 'static,
  E: FnOnce(Error) + Send + 'static,
  C: FnOnce() + Send + 'static,
{
  fn next(&mut self, value: Var) {
    if self.closed {
      return;
    }
    match T::from_var(&value) {
      Ok(v) => (self.next)(v),
      Err(err) => self.error(err),
    }
  }

  fn error(&mut self, err: Error) {
    self.closed = true;
    if let Some(on_error) = self.error.take() {
      on_error(err);
    }
  }

  fn complete(&mut self) {
    self.closed = true;
    if let Some(on_complete) = self.complete.take() {
      on_complete();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.closed }
}

/// `onError` used when the subscriber supplies none: the error is fatal.
pub fn terminate_on_error(err: Error) { escalate(err) }

/// `onCompleted` used when the subscriber supplies none.
pub fn empty_on_completed() {}

enum Event {
  Next(Var),
  Error(Error),
  Complete,
}

struct SubscriberInner {
  observer: Mutex<Option<Box<dyn Observer>>>,
  subscription: Subscription,
  // Thread currently holding `observer`, and events that thread raised on
  // this same subscriber while delivering.
  delivering_on: Mutex<Option<ThreadId>>,
  reentrant: Mutex<VecDeque<Event>>,
}

/// Ends a delivery pass, also when the observer unwinds: drops events
/// queued during the pass and forgets the delivering thread.
struct DeliveryGuard<'a>(&'a SubscriberInner);

impl Drop for DeliveryGuard<'_> {
  fn drop(&mut self) {
    self.0.reentrant.lock().clear();
    *self.0.delivering_on.lock() = None;
  }
}

/// The sink a producer pushes into.
///
/// A `Subscriber` is created per subscription and may be cloned and moved to
/// other threads, so producers can emit asynchronously. Every delivery first
/// checks that the subscription is still live, which closes the race between
/// `dispose` and a producer that is still running. After a terminal event
/// the subscription is disposed and the wrapped observer is released.
///
/// Deliveries are serialized. An event raised by the observer itself while
/// it is handling another one is queued and delivered right after.
#[derive(Clone)]
pub struct Subscriber(Arc<SubscriberInner>);

impl Subscriber {
  pub fn new(observer: impl Observer, subscription: Subscription) -> Self {
    let inner = Arc::new(SubscriberInner {
      observer: Mutex::new(Some(Box::new(observer))),
      subscription: subscription.clone(),
      delivering_on: Mutex::new(None),
      reentrant: Mutex::new(VecDeque::new()),
    });
    let weak = Arc::downgrade(&inner);
    subscription.add_teardown(move || {
      // A delivery in progress holds the lock and releases the observer
      // itself once it notices the disposal.
      if let Some(inner) = weak.upgrade() {
        if let Some(mut slot) = inner.observer.try_lock() {
          slot.take();
        }
      }
    });
    Subscriber(inner)
  }

  /// Creates the upstream sink for an operator: `observer` receives the
  /// upstream events, and its subscription is disposed together with this
  /// one.
  pub fn chain(&self, observer: impl Observer) -> Subscriber {
    Subscriber::new(observer, self.0.subscription.child())
  }

  pub fn next(&self, value: impl IntoVar) { self.deliver(Event::Next(value.into_var())) }

  pub fn error(&self, err: Error) { self.deliver(Event::Error(err)) }

  pub fn complete(&self) { self.deliver(Event::Complete) }

  fn deliver(&self, event: Event) {
    if self.is_disposed() {
      return;
    }
    let current = thread::current().id();
    let mut slot = match self.0.observer.try_lock() {
      Some(slot) => slot,
      None if *self.0.delivering_on.lock() == Some(current) => {
        self.0.reentrant.lock().push_back(event);
        return;
      }
      None => self.0.observer.lock(),
    };
    *self.0.delivering_on.lock() = Some(current);
    let _delivering = DeliveryGuard(&self.0);
    let mut event = Some(event);
    while let Some(e) = event.take().or_else(|| self.0.reentrant.lock().pop_front()) {
      if self.is_disposed() {
        slot.take();
        break;
      }
      let Some(observer) = slot.as_mut() else { break };
      match e {
        Event::Next(value) => {
          observer.next(value);
          if observer.is_closed() || self.is_disposed() {
            slot.take();
            self.0.subscription.dispose();
            break;
          }
        }
        Event::Error(err) => {
          if let Some(mut observer) = slot.take() {
            self.0.subscription.dispose();
            observer.error(err);
          }
          break;
        }
        Event::Complete => {
          if let Some(mut observer) = slot.take() {
            self.0.subscription.dispose();
            observer.complete();
          }
          break;
        }
      }
    }
  }

  /// Returns `true` once the subscription was disposed or terminated.
  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.subscription.is_disposed() }

  /// The subscription this sink delivers for. Producers attach teardown
  /// here.
  #[inline]
  pub fn subscription(&self) -> &Subscription { &self.0.subscription }

  /// Shorthand for `subscription().add_teardown(..)`.
  pub fn add_teardown(&self, action: impl FnOnce() + Send + 'static) {
    self.0.subscription.add_teardown(action)
  }
}

impl Observer for Subscriber {
  #[inline]
  fn next(&mut self, value: Var) { Subscriber::next(self, value) }

  #[inline]
  fn error(&mut self, err: Error) { Subscriber::error(self, err) }

  #[inline]
  fn complete(&mut self) { Subscriber::complete(self) }

  #[inline]
  fn is_closed(&self) -> bool { self.is_disposed() }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Recorder(Arc<Mutex<Vec<String>>>);

  impl Observer for Recorder {
    fn next(&mut self, value: Var) { self.0.lock().push(value.to_string()) }

    fn error(&mut self, err: Error) { self.0.lock().push(format!("error: {err}")) }

    fn complete(&mut self) { self.0.lock().push("complete".into()) }
  }

  #[test]
  fn nothing_after_terminal_event() {
    let log = Arc::new(Mutex::new(vec![]));
    let s = Subscriber::new(Recorder(log.clone()), Subscription::default());
    s.next(1);
    s.complete();
    s.next(2);
    s.error(Error::msg("late"));
    s.complete();
    assert_eq!(*log.lock(), vec!["1", "complete"]);
    assert!(s.is_disposed());
  }

  #[test]
  fn nothing_after_dispose() {
    let log = Arc::new(Mutex::new(vec![]));
    let subscription = Subscription::default();
    let s = Subscriber::new(Recorder(log.clone()), subscription.clone());
    subscription.dispose();
    s.next(1);
    s.complete();
    assert!(log.lock().is_empty());
  }

  #[test]
  fn typed_closure_reports_mismatch() {
    let log = Arc::new(Mutex::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    let s = Subscriber::new(
      FnObserver::new(
        move |v: i32| l1.lock().push(v.to_string()),
        move |e| l2.lock().push(e.to_string()),
        empty_on_completed,
      ),
      Subscription::default(),
    );
    s.next(5);
    s.next("five");
    s.next(6);
    let log = log.lock();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], "5");
    assert!(log[1].starts_with("Type mismatch"));
    assert!(s.is_disposed());
  }

  struct PanicsOnce {
    log: Arc<Mutex<Vec<String>>>,
    this: Arc<Mutex<Option<Subscriber>>>,
    panicked: bool,
  }

  impl Observer for PanicsOnce {
    fn next(&mut self, value: Var) {
      self.log.lock().push(value.to_string());
      if !self.panicked {
        self.panicked = true;
        if let Some(this) = self.this.lock().clone() {
          this.next("queued");
        }
        panic!("observer failure");
      }
    }

    fn error(&mut self, _: Error) {}

    fn complete(&mut self) {}
  }

  #[test]
  fn unwinding_observer_resets_delivery_state() {
    let log = Arc::new(Mutex::new(vec![]));
    let this = Arc::new(Mutex::new(None));
    let observer = PanicsOnce { log: log.clone(), this: this.clone(), panicked: false };
    let s = Subscriber::new(observer, Subscription::default());
    *this.lock() = Some(s.clone());

    let sink = s.clone();
    let delivery = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || sink.next(1)));
    assert!(delivery.is_err());
    assert!(s.0.reentrant.lock().is_empty());
    assert!(s.0.delivering_on.lock().is_none());

    s.next(2);
    assert_eq!(*log.lock(), vec!["1", "2"]);
    this.lock().take();
  }

  #[test]
  fn dispose_releases_observer() {
    let token = Arc::new(());
    let held = token.clone();
    let subscription = Subscription::default();
    let _s = Subscriber::new(
      FnObserver::new(
        move |_: Var| {
          let _ = &held;
        },
        |_| {},
        || {},
      ),
      subscription.clone(),
    );
    assert_eq!(Arc::strong_count(&token), 2);
    subscription.dispose();
    assert_eq!(Arc::strong_count(&token), 1);
  }
}
