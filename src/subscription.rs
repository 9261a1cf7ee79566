//! Subscription lifetime management.
//!
//! [`Subscription`] is the shared cancellation node every producer and
//! operator hangs its teardown on. Users only see the move-only
//! [`Disposable`] returned from `subscribe`, its RAII flavour
//! [`ScopedDisposable`], and the [`DisposeBag`] container.

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;
use smallvec::SmallVec;

/// Anything that can be cancelled and asked whether it already was.
pub trait SubscriptionLike {
  /// Cancels the subscription. Calling it again is a no-op.
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

enum Teardown {
  Child(Subscription),
  Action(Box<dyn FnOnce() + Send>),
}

impl Teardown {
  fn run(self) {
    match self {
      Teardown::Child(child) => child.dispose(),
      Teardown::Action(action) => action(),
    }
  }

  fn is_finished(&self) -> bool {
    match self {
      Teardown::Child(child) => child.is_disposed(),
      Teardown::Action(_) => false,
    }
  }
}

#[derive(Default)]
struct Inner {
  disposed: AtomicBool,
  teardown: Mutex<SmallVec<[Teardown; 2]>>,
}

/// Thread-safe, cloneable cancellation node.
///
/// Clones share state: disposing any clone disposes them all and runs every
/// registered teardown exactly once.
#[derive(Clone, Default)]
pub struct Subscription(Arc<Inner>);

impl Subscription {
  pub fn new() -> Self { Self::default() }

  /// Registers `child` to be disposed together with this subscription.
  ///
  /// If this subscription is already disposed, `child` is disposed
  /// immediately.
  pub fn add(&self, child: Subscription) {
    if Arc::ptr_eq(&self.0, &child.0) {
      return;
    }
    self.push(Teardown::Child(child));
  }

  /// Registers a closure to run on dispose.
  pub fn add_teardown(&self, action: impl FnOnce() + Send + 'static) {
    self.push(Teardown::Action(Box::new(action)));
  }

  /// Creates a subscription that is disposed along with this one.
  pub fn child(&self) -> Subscription {
    let child = Subscription::default();
    self.add(child.clone());
    child
  }

  fn push(&self, teardown: Teardown) {
    {
      let mut list = self.0.teardown.lock();
      if !self.is_disposed() {
        list.retain(|t| !t.is_finished());
        list.push(teardown);
        return;
      }
    }
    teardown.run();
  }

  pub(crate) fn teardown_size(&self) -> usize { self.0.teardown.lock().len() }
}

impl SubscriptionLike for Subscription {
  fn dispose(&self) {
    if self.0.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    let teardown = std::mem::take(&mut *self.0.teardown.lock());
    for t in teardown {
      t.run();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.disposed.load(Ordering::Acquire) }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("is_disposed", &self.is_disposed()).finish()
  }
}

/// Handle returned from `subscribe`.
///
/// Move-only. Dropping it does **not** unsubscribe; call
/// [`Disposable::dispose`], hand it to a [`DisposeBag`], or convert it with
/// [`Disposable::dispose_when_dropped`].
#[derive(Debug)]
pub struct Disposable(pub(crate) Subscription);

impl Disposable {
  pub(crate) fn new(subscription: Subscription) -> Self { Disposable(subscription) }

  /// Stops delivery to the subscribed observer.
  #[inline]
  pub fn dispose(&self) { self.0.dispose() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }

  /// Moves this handle into `bag`, which disposes it when cleared or dropped.
  pub fn disposed_by(self, bag: &DisposeBag) { bag.insert(self) }

  /// Activates "RAII" behavior for this subscription. That means
  /// `dispose()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `dispose()` is called immediately, which is probably not what you
  /// want!
  pub fn dispose_when_dropped(self) -> ScopedDisposable { ScopedDisposable(self.0) }

  /// Returns the underlying shared subscription.
  pub fn into_inner(self) -> Subscription { self.0 }
}

impl SubscriptionLike for Disposable {
  #[inline]
  fn dispose(&self) { self.0.dispose() }
  #[inline]
  fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be disposed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct ScopedDisposable(Subscription);

impl ScopedDisposable {
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

impl From<Disposable> for ScopedDisposable {
  fn from(d: Disposable) -> Self { d.dispose_when_dropped() }
}

impl Drop for ScopedDisposable {
  #[inline]
  fn drop(&mut self) { self.0.dispose() }
}

/// Owns a set of [`Disposable`]s and disposes all of them together.
///
/// Disposal happens on [`DisposeBag::clear`] or when the bag is dropped.
/// Inserting into a bag that was already cleared disposes the handle
/// immediately.
#[derive(Default)]
pub struct DisposeBag {
  inner: Mutex<BagState>,
}

#[derive(Default)]
struct BagState {
  cleared: bool,
  items: Vec<Subscription>,
}

impl DisposeBag {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&self, disposable: Disposable) {
    let mut state = self.inner.lock();
    if state.cleared {
      drop(state);
      disposable.dispose();
    } else {
      state.items.retain(|s| !s.is_disposed());
      state.items.push(disposable.0);
    }
  }

  /// Disposes everything held. Later insertions are disposed on arrival.
  pub fn clear(&self) {
    let items = {
      let mut state = self.inner.lock();
      state.cleared = true;
      std::mem::take(&mut state.items)
    };
    for s in items {
      s.dispose();
    }
  }

  pub fn len(&self) -> usize { self.inner.lock().items.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Drop for DisposeBag {
  fn drop(&mut self) { self.clear() }
}

impl Debug for DisposeBag {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DisposeBag").field("len", &self.len()).finish()
  }
}
