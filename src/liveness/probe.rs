use std::sync::{Arc, Weak};

/// Answers "is the tracked owner still alive?" without dereferencing it.
pub trait LivenessProbe: Send + 'static {
  /// Key of the tracked owner. Probes sharing an address expire together.
  fn address(&self) -> usize;

  fn is_expired(&self) -> bool;
}

impl LivenessProbe for Box<dyn LivenessProbe> {
  fn address(&self) -> usize { (**self).address() }

  fn is_expired(&self) -> bool { (**self).is_expired() }
}

/// Tracks an `Arc`-owned object through a weak reference.
pub struct WeakProbe<T: ?Sized> {
  weak: Weak<T>,
  address: usize,
}

impl<T: ?Sized> WeakProbe<T> {
  pub fn new(owner: &Arc<T>) -> Self {
    WeakProbe { weak: Arc::downgrade(owner), address: Arc::as_ptr(owner) as *const () as usize }
  }
}

impl<T: ?Sized + Send + Sync + 'static> LivenessProbe for WeakProbe<T> {
  fn address(&self) -> usize { self.address }

  fn is_expired(&self) -> bool { self.weak.strong_count() == 0 }
}

/// A token an owner embeds to become trackable; it expires when the owner
/// (and with it the token) is dropped.
///
/// ```rust
/// use rxvar::liveness::{LifetimeToken, LivenessProbe};
///
/// struct Widget {
///   lifetime: LifetimeToken,
/// }
///
/// let widget = Widget { lifetime: LifetimeToken::new() };
/// let probe = widget.lifetime.probe();
/// assert!(!probe.is_expired());
/// drop(widget);
/// assert!(probe.is_expired());
/// ```
#[derive(Debug, Default)]
pub struct LifetimeToken(Arc<()>);

impl LifetimeToken {
  pub fn new() -> Self { Self::default() }

  pub fn probe(&self) -> TokenProbe {
    TokenProbe { weak: Arc::downgrade(&self.0), address: self.address() }
  }

  pub fn address(&self) -> usize { Arc::as_ptr(&self.0) as usize }
}

/// Probe handed out by [`LifetimeToken::probe`].
#[derive(Clone, Debug)]
pub struct TokenProbe {
  weak: Weak<()>,
  address: usize,
}

impl LivenessProbe for TokenProbe {
  fn address(&self) -> usize { self.address }

  fn is_expired(&self) -> bool { self.weak.strong_count() == 0 }
}

/// Probe backed by a predicate returning `true` once the owner is gone.
pub struct FnProbe<F> {
  address: usize,
  expired: F,
}

impl<F> FnProbe<F>
where
  F: Fn() -> bool + Send + 'static,
{
  pub fn new(address: usize, expired: F) -> Self { FnProbe { address, expired } }
}

impl<F> LivenessProbe for FnProbe<F>
where
  F: Fn() -> bool + Send + 'static,
{
  fn address(&self) -> usize { self.address }

  fn is_expired(&self) -> bool { (self.expired)() }
}
