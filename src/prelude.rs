//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  error::Error,
  impl_var_object,
  liveness::{FnProbe, LifetimeToken, LivenessPool, LivenessProbe, TokenProbe, WeakProbe},
  observable::{Observable, RangeValue},
  observer::{Observer, Subscriber},
  scheduler::{RunLoop, Scheduler},
  shared_value::SharedValue,
  subject::{BehaviorSubject, PublishSubject, ReplaySubject},
  subscription::{Disposable, DisposeBag, ScopedDisposable, Subscription, SubscriptionLike},
  var::{from_var, to_var, FromVar, IntoVar, Var},
};
