//! Liveness tracking for owners a stream cannot reference directly.
//!
//! A callback that captures a handle to some owner (a widget, a controller)
//! should stop receiving items once that owner is gone. The owner is
//! described by a [`LivenessProbe`]; a [`LivenessPool`] polls registered
//! probes on a run loop and lets observables end when a probe expires:
//!
//! ```rust
//! use rxvar::prelude::*;
//!
//! let owner = std::sync::Arc::new("widget");
//! let items = PublishSubject::new();
//! let _d = items
//!   .as_observable()
//!   .take_until_deallocated(WeakProbe::new(&owner))
//!   .subscribe(|v: i32| println!("{v}"));
//! ```

mod pool;
mod probe;

pub use pool::LivenessPool;
pub use probe::{FnProbe, LifetimeToken, LivenessProbe, TokenProbe, WeakProbe};
