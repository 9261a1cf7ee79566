//! # rxvar: a dynamically typed reactive stream runtime
//!
//! Push-based event streams carrying a boxed [`Var`] payload, with the usual
//! operator algebra, multicast subjects, subscription lifetime management,
//! cross-thread delivery and liveness tracking for owners a callback cannot
//! reference directly.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxvar::prelude::*;
//!
//! let bag = DisposeBag::new();
//! Observable::range(1, 10, 1)
//!   .unwrap()
//!   .filter(|v: i32| v % 2 == 0)
//!   .map(|v: i32| v * 2)
//!   .subscribe(|v: i32| println!("Value: {}", v))
//!   .disposed_by(&bag);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Var`] | The boxed payload and its `IntoVar`/`FromVar` conversions |
//! | [`Observable`] | Shareable stream definition plus the operators |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Disposable`] / [`DisposeBag`] | Handles to cancel active subscriptions |
//! | [`BehaviorSubject`] / [`PublishSubject`] / [`ReplaySubject`] | Multicast producers |
//! | [`Scheduler`] / [`RunLoop`] | Thread roles for `observe_on` |
//! | [`LivenessPool`] | Ends streams when a tracked owner goes away |
//!
//! ## Errors
//!
//! A panic inside a callback given to `create`, `defer` or an operator is
//! delivered as [`Error::CallbackPanic`] to that subscription's `onError`.
//! `subscribe` without an error handler treats an error as fatal: it is
//! logged and re-raised as an [`error::UnhandledError`] panic.
//!
//! ## Feature Flags
//!
//! - **`timer`** (default): `interval`, `debounce` and `sample`, driven by
//!   `futures-time` on the shared background worker.
//!
//! [`Var`]: var::Var
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Disposable`]: subscription::Disposable
//! [`DisposeBag`]: subscription::DisposeBag
//! [`BehaviorSubject`]: subject::BehaviorSubject
//! [`PublishSubject`]: subject::PublishSubject
//! [`ReplaySubject`]: subject::ReplaySubject
//! [`Scheduler`]: scheduler::Scheduler
//! [`RunLoop`]: scheduler::RunLoop
//! [`LivenessPool`]: liveness::LivenessPool
//! [`Error::CallbackPanic`]: error::Error::CallbackPanic

pub mod error;
pub mod liveness;
pub mod observable;
pub mod observer;
mod ops;
pub mod prelude;
pub mod scheduler;
pub mod shared_value;
pub mod subject;
pub mod subscription;
pub mod var;

pub use error::{Error, Result};
