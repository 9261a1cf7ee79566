//! Multicast producers that are both an [`Observer`] and an
//! [`Observable`].
//!
//! The three flavours differ only in what a new subscriber sees right away:
//!
//! | Subject | On subscribe |
//! |---------|--------------|
//! | [`BehaviorSubject`] | the current value |
//! | [`PublishSubject`] | nothing |
//! | [`ReplaySubject`] | the buffered items, oldest first |
//!
//! Once completed or errored a subject is terminal for current and future
//! subscribers. Dropping a subject handle does not complete it.
//!
//! [`Observer`]: crate::observer::Observer
//! [`Observable`]: crate::observable::Observable

macro_rules! impl_subject_observer {
  ($t:ty) => {
    impl $t {
      /// Pushes `value` to every current subscriber.
      pub fn next(&self, value: impl $crate::var::IntoVar) { self.core.next($crate::var::IntoVar::into_var(value)) }

      /// Terminates the subject with `err`.
      pub fn error(&self, err: $crate::error::Error) { self.core.error(err) }

      /// Completes the subject.
      pub fn complete(&self) { self.core.complete() }

      /// The read side of this subject.
      pub fn as_observable(&self) -> $crate::observable::Observable { self.core.observable() }

      /// The write side of this subject, for subscribing it to a source.
      pub fn as_observer(&self) -> Self { self.clone() }

      pub fn is_terminated(&self) -> bool { self.core.is_terminated() }

      /// Number of live subscriptions.
      pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }
    }

    impl $crate::observer::Observer for $t {
      fn next(&mut self, value: $crate::var::Var) { self.core.next(value) }

      fn error(&mut self, err: $crate::error::Error) { self.core.error(err) }

      fn complete(&mut self) { self.core.complete() }
    }
  };
}

pub(crate) use impl_subject_observer;

mod behavior_subject;
mod publish_subject;
mod replay_subject;
mod subject_core;

pub use behavior_subject::BehaviorSubject;
pub use publish_subject::PublishSubject;
pub use replay_subject::ReplaySubject;
