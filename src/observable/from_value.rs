use std::sync::Arc;

use crate::{
  observable::Observable,
  shared_value::{ListenerId, SharedValue},
  subject::BehaviorSubject,
};

/// Bridges one [`SharedValue`] into a subject for as long as the observable
/// returned by [`Observable::from_value`] (or a copy of it) exists.
struct ValueWatcher {
  value: SharedValue,
  listener: ListenerId,
  subject: BehaviorSubject,
}

impl Drop for ValueWatcher {
  fn drop(&mut self) {
    self.value.remove_listener(self.listener);
    self.subject.complete();
  }
}

impl Observable {
  /// Creates an observable of `value`'s current value and later changes.
  ///
  /// Subscribers receive the current value right away, then every change
  /// once the value's run loop dispatches it. All copies of the returned
  /// handle share one watcher; when the last copy is dropped the watcher
  /// detaches from `value` and completes every live subscription.
  /// Observables derived with operators do not keep the watcher alive.
  pub fn from_value(value: &SharedValue) -> Observable {
    let subject = BehaviorSubject::new(value.get());
    let sink = subject.clone();
    let listener = value.add_listener(move |v| sink.next(v));
    let observable = subject.as_observable();
    let watcher = ValueWatcher { value: value.clone(), listener, subject };
    observable.with_owner(Arc::new(watcher))
  }
}
