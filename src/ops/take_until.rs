use crate::{
  error::Error,
  liveness::{LivenessPool, LivenessProbe},
  observable::Observable,
  observer::{Observer, Subscriber},
  var::Var,
};

impl Observable {
  /// Emits items until `other` emits its first item, then completes.
  ///
  /// `other` completing without emitting has no effect. An error from
  /// `other` is forwarded.
  pub fn take_until(&self, other: &Observable) -> Observable {
    let source = self.detached();
    let other = other.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      other.actual_subscribe(subscriber.chain(NotifierObserver { downstream: subscriber.clone() }));
      if subscriber.is_disposed() {
        return;
      }
      source.actual_subscribe(subscriber.chain(PassObserver { downstream: subscriber.clone() }));
    })
  }

  /// Emits items until the owner tracked by `probe` is gone, as detected by
  /// the global [`LivenessPool`].
  ///
  /// Use this when the observer captures a handle to an owner whose
  /// destruction it cannot see otherwise.
  pub fn take_until_deallocated(&self, probe: impl LivenessProbe) -> Observable {
    self.take_until(&LivenessPool::global().deallocated(probe))
  }
}

struct NotifierObserver {
  downstream: Subscriber,
}

impl Observer for NotifierObserver {
  fn next(&mut self, _: Var) { self.downstream.complete() }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

struct PassObserver {
  downstream: Subscriber,
}

impl Observer for PassObserver {
  fn next(&mut self, value: Var) { self.downstream.next(value) }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
