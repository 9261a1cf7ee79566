use std::sync::Arc;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  scheduler::{Scheduler, Worker},
  var::Var,
};

impl Observable {
  /// Re-emits every event of this observable on `scheduler`'s thread role.
  ///
  /// Events keep their order. Each subscription gets its own worker: with
  /// [`Scheduler::NewThread`] that is one thread per subscription, stopped
  /// once the subscription ends.
  ///
  /// Disposing the subscription stops delivery of events that were already
  /// scheduled but not yet delivered.
  pub fn observe_on(&self, scheduler: Scheduler) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let worker = Arc::new(scheduler.worker());
      let releasing = worker.clone();
      subscriber.add_teardown(move || releasing.release());
      let observer = ObserveOnObserver { worker, downstream: subscriber.clone() };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct ObserveOnObserver {
  worker: Arc<Worker>,
  downstream: Subscriber,
}

impl Observer for ObserveOnObserver {
  fn next(&mut self, value: Var) {
    let downstream = self.downstream.clone();
    self.worker.schedule(move || downstream.next(value));
  }

  fn error(&mut self, err: Error) {
    let downstream = self.downstream.clone();
    self.worker.schedule(move || downstream.error(err));
  }

  fn complete(&mut self) {
    let downstream = self.downstream.clone();
    self.worker.schedule(move || downstream.complete());
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
