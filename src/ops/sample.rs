use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  scheduler::timer,
  var::Var,
};

impl Observable {
  /// Every `interval`, emits the most recent item if one arrived since the
  /// previous emission.
  ///
  /// An item still unsampled when the source completes is dropped. Items
  /// are delivered on the shared background worker.
  pub fn sample(&self, interval: Duration) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let latest = Arc::new(Mutex::new(None));
      let (ticking, downstream) = (latest.clone(), subscriber.clone());
      let timer = timer::periodic(interval, move || {
        if downstream.is_disposed() {
          return false;
        }
        let value = ticking.lock().take();
        if let Some(value) = value {
          downstream.next(value);
        }
        !downstream.is_disposed()
      });
      subscriber.add_teardown(move || timer.abort());
      let observer = SampleObserver { latest, downstream: subscriber.clone() };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct SampleObserver {
  latest: Arc<Mutex<Option<Var>>>,
  downstream: Subscriber,
}

impl Observer for SampleObserver {
  fn next(&mut self, value: Var) { *self.latest.lock() = Some(value) }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
  };

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn emits_latest_item_each_period() {
    let subject = PublishSubject::new();
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    let d = subject.as_observable().sample(Duration::from_millis(20)).subscribe(move |v: i32| sink.lock().push(v));
    subject.next(1);
    subject.next(2);
    let start = Instant::now();
    while items.lock().is_empty() && start.elapsed() < Duration::from_secs(5) {
      thread::sleep(Duration::from_millis(1));
    }
    thread::sleep(Duration::from_millis(60));
    assert_eq!(*items.lock(), vec![2]);
    d.dispose();
  }

  #[test]
  fn unsampled_item_is_dropped_on_completion() {
    let items = Observable::from(vec![1, 2]).sample(Duration::from_secs(10)).to_array().unwrap();
    assert!(items.is_empty());
  }
}
