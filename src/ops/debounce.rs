use std::{sync::Arc, time::Duration};

use futures::future::AbortHandle;
use parking_lot::{Mutex, ReentrantMutex};

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  scheduler::timer,
  var::Var,
};

impl Observable {
  /// Emits an item only once `interval` has passed without another item.
  ///
  /// A pending item is flushed when the source completes. Delayed items are
  /// delivered on the shared background worker.
  pub fn debounce(&self, interval: Duration) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let state = Arc::new(Mutex::new(DebounceState::default()));
      let cancel = state.clone();
      subscriber.add_teardown(move || cancel.lock().cancel_timer());
      let observer = DebounceObserver {
        interval,
        state,
        emitting: Arc::new(ReentrantMutex::new(())),
        downstream: subscriber.clone(),
      };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

#[derive(Default)]
struct DebounceState {
  pending: Option<Var>,
  generation: u64,
  timer: Option<AbortHandle>,
}

impl DebounceState {
  fn cancel_timer(&mut self) {
    if let Some(timer) = self.timer.take() {
      timer.abort();
    }
  }
}

struct DebounceObserver {
  interval: Duration,
  state: Arc<Mutex<DebounceState>>,
  // Held from taking the pending item until it is delivered, so a timer
  // firing and the source completing cannot interleave.
  emitting: Arc<ReentrantMutex<()>>,
  downstream: Subscriber,
}

impl Observer for DebounceObserver {
  fn next(&mut self, value: Var) {
    let generation = {
      let mut state = self.state.lock();
      state.cancel_timer();
      state.generation += 1;
      state.pending = Some(value);
      state.generation
    };
    let (state, downstream) = (self.state.clone(), self.downstream.clone());
    let emitting = self.emitting.clone();
    let timer = timer::delay(self.interval, move || {
      let _emitting = emitting.lock();
      let value = {
        let mut state = state.lock();
        if state.generation != generation {
          return;
        }
        state.timer = None;
        state.pending.take()
      };
      if let Some(value) = value {
        downstream.next(value);
      }
    });
    let mut state = self.state.lock();
    if state.generation == generation && state.pending.is_some() {
      state.timer = Some(timer);
    }
  }

  fn error(&mut self, err: Error) {
    self.state.lock().cancel_timer();
    self.downstream.error(err)
  }

  fn complete(&mut self) {
    let _emitting = self.emitting.lock();
    let pending = {
      let mut state = self.state.lock();
      state.cancel_timer();
      state.generation += 1;
      state.pending.take()
    };
    if let Some(value) = pending {
      self.downstream.next(value);
    }
    self.downstream.complete()
  }

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

  fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(5) {
      if done() {
        return true;
      }
      thread::sleep(Duration::from_millis(1));
    }
    false
  }

  #[test]
  fn emits_only_after_a_quiet_interval() {
    let subject = PublishSubject::new();
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    subject.as_observable().debounce(Duration::from_millis(50)).subscribe(move |v: i32| sink.lock().push(v));
    subject.next(1);
    subject.next(2);
    subject.next(3);
    assert!(wait_for(|| !items.lock().is_empty()));
    thread::sleep(Duration::from_millis(60));
    assert_eq!(*items.lock(), vec![3]);
  }

  #[test]
  fn flushes_pending_item_on_completion() {
    let items = Observable::from(vec![1, 2, 3]).debounce(Duration::from_secs(10)).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![3]);
  }

  #[test]
  fn completing_while_a_timer_fires_keeps_the_item() {
    for round in 0..200 {
      let subject = PublishSubject::new();
      let log = Arc::new(Mutex::new(vec![]));
      let (n, c) = (log.clone(), log.clone());
      subject.as_observable().debounce(Duration::ZERO).subscribe_all(
        move |v: i32| n.lock().push(v.to_string()),
        |_| {},
        move || c.lock().push("complete".to_string()),
      );
      subject.next(round);
      if round % 2 == 0 {
        thread::yield_now();
      }
      subject.complete();
      assert!(wait_for(|| log.lock().len() == 2));
      assert_eq!(*log.lock(), vec![round.to_string(), "complete".to_string()]);
    }
  }

  #[test]
  fn dispose_cancels_pending_item() {
    let subject = PublishSubject::new();
    let items = Arc::new(Mutex::new(Vec::<i32>::new()));
    let sink = items.clone();
    let d = subject.as_observable().debounce(Duration::from_millis(10)).subscribe(move |v: i32| sink.lock().push(v));
    subject.next(1);
    d.dispose();
    thread::sleep(Duration::from_millis(40));
    assert!(items.lock().is_empty());
  }
}
