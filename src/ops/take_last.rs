use std::collections::VecDeque;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  var::Var,
};

impl Observable {
  /// Emits the last `count` items once the source completes.
  pub fn take_last(&self, count: usize) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer =
        TakeLastObserver { downstream: subscriber.clone(), count, queue: VecDeque::with_capacity(count.min(64)) };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct TakeLastObserver {
  downstream: Subscriber,
  count: usize,
  queue: VecDeque<Var>,
}

impl Observer for TakeLastObserver {
  fn next(&mut self, value: Var) {
    if self.count == 0 {
      return;
    }
    if self.queue.len() == self.count {
      self.queue.pop_front();
    }
    self.queue.push_back(value);
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {
    for value in self.queue.drain(..) {
      self.downstream.next(value);
    }
    self.downstream.complete();
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn base_function() {
    let items = Observable::range(0, 99, 1).unwrap().take_last(3).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![97, 98, 99]);
  }

  #[test]
  fn nothing_before_completion() {
    let subject = PublishSubject::new();
    let items = std::sync::Arc::new(parking_lot::Mutex::new(vec![]));
    let sink = items.clone();
    subject.as_observable().take_last(2).subscribe(move |v: i32| sink.lock().push(v));
    subject.next(1);
    subject.next(2);
    subject.next(3);
    assert!(items.lock().is_empty());
    subject.complete();
    assert_eq!(*items.lock(), vec![2, 3]);
  }
}
