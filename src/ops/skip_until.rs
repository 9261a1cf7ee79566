use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  var::Var,
};

impl Observable {
  /// Ignores items until `other` emits its first item.
  ///
  /// Only an item from `other` opens the gate; `other` completing without
  /// emitting leaves it closed. An error from `other` is forwarded.
  pub fn skip_until(&self, other: &Observable) -> Observable {
    let source = self.detached();
    let other = other.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let open = Arc::new(AtomicBool::new(false));
      let notifier = NotifierObserver { open: open.clone(), downstream: subscriber.clone() };
      other.actual_subscribe(subscriber.chain(notifier));
      if subscriber.is_disposed() {
        return;
      }
      source.actual_subscribe(subscriber.chain(SkipUntilObserver { open, downstream: subscriber.clone() }));
    })
  }
}

struct NotifierObserver {
  open: Arc<AtomicBool>,
  downstream: Subscriber,
}

impl Observer for NotifierObserver {
  fn next(&mut self, _: Var) { self.open.store(true, Ordering::Release) }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.open.load(Ordering::Acquire) || self.downstream.is_disposed() }
}

struct SkipUntilObserver {
  open: Arc<AtomicBool>,
  downstream: Subscriber,
}

impl Observer for SkipUntilObserver {
  fn next(&mut self, value: Var) {
    if self.open.load(Ordering::Acquire) {
      self.downstream.next(value);
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn emits_after_other_emits() {
    let source = PublishSubject::new();
    let trigger = PublishSubject::new();
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    source.as_observable().skip_until(&trigger.as_observable()).subscribe(move |v: i32| sink.lock().push(v));
    source.next(1);
    trigger.next(());
    source.next(2);
    source.next(3);
    assert_eq!(*items.lock(), vec![2, 3]);
    assert_eq!(trigger.subscriber_count(), 0);
  }

  #[test]
  fn other_completing_does_not_open() {
    let source = PublishSubject::new();
    let trigger = PublishSubject::new();
    let items = Arc::new(Mutex::new(Vec::<i32>::new()));
    let sink = items.clone();
    source.as_observable().skip_until(&trigger.as_observable()).subscribe(move |v: i32| sink.lock().push(v));
    trigger.complete();
    source.next(1);
    assert!(items.lock().is_empty());
  }
}
