use std::sync::Arc;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::call_or_report,
  var::Var,
};

type Equals = dyn Fn(&Var, &Var) -> bool + Send + Sync;

impl Observable {
  /// Suppresses items equal to the item emitted right before them.
  ///
  /// Equality is [`Var`]'s `PartialEq`, which compares custom objects by
  /// identity; use [`Observable::distinct_until_changed_by`] to compare them
  /// by value.
  pub fn distinct_until_changed(&self) -> Observable { self.distinct_until_changed_by(|a, b| a == b) }

  /// Suppresses an item when `equals(previous, current)` holds.
  pub fn distinct_until_changed_by<F>(&self, equals: F) -> Observable
  where
    F: Fn(&Var, &Var) -> bool + Send + Sync + 'static,
  {
    let source = self.detached();
    let equals: Arc<Equals> = Arc::new(equals);
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer = DistinctObserver { downstream: subscriber.clone(), equals: equals.clone(), last: None };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct DistinctObserver {
  downstream: Subscriber,
  equals: Arc<Equals>,
  last: Option<Var>,
}

impl Observer for DistinctObserver {
  fn next(&mut self, value: Var) {
    if let Some(last) = &self.last {
      match call_or_report(&self.downstream, || (self.equals)(last, &value)) {
        Some(false) => {}
        _ => return,
      }
    }
    self.last = Some(value.clone());
    self.downstream.next(value);
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
