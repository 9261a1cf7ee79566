use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::{call_or_report, pack},
  var::{IntoVar, Var},
};

type Combinator = dyn Fn(&[Var]) -> Var + Send + Sync;

impl Observable {
  /// Emits, for every item of this observable, an array of that item and
  /// the latest item of each of `others`. Items arriving before every other
  /// source has emitted are dropped.
  pub fn with_latest_from(&self, others: impl IntoIterator<Item = Observable>) -> Observable {
    self.with_latest_from_with(others, pack)
  }

  /// Like [`Observable::with_latest_from`], emitting `f`'s result instead of
  /// the packed array.
  pub fn with_latest_from_with<R, F>(&self, others: impl IntoIterator<Item = Observable>, f: F) -> Observable
  where
    R: IntoVar,
    F: Fn(&[Var]) -> R + Send + Sync + 'static,
  {
    let source = self.detached();
    let others: Arc<[Observable]> = others.into_iter().map(|o| o.detached()).collect();
    let f: Arc<Combinator> = Arc::new(move |values: &[Var]| f(values).into_var());
    Observable::from_fn(move |subscriber: Subscriber| {
      let latest = Arc::new(Mutex::new(vec![None; others.len()]));
      for (index, other) in others.iter().enumerate() {
        if subscriber.is_disposed() {
          return;
        }
        let observer = OtherObserver { index, latest: latest.clone(), downstream: subscriber.clone() };
        other.actual_subscribe(subscriber.chain(observer));
      }
      let observer = PrimaryObserver { latest, f: f.clone(), downstream: subscriber.clone() };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct OtherObserver {
  index: usize,
  latest: Arc<Mutex<Vec<Option<Var>>>>,
  downstream: Subscriber,
}

impl Observer for OtherObserver {
  fn next(&mut self, value: Var) { self.latest.lock()[self.index] = Some(value) }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {}

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

struct PrimaryObserver {
  latest: Arc<Mutex<Vec<Option<Var>>>>,
  f: Arc<Combinator>,
  downstream: Subscriber,
}

impl Observer for PrimaryObserver {
  fn next(&mut self, value: Var) {
    let values: Option<Vec<Var>> =
      std::iter::once(Some(value)).chain(self.latest.lock().iter().cloned()).collect();
    if let Some(values) = values {
      if let Some(combined) = call_or_report(&self.downstream, || (self.f)(&values)) {
        self.downstream.next(combined);
      }
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
