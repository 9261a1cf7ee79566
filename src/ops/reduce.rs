use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::{call_or_report, unwrap_or_report},
  var::{FromVar, IntoVar, Var},
};

impl Observable {
  /// Folds every item into an accumulator starting at `seed` and emits the
  /// final accumulator once the source completes, right before completing.
  ///
  /// An empty source emits `seed`.
  pub fn reduce<A, T, F>(&self, seed: A, f: F) -> Observable
  where
    A: IntoVar + Clone + Send + Sync + 'static,
    T: FromVar + 'static,
    F: Fn(A, T) -> A + Send + Sync + 'static,
  {
    let source = self.detached();
    let f = Arc::new(f);
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer = ReduceObserver {
        downstream: subscriber.clone(),
        acc: Some(seed.clone()),
        f: f.clone(),
        _hint: PhantomData,
      };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct ReduceObserver<A, T, F> {
  downstream: Subscriber,
  acc: Option<A>,
  f: Arc<F>,
  _hint: PhantomData<fn(T)>,
}

impl<A, T, F> Observer for ReduceObserver<A, T, F>
where
  A: IntoVar + Clone + Send + Sync + 'static,
  T: FromVar + 'static,
  F: Fn(A, T) -> A + Send + Sync + 'static,
{
  fn next(&mut self, value: Var) {
    let Some(v) = unwrap_or_report::<T>(&value, &self.downstream) else { return };
    let Some(acc) = self.acc.take() else { return };
    self.acc = call_or_report(&self.downstream, || (self.f)(acc, v));
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {
    if let Some(acc) = self.acc.take() {
      self.downstream.next(acc);
    }
    self.downstream.complete()
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn emits_final_value_before_completion() {
    let events = Arc::new(Mutex::new(vec![]));
    let (n, c) = (events.clone(), events.clone());
    Observable::range(1, 4, 1).unwrap().reduce(0, |acc: i32, v: i32| acc + v).subscribe_all(
      move |v: i32| n.lock().push(v.to_string()),
      |_| {},
      move || c.lock().push("complete".to_string()),
    );
    assert_eq!(*events.lock(), vec!["10", "complete"]);
  }

  #[test]
  fn empty_source_emits_seed() {
    let items = Observable::empty().reduce(7, |acc: i32, v: i32| acc + v).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![7]);
  }

  #[test]
  fn panic_in_accumulator_is_an_error() {
    let result = Observable::from(vec![1, 2])
      .reduce(0, |_: i32, v: i32| if v == 2 { panic!("overflow") } else { v })
      .to_array();
    assert!(matches!(result, Err(Error::CallbackPanic { .. })));
  }
}
