use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::{call_or_report, unwrap_or_report},
  var::{FromVar, IntoVar, Var},
};

impl Observable {
  /// Folds each item into an accumulator starting at `seed` and emits every
  /// intermediate accumulator.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::range(1, 5, 1).unwrap().scan(10, |acc: i32, v: i32| acc + v);
  /// assert_eq!(o.to_vec::<i32>().unwrap(), vec![11, 13, 16, 20, 25]);
  /// ```
  pub fn scan<A, T, F>(&self, seed: A, f: F) -> Observable
  where
    A: IntoVar + Clone + Send + Sync + 'static,
    T: FromVar + 'static,
    F: Fn(A, T) -> A + Send + Sync + 'static,
  {
    let source = self.detached();
    let f = Arc::new(f);
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer = ScanObserver {
        downstream: subscriber.clone(),
        acc: Some(seed.clone()),
        f: f.clone(),
        _hint: PhantomData,
      };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct ScanObserver<A, T, F> {
  downstream: Subscriber,
  acc: Option<A>,
  f: Arc<F>,
  _hint: PhantomData<fn(T)>,
}

impl<A, T, F> Observer for ScanObserver<A, T, F>
where
  A: IntoVar + Clone + Send + Sync + 'static,
  T: FromVar + 'static,
  F: Fn(A, T) -> A + Send + Sync + 'static,
{
  fn next(&mut self, value: Var) {
    let Some(v) = unwrap_or_report::<T>(&value, &self.downstream) else { return };
    let Some(acc) = self.acc.take() else { return };
    if let Some(acc) = call_or_report(&self.downstream, || (self.f)(acc, v)) {
      self.acc = Some(acc.clone());
      self.downstream.next(acc);
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
