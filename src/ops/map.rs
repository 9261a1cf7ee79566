use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::{Error, Result},
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::{call_or_report, unwrap_or_report},
  var::{FromVar, IntoVar, Var},
};

impl Observable {
  /// Applies `f` to each item and emits the result.
  ///
  /// `f` may return another [`Observable`], producing a stream of streams
  /// that `switch_on_next` or `merge_all` can flatten.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::range(4, 7, 2).unwrap().map(|v: i32| f64::from(v) * 1.5);
  /// assert_eq!(o.to_vec::<f64>().unwrap(), vec![6.0, 9.0, 10.5]);
  /// ```
  pub fn map<T, R, F>(&self, f: F) -> Observable
  where
    T: FromVar + 'static,
    R: IntoVar,
    F: Fn(T) -> R + Send + Sync + 'static,
  {
    self.try_map(move |v: T| Ok(f(v)))
  }

  /// Like [`Observable::map`], but `f` may fail; an `Err` terminates the
  /// stream with that error.
  pub fn try_map<T, R, F>(&self, f: F) -> Observable
  where
    T: FromVar + 'static,
    R: IntoVar,
    F: Fn(T) -> Result<R> + Send + Sync + 'static,
  {
    let source = self.detached();
    let f = Arc::new(f);
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer = MapObserver { downstream: subscriber.clone(), f: f.clone(), _hint: PhantomData };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct MapObserver<T, F> {
  downstream: Subscriber,
  f: Arc<F>,
  _hint: PhantomData<fn(T)>,
}

impl<T, R, F> Observer for MapObserver<T, F>
where
  T: FromVar + 'static,
  R: IntoVar,
  F: Fn(T) -> Result<R> + Send + Sync + 'static,
{
  fn next(&mut self, value: Var) {
    let Some(v) = unwrap_or_report::<T>(&value, &self.downstream) else { return };
    match call_or_report(&self.downstream, || (self.f)(v)) {
      Some(Ok(mapped)) => self.downstream.next(mapped),
      Some(Err(err)) => self.downstream.error(err),
      None => {}
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
