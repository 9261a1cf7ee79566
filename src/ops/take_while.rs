use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::{call_or_report, unwrap_or_report},
  var::{FromVar, Var},
};

impl Observable {
  /// Emits items while `predicate` holds, and completes at the first item
  /// for which it does not.
  pub fn take_while<T, F>(&self, predicate: F) -> Observable
  where
    T: FromVar + 'static,
    F: Fn(T) -> bool + Send + Sync + 'static,
  {
    let source = self.detached();
    let predicate = Arc::new(predicate);
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer =
        TakeWhileObserver { downstream: subscriber.clone(), predicate: predicate.clone(), _hint: PhantomData };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct TakeWhileObserver<T, F> {
  downstream: Subscriber,
  predicate: Arc<F>,
  _hint: PhantomData<fn(T)>,
}

impl<T, F> Observer for TakeWhileObserver<T, F>
where
  T: FromVar + 'static,
  F: Fn(T) -> bool + Send + Sync + 'static,
{
  fn next(&mut self, value: Var) {
    let Some(v) = unwrap_or_report::<T>(&value, &self.downstream) else { return };
    match call_or_report(&self.downstream, || (self.predicate)(v)) {
      Some(true) => self.downstream.next(value),
      Some(false) => self.downstream.complete(),
      None => {}
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn stops_at_first_failing_item() {
    let items = Observable::from(vec![1, 2, 5, 3]).take_while(|v: i32| v < 4).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![1, 2]);
  }

  #[test]
  fn stops_an_infinite_source() {
    let items = Observable::range(0, i32::MAX, 10).unwrap().take_while(|v: i32| v < 30).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![0, 10, 20]);
  }
}
