use std::{marker::PhantomData, sync::Arc};

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::{call_or_report, unwrap_or_report},
  var::{FromVar, Var},
};

impl Observable {
  /// Emits only the items for which `predicate` returns `true`.
  pub fn filter<T, F>(&self, predicate: F) -> Observable
  where
    T: FromVar + 'static,
    F: Fn(T) -> bool + Send + Sync + 'static,
  {
    let source = self.detached();
    let predicate = Arc::new(predicate);
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer =
        FilterObserver { downstream: subscriber.clone(), predicate: predicate.clone(), _hint: PhantomData };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct FilterObserver<T, F> {
  downstream: Subscriber,
  predicate: Arc<F>,
  _hint: PhantomData<fn(T)>,
}

impl<T, F> Observer for FilterObserver<T, F>
where
  T: FromVar + 'static,
  F: Fn(T) -> bool + Send + Sync + 'static,
{
  fn next(&mut self, value: Var) {
    let Some(v) = unwrap_or_report::<T>(&value, &self.downstream) else { return };
    if call_or_report(&self.downstream, || (self.predicate)(v)) == Some(true) {
      self.downstream.next(value);
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
  fn filters_ints() {
    let items = Observable::range(4, 9, 1).unwrap().filter(|v: i32| v % 2 == 0).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![4, 6, 8]);
  }

  #[test]
  fn filters_strings() {
    let items = Observable::from(vec!["Hello", "Great", "World", "Hey"])
      .filter(|s: String| s.starts_with('H'))
      .to_vec::<String>()
      .unwrap();
    assert_eq!(items, vec!["Hello", "Hey"]);
  }

  #[test]
  fn filters_mixed_payloads_as_var() {
    let items = Observable::from(vec![3.into_var(), "Hello".into_var(), 5.43.into_var()])
      .filter(|v: Var| v.is_double())
      .to_array()
      .unwrap();
    assert_eq!(items, vec![5.43.into_var()]);
  }

  #[test]
  fn panicking_predicate_errors() {
    let result = Observable::from(vec![1]).filter(|_: i32| -> bool { panic!("bad predicate") }).to_array();
    assert!(matches!(result, Err(Error::CallbackPanic { .. })));
  }
}
