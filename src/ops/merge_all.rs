use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::unwrap_or_report,
  var::{FromVar, Var},
};

impl Observable {
  /// Subscribes to this observable and all of `others` at once and
  /// interleaves their items in arrival order.
  ///
  /// Completes once every source completed; the first error is forwarded
  /// right away and the remaining sources are abandoned.
  pub fn merge(&self, others: impl IntoIterator<Item = Observable>) -> Observable {
    let sources: Vec<Observable> =
      std::iter::once(self.detached()).chain(others.into_iter().map(|o| o.detached())).collect();
    Observable::from(sources).merge_all()
  }

  /// Flattens an observable of observables by subscribing to every inner
  /// observable as it arrives.
  ///
  /// An item that is not an observable terminates the stream with
  /// [`Error::NotAnObservable`].
  pub fn merge_all(&self) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let state = Arc::new(Mutex::new(MergeState { active: 0, outer_done: false }));
      let observer = OuterObserver { state, downstream: subscriber.clone() };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }

  /// Maps every item to an observable with `f` and merges their items.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::from(vec!["Hello", "World"])
  ///   .flat_map(|s: String| Observable::from(vec![s.to_lowercase(), s.to_uppercase() + "!"]));
  /// assert_eq!(o.to_vec::<String>().unwrap(), vec!["hello", "HELLO!", "world", "WORLD!"]);
  /// ```
  pub fn flat_map<T, F>(&self, f: F) -> Observable
  where
    T: FromVar + 'static,
    F: Fn(T) -> Observable + Send + Sync + 'static,
  {
    self.map(f).merge_all()
  }
}

struct MergeState {
  active: usize,
  outer_done: bool,
}

struct OuterObserver {
  state: Arc<Mutex<MergeState>>,
  downstream: Subscriber,
}

impl Observer for OuterObserver {
  fn next(&mut self, value: Var) {
    let Some(inner) = unwrap_or_report::<Observable>(&value, &self.downstream) else { return };
    self.state.lock().active += 1;
    let observer = InnerObserver { state: self.state.clone(), downstream: self.downstream.clone() };
    inner.actual_subscribe(self.downstream.chain(observer));
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.state.lock();
      state.outer_done = true;
      state.active == 0
    };
    if done {
      self.downstream.complete();
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

struct InnerObserver {
  state: Arc<Mutex<MergeState>>,
  downstream: Subscriber,
}

impl Observer for InnerObserver {
  fn next(&mut self, value: Var) { self.downstream.next(value) }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.state.lock();
      state.active -= 1;
      state.outer_done && state.active == 0
    };
    if done {
      self.downstream.complete();
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
