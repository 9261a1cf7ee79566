use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::{call_or_report, pack},
  var::{IntoVar, Var},
};

type Combinator = dyn Fn(&[Var]) -> Var + Send + Sync;

impl Observable {
  /// Combines this observable with `others`, emitting an array of the latest
  /// item of every source whenever any of them emits, once each has emitted
  /// at least once.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::just(1).combine_latest([Observable::just("a")]);
  /// assert_eq!(o.to_vec::<(i32, String)>().unwrap(), vec![(1, "a".to_string())]);
  /// ```
  pub fn combine_latest(&self, others: impl IntoIterator<Item = Observable>) -> Observable {
    self.combine_latest_with(others, pack)
  }

  /// Like [`Observable::combine_latest`], passing the latest items (this
  /// observable's first) to `f` and emitting its result.
  pub fn combine_latest_with<R, F>(&self, others: impl IntoIterator<Item = Observable>, f: F) -> Observable
  where
    R: IntoVar,
    F: Fn(&[Var]) -> R + Send + Sync + 'static,
  {
    let sources: Arc<[Observable]> =
      std::iter::once(self.detached()).chain(others.into_iter().map(|o| o.detached())).collect();
    let f: Arc<Combinator> = Arc::new(move |values: &[Var]| f(values).into_var());
    Observable::from_fn(move |subscriber: Subscriber| {
      let emitting = Arc::new(ReentrantMutex::new(()));
      let state = Arc::new(Mutex::new(CombineState {
        latest: vec![None; sources.len()],
        completed: vec![false; sources.len()],
      }));
      for (index, source) in sources.iter().enumerate() {
        if subscriber.is_disposed() {
          break;
        }
        let observer = CombineObserver {
          index,
          state: state.clone(),
          emitting: emitting.clone(),
          f: f.clone(),
          downstream: subscriber.clone(),
        };
        source.actual_subscribe(subscriber.chain(observer));
      }
    })
  }
}

struct CombineState {
  latest: Vec<Option<Var>>,
  completed: Vec<bool>,
}

struct CombineObserver {
  index: usize,
  state: Arc<Mutex<CombineState>>,
  // Shared by all sources: state updates and the deliveries they cause
  // happen in the same order.
  emitting: Arc<ReentrantMutex<()>>,
  f: Arc<Combinator>,
  downstream: Subscriber,
}

impl Observer for CombineObserver {
  fn next(&mut self, value: Var) {
    let _emitting = self.emitting.lock();
    let values: Option<Vec<Var>> = {
      let mut state = self.state.lock();
      state.latest[self.index] = Some(value);
      state.latest.iter().cloned().collect()
    };
    if let Some(values) = values {
      if let Some(combined) = call_or_report(&self.downstream, || (self.f)(&values)) {
        self.downstream.next(combined);
      }
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {
    let _emitting = self.emitting.lock();
    let done = {
      let mut state = self.state.lock();
      state.completed[self.index] = true;
      // A source that completes silently means no combination can ever be
      // emitted.
      state.latest[self.index].is_none() || state.completed.iter().all(|c| *c)
    };
    if done {
      self.downstream.complete();
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
