use std::{collections::VecDeque, sync::Arc};

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
  /// Pairs the n-th items of this observable and `others` positionally into
  /// arrays. Completes as soon as the shortest source is exhausted.
  pub fn zip(&self, others: impl IntoIterator<Item = Observable>) -> Observable {
    self.zip_with(others, pack)
  }

  /// Like [`Observable::zip`], emitting `f`'s result for each group.
  pub fn zip_with<R, F>(&self, others: impl IntoIterator<Item = Observable>, f: F) -> Observable
  where
    R: IntoVar,
    F: Fn(&[Var]) -> R + Send + Sync + 'static,
  {
    let sources: Arc<[Observable]> =
      std::iter::once(self.detached()).chain(others.into_iter().map(|o| o.detached())).collect();
    let f: Arc<Combinator> = Arc::new(move |values: &[Var]| f(values).into_var());
    Observable::from_fn(move |subscriber: Subscriber| {
      let emitting = Arc::new(ReentrantMutex::new(()));
      let state = Arc::new(Mutex::new(ZipState {
        queues: vec![VecDeque::new(); sources.len()],
        completed: vec![false; sources.len()],
      }));
      for (index, source) in sources.iter().enumerate() {
        if subscriber.is_disposed() {
          break;
        }
        let observer = ZipObserver {
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

struct ZipState {
  queues: Vec<VecDeque<Var>>,
  completed: Vec<bool>,
}

impl ZipState {
  fn pop_group(&mut self) -> Option<Vec<Var>> {
    if self.queues.iter().any(VecDeque::is_empty) {
      return None;
    }
    self.queues.iter_mut().map(VecDeque::pop_front).collect()
  }

  /// A source that completed with nothing left queued ends the zip.
  fn exhausted(&self) -> bool { self.queues.iter().zip(&self.completed).any(|(q, done)| *done && q.is_empty()) }
}

struct ZipObserver {
  index: usize,
  state: Arc<Mutex<ZipState>>,
  // Shared by all sources: state updates and the deliveries they cause
  // happen in the same order.
  emitting: Arc<ReentrantMutex<()>>,
  f: Arc<Combinator>,
  downstream: Subscriber,
}

impl Observer for ZipObserver {
  fn next(&mut self, value: Var) {
    let _emitting = self.emitting.lock();
    let (group, exhausted) = {
      let mut state = self.state.lock();
      state.queues[self.index].push_back(value);
      let group = state.pop_group();
      (group, state.exhausted())
    };
    if let Some(values) = group {
      if let Some(zipped) = call_or_report(&self.downstream, || (self.f)(&values)) {
        self.downstream.next(zipped);
      }
    }
    if exhausted {
      self.downstream.complete();
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {
    let _emitting = self.emitting.lock();
    let exhausted = {
      let mut state = self.state.lock();
      state.completed[self.index] = true;
      state.exhausted()
    };
    if exhausted {
      self.downstream.complete();
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}
