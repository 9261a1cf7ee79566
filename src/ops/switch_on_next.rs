use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  ops::unwrap_or_report,
  subscription::{Subscription, SubscriptionLike},
  var::Var,
};

impl Observable {
  /// Flattens an observable of observables by following only the most
  /// recent inner observable.
  ///
  /// Each new inner observable replaces (and unsubscribes) the previous
  /// one. An item that is not an observable terminates the stream with
  /// [`Error::NotAnObservable`]. Completes once the outer observable and the
  /// current inner observable have both completed.
  pub fn switch_on_next(&self) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let state = Arc::new(Mutex::new(SwitchState::default()));
      let observer = OuterObserver { state, downstream: subscriber.clone() };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

#[derive(Default)]
struct SwitchState {
  generation: u64,
  inner: Option<Subscription>,
  inner_active: bool,
  outer_done: bool,
}

struct OuterObserver {
  state: Arc<Mutex<SwitchState>>,
  downstream: Subscriber,
}

impl Observer for OuterObserver {
  fn next(&mut self, value: Var) {
    let Some(inner) = unwrap_or_report::<Observable>(&value, &self.downstream) else { return };
    let subscription = self.downstream.subscription().child();
    let (generation, previous) = {
      let mut state = self.state.lock();
      state.generation += 1;
      state.inner_active = true;
      (state.generation, state.inner.replace(subscription.clone()))
    };
    if let Some(previous) = previous {
      previous.dispose();
    }
    let observer = InnerObserver { generation, state: self.state.clone(), downstream: self.downstream.clone() };
    inner.actual_subscribe(Subscriber::new(observer, subscription));
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) {
    let done = {
      let mut state = self.state.lock();
      state.outer_done = true;
      !state.inner_active
    };
    if done {
      self.downstream.complete();
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

struct InnerObserver {
  generation: u64,
  state: Arc<Mutex<SwitchState>>,
  downstream: Subscriber,
}

impl InnerObserver {
  fn is_current(&self) -> bool { self.state.lock().generation == self.generation }
}

impl Observer for InnerObserver {
  fn next(&mut self, value: Var) {
    if self.is_current() {
      self.downstream.next(value);
    }
  }

  fn error(&mut self, err: Error) {
    if self.is_current() {
      self.downstream.error(err);
    }
  }

  fn complete(&mut self) {
    let done = {
      let mut state = self.state.lock();
      if state.generation != self.generation {
        return;
      }
      state.inner_active = false;
      state.inner = None;
      state.outer_done
    };
    if done {
      self.downstream.complete();
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::{prelude::*, scheduler::RunLoop};

  #[test]
  fn follows_the_latest_inner() {
    let outer = PublishSubject::new();
    let first = PublishSubject::new();
    let second = PublishSubject::new();
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    outer.as_observable().switch_on_next().subscribe(move |v: i32| sink.lock().push(v));
    outer.next(first.as_observable());
    first.next(1);
    outer.next(second.as_observable());
    first.next(2);
    second.next(3);
    assert_eq!(*items.lock(), vec![1, 3]);
    assert_eq!(first.subscriber_count(), 0);
  }

  #[test]
  fn plain_items_are_an_error() {
    let called = Arc::new(Mutex::new(false));
    let c = called.clone();
    let bag = DisposeBag::new();
    Observable::just(1)
      .switch_on_next()
      .subscribe_all(|_: Var| {}, move |_| *c.lock() = true, || {})
      .disposed_by(&bag);
    assert!(*called.lock());
  }

  #[test]
  fn completes_after_outer_and_inner() {
    let outer = PublishSubject::new();
    let inner = PublishSubject::new();
    let done = Arc::new(Mutex::new(false));
    let d = done.clone();
    outer.as_observable().switch_on_next().subscribe_all(|_: Var| {}, |_| {}, move || *d.lock() = true);
    outer.next(inner.as_observable());
    outer.complete();
    assert!(!*done.lock());
    inner.complete();
    assert!(*done.lock());
  }

  #[test]
  fn keeps_emitting_after_the_source_is_gone() {
    let rl = RunLoop::new();
    let source = Observable::just(17);
    let r = rl.clone();
    let mapped = source
      .map(move |next: i32| {
        let r = r.clone();
        Observable::create(move |s| {
          r.call_async(move || s.next(next * 3));
        })
      })
      .switch_on_next();
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    mapped.subscribe(move |v: i32| sink.lock().push(v));
    assert!(items.lock().is_empty());
    drop(source);
    rl.run_pending();
    assert_eq!(*items.lock(), vec![51]);
  }
}
