use std::sync::Arc;

use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  var::Var,
};

impl Observable {
  /// Emits this observable's items, then those of each of `others` in turn.
  ///
  /// The next source is subscribed only once the previous one completed. An
  /// error from any source is forwarded right away and ends the chain.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::from(vec!["Hello", "World"]).concat([Observable::from(vec![1.5, 2.32])]);
  /// assert_eq!(o.to_array().unwrap().len(), 4);
  /// ```
  pub fn concat(&self, others: impl IntoIterator<Item = Observable>) -> Observable {
    let sources: Arc<[Observable]> =
      std::iter::once(self.detached()).chain(others.into_iter().map(|o| o.detached())).collect();
    Observable::from_fn(move |subscriber: Subscriber| subscribe_from(sources.clone(), 0, subscriber))
  }
}

fn subscribe_from(sources: Arc<[Observable]>, index: usize, downstream: Subscriber) {
  if downstream.is_disposed() {
    return;
  }
  match sources.get(index) {
    Some(source) => {
      let source = source.clone();
      let observer = ConcatObserver { sources, index, downstream: downstream.clone() };
      source.actual_subscribe(downstream.chain(observer));
    }
    None => downstream.complete(),
  }
}

struct ConcatObserver {
  sources: Arc<[Observable]>,
  index: usize,
  downstream: Subscriber,
}

impl Observer for ConcatObserver {
  fn next(&mut self, value: Var) { self.downstream.next(value) }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { subscribe_from(self.sources.clone(), self.index + 1, self.downstream.clone()) }

  fn is_closed(&self) -> bool { self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::{prelude::*, scheduler::RunLoop};

  #[test]
  fn concatenates_in_order() {
    let items = Observable::from(vec!["Hello", "World"])
      .concat([Observable::from(vec![1.5, 2.32, 5.6])])
      .to_array()
      .unwrap();
    let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
    assert_eq!(rendered, vec!["Hello", "World", "1.5", "2.32", "5.6"]);
  }

  #[test]
  fn waits_for_previous_to_complete() {
    let first = PublishSubject::new();
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    first.as_observable().concat([Observable::just(99)]).subscribe(move |v: i32| sink.lock().push(v));
    first.next(1);
    assert_eq!(*items.lock(), vec![1]);
    first.complete();
    assert_eq!(*items.lock(), vec![1, 99]);
  }

  #[test]
  fn error_aborts_the_chain() {
    let subscribed = Arc::new(Mutex::new(false));
    let flag = subscribed.clone();
    let last = Observable::create(move |s| {
      *flag.lock() = true;
      s.complete();
    });
    let result = Observable::just(1).concat([Observable::error(Error::msg("stop")), last]).to_array();
    assert_eq!(result.unwrap_err().to_string(), "stop");
    assert!(!*subscribed.lock());
  }

  #[test]
  fn asynchronous_sources_keep_order() {
    let rl = RunLoop::new();
    let async_just = |v: i32, rl: RunLoop| {
      Observable::create(move |s| {
        rl.call_async(move || {
          s.next(v);
          s.complete();
        });
      })
    };
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    async_just(1, rl.clone())
      .concat([async_just(2, rl.clone()), async_just(3, rl.clone())])
      .subscribe(move |v: i32| sink.lock().push(v));
    rl.run_pending();
    assert_eq!(*items.lock(), vec![1, 2, 3]);
  }
}
