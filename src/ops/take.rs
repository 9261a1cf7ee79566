use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  var::Var,
};

impl Observable {
  /// Emits only the first `count` items, then completes and unsubscribes
  /// from the source.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::repeat("tick").take(2);
  /// assert_eq!(o.to_vec::<String>().unwrap(), vec!["tick", "tick"]);
  /// ```
  pub fn take(&self, count: usize) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      if count == 0 {
        subscriber.complete();
        return;
      }
      let observer = TakeObserver { downstream: subscriber.clone(), remaining: count };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct TakeObserver {
  downstream: Subscriber,
  remaining: usize,
}

impl Observer for TakeObserver {
  fn next(&mut self, value: Var) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.downstream.next(value);
    if self.remaining == 0 {
      self.downstream.complete();
    }
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.remaining == 0 || self.downstream.is_disposed() }
}
