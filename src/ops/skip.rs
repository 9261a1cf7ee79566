use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  var::Var,
};

impl Observable {
  /// Ignores the first `count` items.
  pub fn skip(&self, count: usize) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer = SkipObserver { downstream: subscriber.clone(), remaining: count };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct SkipObserver {
  downstream: Subscriber,
  remaining: usize,
}

impl Observer for SkipObserver {
  fn next(&mut self, value: Var) {
    if self.remaining > 0 {
      self.remaining -= 1;
    } else {
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
  fn base_function() {
    let items = Observable::range(4, 10, 1).unwrap().skip(2).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![6, 7, 8, 9, 10]);
  }

  #[test]
  fn skip_more_than_emitted() {
    assert!(Observable::from(vec![1, 2]).skip(5).to_array().unwrap().is_empty());
  }
}
