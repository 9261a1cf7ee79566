use crate::{
  error::Error,
  observable::Observable,
  observer::{Observer, Subscriber},
  var::Var,
};

impl Observable {
  /// Emits only the item at `index` (zero based), then completes.
  ///
  /// Fails with [`Error::ArgumentOutOfRange`] if the source completes
  /// before reaching `index`.
  pub fn element_at(&self, index: usize) -> Observable {
    let source = self.detached();
    Observable::from_fn(move |subscriber: Subscriber| {
      let observer = ElementAtObserver { downstream: subscriber.clone(), index, seen: 0 };
      source.actual_subscribe(subscriber.chain(observer));
    })
  }
}

struct ElementAtObserver {
  downstream: Subscriber,
  index: usize,
  seen: usize,
}

impl Observer for ElementAtObserver {
  fn next(&mut self, value: Var) {
    if self.seen == self.index {
      self.downstream.next(value);
      self.downstream.complete();
    }
    self.seen += 1;
  }

  fn error(&mut self, err: Error) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.error(Error::ArgumentOutOfRange { index: self.index }) }

  fn is_closed(&self) -> bool { self.seen > self.index || self.downstream.is_disposed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn picks_the_indexed_item() {
    let items = Observable::from(vec![17, 4, 8, 3]).element_at(2).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![8]);
  }

  #[test]
  fn out_of_range_is_an_error() {
    let result = Observable::from(vec![1, 2]).element_at(2).to_array();
    assert!(matches!(result, Err(Error::ArgumentOutOfRange { index: 2 })));
  }
}
