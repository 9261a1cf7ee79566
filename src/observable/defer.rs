use crate::{error::catch_callback, observable::Observable, observer::Subscriber};

impl Observable {
  /// Creates an observable that will on subscription defer to another
  /// observable that is supplied by a factory function which will be run
  /// once at each subscription.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::defer(|| Observable::from(vec![3, 4]));
  /// assert_eq!(o.to_vec::<i32>().unwrap(), vec![3, 4]);
  /// ```
  pub fn defer<F>(factory: F) -> Observable
  where
    F: Fn() -> Observable + Send + Sync + 'static,
  {
    Observable::from_fn(move |subscriber: Subscriber| match catch_callback(&factory) {
      Ok(source) => {
        source.actual_subscribe(subscriber.clone());
        // The produced handle may own its source; keep it for the lifetime
        // of this subscription.
        subscriber.add_teardown(move || drop(source));
      }
      Err(err) => subscriber.error(err),
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use crate::prelude::*;

  #[test]
  fn calls_the_factory_once_per_subscription() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let o = Observable::defer(move || {
      c.fetch_add(1, Ordering::SeqCst);
      Observable::from(vec![3, 4])
    });
    let mut items = vec![];
    for _ in 0..3 {
      items.extend(o.to_vec::<i32>().unwrap());
    }
    assert_eq!(items, vec![3, 4, 3, 4, 3, 4]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn factory_panic_is_an_error() {
    let o = Observable::defer(|| panic!("no source"));
    assert!(matches!(o.to_array(), Err(Error::CallbackPanic { .. })));
  }
}
