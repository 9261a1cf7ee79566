use crate::{error::catch_callback, observable::Observable, observer::Subscriber};

impl Observable {
  /// Creates an observable which runs `on_subscribe` for each new
  /// subscription.
  ///
  /// `on_subscribe` receives a [`Subscriber`] to push items into. It may emit
  /// synchronously, or clone the subscriber and emit later from a scheduler.
  /// A panic inside `on_subscribe` is delivered as `onError` to that
  /// subscription instead of escaping `subscribe`.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::create(|subscriber| {
  ///   subscriber.next("First");
  ///   subscriber.next("Second");
  ///   subscriber.complete();
  /// });
  /// assert_eq!(o.to_vec::<String>().unwrap(), vec!["First", "Second"]);
  /// ```
  pub fn create<F>(on_subscribe: F) -> Observable
  where
    F: Fn(Subscriber) + Send + Sync + 'static,
  {
    Observable::from_fn(move |subscriber: Subscriber| {
      let emitter = subscriber.clone();
      let on_subscribe = &on_subscribe;
      if let Err(err) = catch_callback(move || on_subscribe(emitter)) {
        subscriber.error(err);
      }
    })
  }
}
