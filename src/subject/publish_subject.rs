use std::{fmt, sync::Arc};

use super::{
  impl_subject_observer,
  subject_core::{Replay, SubjectCore},
};

/// A subject that replays nothing: subscribers only see what is pushed after
/// they subscribed.
#[derive(Clone)]
pub struct PublishSubject {
  core: Arc<SubjectCore>,
}

impl PublishSubject {
  pub fn new() -> Self { PublishSubject { core: SubjectCore::new(Replay::Nothing) } }
}

impl Default for PublishSubject {
  fn default() -> Self { Self::new() }
}

impl fmt::Debug for PublishSubject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PublishSubject").field("terminated", &self.is_terminated()).finish()
  }
}

impl_subject_observer!(PublishSubject);

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  fn collect(o: &Observable) -> (Arc<Mutex<Vec<i32>>>, Arc<Mutex<Vec<String>>>) {
    let items = Arc::new(Mutex::new(vec![]));
    let events = Arc::new(Mutex::new(vec![]));
    let (i, e, c) = (items.clone(), events.clone(), events.clone());
    let _ = o.subscribe_all(
      move |v: i32| i.lock().push(v),
      move |err| e.lock().push(format!("error: {err}")),
      move || c.lock().push("complete".to_string()),
    );
    (items, events)
  }

  #[test]
  fn late_subscriber_gets_nothing_retroactively() {
    let subject = PublishSubject::new();
    subject.next(1);
    let (items, _) = collect(&subject.as_observable());
    assert!(items.lock().is_empty());
    subject.next(2);
    assert_eq!(*items.lock(), vec![2]);
  }

  #[test]
  fn multicasts_to_every_subscriber() {
    let subject = PublishSubject::new();
    let (a, _) = collect(&subject.as_observable());
    let (b, _) = collect(&subject.as_observable());
    subject.next(1);
    subject.next(2);
    assert_eq!(*a.lock(), vec![1, 2]);
    assert_eq!(*b.lock(), vec![1, 2]);
  }

  #[test]
  fn terminal_for_current_and_future_subscribers() {
    let subject = PublishSubject::new();
    let (_, before) = collect(&subject.as_observable());
    subject.error(Error::msg("bad"));
    subject.next(1);
    subject.complete();
    let (items, after) = collect(&subject.as_observable());
    assert_eq!(*before.lock(), vec!["error: bad"]);
    assert_eq!(*after.lock(), vec!["error: bad"]);
    assert!(items.lock().is_empty());
  }

  #[test]
  fn dropping_the_subject_does_not_complete() {
    let subject = PublishSubject::new();
    let (_, events) = collect(&subject.as_observable());
    drop(subject);
    assert!(events.lock().is_empty());
  }

  #[test]
  fn disposed_subscriber_is_removed() {
    let subject = PublishSubject::new();
    let items = Arc::new(Mutex::new(vec![]));
    let sink = items.clone();
    let d = subject.as_observable().subscribe(move |v: i32| sink.lock().push(v));
    assert_eq!(subject.subscriber_count(), 1);
    subject.next(1);
    d.dispose();
    subject.next(2);
    assert_eq!(*items.lock(), vec![1]);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn can_subscribe_to_a_source() {
    let subject = PublishSubject::new();
    let (items, events) = collect(&subject.as_observable());
    Observable::from(vec![1, 2, 3]).subscribe_with(subject.as_observer());
    assert_eq!(*items.lock(), vec![1, 2, 3]);
    assert_eq!(*events.lock(), vec!["complete"]);
  }

  #[test]
  fn observer_may_push_into_its_own_subject() {
    let subject = PublishSubject::new();
    let items = Arc::new(Mutex::new(vec![]));
    let (sink, feedback) = (items.clone(), subject.clone());
    subject.as_observable().subscribe(move |v: i32| {
      sink.lock().push(v);
      if v < 3 {
        feedback.next(v + 1);
      }
    });
    subject.next(1);
    assert_eq!(*items.lock(), vec![1, 2, 3]);
  }
}
