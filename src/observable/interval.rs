use std::time::Duration;

use crate::{observable::Observable, observer::Subscriber, scheduler::timer};

impl Observable {
  /// Creates an observable which emits `1, 2, 3, …` every `period`, the
  /// first item one period after subscription. Never completes.
  ///
  /// Items are delivered on the shared background worker.
  pub fn interval(period: Duration) -> Observable {
    Observable::from_fn(move |subscriber: Subscriber| {
      let sink = subscriber.clone();
      let mut count: i64 = 0;
      let handle = timer::periodic(period, move || {
        if sink.is_disposed() {
          return false;
        }
        count += 1;
        sink.next(count);
        !sink.is_disposed()
      });
      subscriber.add_teardown(move || handle.abort());
    })
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{mpsc, Arc},
    time::{Duration, Instant},
  };

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn emits_increasing_counts() {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let start = Instant::now();
    let d = Observable::interval(Duration::from_millis(5)).subscribe(move |v: i64| {
      let _ = tx.lock().send(v);
    });
    let got: Vec<i64> = rx.iter().take(3).collect();
    d.dispose();
    assert_eq!(got, vec![1, 2, 3]);
    assert!(start.elapsed() >= Duration::from_millis(15));
  }

  #[test]
  fn dispose_stops_the_timer() {
    let count = Arc::new(Mutex::new(0));
    let c = count.clone();
    let d = Observable::interval(Duration::from_millis(2)).subscribe(move |_: i64| *c.lock() += 1);
    std::thread::sleep(Duration::from_millis(20));
    d.dispose();
    let seen = *count.lock();
    std::thread::sleep(Duration::from_millis(20));
    assert!(*count.lock() <= seen + 1);
  }

  #[test]
  fn take_completes_an_interval() {
    let items = Observable::interval(Duration::from_millis(1)).take(3).to_vec::<i64>().unwrap();
    assert_eq!(items, vec![1, 2, 3]);
  }
}
