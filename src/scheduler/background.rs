use std::{future::Future, panic::AssertUnwindSafe, thread};

use futures::{
  executor::{block_on, ThreadPool},
  FutureExt,
};
use once_cell::sync::Lazy;

const THREAD_NAME_PREFIX: &str = "rxvar-background-";

static BACKGROUND: Lazy<Option<ThreadPool>> = Lazy::new(|| {
  let pool = ThreadPool::builder().pool_size(1).name_prefix(THREAD_NAME_PREFIX).create();
  match pool {
    Ok(pool) => Some(pool),
    Err(err) => {
      tracing::error!(error = %err, "failed to start the background worker");
      None
    }
  }
});

/// Runs `fut` on the shared background worker.
///
/// The worker is a single thread, so futures start in the order they were
/// spawned. A panicking task is logged and does not take the worker down.
pub(crate) fn spawn(fut: impl Future<Output = ()> + Send + 'static) {
  let fut = AssertUnwindSafe(fut).catch_unwind().map(|result| {
    if result.is_err() {
      tracing::error!("background task panicked");
    }
  });
  match BACKGROUND.as_ref() {
    Some(pool) => pool.spawn_ok(fut),
    None => {
      let _ = thread::Builder::new().spawn(move || block_on(fut));
    }
  }
}

/// Runs `task` on the shared background worker.
pub(crate) fn execute(task: impl FnOnce() + Send + 'static) {
  spawn(futures::future::lazy(move |_| task()))
}

/// Returns `true` on the shared background worker thread.
pub fn is_background_thread() -> bool {
  thread::current().name().map_or(false, |name| name.starts_with(THREAD_NAME_PREFIX))
}

#[cfg(feature = "timer")]
pub(crate) mod timer {
  use std::time::Duration;

  use futures::{
    future::{abortable, AbortHandle},
    StreamExt,
  };

  /// Runs `task` on the background worker after `delay`. Aborting the
  /// returned handle cancels it if it has not fired yet.
  pub(crate) fn delay(delay: Duration, task: impl FnOnce() + Send + 'static) -> AbortHandle {
    let (fut, handle) = abortable(async move {
      futures_time::task::sleep(delay.into()).await;
      task();
    });
    super::spawn(async move {
      let _ = fut.await;
    });
    handle
  }

  /// Calls `tick` on the background worker every `period`, starting one
  /// period from now, until it returns `false` or the handle is aborted.
  pub(crate) fn periodic(
    period: Duration,
    mut tick: impl FnMut() -> bool + Send + 'static,
  ) -> AbortHandle {
    let (fut, handle) = abortable(async move {
      let mut ticks = futures_time::stream::interval(period.into());
      while ticks.next().await.is_some() {
        if !tick() {
          break;
        }
      }
    });
    super::spawn(async move {
      let _ = fut.await;
    });
    handle
  }
}

#[cfg(test)]
mod tests {
  use std::{sync::mpsc, time::Duration};

  use super::*;

  #[test]
  fn runs_on_the_background_thread() {
    let (tx, rx) = mpsc::channel();
    execute(move || tx.send(is_background_thread()).unwrap());
    assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    assert!(!is_background_thread());
  }

  #[test]
  fn keeps_running_after_a_task_panics() {
    execute(|| panic!("task failure"));
    let (tx, rx) = mpsc::channel();
    execute(move || tx.send(()).unwrap());
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
  }

  #[cfg(feature = "timer")]
  #[test]
  fn aborted_delay_never_fires() {
    let (tx, rx) = mpsc::channel::<()>();
    let handle = timer::delay(Duration::from_millis(30), move || tx.send(()).unwrap());
    handle.abort();
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
  }

  #[cfg(feature = "timer")]
  #[test]
  fn periodic_stops_when_tick_returns_false() {
    let (tx, rx) = mpsc::channel();
    let mut n = 0;
    timer::periodic(Duration::from_millis(2), move || {
      n += 1;
      tx.send(n).unwrap();
      n < 3
    });
    let got: Vec<i32> = rx.iter().take(3).collect();
    assert_eq!(got, vec![1, 2, 3]);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
  }
}
