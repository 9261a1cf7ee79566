use std::{
  cmp::Ordering,
  collections::{BinaryHeap, VecDeque},
  sync::Arc,
  thread::{self, ThreadId},
  time::{Duration, Instant},
};

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

type Task = Box<dyn FnOnce() + Send>;

struct Timer {
  deadline: Instant,
  seq: u64,
  task: Task,
}

// Reversed so the `BinaryHeap` pops the earliest deadline first, ties broken
// by scheduling order.
impl Ord for Timer {
  fn cmp(&self, other: &Self) -> Ordering {
    other.deadline.cmp(&self.deadline).then_with(|| other.seq.cmp(&self.seq))
  }
}

impl PartialOrd for Timer {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for Timer {
  fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Timer {}

#[derive(Default)]
struct LoopState {
  queue: VecDeque<Task>,
  timers: BinaryHeap<Timer>,
  seq: u64,
  shut_down: bool,
  thread: Option<ThreadId>,
}

impl LoopState {
  /// Moves every timer whose deadline passed into the task queue.
  fn promote_due_timers(&mut self, now: Instant) {
    while self.timers.peek().map_or(false, |t| t.deadline <= now) {
      if let Some(timer) = self.timers.pop() {
        self.queue.push_back(timer.task);
      }
    }
  }
}

#[derive(Default)]
struct Inner {
  state: Mutex<LoopState>,
  wakeup: Condvar,
}

static MAIN: Lazy<RunLoop> = Lazy::new(RunLoop::new);

/// A deferred-call queue owned by one thread.
///
/// Tasks posted with [`RunLoop::call_async`] run in FIFO order on whichever
/// thread pumps the loop (`run_pending`, `run_until`, `run_for` or `run`).
/// The first thread to pump becomes the loop thread reported by
/// [`RunLoop::is_loop_thread`].
///
/// [`RunLoop::main`] is the process-wide main/UI loop. The application's
/// main thread is expected to pump it; tests usually create their own loop
/// with [`RunLoop::new`] instead.
#[derive(Clone, Default)]
pub struct RunLoop(Arc<Inner>);

impl RunLoop {
  pub fn new() -> Self { Self::default() }

  /// The process-wide main/UI run loop.
  pub fn main() -> RunLoop { MAIN.clone() }

  /// Queues `task` to run on the loop thread.
  ///
  /// Returns `false` (and drops `task`) if the loop was shut down.
  pub fn call_async(&self, task: impl FnOnce() + Send + 'static) -> bool {
    let mut state = self.0.state.lock();
    if state.shut_down {
      drop(state);
      return false;
    }
    state.queue.push_back(Box::new(task));
    drop(state);
    self.0.wakeup.notify_all();
    true
  }

  /// Queues `task` to run on the loop thread once `delay` has elapsed.
  pub fn call_after(&self, delay: Duration, task: impl FnOnce() + Send + 'static) -> bool {
    let mut state = self.0.state.lock();
    if state.shut_down {
      drop(state);
      return false;
    }
    state.seq += 1;
    let seq = state.seq;
    state.timers.push(Timer { deadline: Instant::now() + delay, seq, task: Box::new(task) });
    drop(state);
    self.0.wakeup.notify_all();
    true
  }

  /// Runs every task that is ready, including tasks queued by those tasks.
  /// Returns how many ran.
  pub fn run_pending(&self) -> usize {
    let mut ran = 0;
    loop {
      let task = {
        let mut state = self.0.state.lock();
        state.thread.get_or_insert_with(|| thread::current().id());
        state.promote_due_timers(Instant::now());
        match state.queue.pop_front() {
          Some(task) => task,
          None => return ran,
        }
      };
      task();
      ran += 1;
    }
  }

  /// Pumps the loop until `done` returns `true` or `timeout` elapses.
  ///
  /// Returns the last result of `done`.
  pub fn run_until(&self, mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
      self.run_pending();
      if done() {
        return true;
      }
      let now = Instant::now();
      if now >= deadline {
        return false;
      }
      self.wait_for_work(deadline);
    }
  }

  /// Pumps the loop for `duration`.
  pub fn run_for(&self, duration: Duration) { self.run_until(|| false, duration); }

  /// Pumps the loop on the calling thread until [`RunLoop::shutdown`].
  pub fn run(&self) {
    while !self.is_shut_down() {
      self.run_pending();
      self.wait_for_work(Instant::now() + Duration::from_secs(3600));
    }
  }

  fn wait_for_work(&self, deadline: Instant) {
    let mut state = self.0.state.lock();
    if state.shut_down || !state.queue.is_empty() {
      return;
    }
    let wake_at = state.timers.peek().map_or(deadline, |t| t.deadline.min(deadline));
    if wake_at > Instant::now() {
      self.0.wakeup.wait_until(&mut state, wake_at);
    }
  }

  /// Returns `true` when called from the thread that pumps this loop.
  pub fn is_loop_thread(&self) -> bool {
    self.0.state.lock().thread == Some(thread::current().id())
  }

  /// Stops accepting tasks and drops everything still queued.
  pub fn shutdown(&self) {
    let (queue, timers) = {
      let mut state = self.0.state.lock();
      state.shut_down = true;
      (std::mem::take(&mut state.queue), std::mem::take(&mut state.timers))
    };
    self.0.wakeup.notify_all();
    drop(queue);
    drop(timers);
  }

  pub fn is_shut_down(&self) -> bool { self.0.state.lock().shut_down }

  pub(crate) fn ptr_eq(&self, other: &RunLoop) -> bool { Arc::ptr_eq(&self.0, &other.0) }

  /// Number of `call_after` tasks that have not come due yet.
  pub(crate) fn pending_timers(&self) -> usize { self.0.state.lock().timers.len() }
}

impl std::fmt::Debug for RunLoop {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.0.state.lock();
    f.debug_struct("RunLoop")
      .field("queued", &state.queue.len())
      .field("timers", &state.timers.len())
      .field("shut_down", &state.shut_down)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  #[test]
  fn runs_tasks_in_fifo_order() {
    let rl = RunLoop::new();
    let log = Arc::new(Mutex::new(vec![]));
    for i in 0..5 {
      let log = log.clone();
      rl.call_async(move || log.lock().push(i));
    }
    assert!(log.lock().is_empty());
    assert_eq!(rl.run_pending(), 5);
    assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
  }

  #[test]
  fn tasks_queued_by_tasks_run_in_the_same_pass() {
    let rl = RunLoop::new();
    let count = Arc::new(AtomicUsize::new(0));
    let (c, inner) = (count.clone(), rl.clone());
    rl.call_async(move || {
      let c2 = c.clone();
      inner.call_async(move || {
        c2.fetch_add(1, Ordering::SeqCst);
      });
      c.fetch_add(1, Ordering::SeqCst);
    });
    rl.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn timers_fire_in_deadline_order() {
    let rl = RunLoop::new();
    let log = Arc::new(Mutex::new(vec![]));
    let (a, b) = (log.clone(), log.clone());
    rl.call_after(Duration::from_millis(20), move || a.lock().push("late"));
    rl.call_after(Duration::from_millis(5), move || b.lock().push("early"));
    assert_eq!(rl.run_pending(), 0);
    let done = rl.run_until(|| log.lock().len() == 2, Duration::from_secs(5));
    assert!(done);
    assert_eq!(*log.lock(), vec!["early", "late"]);
  }

  #[test]
  fn run_until_times_out() {
    let rl = RunLoop::new();
    let start = Instant::now();
    assert!(!rl.run_until(|| false, Duration::from_millis(20)));
    assert!(start.elapsed() >= Duration::from_millis(20));
  }

  #[test]
  fn wakes_up_for_tasks_from_other_threads() {
    let rl = RunLoop::new();
    let flag = Arc::new(AtomicUsize::new(0));
    let (remote, f) = (rl.clone(), flag.clone());
    let handle = thread::spawn(move || {
      thread::sleep(Duration::from_millis(10));
      remote.call_async(move || {
        f.store(1, Ordering::SeqCst);
      });
    });
    assert!(rl.run_until(|| flag.load(Ordering::SeqCst) == 1, Duration::from_secs(5)));
    handle.join().unwrap();
  }

  #[test]
  fn shutdown_rejects_and_drops_tasks() {
    let rl = RunLoop::new();
    let token = Arc::new(());
    let held = token.clone();
    rl.call_async(move || {
      let _ = &held;
    });
    rl.shutdown();
    assert_eq!(Arc::strong_count(&token), 1);
    assert!(!rl.call_async(|| {}));
    assert!(rl.is_shut_down());
  }

  #[test]
  fn records_the_loop_thread() {
    let rl = RunLoop::new();
    assert!(!rl.is_loop_thread());
    rl.run_pending();
    assert!(rl.is_loop_thread());
    let remote = rl.clone();
    assert!(!thread::spawn(move || remote.is_loop_thread()).join().unwrap());
  }
}
