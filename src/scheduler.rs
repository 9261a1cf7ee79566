//! Thread roles used to marshal delivery of stream events.
//!
//! There are exactly three roles: the designated main/UI thread (a
//! [`RunLoop`] pumped by the application), one shared background worker,
//! and freshly spawned threads. `observe_on` is the only operator that moves
//! delivery between them.

mod background;
mod new_thread;
mod run_loop;

#[cfg(feature = "timer")]
pub(crate) use background::timer;
pub use background::is_background_thread;
pub use run_loop::RunLoop;

/// Description of the thread role that should run a callback.
#[derive(Clone, Debug)]
pub enum Scheduler {
  /// The process-wide [`RunLoop::main`].
  MainThread,
  /// The shared background worker thread.
  Background,
  /// A new thread. `observe_on` starts one thread per subscription.
  NewThread,
  /// A specific run loop, mostly useful to drive tests deterministically.
  RunLoop(RunLoop),
}

impl Scheduler {
  pub fn main_thread() -> Self { Scheduler::MainThread }

  pub fn background() -> Self { Scheduler::Background }

  pub fn new_thread() -> Self { Scheduler::NewThread }

  pub fn run_loop(run_loop: RunLoop) -> Self { Scheduler::RunLoop(run_loop) }

  /// Runs `task` once on this scheduler's thread role.
  pub fn schedule(&self, task: impl FnOnce() + Send + 'static) {
    match self {
      Scheduler::MainThread => {
        RunLoop::main().call_async(task);
      }
      Scheduler::Background => background::execute(task),
      Scheduler::NewThread => {
        let worker = new_thread::spawn_worker();
        let remote = worker.clone();
        worker.call_async(move || {
          task();
          remote.shutdown();
        });
      }
      Scheduler::RunLoop(run_loop) => {
        run_loop.call_async(task);
      }
    }
  }

  /// Acquires an ordered executor for one subscription. Tasks given to the
  /// returned worker run in FIFO order on this role's thread.
  pub(crate) fn worker(&self) -> Worker {
    match self {
      Scheduler::MainThread => Worker::Loop { run_loop: RunLoop::main(), owned: false },
      Scheduler::Background => Worker::Background,
      Scheduler::NewThread => Worker::Loop { run_loop: new_thread::spawn_worker(), owned: true },
      Scheduler::RunLoop(run_loop) => Worker::Loop { run_loop: run_loop.clone(), owned: false },
    }
  }
}

pub(crate) enum Worker {
  Loop { run_loop: RunLoop, owned: bool },
  Background,
}

impl Worker {
  pub(crate) fn schedule(&self, task: impl FnOnce() + Send + 'static) {
    match self {
      Worker::Loop { run_loop, .. } => {
        if !run_loop.call_async(task) {
          tracing::debug!("run loop shut down, dropping scheduled delivery");
        }
      }
      Worker::Background => background::execute(task),
    }
  }

  /// Stops the worker's thread if it was started for this worker alone.
  pub(crate) fn release(&self) {
    if let Worker::Loop { run_loop, owned: true } = self {
      run_loop.shutdown();
    }
  }
}
