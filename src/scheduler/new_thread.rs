use std::thread;

use super::RunLoop;

/// Starts a dedicated thread pumping a fresh [`RunLoop`] until the loop is
/// shut down.
pub(crate) fn spawn_worker() -> RunLoop {
  let run_loop = RunLoop::new();
  let worker = run_loop.clone();
  let spawned = thread::Builder::new().name("rxvar-worker".into()).spawn(move || {
    tracing::trace!("worker thread started");
    worker.run();
    tracing::trace!("worker thread exiting");
  });
  if let Err(err) = spawned {
    tracing::error!(error = %err, "failed to spawn worker thread");
    run_loop.shutdown();
  }
  run_loop
}
