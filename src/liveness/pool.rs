use std::{
  collections::BTreeMap,
  sync::{Arc, Weak},
  time::Duration,
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::probe::LivenessProbe;
use crate::{observable::Observable, scheduler::RunLoop, subject::ReplaySubject};

type Batch = Vec<Box<dyn LivenessProbe>>;

#[derive(Default)]
struct PoolState {
  batches: BTreeMap<usize, Batch>,
  polling: bool,
}

struct PoolInner {
  state: Mutex<PoolState>,
  run_loop: RunLoop,
  poll_interval: Duration,
}

static GLOBAL: Lazy<LivenessPool> =
  Lazy::new(|| LivenessPool::new(RunLoop::main(), LivenessPool::DEFAULT_POLL_INTERVAL));

/// Registry of liveness probes polled on a run loop.
///
/// Probes are grouped by [`LivenessProbe::address`]. Every poll tick checks
/// each group; as soon as one probe of a group reports expired, the whole
/// group is removed and dropped. Polling runs only while probes are
/// registered.
#[derive(Clone)]
pub struct LivenessPool(Arc<PoolInner>);

impl LivenessPool {
  /// Sixty polls per second.
  pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(16_667);

  /// How long [`LivenessPool::add`] waits for the registry before giving up.
  pub const REGISTRATION_TIMEOUT: Duration = Duration::from_millis(100);

  pub fn new(run_loop: RunLoop, poll_interval: Duration) -> Self {
    LivenessPool(Arc::new(PoolInner {
      state: Mutex::new(PoolState::default()),
      run_loop,
      poll_interval,
    }))
  }

  /// The process-wide pool, polled on [`RunLoop::main`].
  pub fn global() -> LivenessPool { GLOBAL.clone() }

  /// Registers `probe` and starts polling if needed.
  ///
  /// Registration fails closed: when the run loop is shut down or the
  /// registry cannot be locked within [`LivenessPool::REGISTRATION_TIMEOUT`],
  /// the probe is dropped unregistered and `false` is returned.
  pub fn add(&self, probe: impl LivenessProbe) -> bool {
    if self.0.run_loop.is_shut_down() {
      tracing::warn!("liveness pool run loop is shut down, probe not registered");
      return false;
    }
    let Some(mut state) = self.0.state.try_lock_for(Self::REGISTRATION_TIMEOUT) else {
      tracing::warn!("liveness pool busy, probe not registered");
      return false;
    };
    state.batches.entry(probe.address()).or_default().push(Box::new(probe));
    let start = !state.polling;
    state.polling = true;
    drop(state);
    if start {
      tracing::debug!("liveness polling started");
      self.schedule_poll();
    }
    true
  }

  /// Runs one poll tick: removes every batch holding an expired probe.
  ///
  /// Scheduled polling is unaffected; it stops on its own once the pool is
  /// empty.
  pub fn poll(&self) {
    let expired = {
      let mut state = self.0.state.lock();
      let addresses: Vec<usize> = state
        .batches
        .iter()
        .filter(|(_, batch)| batch.iter().any(|probe| probe.is_expired()))
        .map(|(address, _)| *address)
        .collect();
      addresses.iter().filter_map(|address| state.batches.remove(address)).collect::<Vec<Batch>>()
    };
    if !expired.is_empty() {
      tracing::debug!(batches = expired.len(), "expiring liveness batches");
    }
    // Dropping probes may notify observers, which must not see the registry
    // locked.
    drop(expired);
  }

  /// One scheduled tick. Only this path ends a polling chain, so `add` never
  /// starts a second chain while one is queued.
  fn tick(&self) {
    self.poll();
    let keep_polling = {
      let mut state = self.0.state.lock();
      state.polling = !state.batches.is_empty();
      state.polling
    };
    if keep_polling {
      self.schedule_poll();
    } else {
      tracing::debug!("liveness polling stopped");
    }
  }

  fn schedule_poll(&self) {
    let pool: Weak<PoolInner> = Arc::downgrade(&self.0);
    let scheduled = self.0.run_loop.call_after(self.0.poll_interval, move || {
      if let Some(inner) = pool.upgrade() {
        LivenessPool(inner).tick();
      }
    });
    if !scheduled {
      self.0.state.lock().polling = false;
    }
  }

  /// Returns an observable that emits once and completes when `probe`'s
  /// batch expires.
  ///
  /// If the probe cannot be registered it fires right away, so anything
  /// waiting on it stops instead of outliving its owner.
  pub fn deallocated(&self, probe: impl LivenessProbe) -> Observable {
    let subject = ReplaySubject::with_capacity(1);
    let observable = subject.as_observable();
    self.add(NotifyingProbe { probe, subject });
    observable
  }

  /// Number of registered probes.
  pub fn len(&self) -> usize { self.0.state.lock().batches.values().map(Vec::len).sum() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn is_polling(&self) -> bool { self.0.state.lock().polling }
}

impl std::fmt::Debug for LivenessPool {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LivenessPool")
      .field("probes", &self.len())
      .field("poll_interval", &self.0.poll_interval)
      .finish()
  }
}

/// Probe that signals its subject when it is dropped.
struct NotifyingProbe<P> {
  probe: P,
  subject: ReplaySubject,
}

impl<P: LivenessProbe> LivenessProbe for NotifyingProbe<P> {
  fn address(&self) -> usize { self.probe.address() }

  fn is_expired(&self) -> bool { self.probe.is_expired() }
}

impl<P> Drop for NotifyingProbe<P> {
  fn drop(&mut self) {
    self.subject.next(());
    self.subject.complete();
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicBool, Ordering};

  use super::*;
  use crate::liveness::{FnProbe, LifetimeToken, WeakProbe};

  fn pool() -> (LivenessPool, RunLoop) {
    let rl = RunLoop::new();
    (LivenessPool::new(rl.clone(), Duration::from_millis(1)), rl)
  }

  #[test]
  fn expiring_one_probe_removes_its_batch() {
    let (pool, _rl) = pool();
    let flag = Arc::new(AtomicBool::new(false));
    let f = flag.clone();
    assert!(pool.add(FnProbe::new(7, move || f.load(Ordering::SeqCst))));
    assert!(pool.add(FnProbe::new(7, || false)));
    assert!(pool.add(FnProbe::new(8, || false)));
    assert_eq!(pool.len(), 3);
    pool.poll();
    assert_eq!(pool.len(), 3);
    flag.store(true, Ordering::SeqCst);
    pool.poll();
    assert_eq!(pool.len(), 1);
  }

  #[test]
  fn polls_on_its_run_loop_until_empty() {
    let (pool, rl) = pool();
    let owner = Arc::new(5);
    pool.add(WeakProbe::new(&owner));
    assert!(pool.is_polling());
    rl.run_for(Duration::from_millis(10));
    assert_eq!(pool.len(), 1);
    drop(owner);
    assert!(rl.run_until(|| pool.is_empty(), Duration::from_secs(5)));
    assert!(!pool.is_polling());
  }

  #[test]
  fn manual_poll_keeps_a_single_polling_chain() {
    let (pool, rl) = pool();
    let first = LifetimeToken::new();
    pool.add(first.probe());
    assert_eq!(rl.pending_timers(), 1);
    drop(first);
    pool.poll();
    assert!(pool.is_empty());
    assert!(pool.is_polling());

    let second = LifetimeToken::new();
    pool.add(second.probe());
    assert_eq!(rl.pending_timers(), 1);
    drop(second);
    assert!(rl.run_until(|| !pool.is_polling(), Duration::from_secs(5)));
    assert!(pool.is_empty());
    assert_eq!(rl.pending_timers(), 0);
  }

  #[test]
  fn registration_fails_closed_after_shutdown() {
    let (pool, rl) = pool();
    rl.shutdown();
    assert!(!pool.add(FnProbe::new(1, || false)));
    assert!(pool.is_empty());
  }

  #[test]
  fn registration_fails_closed_while_registry_is_held() {
    let (pool, _rl) = pool();
    let _held = pool.0.state.lock();
    let remote = pool.clone();
    let added = std::thread::spawn(move || remote.add(FnProbe::new(1, || false))).join().unwrap();
    assert!(!added);
  }

  #[test]
  fn deallocated_fires_when_owner_drops() {
    let (pool, rl) = pool();
    let token = LifetimeToken::new();
    let gone = Arc::new(AtomicBool::new(false));
    let g = gone.clone();
    pool.deallocated(token.probe()).subscribe_all(
      |_: crate::var::Var| {},
      |_| {},
      move || g.store(true, Ordering::SeqCst),
    );
    rl.run_for(Duration::from_millis(5));
    assert!(!gone.load(Ordering::SeqCst));
    drop(token);
    assert!(rl.run_until(|| gone.load(Ordering::SeqCst), Duration::from_secs(5)));
  }

  #[test]
  fn deallocated_fires_immediately_when_registration_fails() {
    let (pool, rl) = pool();
    rl.shutdown();
    let token = LifetimeToken::new();
    let items = pool.deallocated(token.probe()).to_array().unwrap();
    assert_eq!(items.len(), 1);
  }
}
