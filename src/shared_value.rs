//! An observable value cell living outside the stream world.
//!
//! [`SharedValue`] stands in for the externally owned state (a widget
//! property, a settings entry) that `Observable::from_value` watches. Change
//! notifications are posted to the cell's [`RunLoop`], so listeners run
//! after the `set` that caused them, and several sets in a row collapse into
//! one notification carrying the latest value.

use std::{
  fmt,
  sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;

use crate::{
  error::Result,
  scheduler::RunLoop,
  var::{FromVar, IntoVar, Var},
};

/// Identifies a listener registered with [`SharedValue::add_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&Var) + Send + Sync>;

struct Inner {
  value: Mutex<Var>,
  listeners: Mutex<Vec<(ListenerId, Listener)>>,
  next_id: AtomicU64,
  notify_pending: AtomicBool,
  run_loop: RunLoop,
}

/// Cloneable handle to a shared mutable value with change listeners.
#[derive(Clone)]
pub struct SharedValue(Arc<Inner>);

impl SharedValue {
  /// A cell notifying on [`RunLoop::main`].
  pub fn new(initial: impl IntoVar) -> Self { Self::with_run_loop(initial, RunLoop::main()) }

  /// A cell notifying on `run_loop`.
  pub fn with_run_loop(initial: impl IntoVar, run_loop: RunLoop) -> Self {
    SharedValue(Arc::new(Inner {
      value: Mutex::new(initial.into_var()),
      listeners: Mutex::new(vec![]),
      next_id: AtomicU64::new(0),
      notify_pending: AtomicBool::new(false),
      run_loop,
    }))
  }

  pub fn get(&self) -> Var { self.0.value.lock().clone() }

  pub fn get_as<T: FromVar>(&self) -> Result<T> { T::from_var(&self.0.value.lock()) }

  /// Stores `value` and schedules a change notification. Setting a value
  /// equal to the current one does nothing.
  pub fn set(&self, value: impl IntoVar) {
    let value = value.into_var();
    {
      let mut current = self.0.value.lock();
      if *current == value {
        return;
      }
      *current = value;
    }
    if self.0.notify_pending.swap(true, Ordering::AcqRel) {
      return;
    }
    let weak = Arc::downgrade(&self.0);
    let posted = self.0.run_loop.call_async(move || {
      if let Some(inner) = weak.upgrade() {
        inner.notify_pending.store(false, Ordering::Release);
        let value = inner.value.lock().clone();
        let listeners: Vec<Listener> = inner.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
          listener(&value);
        }
      }
    });
    if !posted {
      self.0.notify_pending.store(false, Ordering::Release);
    }
  }

  /// Registers `listener`, called on the cell's run loop after each change.
  pub fn add_listener(&self, listener: impl Fn(&Var) + Send + Sync + 'static) -> ListenerId {
    let id = ListenerId(self.0.next_id.fetch_add(1, Ordering::Relaxed));
    self.0.listeners.lock().push((id, Arc::new(listener)));
    id
  }

  /// Returns `false` if `id` was not registered.
  pub fn remove_listener(&self, id: ListenerId) -> bool {
    let removed = {
      let mut listeners = self.0.listeners.lock();
      let position = listeners.iter().position(|(l, _)| *l == id);
      position.map(|i| listeners.remove(i))
    };
    removed.is_some()
  }

  pub fn listener_count(&self) -> usize { self.0.listeners.lock().len() }
}

impl fmt::Debug for SharedValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SharedValue").field("value", &self.get()).finish()
  }
}
