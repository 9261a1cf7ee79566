use std::{collections::VecDeque, fmt, sync::Arc};

use super::{
  impl_subject_observer,
  subject_core::{Replay, SubjectCore},
};

/// A subject that buffers pushed items and replays them, oldest first, to
/// every new subscriber.
///
/// The buffer keeps the most recent `capacity` items; [`ReplaySubject::new`]
/// keeps everything.
#[derive(Clone)]
pub struct ReplaySubject {
  core: Arc<SubjectCore>,
  capacity: Option<usize>,
}

impl ReplaySubject {
  /// A subject with an unbounded buffer.
  pub fn new() -> Self { Self::build(None) }

  /// A subject that keeps the `capacity` most recent items.
  pub fn with_capacity(capacity: usize) -> Self { Self::build(Some(capacity)) }

  fn build(capacity: Option<usize>) -> Self {
    let items = VecDeque::with_capacity(capacity.unwrap_or(0).min(64));
    ReplaySubject { core: SubjectCore::new(Replay::Buffer { items, capacity }), capacity }
  }

  pub fn capacity(&self) -> Option<usize> { self.capacity }
}

impl Default for ReplaySubject {
  fn default() -> Self { Self::new() }
}

impl fmt::Debug for ReplaySubject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReplaySubject").field("capacity", &self.capacity).finish()
  }
}

impl_subject_observer!(ReplaySubject);
