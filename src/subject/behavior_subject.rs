use std::{fmt, sync::Arc};

use super::{
  impl_subject_observer,
  subject_core::{Replay, SubjectCore},
};
use crate::{
  error::Result,
  var::{FromVar, IntoVar, Var},
};

/// A subject that always holds a current value.
///
/// New subscribers immediately receive the current value, then every later
/// push.
#[derive(Clone)]
pub struct BehaviorSubject {
  core: Arc<SubjectCore>,
}

impl BehaviorSubject {
  pub fn new(initial: impl IntoVar) -> Self {
    BehaviorSubject { core: SubjectCore::new(Replay::Latest(initial.into_var())) }
  }

  /// The current value.
  pub fn latest(&self) -> Var { self.core.latest().unwrap_or_default() }

  /// The current value, unwrapped as `T`.
  pub fn latest_as<T: FromVar>(&self) -> Result<T> { T::from_var(&self.latest()) }
}

impl fmt::Debug for BehaviorSubject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BehaviorSubject").field("latest", &self.latest()).finish()
  }
}

impl_subject_observer!(BehaviorSubject);
