use crate::{observable::Observable, var::IntoVar};

impl Observable {
  /// Emits `items` before the items of this observable.
  pub fn start_with<I>(&self, items: I) -> Observable
  where
    I: IntoIterator,
    I::Item: IntoVar,
  {
    Observable::from(items).concat([self.detached()])
  }
}
