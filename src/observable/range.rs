use std::fmt::Display;

use crate::{
  error::{Error, Result},
  observable::Observable,
  observer::Subscriber,
  var::IntoVar,
};

/// Numeric types `Observable::range` can count with.
pub trait RangeValue: Copy + PartialOrd + Display + IntoVar + Send + Sync + 'static {
  /// `self + step`, saturating where the type would overflow.
  fn advance(self, step: u32) -> Self;
}

macro_rules! impl_range_int {
  ($($t:ty),*) => {
    $(
      impl RangeValue for $t {
        #[inline]
        fn advance(self, step: u32) -> Self {
          // A step the type cannot hold overshoots any `last`.
          <$t>::try_from(step).map_or(<$t>::MAX, |step| self.saturating_add(step))
        }
      }
    )*
  };
}

impl_range_int!(i32, i64);

impl RangeValue for f32 {
  #[inline]
  fn advance(self, step: u32) -> Self { self + step as f32 }
}

impl RangeValue for f64 {
  #[inline]
  fn advance(self, step: u32) -> Self { self + f64::from(step) }
}

impl Observable {
  /// Creates an observable counting from `first` to `last` by `step`.
  ///
  /// The last emitted value is always exactly `last`, even when
  /// `last - first` is not a multiple of `step`. Fails with
  /// [`Error::InvalidRange`] if `first > last` or `step` is zero.
  ///
  /// ```rust
  /// use rxvar::prelude::*;
  ///
  /// let o = Observable::range(3, 7, 3).unwrap();
  /// assert_eq!(o.to_vec::<i32>().unwrap(), vec![3, 6, 7]);
  /// ```
  pub fn range<T: RangeValue>(first: T, last: T, step: u32) -> Result<Observable> {
    if !(first <= last) || step == 0 {
      return Err(Error::InvalidRange { first: first.to_string(), last: last.to_string(), step });
    }
    Ok(Observable::from_fn(move |subscriber: Subscriber| {
      let mut value = first;
      loop {
        if subscriber.is_disposed() {
          return;
        }
        if value >= last {
          subscriber.next(last);
          break;
        }
        subscriber.next(value);
        let next = value.advance(step);
        if !(next > value) {
          subscriber.next(last);
          break;
        }
        value = next;
      }
      subscriber.complete();
    }))
  }
}

#[cfg(test)]
mod tests {
  use float_cmp::approx_eq;

  use crate::prelude::*;

  #[test]
  fn first_greater_than_last_is_invalid() {
    let err = Observable::range(10, 9, 1).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
  }

  #[test]
  fn zero_step_is_invalid() {
    assert!(Observable::range(1, 9, 0).is_err());
  }

  #[test]
  fn clamps_to_last() {
    let items = Observable::range(3, 7, 3).unwrap().to_vec::<i32>().unwrap();
    assert_eq!(items, vec![3, 6, 7]);
  }

  #[test]
  fn exact_multiple_does_not_repeat_last() {
    let items = Observable::range(1i64, 3, 1).unwrap().to_vec::<i64>().unwrap();
    assert_eq!(items, vec![1, 2, 3]);
  }

  #[test]
  fn single_value_range() {
    let items = Observable::range(10, 10, 1).unwrap().to_vec::<i32>().unwrap();
    assert_eq!(items, vec![10]);
  }

  #[test]
  fn floating_point_range() {
    let items = Observable::range(17.5, 22.8, 2).unwrap().to_vec::<f64>().unwrap();
    let expected = [17.5, 19.5, 21.5, 22.8];
    assert_eq!(items.len(), expected.len());
    for (a, b) in items.iter().zip(expected) {
      assert!(approx_eq!(f64, *a, b, ulps = 2));
    }
  }

  #[test]
  fn single_precision_range() {
    let items = Observable::range(0.5f32, 2.0, 1).unwrap().to_vec::<f32>().unwrap();
    assert_eq!(items, vec![0.5, 1.5, 2.0]);
  }

  #[test]
  fn step_wider_than_the_type_jumps_to_last() {
    assert_eq!((-5i32).advance(3_000_000_000), i32::MAX);
    let items = Observable::range(-5, 5, u32::MAX).unwrap().to_vec::<i32>().unwrap();
    assert_eq!(items, vec![-5, 5]);
  }

  #[test]
  fn stops_when_downstream_is_done() {
    let items = Observable::range(0, i32::MAX, 1).unwrap().take(3).to_vec::<i32>().unwrap();
    assert_eq!(items, vec![0, 1, 2]);
  }
}
