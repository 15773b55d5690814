//! Reductions over a field's neighborhood
//!
//! `combine` must be associative and commutative: neighbor iteration order is
//! an implementation detail. The own value takes part only in the
//! `_with_self` variants.

use crate::Field;

/// Fold neighbor values with `combine`, `default` when there are none
pub fn fold_hood<T, F>(field: &Field<T>, default: T, combine: F) -> T
where
    T: Clone,
    F: Fn(T, T) -> T,
{
    field
        .iter()
        .map(|(_, v)| v.clone())
        .reduce(&combine)
        .unwrap_or(default)
}

/// Fold neighbor values and the own value
pub fn fold_hood_with_self<T, F>(field: &Field<T>, combine: F) -> T
where
    T: Clone,
    F: Fn(T, T) -> T,
{
    field
        .iter()
        .map(|(_, v)| v.clone())
        .fold(field.own().clone(), combine)
}

/// Smallest neighbor value, `default` when there are none
pub fn min_hood<T: Clone + PartialOrd>(field: &Field<T>, default: T) -> T {
    fold_hood(field, default, partial_min)
}

/// Largest neighbor value, `default` when there are none
pub fn max_hood<T: Clone + PartialOrd>(field: &Field<T>, default: T) -> T {
    fold_hood(field, default, partial_max)
}

pub fn min_hood_with_self<T: Clone + PartialOrd>(field: &Field<T>) -> T {
    fold_hood_with_self(field, partial_min)
}

pub fn max_hood_with_self<T: Clone + PartialOrd>(field: &Field<T>) -> T {
    fold_hood_with_self(field, partial_max)
}

/// Sum of neighbor values (0 when there are none)
pub fn sum_hood(field: &Field<f64>) -> f64 {
    field.iter().map(|(_, v)| *v).sum()
}

/// True when any neighbor value is true
pub fn any_hood(field: &Field<bool>) -> bool {
    field.iter().any(|(_, v)| *v)
}

/// True when every neighbor value is true (vacuously on no neighbors)
pub fn all_hood(field: &Field<bool>) -> bool {
    field.iter().all(|(_, v)| *v)
}

/// Number of neighbors holding a value
pub fn count_hood<T>(field: &Field<T>) -> usize {
    field.len()
}

// Ties and incomparable pairs (NaN) keep the left operand
fn partial_min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

fn partial_max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldwave_core::DeviceId;
    use proptest::prelude::*;

    fn field_of(own: f64, values: &[f64]) -> Field<f64> {
        Field::from_neighbors(
            own,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (DeviceId::new(i as u64 + 1), *v)),
        )
    }

    #[test]
    fn test_empty_hood_returns_default() {
        let field = Field::new(3.0);
        assert_eq!(min_hood(&field, f64::INFINITY), f64::INFINITY);
        assert_eq!(max_hood(&field, -1.0), -1.0);
        assert_eq!(sum_hood(&field), 0.0);
        assert_eq!(count_hood(&field), 0);
        assert!(!any_hood(&Field::new(true)));
        assert!(all_hood(&Field::new(false)));
    }

    #[test]
    fn test_own_value_excluded() {
        let field = field_of(-10.0, &[4.0, 2.0, 8.0]);
        assert_eq!(min_hood(&field, f64::INFINITY), 2.0);
        assert_eq!(max_hood(&field, 0.0), 8.0);
        assert_eq!(min_hood_with_self(&field), -10.0);
        assert_eq!(max_hood_with_self(&field), 8.0);
        assert_eq!(sum_hood(&field), 14.0);
    }

    #[test]
    fn test_custom_fold() {
        let field = Field::new(0u32)
            .with_neighbor(DeviceId::new(1), 0b0011)
            .with_neighbor(DeviceId::new(2), 0b0110);
        assert_eq!(fold_hood(&field, 0, |a, b| a | b), 0b0111);
        assert_eq!(fold_hood_with_self(&field.map(|v| v + 1), |a, b| a + b), 1 + 4 + 7);
    }

    #[test]
    fn test_nan_neighbor_does_not_replace_minimum() {
        let field = field_of(0.0, &[3.0, f64::NAN]);
        assert_eq!(min_hood(&field, f64::INFINITY), 3.0);
    }

    #[test]
    fn test_bool_hoods() {
        let field = Field::new(false)
            .with_neighbor(DeviceId::new(1), true)
            .with_neighbor(DeviceId::new(2), false);
        assert!(any_hood(&field));
        assert!(!all_hood(&field));
    }

    proptest! {
        #[test]
        fn prop_fold_over_empty_is_default(default in -1e9f64..1e9) {
            let field = Field::new(0.0);
            prop_assert_eq!(fold_hood(&field, default, |a: f64, b: f64| a + b), default);
            prop_assert_eq!(fold_hood(&field, default, f64::min), default);
        }

        #[test]
        fn prop_fold_ignores_neighbor_order(
            (values, shuffled) in proptest::collection::vec(-1_000_000i64..1_000_000, 0..16)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        ) {
            let plain = Field::from_neighbors(
                0i64,
                values.iter().enumerate().map(|(i, v)| (DeviceId::new(i as u64), *v)),
            );
            let permuted = Field::from_neighbors(
                0i64,
                shuffled.iter().enumerate().map(|(i, v)| (DeviceId::new(i as u64), *v)),
            );

            prop_assert_eq!(min_hood(&plain, i64::MAX), min_hood(&permuted, i64::MAX));
            prop_assert_eq!(max_hood(&plain, i64::MIN), max_hood(&permuted, i64::MIN));
            prop_assert_eq!(
                fold_hood(&plain, 0, |a, b| a + b),
                fold_hood(&permuted, 0, |a, b| a + b)
            );
            prop_assert_eq!(count_hood(&plain), count_hood(&permuted));
        }
    }
}
