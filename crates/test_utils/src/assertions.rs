//! Custom Test Assertions
//!
//! Provides assertion helpers for repository results that give more
//! meaningful failure messages than matching by hand.

use infra_db::{error_constraint, Constraint, DatabaseError};
use std::fmt::Debug;

/// Asserts that `result` failed on the named constraint
///
/// # Panics
///
/// Panics if the result is `Ok` or fails for any other reason
pub fn assert_constraint_violation<T: Debug>(result: &Result<T, DatabaseError>, expected: Constraint) {
    match result {
        Ok(value) => panic!("Expected violation of {}, got Ok({:?})", expected, value),
        Err(err) => assert_eq!(
            error_constraint(err),
            Some(expected),
            "Expected violation of {}, got {:?}",
            expected,
            err
        ),
    }
}

/// Asserts that `result` failed with a not found error
pub fn assert_not_found<T: Debug>(result: &Result<T, DatabaseError>) {
    assert!(
        matches!(result, Err(err) if err.is_not_found()),
        "Expected NotFound, got {:?}",
        result
    );
}

/// Asserts that `result` failed input validation
pub fn assert_validation_error<T: Debug>(result: &Result<T, DatabaseError>) {
    assert!(
        matches!(result, Err(DatabaseError::Validation(_))),
        "Expected Validation, got {:?}",
        result
    );
}

/// Asserts that identities are strictly increasing
pub fn assert_strictly_ascending<I: Ord + Debug>(ids: &[I]) {
    for pair in ids.windows(2) {
        assert!(
            pair[0] < pair[1],
            "Expected ascending identities, found {:?} before {:?}",
            pair[0],
            pair[1]
        );
    }
}

/// Asserts that `values` is sorted by `key` in the given direction
pub fn assert_sorted_by<T, K, F>(values: &[T], descending: bool, key: F)
where
    K: PartialOrd + Debug,
    F: Fn(&T) -> K,
{
    for pair in values.windows(2) {
        let (a, b) = (key(&pair[0]), key(&pair[1]));
        let ordered = if descending { a >= b } else { a <= b };
        assert!(ordered, "Out of order: {:?} then {:?}", a, b);
    }
}
