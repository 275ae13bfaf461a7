//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use chrono::{DateTime, TimeZone, Utc};
use displaykit::Value;

/// Timestamp `secs` seconds after the epoch
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Assert a formula result is a number approximately equal to `expected`
pub fn assert_number(value: &Value, expected: f64) {
    match value {
        Value::Number(n) => assert_float_eq(*n, expected, 1e-9),
        other => panic!("Expected number {}, got {:?}", expected, other),
    }
}
