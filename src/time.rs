//! Real-valued time and bandwidth types used throughout the kernel.
//!
//! The schedulability model works over real-valued instants and durations
//! (task periods, deadlines, α and Δ are not constrained to be integral), so
//! unlike a nanosecond-counting `Duration` this wraps a bare `f64` and keeps
//! the small arithmetic surface the rest of the crate needs.

use std::ops::{Add, Div, Mul, Sub};

/// A non-negative span of time, in whatever unit the model's inputs use
/// (the crate is unit-agnostic: callers are responsible for using one
/// consistent unit for periods, deadlines and WCETs).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Duration(pub f64);

/// Absolute tolerance used for float equality throughout the kernel.
///
/// Chosen per spec: prefer strict `>` when deciding infeasibility, so
/// borderline-feasible systems are not rejected due to rounding noise.
pub const EPS: f64 = 1e-9;

impl Duration {
    pub const ZERO: Duration = Duration(0.0);

    pub fn new(value: f64) -> Self {
        Duration(value)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    pub fn max(self, other: Duration) -> Duration {
        Duration(self.0.max(other.0))
    }

    pub fn min(self, other: Duration) -> Duration {
        Duration(self.0.min(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0.abs() < EPS
    }

    /// `self` and `other` compare equal within [`EPS`].
    pub fn approx_eq(self, other: Duration) -> bool {
        (self.0 - other.0).abs() < EPS
    }

    /// Strictly greater, biased by [`EPS`] so near-equal values never
    /// spuriously count as "greater" (used when demand is compared to
    /// supply: a feasible-but-borderline system must not be rejected).
    pub fn strictly_greater(self, other: Duration) -> bool {
        self.0 - other.0 > EPS
    }

    pub fn floor_div(self, rhs: Duration) -> i64 {
        (self.0 / rhs.0).floor() as i64
    }

    pub fn ceil_div(self, rhs: Duration) -> i64 {
        (self.0 / rhs.0).ceil() as i64
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Mul<f64> for Duration {
    type Output = Duration;
    fn mul(self, rhs: f64) -> Duration {
        Duration(self.0 * rhs)
    }
}

impl Mul<Duration> for f64 {
    type Output = Duration;
    fn mul(self, rhs: Duration) -> Duration {
        rhs * self
    }
}

impl Div<f64> for Duration {
    type Output = Duration;
    fn div(self, rhs: f64) -> Duration {
        Duration(self.0 / rhs)
    }
}

impl Div for Duration {
    type Output = f64;
    fn div(self, rhs: Duration) -> f64 {
        self.0 / rhs.0
    }
}

impl std::iter::Sum for Duration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Duration::ZERO, |acc, val| acc + val)
    }
}

impl From<f64> for Duration {
    fn from(value: f64) -> Self {
        Duration(value)
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An f64 wrapper that is totally ordered, for use as a [`std::collections::BinaryHeap`]
/// / event-queue sort key where bare `f64` (only `PartialOrd`) cannot be used directly.
pub type OrderedTime = ordered_float::OrderedFloat<f64>;

pub fn ordered(d: Duration) -> OrderedTime {
    ordered_float::OrderedFloat(d.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_roundtrip() {
        let a = Duration::new(3.0);
        let b = Duration::new(2.0);
        assert_eq!((a + b).as_f64(), 5.0);
        assert_eq!((a - b).as_f64(), 1.0);
        assert_eq!((a * 2.0).as_f64(), 6.0);
    }

    #[test]
    fn tolerance_absorbs_rounding_noise() {
        let a = Duration::new(1.0 + 1e-12);
        let b = Duration::new(1.0);
        assert!(a.approx_eq(b));
        assert!(!a.strictly_greater(b));
    }
}
