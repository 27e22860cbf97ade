// Copyright 2026 the Tempostat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time in milliseconds.
//!
//! [`Instant`] represents a point in time as whole milliseconds from an
//! arbitrary origin (`performance.now()` truncated, in the browser backend;
//! a virtual clock in the page harness). [`Span`] is a duration in the same
//! unit. Millisecond resolution is deliberate: every deadline in this system
//! (chord window, settle delay, label hold, menu polling) is specified in
//! milliseconds, and `setTimeout` cannot do better anyway.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time expressed as whole milliseconds from an arbitrary origin.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant(pub u64);

impl Instant {
    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Returns the span between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_since(self, earlier: Self) -> Span {
        Span(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a span.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, span: Span) -> Option<Self> {
        match self.0.checked_add(span.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Span> for Instant {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Span) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Span> for Instant {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Span) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for Instant {
    type Output = Span;

    #[inline]
    fn sub(self, rhs: Self) -> Span {
        Span(self.0 - rhs.0)
    }
}

impl fmt::Debug for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instant({}ms)", self.0)
    }
}

/// A duration in whole milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span(pub u64);

impl Span {
    /// A zero-length span.
    pub const ZERO: Self = Self(0);

    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Add for Span {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}ms)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_since_clamps_to_zero() {
        let t = Instant(1000);
        assert_eq!(t.saturating_since(Instant(400)), Span(600));
        assert_eq!(t.saturating_since(Instant(1500)), Span::ZERO);
    }

    #[test]
    fn instant_span_arithmetic() {
        let t = Instant(1000);
        let s = Span(200);
        assert_eq!((t + s).millis(), 1200);
        assert_eq!((t - s).millis(), 800);
        assert_eq!(Instant(1500) - t, Span(500));
    }

    #[test]
    fn checked_add_overflow() {
        assert_eq!(Instant(u64::MAX).checked_add(Span(1)), None);
        assert_eq!(Instant(10).checked_add(Span(5)), Some(Instant(15)));
    }
}
