//! Time utilities.
use crate::{bindings::Glib, error::Result};
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

mod date_time;
mod time_zone;

pub use date_time::DateTime;
pub use time_zone::{TimeType, TimeZone};

/// A signed span between two points in time, with microsecond resolution.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default)]
pub struct TimeSpan(i64);

impl TimeSpan {
    /// The span of one day.
    pub const DAY: Self = Self(86_400_000_000);

    /// The span of one hour.
    pub const HOUR: Self = Self(3_600_000_000);

    /// The span of one minute.
    pub const MINUTE: Self = Self(60_000_000);

    /// The span of one second.
    pub const SECOND: Self = Self(1_000_000);

    /// The span of one millisecond.
    pub const MILLISECOND: Self = Self(1_000);

    /// The span of one microsecond.
    pub const MICROSECOND: Self = Self(1);

    /// The empty span.
    pub const ZERO: Self = Self(0);

    /// Constructs a `TimeSpan` from microseconds.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Constructs a `TimeSpan` from whole seconds, or `None` on overflow.
    pub const fn from_secs(secs: i64) -> Option<Self> {
        match secs.checked_mul(Self::SECOND.0) {
            Some(micros) => Some(Self(micros)),
            None => None,
        }
    }

    /// Returns the span in microseconds.
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Returns the whole seconds of the span, rounded towards zero.
    pub const fn as_secs(self) -> i64 {
        self.0 / Self::SECOND.0
    }

    /// Converts a [`std::time::Duration`], or returns `None` if it does not fit.
    pub fn from_duration(duration: std::time::Duration) -> Option<Self> {
        i64::try_from(duration.as_micros()).ok().map(Self)
    }

    /// Converts the span to a [`std::time::Duration`], or returns `None` if it is negative.
    pub fn to_duration(self) -> Option<std::time::Duration> {
        u64::try_from(self.0)
            .ok()
            .map(std::time::Duration::from_micros)
    }

    /// Returns `Some(s)` where `s` is the span `self + span`, or `None` on overflow.
    pub const fn checked_add(self, span: Self) -> Option<Self> {
        match self.0.checked_add(span.0) {
            Some(micros) => Some(Self(micros)),
            None => None,
        }
    }

    /// Returns `Some(s)` where `s` is the span `self - span`, or `None` on overflow.
    pub const fn checked_sub(self, span: Self) -> Option<Self> {
        match self.0.checked_sub(span.0) {
            Some(micros) => Some(Self(micros)),
            None => None,
        }
    }

    /// Returns `self + span`, saturating at the numeric bounds.
    pub const fn saturating_add(self, span: Self) -> Self {
        Self(self.0.saturating_add(span.0))
    }
}

impl Add for TimeSpan {
    type Output = TimeSpan;

    fn add(self, rhs: TimeSpan) -> Self::Output {
        self.checked_add(rhs).expect("overflow when adding time spans")
    }
}

impl AddAssign for TimeSpan {
    fn add_assign(&mut self, rhs: TimeSpan) {
        *self = *self + rhs;
    }
}

impl Sub for TimeSpan {
    type Output = TimeSpan;

    fn sub(self, rhs: TimeSpan) -> Self::Output {
        self.checked_sub(rhs)
            .expect("overflow when subtracting time spans")
    }
}

impl SubAssign for TimeSpan {
    fn sub_assign(&mut self, rhs: TimeSpan) {
        *self = *self - rhs;
    }
}

impl Mul<i64> for TimeSpan {
    type Output = TimeSpan;

    fn mul(self, rhs: i64) -> Self::Output {
        self.0
            .checked_mul(rhs)
            .map(Self)
            .expect("overflow when multiplying a time span")
    }
}

impl Neg for TimeSpan {
    type Output = TimeSpan;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// A point on the monotonic clock of the native library, in microseconds.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct MonotonicTime(i64);

impl MonotonicTime {
    /// Returns the current time.
    pub fn now() -> Result<Self> {
        let glib = Glib::get()?;
        Ok(Self::now_in(glib))
    }

    pub(crate) fn now_in(glib: &Glib) -> Self {
        // Safety: FFI call is safe.
        Self(unsafe { (glib.g_get_monotonic_time)() })
    }

    /// Wraps a raw reading of the clock.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Returns the raw reading of the clock.
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Returns the span elapsed from `earlier` to `self`.
    pub const fn duration_since(self, earlier: Self) -> TimeSpan {
        TimeSpan(self.0.saturating_sub(earlier.0))
    }

    /// Returns `Some(t)` where `t` is the time `self + span`, or `None` on overflow.
    pub const fn checked_add(self, span: TimeSpan) -> Option<Self> {
        match self.0.checked_add(span.0) {
            Some(micros) => Some(Self(micros)),
            None => None,
        }
    }

    /// Returns `self + span`, saturating at the numeric bounds.
    pub const fn saturating_add(self, span: TimeSpan) -> Self {
        Self(self.0.saturating_add(span.0))
    }
}

impl Add<TimeSpan> for MonotonicTime {
    type Output = MonotonicTime;

    fn add(self, rhs: TimeSpan) -> Self::Output {
        self.checked_add(rhs)
            .expect("overflow when adding a time span to a monotonic time")
    }
}

impl Sub for MonotonicTime {
    type Output = TimeSpan;

    fn sub(self, rhs: MonotonicTime) -> Self::Output {
        self.duration_since(rhs)
    }
}

/// Reads the monotonic clock of the native library.
pub fn monotonic_time() -> Result<MonotonicTime> {
    MonotonicTime::now()
}
