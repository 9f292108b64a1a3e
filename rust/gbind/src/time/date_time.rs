use super::{TimeSpan, TimeZone};
use crate::{
    allocator::GlibAllocator,
    bindings::{GDateTime, Glib},
    error::{Error, Result},
    ffi::Borrowed,
    marshal::{string, TransientStr},
};
use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

bound_type! {
    /// An immutable point in time in a time zone, with microsecond precision.
    ///
    /// Arithmetic never modifies a `DateTime`; every operation returns a new one.
    refcounted DateTime(GDateTime) = g_date_time
}

// Safety: A `GDateTime` is immutable and its reference count is atomic.
unsafe impl Send for DateTime {}

// Safety: See above.
unsafe impl Sync for DateTime {}

macro_rules! getters {
    ($($(#[$meta:meta])* $name:ident => $native:ident;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self) -> i32 {
                // Safety: FFI call is safe.
                unsafe { (self.glib.$native)(self.as_raw()) }
            }
        )*
    };
}

impl DateTime {
    fn expect_new(glib: &'static Glib, ptr: *mut GDateTime, symbol: &'static str) -> Result<Self> {
        // Safety: All constructors return null or a new reference.
        unsafe { Self::from_raw_full(glib, ptr) }.ok_or(Error::NullReturn { symbol })
    }

    fn derived(&self, ptr: *mut GDateTime) -> Option<Self> {
        // Safety: All derivations return null or a new reference.
        unsafe { Self::from_raw_full(self.glib, ptr) }
    }

    /// Returns the current time in the local time zone.
    pub fn now_local() -> Result<Self> {
        let glib = Glib::get()?;
        // Safety: FFI call is safe.
        let ptr = unsafe { (glib.g_date_time_new_now_local)() };
        Self::expect_new(glib, ptr, "g_date_time_new_now_local")
    }

    /// Returns the current time in UTC.
    pub fn now_utc() -> Result<Self> {
        let glib = Glib::get()?;
        // Safety: FFI call is safe.
        let ptr = unsafe { (glib.g_date_time_new_now_utc)() };
        Self::expect_new(glib, ptr, "g_date_time_new_now_utc")
    }

    /// Returns the current time in `tz`.
    pub fn now(tz: &TimeZone) -> Result<Self> {
        let glib = Glib::get()?;
        // Safety: The time zone is live.
        let ptr = unsafe { (glib.g_date_time_new_now)(tz.as_raw()) };
        Self::expect_new(glib, ptr, "g_date_time_new_now")
    }

    /// Constructs the UTC time `t` seconds after the epoch.
    ///
    /// Returns `None` if the time is out of the supported range.
    pub fn from_unix_utc(t: i64) -> Result<Option<Self>> {
        let glib = Glib::get()?;
        // Safety: FFI call is safe.
        let ptr = unsafe { (glib.g_date_time_new_from_unix_utc)(t) };
        // Safety: Returns null or a new reference.
        Ok(unsafe { Self::from_raw_full(glib, ptr) })
    }

    /// Constructs a time from its calendar fields in `tz`.
    ///
    /// Returns `None` if the fields do not describe a valid time.
    pub fn new(
        tz: &TimeZone,
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        seconds: f64,
    ) -> Result<Option<Self>> {
        let glib = Glib::get()?;
        // Safety: The time zone is live.
        let ptr = unsafe {
            (glib.g_date_time_new)(tz.as_raw(), year, month, day, hour, minute, seconds)
        };
        // Safety: Returns null or a new reference.
        Ok(unsafe { Self::from_raw_full(glib, ptr) })
    }

    /// Parses an ISO 8601 formatted time.
    ///
    /// Texts without a time zone designator are interpreted in `default_tz`, or in the local
    /// time zone if it is `None`. Returns `None` if the text can not be parsed.
    pub fn from_iso8601(text: &str, default_tz: Option<&TimeZone>) -> Result<Option<Self>> {
        let glib = Glib::get()?;
        let text = TransientStr::new(text)?;
        let tz = default_tz.map_or(std::ptr::null_mut(), TimeZone::as_raw);
        // Safety: The text is nul-terminated and the time zone is null or live.
        let ptr = unsafe { (glib.g_date_time_new_from_iso8601)(text.as_ptr(), tz) };
        // Safety: Returns null or a new reference.
        Ok(unsafe { Self::from_raw_full(glib, ptr) })
    }

    /// Returns the time `seconds` later, or `None` if it is out of range.
    pub fn add_seconds(&self, seconds: f64) -> Option<Self> {
        // Safety: FFI call is safe.
        self.derived(unsafe { (self.glib.g_date_time_add_seconds)(self.as_raw(), seconds) })
    }

    /// Returns the time `days` later, or `None` if it is out of range.
    pub fn add_days(&self, days: i32) -> Option<Self> {
        // Safety: FFI call is safe.
        self.derived(unsafe { (self.glib.g_date_time_add_days)(self.as_raw(), days) })
    }

    /// Returns the time `months` later, or `None` if it is out of range.
    ///
    /// The day of the month is clamped to the length of the resulting month.
    pub fn add_months(&self, months: i32) -> Option<Self> {
        // Safety: FFI call is safe.
        self.derived(unsafe { (self.glib.g_date_time_add_months)(self.as_raw(), months) })
    }

    /// Returns the time `years` later, or `None` if it is out of range.
    pub fn add_years(&self, years: i32) -> Option<Self> {
        // Safety: FFI call is safe.
        self.derived(unsafe { (self.glib.g_date_time_add_years)(self.as_raw(), years) })
    }

    /// Returns the span from `begin` to `self`.
    pub fn difference(&self, begin: &Self) -> TimeSpan {
        // Safety: Both times are live.
        let span = unsafe { (self.glib.g_date_time_difference)(self.as_raw(), begin.as_raw()) };
        TimeSpan::from_micros(span)
    }

    /// Returns the whole seconds since the epoch.
    pub fn to_unix(&self) -> i64 {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_date_time_to_unix)(self.as_raw()) }
    }

    getters! {
        /// Returns the year.
        year => g_date_time_get_year;
        /// Returns the month of the year, from 1 to 12.
        month => g_date_time_get_month;
        /// Returns the day of the month, from 1 to 31.
        day_of_month => g_date_time_get_day_of_month;
        /// Returns the ISO 8601 day of the week, from 1 (Monday) to 7 (Sunday).
        day_of_week => g_date_time_get_day_of_week;
        /// Returns the day of the year, from 1 to 366.
        day_of_year => g_date_time_get_day_of_year;
        /// Returns the hour of the day, from 0 to 23.
        hour => g_date_time_get_hour;
        /// Returns the minute of the hour, from 0 to 59.
        minute => g_date_time_get_minute;
        /// Returns the second of the minute, from 0 to 59.
        second => g_date_time_get_second;
        /// Returns the microsecond of the second, from 0 to 999999.
        microsecond => g_date_time_get_microsecond;
    }

    /// Returns the offset of the time zone from UTC at this time.
    pub fn utc_offset(&self) -> TimeSpan {
        // Safety: FFI call is safe.
        TimeSpan::from_micros(unsafe { (self.glib.g_date_time_get_utc_offset)(self.as_raw()) })
    }

    /// Returns the time zone of the time.
    ///
    /// The time zone is owned by `self`; clone it to keep it beyond that.
    pub fn timezone(&self) -> Result<Borrowed<'_, TimeZone>> {
        let get_timezone = self.glib.g_date_time_get_timezone.ok_or(Error::Unsupported {
            symbol: "g_date_time_get_timezone",
        })?;
        // Safety: The time zone is owned by `self`, which outlives the view.
        unsafe { TimeZone::from_raw_none(self.glib, get_timezone(self.as_raw())) }.ok_or(
            Error::NullReturn {
                symbol: "g_date_time_get_timezone",
            },
        )
    }

    /// Returns the abbreviation of the time zone at this time, e.g. `"CEST"`.
    pub fn timezone_abbreviation(&self) -> String {
        // Safety: The string is owned by `self` and copied immediately.
        unsafe {
            string::from_borrowed((self.glib.g_date_time_get_timezone_abbreviation)(
                self.as_raw(),
            ))
        }
        .unwrap_or_default()
    }

    /// Returns whether daylight saving time is in effect at this time.
    pub fn is_daylight_savings(&self) -> bool {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_date_time_is_daylight_savings)(self.as_raw()) }.get()
    }

    /// Returns the same instant in `tz`, or `None` if it is out of range there.
    pub fn to_timezone(&self, tz: &TimeZone) -> Option<Self> {
        // Safety: Both objects are live.
        self.derived(unsafe { (self.glib.g_date_time_to_timezone)(self.as_raw(), tz.as_raw()) })
    }

    /// Returns the same instant in the local time zone.
    pub fn to_local(&self) -> Option<Self> {
        // Safety: FFI call is safe.
        self.derived(unsafe { (self.glib.g_date_time_to_local)(self.as_raw()) })
    }

    /// Returns the same instant in UTC.
    pub fn to_utc(&self) -> Option<Self> {
        // Safety: FFI call is safe.
        self.derived(unsafe { (self.glib.g_date_time_to_utc)(self.as_raw()) })
    }

    /// Formats the time with a `strftime`-like format string.
    ///
    /// Returns `None` if the format is invalid.
    pub fn format(&self, format: &str) -> Result<Option<String>> {
        let format = TransientStr::new(format)?;
        // Safety: The result is owned by us and allocated with `g_malloc`.
        Ok(unsafe {
            string::from_owned(
                &GlibAllocator::new(self.glib),
                (self.glib.g_date_time_format)(self.as_raw(), format.as_ptr()),
            )
        })
    }

    /// Formats the time as ISO 8601.
    pub fn format_iso8601(&self) -> Result<String> {
        let format_iso8601 = self.glib.g_date_time_format_iso8601.ok_or(Error::Unsupported {
            symbol: "g_date_time_format_iso8601",
        })?;
        // Safety: The result is owned by us and allocated with `g_malloc`.
        unsafe { string::from_owned(&GlibAllocator::new(self.glib), format_iso8601(self.as_raw())) }
            .ok_or(Error::NullReturn {
                symbol: "g_date_time_format_iso8601",
            })
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        // Safety: Both times are live.
        unsafe {
            (self.glib.g_date_time_equal)(
                self.as_raw().cast_const().cast(),
                other.as_raw().cast_const().cast(),
            )
        }
        .get()
    }
}

impl Eq for DateTime {}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        // Safety: Both times are live.
        let order = unsafe {
            (self.glib.g_date_time_compare)(
                self.as_raw().cast_const().cast(),
                other.as_raw().cast_const().cast(),
            )
        };
        order.cmp(&0)
    }
}

impl Hash for DateTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_date_time_hash)(self.as_raw().cast_const().cast()) }.hash(state);
    }
}
