use crate::{
    bindings::{GTimeType, GTimeZone, Glib},
    error::{Error, Result},
    marshal::{string, TransientStr},
};

bound_type! {
    /// An immutable time zone, shared by reference counting.
    refcounted TimeZone(GTimeZone) = g_time_zone
}

// Safety: A `GTimeZone` is immutable and its reference count is atomic.
unsafe impl Send for TimeZone {}

// Safety: See above.
unsafe impl Sync for TimeZone {}

/// Interpretation of a local time when searching for an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeType {
    /// The time is in local standard time.
    Standard,
    /// The time is in local daylight time.
    Daylight,
    /// The time is in UTC.
    Universal,
}

impl From<TimeType> for GTimeType {
    fn from(value: TimeType) -> Self {
        match value {
            TimeType::Standard => GTimeType::G_TIME_TYPE_STANDARD,
            TimeType::Daylight => GTimeType::G_TIME_TYPE_DAYLIGHT,
            TimeType::Universal => GTimeType::G_TIME_TYPE_UNIVERSAL,
        }
    }
}

impl TimeZone {
    /// Returns the UTC time zone.
    pub fn utc() -> Result<Self> {
        let glib = Glib::get()?;
        // Safety: Returns a new reference.
        unsafe { Self::from_raw_full(glib, (glib.g_time_zone_new_utc)()) }.ok_or(Error::NullReturn {
            symbol: "g_time_zone_new_utc",
        })
    }

    /// Returns the local time zone of the process.
    pub fn local() -> Result<Self> {
        let glib = Glib::get()?;
        // Safety: Returns a new reference.
        unsafe { Self::from_raw_full(glib, (glib.g_time_zone_new_local)()) }.ok_or(
            Error::NullReturn {
                symbol: "g_time_zone_new_local",
            },
        )
    }

    /// Constructs the time zone named by `identifier`, e.g. `"Europe/Berlin"` or `"+02:00"`.
    ///
    /// Returns `None` if the identifier can not be parsed or loaded. Versions of GLib that
    /// predate the checked constructor silently fall back to UTC instead.
    pub fn from_identifier(identifier: &str) -> Result<Option<Self>> {
        let glib = Glib::get()?;
        let identifier = TransientStr::new(identifier)?;
        let ptr = match glib.g_time_zone_new_identifier {
            // Safety: The identifier is a nul-terminated string.
            Some(new_identifier) => unsafe { new_identifier(identifier.as_ptr()) },
            None => {
                tracing::debug!("falling back to the unchecked time zone constructor");
                // Safety: See above.
                unsafe { (glib.g_time_zone_new)(identifier.as_ptr()) }
            }
        };
        // Safety: Returns null or a new reference.
        Ok(unsafe { Self::from_raw_full(glib, ptr) })
    }

    /// Constructs a time zone with a fixed offset of `seconds` from UTC.
    pub fn from_offset(seconds: i32) -> Result<Self> {
        let glib = Glib::get()?;
        let new_offset = glib.g_time_zone_new_offset.ok_or(Error::Unsupported {
            symbol: "g_time_zone_new_offset",
        })?;
        // Safety: Returns a new reference.
        unsafe { Self::from_raw_full(glib, new_offset(seconds)) }.ok_or(Error::NullReturn {
            symbol: "g_time_zone_new_offset",
        })
    }

    /// Returns the identifier the time zone was constructed with.
    pub fn identifier(&self) -> Result<String> {
        let get_identifier = self.glib.g_time_zone_get_identifier.ok_or(Error::Unsupported {
            symbol: "g_time_zone_get_identifier",
        })?;
        // Safety: The identifier is owned by the time zone, which is live.
        let identifier = unsafe { string::from_borrowed(get_identifier(self.as_raw())) };
        Ok(identifier.unwrap_or_default())
    }

    /// Finds the interval containing `time`, in seconds since the epoch, interpreted
    /// according to `time_type`.
    ///
    /// Returns `None` if the time does not exist in the time zone, e.g. when skipped by a
    /// daylight saving transition.
    pub fn find_interval(&self, time_type: TimeType, time: i64) -> Option<i32> {
        // Safety: FFI call is safe.
        let interval =
            unsafe { (self.glib.g_time_zone_find_interval)(self.as_raw(), time_type.into(), time) };
        (interval >= 0).then_some(interval)
    }

    /// Returns the abbreviation of the interval, e.g. `"CEST"`.
    pub fn abbreviation(&self, interval: i32) -> Option<String> {
        // Safety: The string is owned by the time zone and copied immediately.
        unsafe {
            string::from_borrowed((self.glib.g_time_zone_get_abbreviation)(self.as_raw(), interval))
        }
    }

    /// Returns the offset of the interval from UTC, in seconds.
    pub fn offset(&self, interval: i32) -> i32 {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_time_zone_get_offset)(self.as_raw(), interval) }
    }

    /// Returns whether daylight saving time is in effect during the interval.
    pub fn is_dst(&self, interval: i32) -> bool {
        // Safety: FFI call is safe.
        unsafe { (self.glib.g_time_zone_is_dst)(self.as_raw(), interval) }.get()
    }
}
