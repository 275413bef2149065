//! Module containing the [`DateTime`] type.

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Struct representing a BSON datetime: a signed 64-bit count of milliseconds
/// since the Unix epoch.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct DateTime(i64);

impl DateTime {
    /// The latest possible date that can be represented in BSON.
    pub const MAX: Self = Self(i64::MAX);

    /// The earliest possible date that can be represented in BSON.
    pub const MIN: Self = Self(i64::MIN);

    /// Returns a [`DateTime`] which corresponds to the current date and time.
    pub fn now() -> DateTime {
        Self::from_system_time(SystemTime::now())
    }

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds since
    /// January 1, 1970 0:00:00 UTC.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Makes a new [`DateTime`] from a [`SystemTime`], truncating
    /// sub-millisecond precision.
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(UNIX_EPOCH) {
            Ok(d) => Self(d.as_millis().min(i64::MAX as u128) as i64),
            // handle SystemTime from before the Unix epoch
            Err(e) => {
                let millis = e.duration().as_millis().min(i64::MAX as u128) as i64;
                Self(-millis)
            }
        }
    }

    /// Returns the number of non-leap milliseconds since January 1, 1970
    /// 0:00:00 UTC that this [`DateTime`] corresponds to.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// Convert this [`DateTime`] to a [`SystemTime`].
    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            UNIX_EPOCH + Duration::from_millis(self.0 as u64)
        } else {
            UNIX_EPOCH - Duration::from_millis(self.0.unsigned_abs())
        }
    }

    /// Convert this [`DateTime`] to a [`time::OffsetDateTime`], clamping to
    /// the range `time` supports.
    pub fn to_time_0_3(self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp_nanos(self.0 as i128 * 1_000_000)
            .unwrap_or(if self.0 < 0 {
                OffsetDateTime::UNIX_EPOCH
            } else {
                // the largest value `time` can represent
                OffsetDateTime::from_unix_timestamp_nanos(253_402_300_799 * 1_000_000_000).unwrap()
            })
    }

    /// Makes a new [`DateTime`] from a [`time::OffsetDateTime`], truncating
    /// sub-millisecond precision.
    pub fn from_time_0_3(dt: OffsetDateTime) -> Self {
        Self((dt.unix_timestamp_nanos() / 1_000_000) as i64)
    }

    /// Convert this [`DateTime`] to an RFC 3339 formatted string.
    pub fn try_to_rfc3339_string(self) -> Result<String, time::error::Format> {
        self.to_time_0_3().format(&Rfc3339)
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut tup = f.debug_tuple("DateTime");
        match self.try_to_rfc3339_string() {
            Ok(s) => tup.field(&s),
            _ => tup.field(&self.0),
        };
        tup.finish()
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.try_to_rfc3339_string() {
            Ok(s) => write!(f, "{}", s),
            _ => write!(f, "DateTime({})", self.0),
        }
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<DateTime> for SystemTime {
    fn from(dt: DateTime) -> Self {
        dt.to_system_time()
    }
}
