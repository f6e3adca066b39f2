//! Windows FILETIME decoding and rendering.
//!
//! NTFS and ReFS both stamp metadata with 100-nanosecond ticks counted from
//! 1601-01-01 UTC. Rendering is done in a caller-selected fixed UTC offset;
//! the CLIs default to +9 hours.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

const TICKS_PER_SECOND: u64 = 10_000_000;

/// A raw FILETIME value: 100 ns ticks since 1601-01-01 00:00:00 UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Filetime(pub u64);

fn filetime_epoch() -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(1601, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("1601-01-01T00:00:00 is a valid datetime");
    Utc.from_utc_datetime(&date)
}

impl Filetime {
    /// Parses a hexadecimal tick count, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits = text.trim().trim_start_matches("0x").trim_start_matches("0X");
        u64::from_str_radix(digits, 16)
            .map(Filetime)
            .map_err(|_| CoreError::Format {
                offset: 0,
                reason: format!("'{text}' is not a hexadecimal FILETIME"),
            })
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        let secs = (self.0 / TICKS_PER_SECOND) as i64;
        let nanos = (self.0 % TICKS_PER_SECOND) as i64 * 100;
        filetime_epoch() + Duration::seconds(secs) + Duration::nanoseconds(nanos)
    }

    pub fn from_datetime(t: DateTime<Utc>) -> Self {
        let delta = t - filetime_epoch();
        let secs = delta.num_seconds();
        let sub = delta - Duration::seconds(secs);
        let sub_nanos = sub.num_nanoseconds().unwrap_or(0);
        Filetime(secs as u64 * TICKS_PER_SECOND + sub_nanos as u64 / 100)
    }

    /// Renders as `YYYY-MM-DD HH:MM` shifted into `offset`.
    pub fn render(self, offset: FixedOffset) -> String {
        self.to_datetime()
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }
}

impl std::fmt::Display for Filetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Builds a whole-hour display offset, e.g. `9` for UTC+9.
pub fn utc_offset_hours(hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| CoreError::Format {
        offset: 0,
        reason: format!("{hours} is not a valid UTC offset in hours"),
    })
}
