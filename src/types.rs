//! Core types shared by the content tree, codecs, and emission.

use filetime::FileTime;
use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp: milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Convert a filesystem time to a millisecond [`Timestamp`]
pub fn timestamp_from_system_time(time: SystemTime) -> Timestamp {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_millis() as Timestamp,
        Err(before) => -(before.duration().as_millis() as Timestamp),
    }
}

/// Convert a millisecond [`Timestamp`] to a [`FileTime`] for setting mtimes
pub fn file_time_from_timestamp(ts: Timestamp) -> FileTime {
    let secs = ts.div_euclid(1000);
    let nanos = (ts.rem_euclid(1000) * 1_000_000) as u32;
    FileTime::from_unix_time(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_time_conversion() {
        let t = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(timestamp_from_system_time(t), 1_700_000_000_123);
        let t = UNIX_EPOCH - Duration::from_millis(1500);
        assert_eq!(timestamp_from_system_time(t), -1500);
    }

    #[test]
    fn test_file_time_conversion() {
        let ft = file_time_from_timestamp(1_700_000_000_123);
        assert_eq!(ft.unix_seconds(), 1_700_000_000);
        assert_eq!(ft.nanoseconds(), 123_000_000);

        let ft = file_time_from_timestamp(-1);
        assert_eq!(ft.unix_seconds(), -1);
        assert_eq!(ft.nanoseconds(), 999_000_000);
    }
}
