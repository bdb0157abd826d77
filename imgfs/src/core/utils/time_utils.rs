// SPDX-License-Identifier: MIT

//! Timestamps written into directory entries.
//!
//! Images must be reproducible, so every entry is stamped with the FAT epoch
//! instead of the wall clock.

use time::{OffsetDateTime, macros::datetime};

/// 1980-01-01 00:00:00 UTC, the earliest instant FAT can encode.
pub const FAT_EPOCH: OffsetDateTime = datetime!(1980-01-01 0:00 UTC);

/// Timestamp used for every entry this crate writes.
#[inline]
pub fn fixed_timestamp() -> OffsetDateTime {
    FAT_EPOCH
}

/// Encodes `ts` as FAT `(date, time, tenths)`.
///
/// Years outside 1980..=2107 are clamped; seconds are stored with 2 s
/// granularity, the odd second going into the tenths field.
pub fn fat_datetime(ts: OffsetDateTime) -> (u16, u16, u8) {
    let (year, month, day, hour, minute, second, millis) = if ts < FAT_EPOCH {
        (1980, 1, 1, 0, 0, 0, 0)
    } else if ts.year() > 2107 {
        (2107, 12, 31, 23, 59, 58, 0)
    } else {
        (
            ts.year(),
            ts.month() as u16,
            ts.day() as u16,
            ts.hour() as u16,
            ts.minute() as u16,
            ts.second() as u16,
            ts.millisecond(),
        )
    };

    let date = (((year - 1980) as u16) << 9) | (month << 5) | day;
    let time = (hour << 11) | (minute << 5) | (second / 2);
    let tenths = ((second % 2) * 100 + millis / 10) as u8;
    (date, time, tenths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_encodes_to_first_day() {
        assert_eq!(fat_datetime(FAT_EPOCH), (0x0021, 0, 0));
        assert_eq!(fat_datetime(fixed_timestamp()), (0x0021, 0, 0));
    }

    #[test]
    fn odd_seconds_use_tenths() {
        let ts = datetime!(2024-06-15 13:45:31.250 UTC);
        let (date, time, tenths) = fat_datetime(ts);
        assert_eq!(date, ((2024 - 1980) << 9) | (6 << 5) | 15);
        assert_eq!(time, (13 << 11) | (45 << 5) | 15);
        assert_eq!(tenths, 125);
    }

    #[test]
    fn out_of_range_years_clamp() {
        assert_eq!(fat_datetime(OffsetDateTime::UNIX_EPOCH), (0x0021, 0, 0));
        let (date, _, _) = fat_datetime(datetime!(2200-01-01 0:00 UTC));
        assert_eq!(date >> 9, 127);
    }
}
