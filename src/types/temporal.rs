//! Timestamp and date codecs.
//!
//! PostgreSQL timestamps are stored as microseconds since 2000-01-01 00:00:00 UTC,
//! dates as days since 2000-01-01.

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::protocol::format::{PG_EPOCH_DAYS_FROM_CE, PG_EPOCH_OFFSET_USEC};

/// Microseconds since the PostgreSQL epoch. Sub-microsecond fractions are
/// truncated.
#[inline]
pub fn timestamp_to_pg_usec(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros() - PG_EPOCH_OFFSET_USEC
}

/// Days since 2000-01-01 (negative before it).
#[inline]
pub fn date_to_pg_days(date: &NaiveDate) -> i32 {
    date.num_days_from_ce() - PG_EPOCH_DAYS_FROM_CE
}

/// timestamp: 8 bytes, microseconds since 2000-01-01
pub fn encode_timestamp(buf: &mut BytesMut, ts: &DateTime<Utc>) {
    buf.put_i32(8);
    buf.put_i64(timestamp_to_pg_usec(ts));
}

/// date: 4 bytes, days since 2000-01-01
pub fn encode_date(buf: &mut BytesMut, date: &NaiveDate) {
    buf.put_i32(4);
    buf.put_i32(date_to_pg_days(date));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_epoch_is_zero() {
        assert_eq!(date_to_pg_days(&date(2000, 1, 1)), 0);
        let epoch = DateTime::from_timestamp(946_684_800, 0).unwrap();
        assert_eq!(timestamp_to_pg_usec(&epoch), 0);
    }

    #[test]
    fn test_date_days() {
        assert_eq!(date_to_pg_days(&date(2015, 4, 8)), 5576);
        assert_eq!(date_to_pg_days(&date(1999, 12, 31)), -1);
        // 2024-01-01 = 8766 days since 2000-01-01
        assert_eq!(date_to_pg_days(&date(2024, 1, 1)), 8766);
    }

    #[test]
    fn test_timestamp_usec() {
        // 2013-06-11 15:03:54.62605 UTC
        let ts = DateTime::from_timestamp(1_370_963_034, 626_050_000).unwrap();
        assert_eq!(timestamp_to_pg_usec(&ts), 424_278_234_626_050);
    }

    #[test]
    fn test_timestamp_truncates_nanos() {
        let ts = DateTime::from_timestamp(946_684_800, 1_999).unwrap();
        assert_eq!(timestamp_to_pg_usec(&ts), 1);
    }

    #[test]
    fn test_encode_date_field() {
        let mut buf = BytesMut::new();
        encode_date(&mut buf, &date(2015, 4, 8));
        assert_eq!(&buf[..], &[0, 0, 0, 4, 0, 0, 0x15, 0xC8]);
    }
}
