//! Exchange calendar helpers
//!
//! Shanghai and Shenzhen trade on China Standard Time (UTC+08:00, no DST).
//! A bar belongs to the trading day of its exchange-local date.

use crate::values::{Timestamp, TradingDay};
use chrono::{Duration, NaiveTime};

/// Offset of exchange local time from UTC, in hours
pub const EXCHANGE_UTC_OFFSET_HOURS: i64 = 8;

/// Trading day a UTC timestamp falls on
pub fn trading_day(ts: Timestamp) -> TradingDay {
    (ts + Duration::hours(EXCHANGE_UTC_OFFSET_HOURS)).date_naive()
}

/// UTC instant of exchange-local midnight opening `day`
pub fn day_start(day: TradingDay) -> Timestamp {
    day.and_time(NaiveTime::default()).and_utc() - Duration::hours(EXCHANGE_UTC_OFFSET_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_trading_day_uses_exchange_offset() {
        // 2024-03-04 17:00 UTC is already 01:00 on the 5th in Shanghai
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 17, 0, 0).unwrap();
        assert_eq!(trading_day(ts), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());

        let morning = Utc.with_ymd_and_hms(2024, 3, 4, 1, 30, 0).unwrap();
        assert_eq!(trading_day(morning), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn test_day_start_round_trips() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let start = day_start(day);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 3, 16, 0, 0).unwrap());
        assert_eq!(trading_day(start), day);
        assert_eq!(trading_day(start - Duration::seconds(1)), day.pred_opt().unwrap());
    }
}
