use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal for precision (CNY, two decimal tick)
pub type Price = Decimal;

/// Quantity value - whole shares held in a Decimal
pub type Quantity = Decimal;

/// Money value (cash, fees, PnL) in CNY
pub type Money = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Symbol identifier for a listed A-share (e.g. `SH600519`, `SZ300750`)
pub type Symbol = String;

/// Identifier of one running strategy instance
pub type InstanceId = String;

/// Exchange-local calendar date of a session
pub type TradingDay = NaiveDate;
