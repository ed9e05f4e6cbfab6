//! Duration helpers
//!
//! `chrono::Duration` has no serde support, so stored durations go through
//! the `seconds` adapter which writes them as (possibly fractional) seconds.

use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Whole seconds as a duration
pub fn secs(seconds: i64) -> Duration {
    Duration::seconds(seconds)
}

/// Exact number of seconds held by a duration
pub fn to_seconds(duration: Duration) -> Decimal {
    match duration.num_nanoseconds() {
        Some(nanos) => Decimal::from(nanos) / Decimal::from(NANOS_PER_SEC),
        None => Decimal::from(duration.num_seconds()),
    }
}

/// Duration for a decimal amount of seconds, truncated to nanoseconds
///
/// Amounts beyond what `i64` nanoseconds can hold saturate at the bound of
/// their sign.
pub fn from_seconds(seconds: Decimal) -> Duration {
    let bound = if seconds.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    };
    let nanos = seconds
        .checked_mul(Decimal::from(NANOS_PER_SEC))
        .and_then(|nanos| nanos.trunc().to_i64())
        .unwrap_or(bound);
    Duration::nanoseconds(nanos)
}

/// Serde adapter storing a duration as seconds
pub mod seconds {
    use super::{from_seconds, to_seconds};
    use chrono::Duration;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&to_seconds(*duration).normalize(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(from_seconds)
    }
}
