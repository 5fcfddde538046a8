use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use time::OffsetDateTime;

pub fn millis_to_utc(ms: i64) -> OffsetDateTime {
    let nanos = i128::from(ms).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn offset_to_millis(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn chrono_to_offset(value: DateTime<Utc>) -> OffsetDateTime {
    millis_to_utc(value.timestamp_millis())
}

pub fn offset_to_chrono(value: OffsetDateTime) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(offset_to_millis(value))
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Activity timestamps carry no zone; they are stored as if they were UTC.
pub fn naive_to_offset(value: NaiveDateTime) -> OffsetDateTime {
    millis_to_utc(Utc.from_utc_datetime(&value).timestamp_millis())
}

pub fn offset_to_naive(value: OffsetDateTime) -> NaiveDateTime {
    offset_to_chrono(value).naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_keep_millisecond_precision() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 9, 30, 15).single().expect("time")
            + chrono::Duration::milliseconds(250);
        assert_eq!(offset_to_chrono(chrono_to_offset(now)), now);

        let naive = now.naive_utc();
        assert_eq!(offset_to_naive(naive_to_offset(naive)), naive);
        assert_eq!(offset_to_millis(millis_to_utc(1_741_080_615_250)), 1_741_080_615_250);
    }
}
