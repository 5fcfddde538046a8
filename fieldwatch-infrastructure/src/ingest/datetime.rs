use chrono::{DateTime, NaiveDate, NaiveDateTime};

const PREFERRED_FORMATS: [&str; 8] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const FREEFORM_FORMATS: [&str; 12] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d",
];

const DATE_COLUMN_MARKERS: [&str; 7] = [
    "data", "ora", "inizio", "fine", "iniziata", "conclusa", "timestamp",
];

pub fn is_date_column(column: &str) -> bool {
    let lower = column.to_lowercase();
    DATE_COLUMN_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Ordered format list first, then free-form shapes. `None` keeps the value as text.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_with(value, &PREFERRED_FORMATS).or_else(|| parse_freeform(value))
}

fn parse_with(value: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format).ok().or_else(|| {
            NaiveDate::parse_from_str(value, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
    })
}

fn parse_freeform(value: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    parse_with(value, &FREEFORM_FORMATS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn day_first_wins_over_month_first() {
        let parsed = parse_datetime("04/03/2025 09:30").expect("parse");
        assert_eq!((parsed.day(), parsed.month()), (4, 3));
        assert_eq!((parsed.hour(), parsed.minute()), (9, 30));
    }

    #[test]
    fn month_first_used_when_day_first_impossible() {
        let parsed = parse_datetime("03/25/2025 14:00").expect("parse");
        assert_eq!((parsed.month(), parsed.day()), (3, 25));
    }

    #[test]
    fn date_only_becomes_midnight() {
        let parsed = parse_datetime("2025-03-04").expect("parse");
        assert_eq!((parsed.hour(), parsed.minute()), (0, 0));
    }

    #[test]
    fn freeform_shapes() {
        assert!(parse_datetime("2025-03-04T09:15:00Z").is_some());
        assert!(parse_datetime("2025-03-04T09:15:00").is_some());
        assert!(parse_datetime("04.03.2025 09:15").is_some());
        assert!(parse_datetime("04-03-2025").is_some());
        assert!(parse_datetime("domani").is_none());
    }

    #[test]
    fn date_columns_by_name() {
        assert!(is_date_column("Iniziata il"));
        assert!(is_date_column("ora_presa"));
        assert!(is_date_column("data_inizio"));
        assert!(!is_date_column("Durata"));
        assert!(!is_date_column("Creato da"));
    }
}
