use chrono::NaiveDateTime;

/// Fractional minutes from `from` to `to`; negative when `to` precedes `from`.
pub fn minutes_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 60.0
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 4)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    #[test]
    fn minutes_between_is_signed() {
        assert_eq!(minutes_between(at(12, 0), at(12, 10)), 10.0);
        assert_eq!(minutes_between(at(12, 10), at(12, 0)), -10.0);
    }

    #[test]
    fn minutes_between_keeps_seconds() {
        let from = at(12, 0);
        let to = from + chrono::Duration::seconds(930);
        assert_eq!(minutes_between(from, to), 15.5);
        assert_eq!(minutes_between(to, from), -15.5);
    }

    #[test]
    fn blank_text_becomes_none() {
        assert_eq!(normalize_optional_text(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional_text(Some(" x ".to_string())),
            Some("x".to_string())
        );
    }
}
