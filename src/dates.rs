use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

const DATE_KEY: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn date_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn full_date(date: Date) -> String {
    format!("{} {}, {}", date.month(), date.day(), date.year())
}

pub fn midnight_iso(date: Date) -> String {
    format!("{}T00:00:00Z", date_key(date))
}

// Any time-of-day after the day is dropped.
pub fn parse_date(input: &str) -> Result<Date, time::error::Parse> {
    let input = input.trim();
    let day = match input.as_bytes().get(10) {
        Some(b'T') | Some(b' ') => &input[..10],
        _ => input,
    };
    Date::parse(day, DATE_KEY)
}

pub fn add_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(Duration::days(days))
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

pub mod serde_date {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::date_key(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(D::Error::custom)
    }
}

pub mod serde_date_option {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&super::date_key(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_date(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_date_key_and_full_date() {
        assert_eq!(date_key(date!(2026 - 01 - 04)), "2026-01-04");
        assert_eq!(full_date(date!(2026 - 01 - 04)), "January 4, 2026");
        assert_eq!(midnight_iso(date!(2026 - 12 - 31)), "2026-12-31T00:00:00Z");
    }

    #[test]
    fn test_parse_date_drops_time_of_day() {
        assert_eq!(parse_date("2026-01-04").unwrap(), date!(2026 - 01 - 04));
        assert_eq!(
            parse_date("2026-01-04T23:59:59.000Z").unwrap(),
            date!(2026 - 01 - 04)
        );
        assert_eq!(parse_date("2026-01-04 08:00").unwrap(), date!(2026 - 01 - 04));
        assert!(parse_date("2026-13-01").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("January 4").is_err());
    }

    #[test]
    fn test_add_days_crosses_month_and_year() {
        assert_eq!(add_days(date!(2026 - 01 - 31), 1), Some(date!(2026 - 02 - 01)));
        assert_eq!(add_days(date!(2026 - 12 - 31), 1), Some(date!(2027 - 01 - 01)));
        assert_eq!(add_days(date!(2028 - 02 - 28), 1), Some(date!(2028 - 02 - 29)));
        assert_eq!(add_days(Date::MAX, 1), None);
    }
}
