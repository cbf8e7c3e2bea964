//! Repository layer — entity-scoped database operations.
//!
//! Ids and dates are stored as text. Dose timestamps use a fixed-width
//! RFC 3339 UTC form so that ordering by the column is ordering in time.

mod dose_event;
mod medication;
mod regimen;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use dose_event::*;
pub use medication::*;
pub use regimen::*;

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidValue {
            field: field.into(),
            value: value.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_text_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2026, 5, 6, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::nanoseconds(1);
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
        assert_eq!(format_timestamp(&earlier), "2026-05-06T09:00:00.000000000Z");
    }

    #[test]
    fn timestamp_round_trips_through_text() {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(parse_timestamp("taken_at", &format_timestamp(&at)).unwrap(), at);
    }

    #[test]
    fn malformed_values_name_the_field() {
        let err = parse_uuid("regimen_id", "not-a-uuid").unwrap_err();
        assert!(err.to_string().contains("regimen_id"));
        assert!(parse_date("start_date", "2026-13-01").is_err());
        assert!(parse_timestamp("taken_at", "yesterday").is_err());
    }
}
