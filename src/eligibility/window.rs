use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::{CyclePeriod, DoseEvent};

/// Half-open calendar interval `[start, end)` bounding the dose-count cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CycleWindow {
    /// The day, week (Monday-based) or month containing `instant`, in the
    /// timezone `instant` carries.
    pub fn containing<Tz: TimeZone>(period: CyclePeriod, instant: &DateTime<Tz>) -> Self {
        let tz = instant.timezone();
        let (first, next) = period_bounds(period, instant.date_naive());
        Self {
            start: local_midnight(&tz, first),
            end: local_midnight(&tz, next),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Number of events whose `taken_at` falls inside the window.
    pub fn count(&self, history: &[DoseEvent]) -> u32 {
        history
            .iter()
            .filter(|event| self.contains(event.taken_at))
            .count() as u32
    }
}

fn period_bounds(period: CyclePeriod, date: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        CyclePeriod::Daily => (date, date.succ_opt().unwrap_or(NaiveDate::MAX)),
        CyclePeriod::Weekly => {
            let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
            let first = date.checked_sub_days(back).unwrap_or(NaiveDate::MIN);
            let next = first.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX);
            (first, next)
        }
        CyclePeriod::Monthly => {
            let first = date.with_day(1).unwrap_or(date);
            let next = first
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX);
            (first, next)
        }
    }
}

/// First instant of `date` in `tz`, as UTC.
///
/// A DST gap can swallow local midnight; the day then starts at the first
/// valid local time after it (searched in 15-minute steps).
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=96i64)
        .filter_map(|step| midnight.checked_add_signed(Duration::minutes(15 * step)))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|instant| instant.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}
