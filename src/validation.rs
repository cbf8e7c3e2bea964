//! Validation of doses recorded after the fact (backdated or edited).
//!
//! Unlike the live gate this checks a candidate at its own `taken_at`
//! against the rest of the history, in both directions for spacing.

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::eligibility::{hours_to_duration, CycleWindow};
use crate::models::{CyclePeriod, DoseEvent, Regimen};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DoseValidationError {
    #[error("taken_at cannot be in the future")]
    FutureDose,

    #[error("Maximum of {max} doses per {} allowed", .cycle.noun())]
    MaxDosesExceeded { max: u32, cycle: CyclePeriod },

    #[error("Must wait at least {hours} hours between doses")]
    MinimumSpacing { hours: f64 },
}

/// Check `candidate` against the regimen's constraints and the other events
/// in `history`. The candidate itself may appear in `history` (an edit);
/// events with its id are ignored.
///
/// The cycle window is the calendar window containing `candidate.taken_at`
/// in `now`'s timezone.
pub fn validate_dose_record<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    candidate: &DoseEvent,
    now: &DateTime<Tz>,
) -> Result<(), DoseValidationError> {
    if candidate.taken_at > now.with_timezone(&Utc) {
        return Err(DoseValidationError::FutureDose);
    }

    let others: Vec<&DoseEvent> = history.iter().filter(|event| event.id != candidate.id).collect();

    if let Some(max) = regimen.max_doses_per_cycle {
        let taken_local = candidate.taken_at.with_timezone(&now.timezone());
        let window = CycleWindow::containing(regimen.cycle_period, &taken_local);
        let existing = others
            .iter()
            .filter(|event| window.contains(event.taken_at))
            .count() as u32;
        if existing >= max {
            return Err(DoseValidationError::MaxDosesExceeded {
                max,
                cycle: regimen.cycle_period,
            });
        }
    }

    if let Some(hours) = regimen.min_hours_between_doses {
        let gap = hours_to_duration(hours);
        let previous = others
            .iter()
            .filter(|event| event.taken_at <= candidate.taken_at)
            .map(|event| event.taken_at)
            .max();
        let following = others
            .iter()
            .filter(|event| event.taken_at > candidate.taken_at)
            .map(|event| event.taken_at)
            .min();

        let too_soon_after = previous.is_some_and(|at| candidate.taken_at - at < gap);
        let too_close_before = following.is_some_and(|at| at - candidate.taken_at < gap);
        if too_soon_after || too_close_before {
            return Err(DoseValidationError::MinimumSpacing { hours });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use uuid::Uuid;

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, d, h, 0, 0).unwrap()
    }

    fn regimen() -> Regimen {
        Regimen::prescribed(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
    }

    fn dose(regimen: &Regimen, taken_at: DateTime<Utc>) -> DoseEvent {
        DoseEvent {
            id: Uuid::new_v4(),
            regimen_id: regimen.id,
            taken_at,
            amount: Some(5.0),
        }
    }

    #[test]
    fn rejects_future_dose() {
        let regimen = regimen();
        let candidate = dose(&regimen, utc(6, 13));
        assert_eq!(
            validate_dose_record(&regimen, &[], &candidate, &utc(6, 12)),
            Err(DoseValidationError::FutureDose)
        );
    }

    #[test]
    fn unconstrained_accepts_anything_in_past() {
        let regimen = regimen();
        let history = vec![dose(&regimen, utc(6, 8))];
        let candidate = dose(&regimen, utc(6, 8));
        assert!(validate_dose_record(&regimen, &history, &candidate, &utc(6, 12)).is_ok());
    }

    #[test]
    fn backdated_dose_counts_against_its_own_day() {
        let regimen = regimen().with_max_doses(2);
        let history = vec![dose(&regimen, utc(5, 8)), dose(&regimen, utc(5, 20))];
        let candidate = dose(&regimen, utc(5, 14));

        let err = validate_dose_record(&regimen, &history, &candidate, &utc(6, 12)).unwrap_err();
        assert_eq!(err.to_string(), "Maximum of 2 doses per day allowed");

        // Same time of day, but on a day with no other doses
        let next_day = dose(&regimen, utc(6, 10));
        assert!(validate_dose_record(&regimen, &history, &next_day, &utc(6, 12)).is_ok());
    }

    #[test]
    fn weekly_cap_message_names_week() {
        let regimen = regimen().with_max_doses(1).with_cycle(CyclePeriod::Weekly);
        let history = vec![dose(&regimen, utc(4, 8))];
        let candidate = dose(&regimen, utc(7, 8));
        let err = validate_dose_record(&regimen, &history, &candidate, &utc(7, 12)).unwrap_err();
        assert_eq!(err.to_string(), "Maximum of 1 doses per week allowed");
    }

    #[test]
    fn editing_a_dose_ignores_itself() {
        let regimen = regimen().with_max_doses(1).with_min_hours(4.0);
        let mut existing = dose(&regimen, utc(6, 8));
        let history = vec![existing.clone()];
        existing.taken_at = utc(6, 9);
        assert!(validate_dose_record(&regimen, &history, &existing, &utc(6, 12)).is_ok());
    }

    #[test]
    fn spacing_checked_against_previous_dose() {
        let regimen = regimen().with_min_hours(4.0);
        let history = vec![dose(&regimen, utc(6, 8))];
        let candidate = dose(&regimen, utc(6, 8) + Duration::minutes(239));
        let err = validate_dose_record(&regimen, &history, &candidate, &utc(6, 20)).unwrap_err();
        assert_eq!(err, DoseValidationError::MinimumSpacing { hours: 4.0 });
        assert_eq!(err.to_string(), "Must wait at least 4 hours between doses");

        let ok = dose(&regimen, utc(6, 12));
        assert!(validate_dose_record(&regimen, &history, &ok, &utc(6, 20)).is_ok());
    }

    #[test]
    fn spacing_checked_against_following_dose() {
        let regimen = regimen().with_min_hours(4.0);
        let history = vec![dose(&regimen, utc(6, 12))];
        let candidate = dose(&regimen, utc(6, 10));
        assert_eq!(
            validate_dose_record(&regimen, &history, &candidate, &utc(6, 20)),
            Err(DoseValidationError::MinimumSpacing { hours: 4.0 })
        );
    }

    #[test]
    fn simultaneous_dose_violates_spacing() {
        let regimen = regimen().with_min_hours(1.0);
        let history = vec![dose(&regimen, utc(6, 8))];
        let candidate = dose(&regimen, utc(6, 8));
        assert!(validate_dose_record(&regimen, &history, &candidate, &utc(6, 9)).is_err());
    }
}
