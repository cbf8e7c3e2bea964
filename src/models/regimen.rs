use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CyclePeriod, RegimenSource};
use crate::config::MAX_SPACING_HOURS;
use super::ValidationError;

/// Calendar dates between which a regimen may be followed.
/// `end` is inclusive; `None` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl ActiveWindow {
    pub fn open_from(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && self.end.map_or(true, |end| date <= end)
    }

    /// True once the last day of the window has passed.
    pub fn has_ended(&self, date: NaiveDate) -> bool {
        self.end.is_some_and(|end| date > end)
    }
}

/// Dosing contract for one recipient/medication pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regimen {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub person_id: Uuid,
    pub source: RegimenSource,
    pub max_doses_per_cycle: Option<u32>,
    pub min_hours_between_doses: Option<f64>,
    pub cycle_period: CyclePeriod,
    pub active_window: ActiveWindow,
    pub active: bool,
    /// Stock units one administration draws.
    pub units_per_dose: u32,
    /// Planned quantity per administration (e.g. ml), the default dose amount.
    pub dose_amount: Option<f64>,
}

impl Regimen {
    /// Prescription-style regimen with a configurable cycle.
    pub fn prescribed(medication_id: Uuid, person_id: Uuid, start: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            medication_id,
            person_id,
            source: RegimenSource::Prescription,
            max_doses_per_cycle: None,
            min_hours_between_doses: None,
            cycle_period: CyclePeriod::Daily,
            active_window: ActiveWindow::open_from(start),
            active: true,
            units_per_dose: 1,
            dose_amount: None,
        }
    }

    /// Non-prescription pairing (vitamins, OTC). Always cycles daily.
    pub fn as_needed(medication_id: Uuid, person_id: Uuid, start: NaiveDate) -> Self {
        Self {
            source: RegimenSource::PersonMedicine,
            ..Self::prescribed(medication_id, person_id, start)
        }
    }

    pub fn with_max_doses(mut self, max: u32) -> Self {
        self.max_doses_per_cycle = Some(max);
        self
    }

    pub fn with_min_hours(mut self, hours: f64) -> Self {
        self.min_hours_between_doses = Some(hours);
        self
    }

    /// Ignored for non-prescription sources, which stay daily.
    pub fn with_cycle(mut self, cycle: CyclePeriod) -> Self {
        if self.source.is_prescribed() {
            self.cycle_period = cycle;
        }
        self
    }

    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.active_window.end = Some(end);
        self
    }

    pub fn with_units_per_dose(mut self, units: u32) -> Self {
        self.units_per_dose = units;
        self
    }

    pub fn with_dose_amount(mut self, amount: f64) -> Self {
        self.dose_amount = Some(amount);
        self
    }

    /// True when at least one timing constraint is configured.
    pub fn has_timing_restrictions(&self) -> bool {
        self.max_doses_per_cycle.is_some() || self.min_hours_between_doses.is_some()
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active && self.active_window.contains(date)
    }

    /// Retired regimens never become eligible again.
    pub fn is_retired_on(&self, date: NaiveDate) -> bool {
        !self.active || self.active_window.has_ended(date)
    }

    /// Construction-time checks owned by the data layer.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(hours) = self.min_hours_between_doses {
            if !hours.is_finite() || hours < 0.0 {
                return Err(ValidationError::InvalidSpacing(hours));
            }
            if hours > MAX_SPACING_HOURS {
                return Err(ValidationError::SpacingTooLarge {
                    hours,
                    max: MAX_SPACING_HOURS,
                });
            }
        }
        if let Some(end) = self.active_window.end {
            if end < self.active_window.start {
                return Err(ValidationError::InvalidActiveWindow {
                    start: self.active_window.start,
                    end,
                });
            }
        }
        if self.units_per_dose == 0 {
            return Err(ValidationError::ZeroUnitsPerDose);
        }
        if let Some(amount) = self.dose_amount {
            if amount.is_nan() || amount <= 0.0 {
                return Err(ValidationError::InvalidAmount(amount));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base() -> Regimen {
        Regimen::prescribed(Uuid::new_v4(), Uuid::new_v4(), date(2026, 3, 1))
    }

    #[test]
    fn no_constraints_means_no_timing_restrictions() {
        assert!(!base().has_timing_restrictions());
        assert!(base().with_max_doses(2).has_timing_restrictions());
        assert!(base().with_min_hours(4.0).has_timing_restrictions());
    }

    #[test]
    fn active_window_end_is_inclusive() {
        let regimen = base().with_end(date(2026, 3, 10));
        assert!(!regimen.is_active_on(date(2026, 2, 28)));
        assert!(regimen.is_active_on(date(2026, 3, 1)));
        assert!(regimen.is_active_on(date(2026, 3, 10)));
        assert!(!regimen.is_active_on(date(2026, 3, 11)));
        assert!(regimen.is_retired_on(date(2026, 3, 11)));
        assert!(!regimen.is_retired_on(date(2026, 2, 28)));
    }

    #[test]
    fn inactive_flag_retires_regimen() {
        let mut regimen = base();
        regimen.active = false;
        assert!(!regimen.is_active_on(date(2026, 3, 5)));
        assert!(regimen.is_retired_on(date(2026, 3, 5)));
    }

    #[test]
    fn as_needed_regimen_ignores_cycle_override() {
        let regimen = Regimen::as_needed(Uuid::new_v4(), Uuid::new_v4(), date(2026, 3, 1))
            .with_cycle(CyclePeriod::Weekly);
        assert_eq!(regimen.cycle_period, CyclePeriod::Daily);

        let prescribed = base().with_cycle(CyclePeriod::Monthly);
        assert_eq!(prescribed.cycle_period, CyclePeriod::Monthly);
    }

    #[test]
    fn validate_rejects_negative_spacing() {
        let err = base().with_min_hours(-1.0).validate().unwrap_err();
        assert_eq!(err, ValidationError::InvalidSpacing(-1.0));
        assert!(base().with_min_hours(f64::NAN).validate().is_err());
    }

    #[test]
    fn validate_bounds_spacing() {
        let err = base().with_min_hours(1e10).validate().unwrap_err();
        assert!(matches!(err, ValidationError::SpacingTooLarge { .. }));
        assert!(base().with_min_hours(f64::INFINITY).validate().is_err());
        assert!(base().with_min_hours(MAX_SPACING_HOURS).validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_window() {
        let regimen = base().with_end(date(2026, 2, 1));
        assert!(matches!(
            regimen.validate(),
            Err(ValidationError::InvalidActiveWindow { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_units_and_amount() {
        assert_eq!(
            base().with_units_per_dose(0).validate(),
            Err(ValidationError::ZeroUnitsPerDose)
        );
        assert_eq!(
            base().with_dose_amount(0.0).validate(),
            Err(ValidationError::InvalidAmount(0.0))
        );
    }

    #[test]
    fn validate_accepts_well_formed_regimen() {
        let regimen = base()
            .with_max_doses(4)
            .with_min_hours(6.0)
            .with_dose_amount(5.0)
            .with_end(date(2026, 4, 1));
        assert!(regimen.validate().is_ok());
    }
}
