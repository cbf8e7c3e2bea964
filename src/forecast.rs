//! Consumption forecast: how long a medication's stock will last.
//!
//! Demand is the sum of every active regimen's capped dose count,
//! normalised to a per-day rate. Uncapped regimens contribute nothing.

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::{Medication, Regimen};

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Stock projection for one medication, serialised to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplyForecast {
    pub medication_id: uuid::Uuid,
    pub estimated_daily_consumption: f64,
    pub forecast_available: bool,
    pub days_until_low_stock: Option<u32>,
    pub days_until_out_of_stock: Option<u32>,
    pub low_stock_date: Option<NaiveDate>,
    pub out_of_stock_date: Option<NaiveDate>,
    pub low_stock: bool,
    pub out_of_stock: bool,
    pub supply_percentage: u8,
}

// ═══════════════════════════════════════════
// Forecasting
// ═══════════════════════════════════════════

/// Units per day drawn by all regimens of `medication` active on `now`'s date.
pub fn estimated_daily_consumption<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
) -> f64 {
    let today = now.date_naive();
    regimens
        .iter()
        .filter(|regimen| regimen.medication_id == medication.id && regimen.is_active_on(today))
        .map(daily_rate)
        .sum()
}

fn daily_rate(regimen: &Regimen) -> f64 {
    let Some(max) = regimen.max_doses_per_cycle else {
        return 0.0;
    };
    f64::from(max) * f64::from(regimen.units_per_dose) / f64::from(regimen.cycle_period.nominal_days())
}

/// A forecast needs tracked stock and positive demand.
pub fn forecast_available<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
) -> bool {
    medication.stock.is_tracked() && estimated_daily_consumption(medication, regimens, now) > 0.0
}

/// Days until supply reaches zero; a partial last day still counts.
pub fn days_until_out_of_stock<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
) -> Option<u32> {
    days_until(medication, regimens, now, 0)
}

/// Days until supply reaches the reorder threshold.
pub fn days_until_low_stock<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
) -> Option<u32> {
    days_until(medication, regimens, now, medication.stock.reorder_threshold)
}

fn days_until<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
    threshold: u32,
) -> Option<u32> {
    let supply = medication.stock.current_supply?;
    let rate = estimated_daily_consumption(medication, regimens, now);
    if rate <= 0.0 {
        return None;
    }
    if supply <= threshold {
        return Some(0);
    }

    let days = (f64::from(supply - threshold) / rate).ceil();
    // Beyond u32 days there is no meaningful date to report
    u32::try_from(days as u64).ok()
}

/// Calendar date the stock runs out, counted from `now`'s local date.
pub fn out_of_stock_date<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
) -> Option<NaiveDate> {
    days_until_out_of_stock(medication, regimens, now)
        .and_then(|days| now.date_naive().checked_add_days(Days::new(u64::from(days))))
}

/// Calendar date the stock reaches its reorder threshold.
pub fn low_stock_date<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
) -> Option<NaiveDate> {
    days_until_low_stock(medication, regimens, now)
        .and_then(|days| now.date_naive().checked_add_days(Days::new(u64::from(days))))
}

/// Full projection in one pass.
pub fn forecast_supply<Tz: TimeZone>(
    medication: &Medication,
    regimens: &[Regimen],
    now: &DateTime<Tz>,
) -> SupplyForecast {
    let forecast = SupplyForecast {
        medication_id: medication.id,
        estimated_daily_consumption: estimated_daily_consumption(medication, regimens, now),
        forecast_available: forecast_available(medication, regimens, now),
        days_until_low_stock: days_until_low_stock(medication, regimens, now),
        days_until_out_of_stock: days_until_out_of_stock(medication, regimens, now),
        low_stock_date: low_stock_date(medication, regimens, now),
        out_of_stock_date: out_of_stock_date(medication, regimens, now),
        low_stock: medication.stock.low_stock(),
        out_of_stock: medication.stock.out_of_stock(),
        supply_percentage: medication.stock.supply_percentage(),
    };

    tracing::debug!(
        medication_id = %medication.id,
        daily = forecast.estimated_daily_consumption,
        days_until_out = ?forecast.days_until_out_of_stock,
        "supply forecast"
    );

    forecast
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CyclePeriod, MedicationStock};
    use chrono::Utc;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 6, 12, 0, 0).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn medication(supply: Option<u32>, threshold: u32) -> Medication {
        Medication::new(
            "Ibuprofen",
            MedicationStock {
                current_supply: supply,
                reorder_threshold: threshold,
                ..MedicationStock::default()
            },
        )
    }

    fn regimen_for(medication: &Medication) -> Regimen {
        Regimen::prescribed(medication.id, Uuid::new_v4(), date(1, 1))
    }

    #[test]
    fn no_regimens_means_zero_consumption() {
        let med = medication(Some(10), 2);
        assert_eq!(estimated_daily_consumption(&med, &[], &now()), 0.0);
        assert!(!forecast_available(&med, &[], &now()));
        assert_eq!(days_until_out_of_stock(&med, &[], &now()), None);
        assert_eq!(out_of_stock_date(&med, &[], &now()), None);
    }

    #[test]
    fn sums_daily_rates_across_regimens() {
        let med = medication(Some(25), 5);
        let regimens = vec![
            regimen_for(&med).with_max_doses(3),
            regimen_for(&med).with_max_doses(2),
        ];
        assert_eq!(estimated_daily_consumption(&med, &regimens, &now()), 5.0);
        assert_eq!(days_until_low_stock(&med, &regimens, &now()), Some(4));
        assert_eq!(days_until_out_of_stock(&med, &regimens, &now()), Some(5));
        assert_eq!(low_stock_date(&med, &regimens, &now()), Some(date(5, 10)));
        assert_eq!(out_of_stock_date(&med, &regimens, &now()), Some(date(5, 11)));
    }

    #[test]
    fn weekly_and_monthly_normalise_by_nominal_days() {
        let med = medication(Some(100), 0);
        let regimens = vec![
            regimen_for(&med).with_max_doses(7).with_cycle(CyclePeriod::Weekly),
            regimen_for(&med).with_max_doses(30).with_cycle(CyclePeriod::Monthly),
        ];
        assert!((estimated_daily_consumption(&med, &regimens, &now()) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn uncapped_regimen_contributes_nothing() {
        let med = medication(Some(10), 0);
        let regimens = vec![regimen_for(&med).with_min_hours(4.0)];
        assert_eq!(estimated_daily_consumption(&med, &regimens, &now()), 0.0);
        assert!(!forecast_available(&med, &regimens, &now()));
    }

    #[test]
    fn inactive_and_foreign_regimens_are_ignored() {
        let med = medication(Some(10), 0);
        let other = medication(Some(10), 0);
        let mut paused = regimen_for(&med).with_max_doses(4);
        paused.active = false;
        let regimens = vec![
            paused,
            regimen_for(&med).with_max_doses(4).with_end(date(5, 1)),
            regimen_for(&other).with_max_doses(4),
            regimen_for(&med).with_max_doses(1),
        ];
        assert_eq!(estimated_daily_consumption(&med, &regimens, &now()), 1.0);
    }

    #[test]
    fn units_per_dose_scale_demand() {
        let med = medication(Some(12), 0);
        let regimens = vec![regimen_for(&med).with_max_doses(2).with_units_per_dose(3)];
        assert_eq!(estimated_daily_consumption(&med, &regimens, &now()), 6.0);
        assert_eq!(days_until_out_of_stock(&med, &regimens, &now()), Some(2));
    }

    #[test]
    fn untracked_stock_has_no_forecast() {
        let med = medication(None, 5);
        let regimens = vec![regimen_for(&med).with_max_doses(2)];
        assert!(!forecast_available(&med, &regimens, &now()));
        assert_eq!(days_until_low_stock(&med, &regimens, &now()), None);
        assert_eq!(low_stock_date(&med, &regimens, &now()), None);
    }

    #[test]
    fn ceiling_not_floor() {
        let regimens_for = |med: &Medication| vec![regimen_for(med).with_max_doses(4)];

        let exact = medication(Some(20), 0);
        assert_eq!(days_until_out_of_stock(&exact, &regimens_for(&exact), &now()), Some(5));

        let partial = medication(Some(21), 0);
        assert_eq!(days_until_out_of_stock(&partial, &regimens_for(&partial), &now()), Some(6));
    }

    #[test]
    fn horizon_beyond_u32_days_has_no_forecast_date() {
        let med = medication(Some(u32::MAX), 0);
        let regimens = vec![regimen_for(&med).with_max_doses(1).with_cycle(CyclePeriod::Monthly)];
        assert!(forecast_available(&med, &regimens, &now()));
        assert_eq!(days_until_out_of_stock(&med, &regimens, &now()), None);
        assert_eq!(out_of_stock_date(&med, &regimens, &now()), None);

        let big = medication(Some(u32::MAX), 0);
        let daily = vec![regimen_for(&big).with_max_doses(1)];
        assert_eq!(days_until_out_of_stock(&big, &daily, &now()), Some(u32::MAX));
    }

    #[test]
    fn already_at_threshold_is_zero_days() {
        let med = medication(Some(5), 5);
        let regimens = vec![regimen_for(&med).with_max_doses(1)];
        assert_eq!(days_until_low_stock(&med, &regimens, &now()), Some(0));
        assert_eq!(low_stock_date(&med, &regimens, &now()), Some(date(5, 6)));

        let empty = medication(Some(0), 5);
        let regimens = vec![regimen_for(&empty).with_max_doses(1)];
        assert_eq!(days_until_out_of_stock(&empty, &regimens, &now()), Some(0));
    }

    #[test]
    fn forecast_supply_bundles_projection() {
        let mut med = medication(Some(25), 5);
        med.stock.supply_at_last_restock = Some(50);
        let regimens = vec![regimen_for(&med).with_max_doses(5)];
        let forecast = forecast_supply(&med, &regimens, &now());

        assert!(forecast.forecast_available);
        assert_eq!(forecast.days_until_low_stock, Some(4));
        assert_eq!(forecast.days_until_out_of_stock, Some(5));
        assert_eq!(forecast.supply_percentage, 50);
        assert!(!forecast.low_stock);
        assert!(!forecast.out_of_stock);

        let json = serde_json::to_string(&forecast).unwrap();
        assert!(json.contains("\"low_stock_date\":\"2026-05-10\""));
    }
}
