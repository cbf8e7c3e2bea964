//! Administration service: loads state from SQLite, runs the pure gate and
//! persists the outcome.
//!
//! Every write path reads and writes inside one `IMMEDIATE` transaction, so
//! two callers recording against the same medication cannot both pass the
//! gate on a stale view of history or stock.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::administration::{self, Administration, AdministrationError, BlockedReason};
use crate::db::{self, DatabaseError};
use crate::eligibility::{self, Eligibility};
use crate::forecast::{forecast_supply, SupplyForecast};
use crate::models::{DoseEvent, Medication, MedicationStock, Regimen, ValidationError};
use crate::schedule::{build_day_plan, DayPlanEntry, RegimenSnapshot};
use crate::validation::{validate_dose_record, DoseValidationError};

// ═══════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{}", .0.message())]
    Blocked(BlockedReason),

    #[error("Invalid dose: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    DoseRejected(#[from] DoseValidationError),
}

impl From<AdministrationError> for ServiceError {
    fn from(e: AdministrationError) -> Self {
        match e {
            AdministrationError::Blocked(reason) => ServiceError::Blocked(reason),
        }
    }
}

/// Everything the presentation layer shows next to one regimen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimenStatus {
    pub regimen_id: Uuid,
    pub eligibility: Eligibility,
    pub can_administer: bool,
    pub blocked_reason: Option<BlockedReason>,
    pub stock: MedicationStock,
}

// ═══════════════════════════════════════════
// Recording
// ═══════════════════════════════════════════

/// Record a dose taken now, if the gate allows it.
///
/// On success the dose is stored and `units_per_dose` units are drawn from
/// the medication's stock. A refusal stores nothing.
pub fn administer_dose<Tz: TimeZone>(
    conn: &Connection,
    regimen_id: &Uuid,
    amount: Option<f64>,
    now: &DateTime<Tz>,
) -> Result<Administration, ServiceError> {
    if let Some(value) = amount {
        if value.is_nan() || value <= 0.0 {
            return Err(ValidationError::InvalidAmount(value).into());
        }
    }

    let tx = db::begin_immediate(conn)?;
    let regimen = db::get_regimen(&tx, regimen_id)?;
    let history = db::get_dose_history(&tx, regimen_id)?;
    let medication = db::get_medication(&tx, &regimen.medication_id)?;

    let administration = match administration::administer(&regimen, &history, &medication.stock, amount, now) {
        Ok(administration) => administration,
        Err(AdministrationError::Blocked(reason)) => {
            tracing::warn!(regimen_id = %regimen_id, reason = reason.as_str(), "dose refused");
            return Err(ServiceError::Blocked(reason));
        }
    };

    db::write_dose(&tx, &administration.dose, &medication.id, regimen.units_per_dose)?;
    tx.commit()?;

    tracing::info!(
        regimen_id = %regimen_id,
        dose_id = %administration.dose.id,
        supply = ?administration.stock.current_supply,
        "dose recorded"
    );
    Ok(administration)
}

/// Record a dose taken earlier (or correct the time of one).
///
/// Checked against the history around `taken_at` rather than the live gate.
/// Stock is drawn the same way as for a live administration.
pub fn record_past_dose<Tz: TimeZone>(
    conn: &Connection,
    regimen_id: &Uuid,
    taken_at: DateTime<Utc>,
    amount: Option<f64>,
    now: &DateTime<Tz>,
) -> Result<DoseEvent, ServiceError> {
    let event = DoseEvent::record(*regimen_id, taken_at, amount, now.with_timezone(&Utc))?;

    let tx = db::begin_immediate(conn)?;
    let regimen = db::get_regimen(&tx, regimen_id)?;
    let history = db::get_dose_history(&tx, regimen_id)?;

    if let Err(e) = validate_dose_record(&regimen, &history, &event, now) {
        tracing::warn!(regimen_id = %regimen_id, error = %e, "past dose rejected");
        return Err(e.into());
    }

    let event = DoseEvent {
        amount: event.amount.or(regimen.dose_amount),
        ..event
    };
    db::write_dose(&tx, &event, &regimen.medication_id, regimen.units_per_dose)?;
    tx.commit()?;

    tracing::info!(regimen_id = %regimen_id, dose_id = %event.id, "past dose recorded");
    Ok(event)
}

// ═══════════════════════════════════════════
// Queries
// ═══════════════════════════════════════════

pub fn regimen_status<Tz: TimeZone>(
    conn: &Connection,
    regimen_id: &Uuid,
    now: &DateTime<Tz>,
) -> Result<RegimenStatus, ServiceError> {
    let regimen = db::get_regimen(conn, regimen_id)?;
    let history = db::get_dose_history(conn, regimen_id)?;
    let medication = db::get_medication(conn, &regimen.medication_id)?;
    let stock = medication.stock;

    Ok(RegimenStatus {
        regimen_id: regimen.id,
        eligibility: eligibility::evaluate(&regimen, &history, now),
        can_administer: administration::can_administer(&regimen, &history, &stock, now),
        blocked_reason: administration::administration_blocked_reason(&regimen, &history, &stock, now),
        stock,
    })
}

pub fn forecast_for_medication<Tz: TimeZone>(
    conn: &Connection,
    medication_id: &Uuid,
    now: &DateTime<Tz>,
) -> Result<SupplyForecast, ServiceError> {
    let medication = db::get_medication(conn, medication_id)?;
    let regimens = db::get_regimens_for_medication(conn, medication_id)?;
    Ok(forecast_supply(&medication, &regimens, now))
}

/// Today's plan across every regimen of the given people.
pub fn day_plan_for_people<Tz: TimeZone>(
    conn: &Connection,
    person_ids: &[Uuid],
    now: &DateTime<Tz>,
) -> Result<Vec<DayPlanEntry>, ServiceError> {
    let mut regimens: Vec<Regimen> = Vec::new();
    for person_id in person_ids {
        regimens.extend(db::get_regimens_for_person(conn, person_id)?);
    }

    let mut histories: Vec<Vec<DoseEvent>> = Vec::with_capacity(regimens.len());
    let mut medications: HashMap<Uuid, Medication> = HashMap::new();
    for regimen in &regimens {
        histories.push(db::get_dose_history(conn, &regimen.id)?);
        if !medications.contains_key(&regimen.medication_id) {
            let medication = db::get_medication(conn, &regimen.medication_id)?;
            medications.insert(medication.id, medication);
        }
    }

    let mut snapshots = Vec::with_capacity(regimens.len());
    for (regimen, history) in regimens.iter().zip(&histories) {
        if let Some(medication) = medications.get(&regimen.medication_id) {
            snapshots.push(RegimenSnapshot {
                regimen,
                history,
                stock: &medication.stock,
            });
        }
    }

    Ok(build_day_plan(&snapshots, now))
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
