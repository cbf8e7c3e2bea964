use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_date, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

const REGIMEN_COLUMNS: &str = "id, medication_id, person_id, source, max_doses_per_cycle,
    min_hours_between_doses, cycle_period, start_date, end_date, active, units_per_dose, dose_amount";

/// Validates before writing; invalid regimens never reach the table.
pub fn insert_regimen(conn: &Connection, regimen: &Regimen) -> Result<(), DatabaseError> {
    regimen.validate()?;

    conn.execute(
        &format!(
            "INSERT INTO regimens ({REGIMEN_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            regimen.id.to_string(),
            regimen.medication_id.to_string(),
            regimen.person_id.to_string(),
            regimen.source.as_str(),
            regimen.max_doses_per_cycle,
            regimen.min_hours_between_doses,
            regimen.cycle_period.as_str(),
            regimen.active_window.start.to_string(),
            regimen.active_window.end.map(|d| d.to_string()),
            regimen.active as i32,
            regimen.units_per_dose,
            regimen.dose_amount,
        ],
    )?;
    Ok(())
}

pub fn get_regimen(conn: &Connection, regimen_id: &Uuid) -> Result<Regimen, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REGIMEN_COLUMNS} FROM regimens WHERE id = ?1"),
            params![regimen_id.to_string()],
            regimen_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "Regimen".into(),
            id: regimen_id.to_string(),
        })?;

    regimen_from_row(row)
}

/// Every regimen drawing from the medication, paused and ended ones included.
pub fn get_regimens_for_medication(conn: &Connection, med_id: &Uuid) -> Result<Vec<Regimen>, DatabaseError> {
    query_regimens(
        conn,
        &format!("SELECT {REGIMEN_COLUMNS} FROM regimens WHERE medication_id = ?1 ORDER BY start_date"),
        med_id,
    )
}

pub fn get_regimens_for_person(conn: &Connection, person_id: &Uuid) -> Result<Vec<Regimen>, DatabaseError> {
    query_regimens(
        conn,
        &format!("SELECT {REGIMEN_COLUMNS} FROM regimens WHERE person_id = ?1 ORDER BY start_date"),
        person_id,
    )
}

/// Pause or resume a regimen.
pub fn set_regimen_active(conn: &Connection, regimen_id: &Uuid, active: bool) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE regimens SET active = ?2 WHERE id = ?1",
        params![regimen_id.to_string(), active as i32],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Regimen".into(),
            id: regimen_id.to_string(),
        });
    }
    Ok(())
}

fn query_regimens(conn: &Connection, sql: &str, key: &Uuid) -> Result<Vec<Regimen>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![key.to_string()], regimen_row_from_rusqlite)?;

    let mut regimens = Vec::new();
    for row in rows {
        regimens.push(regimen_from_row(row?)?);
    }
    Ok(regimens)
}

struct RegimenRow {
    id: String,
    medication_id: String,
    person_id: String,
    source: String,
    max_doses_per_cycle: Option<u32>,
    min_hours_between_doses: Option<f64>,
    cycle_period: String,
    start_date: String,
    end_date: Option<String>,
    active: i32,
    units_per_dose: u32,
    dose_amount: Option<f64>,
}

fn regimen_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RegimenRow, rusqlite::Error> {
    Ok(RegimenRow {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        person_id: row.get(2)?,
        source: row.get(3)?,
        max_doses_per_cycle: row.get(4)?,
        min_hours_between_doses: row.get(5)?,
        cycle_period: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        active: row.get(9)?,
        units_per_dose: row.get(10)?,
        dose_amount: row.get(11)?,
    })
}

fn regimen_from_row(row: RegimenRow) -> Result<Regimen, DatabaseError> {
    Ok(Regimen {
        id: parse_uuid("regimens.id", &row.id)?,
        medication_id: parse_uuid("regimens.medication_id", &row.medication_id)?,
        person_id: parse_uuid("regimens.person_id", &row.person_id)?,
        source: RegimenSource::from_str(&row.source)?,
        max_doses_per_cycle: row.max_doses_per_cycle,
        min_hours_between_doses: row.min_hours_between_doses,
        cycle_period: CyclePeriod::from_str(&row.cycle_period)?,
        active_window: ActiveWindow {
            start: parse_date("regimens.start_date", &row.start_date)?,
            end: row
                .end_date
                .as_deref()
                .map(|d| parse_date("regimens.end_date", d))
                .transpose()?,
        },
        active: row.active != 0,
        units_per_dose: row.units_per_dose,
        dose_amount: row.dose_amount,
    })
}
