use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::{draw_stock, format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::DoseEvent;

pub fn insert_dose_event(conn: &Connection, event: &DoseEvent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO dose_events (id, regimen_id, taken_at, amount) VALUES (?1, ?2, ?3, ?4)",
        params![
            event.id.to_string(),
            event.regimen_id.to_string(),
            format_timestamp(&event.taken_at),
            event.amount,
        ],
    )?;
    Ok(())
}

pub fn get_dose_event(conn: &Connection, event_id: &Uuid) -> Result<DoseEvent, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, regimen_id, taken_at, amount FROM dose_events WHERE id = ?1",
            params![event_id.to_string()],
            dose_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "DoseEvent".into(),
            id: event_id.to_string(),
        })?;

    dose_from_row(row)
}

/// All doses for a regimen, oldest first.
pub fn get_dose_history(conn: &Connection, regimen_id: &Uuid) -> Result<Vec<DoseEvent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, regimen_id, taken_at, amount FROM dose_events
         WHERE regimen_id = ?1 ORDER BY taken_at",
    )?;

    let rows = stmt.query_map(params![regimen_id.to_string()], dose_row_from_rusqlite)?;

    let mut events = Vec::new();
    for row in rows {
        events.push(dose_from_row(row?)?);
    }
    Ok(events)
}

pub fn delete_dose_event(conn: &Connection, event_id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM dose_events WHERE id = ?1", params![event_id.to_string()])?;
    Ok(())
}

/// Start a write transaction that takes the database write lock up front.
/// A second writer waits (up to the busy timeout) instead of interleaving
/// its reads with ours.
pub fn begin_immediate(conn: &Connection) -> Result<Transaction<'_>, DatabaseError> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

/// Insert the event and draw `units` from the medication's stock.
/// Callers own the surrounding transaction.
pub fn write_dose(
    tx: &Transaction<'_>,
    event: &DoseEvent,
    medication_id: &Uuid,
    units: u32,
) -> Result<(), DatabaseError> {
    insert_dose_event(tx, event)?;
    draw_stock(tx, medication_id, units)?;
    Ok(())
}

/// Insert a dose and decrement stock as one unit of work.
pub fn record_dose_atomically(
    conn: &Connection,
    event: &DoseEvent,
    medication_id: &Uuid,
    units: u32,
) -> Result<(), DatabaseError> {
    let tx = begin_immediate(conn)?;
    write_dose(&tx, event, medication_id, units)?;
    tx.commit()?;
    Ok(())
}

struct DoseRow {
    id: String,
    regimen_id: String,
    taken_at: String,
    amount: Option<f64>,
}

fn dose_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DoseRow, rusqlite::Error> {
    Ok(DoseRow {
        id: row.get(0)?,
        regimen_id: row.get(1)?,
        taken_at: row.get(2)?,
        amount: row.get(3)?,
    })
}

fn dose_from_row(row: DoseRow) -> Result<DoseEvent, DatabaseError> {
    Ok(DoseEvent {
        id: parse_uuid("dose_events.id", &row.id)?,
        regimen_id: parse_uuid("dose_events.regimen_id", &row.regimen_id)?,
        taken_at: parse_timestamp("dose_events.taken_at", &row.taken_at)?,
        amount: row.amount,
    })
}
