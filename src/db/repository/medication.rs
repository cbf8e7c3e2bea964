use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, name, dosage_unit, current_supply, reorder_threshold,
         supply_at_last_restock, reorder_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            med.id.to_string(),
            med.name,
            med.dosage_unit,
            med.stock.current_supply,
            med.stock.reorder_threshold,
            med.stock.supply_at_last_restock,
            med.stock.reorder_status.map(|s| s.as_str()),
        ],
    )?;
    Ok(())
}

pub fn get_medication(conn: &Connection, med_id: &Uuid) -> Result<Medication, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, dosage_unit, current_supply, reorder_threshold,
             supply_at_last_restock, reorder_status
             FROM medications WHERE id = ?1",
            params![med_id.to_string()],
            medication_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| not_found(med_id))?;

    medication_from_row(row)
}

pub fn get_all_medications(conn: &Connection) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, dosage_unit, current_supply, reorder_threshold,
         supply_at_last_restock, reorder_status
         FROM medications ORDER BY name",
    )?;

    let rows = stmt.query_map([], medication_row_from_rusqlite)?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row?)?);
    }
    Ok(meds)
}

/// Add `quantity` units, remember the new level as the restock baseline and
/// clear any pending reorder. A zero quantity changes nothing.
pub fn restock_medication(conn: &Connection, med_id: &Uuid, quantity: u32) -> Result<bool, DatabaseError> {
    if quantity == 0 {
        return Ok(false);
    }

    let updated = conn.execute(
        "UPDATE medications
         SET current_supply = COALESCE(current_supply, 0) + ?2,
             supply_at_last_restock = COALESCE(current_supply, 0) + ?2,
             reorder_status = NULL
         WHERE id = ?1",
        params![med_id.to_string(), quantity],
    )?;
    if updated == 0 {
        return Err(not_found(med_id));
    }

    tracing::info!(medication_id = %med_id, quantity, "medication restocked");
    Ok(true)
}

pub fn set_reorder_status(
    conn: &Connection,
    med_id: &Uuid,
    status: Option<ReorderStatus>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE medications SET reorder_status = ?2 WHERE id = ?1",
        params![med_id.to_string(), status.map(|s| s.as_str())],
    )?;
    if updated == 0 {
        return Err(not_found(med_id));
    }
    Ok(())
}

/// Decrement tracked supply by `units`, floored at zero. Untracked stock
/// is left alone.
pub fn draw_stock(conn: &Connection, med_id: &Uuid, units: u32) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE medications SET current_supply = MAX(current_supply - ?2, 0)
         WHERE id = ?1 AND current_supply IS NOT NULL",
        params![med_id.to_string(), units],
    )?;
    Ok(())
}

pub fn delete_medication(conn: &Connection, med_id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM medications WHERE id = ?1", params![med_id.to_string()])?;
    Ok(())
}

fn not_found(med_id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "Medication".into(),
        id: med_id.to_string(),
    }
}

struct MedicationRow {
    id: String,
    name: String,
    dosage_unit: Option<String>,
    current_supply: Option<u32>,
    reorder_threshold: u32,
    supply_at_last_restock: Option<u32>,
    reorder_status: Option<String>,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        dosage_unit: row.get(2)?,
        current_supply: row.get(3)?,
        reorder_threshold: row.get(4)?,
        supply_at_last_restock: row.get(5)?,
        reorder_status: row.get(6)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    Ok(Medication {
        id: parse_uuid("medications.id", &row.id)?,
        name: row.name,
        dosage_unit: row.dosage_unit,
        stock: MedicationStock {
            current_supply: row.current_supply,
            reorder_threshold: row.reorder_threshold,
            supply_at_last_restock: row.supply_at_last_restock,
            reorder_status: row
                .reorder_status
                .as_deref()
                .map(ReorderStatus::from_str)
                .transpose()?,
        },
    })
}
