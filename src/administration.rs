//! Administration gate: timing eligibility combined with stock.
//!
//! Stock exhaustion always wins over a cooldown when both apply, so the
//! caller shows "out of stock" rather than a countdown that would never
//! lead anywhere.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::eligibility::can_take_now;
use crate::models::{DoseEvent, MedicationStock, Regimen};

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Why an administration is refused. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockedReason {
    OutOfStock,
    Cooldown,
}

impl BlockedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfStock => "out_of_stock",
            Self::Cooldown => "cooldown",
        }
    }

    /// Refusal text shown to the person recording the dose.
    pub fn message(&self) -> &'static str {
        match self {
            Self::OutOfStock => "Cannot take medicine: out of stock",
            Self::Cooldown => "Cannot take medicine: timing restrictions not met",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdministrationError {
    #[error("{}", .0.message())]
    Blocked(BlockedReason),
}

/// Result of a granted administration: the new record and stock after the draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Administration {
    pub dose: DoseEvent,
    pub stock: MedicationStock,
}

// ═══════════════════════════════════════════
// Gate
// ═══════════════════════════════════════════

/// True when timing allows a dose and the stock is not exhausted.
/// Untracked stock never blocks.
pub fn can_administer<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    stock: &MedicationStock,
    now: &DateTime<Tz>,
) -> bool {
    !stock.out_of_stock() && can_take_now(regimen, history, now)
}

/// The single reason an administration is refused, or `None` when allowed.
pub fn administration_blocked_reason<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    stock: &MedicationStock,
    now: &DateTime<Tz>,
) -> Option<BlockedReason> {
    if stock.out_of_stock() {
        return Some(BlockedReason::OutOfStock);
    }
    if !can_take_now(regimen, history, now) {
        return Some(BlockedReason::Cooldown);
    }
    None
}

/// Record a dose at `now` if the gate allows it.
///
/// `amount` defaults to the regimen's planned dose amount. The returned stock
/// has `units_per_dose` drawn from it; nothing is persisted here.
pub fn administer<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    stock: &MedicationStock,
    amount: Option<f64>,
    now: &DateTime<Tz>,
) -> Result<Administration, AdministrationError> {
    if let Some(reason) = administration_blocked_reason(regimen, history, stock, now) {
        tracing::debug!(regimen_id = %regimen.id, reason = reason.as_str(), "administration blocked");
        return Err(AdministrationError::Blocked(reason));
    }

    let dose = DoseEvent {
        id: Uuid::new_v4(),
        regimen_id: regimen.id,
        taken_at: now.with_timezone(&Utc),
        amount: amount.or(regimen.dose_amount),
    };

    let mut stock = stock.clone();
    stock.draw(regimen.units_per_dose);

    Ok(Administration { dose, stock })
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
