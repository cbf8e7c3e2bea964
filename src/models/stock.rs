use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReorderStatus;

/// Current inventory for a medication.
///
/// `current_supply == None` means the medication is untracked: it is never
/// low, never out of stock and never blocks administration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationStock {
    pub current_supply: Option<u32>,
    pub reorder_threshold: u32,
    pub supply_at_last_restock: Option<u32>,
    pub reorder_status: Option<ReorderStatus>,
}

impl MedicationStock {
    pub fn tracked(current_supply: u32, reorder_threshold: u32) -> Self {
        Self {
            current_supply: Some(current_supply),
            reorder_threshold,
            supply_at_last_restock: None,
            reorder_status: None,
        }
    }

    pub fn untracked() -> Self {
        Self::default()
    }

    pub fn is_tracked(&self) -> bool {
        self.current_supply.is_some()
    }

    pub fn low_stock(&self) -> bool {
        self.current_supply
            .is_some_and(|supply| supply <= self.reorder_threshold)
    }

    pub fn out_of_stock(&self) -> bool {
        self.current_supply == Some(0)
    }

    /// Remaining supply as a 0–100 indicator for stock badges.
    pub fn supply_percentage(&self) -> u8 {
        let current = self.current_supply.unwrap_or(0) as f64;
        let denominator = self
            .supply_at_last_restock
            .unwrap_or_else(|| self.reorder_threshold.max(1));
        if denominator == 0 {
            return 0;
        }

        (current / denominator as f64 * 100.0).min(100.0).round() as u8
    }

    /// Append-only increment. Returns false when nothing was added.
    pub fn restock(&mut self, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }

        let new_supply = self.current_supply.unwrap_or(0).saturating_add(quantity);
        self.current_supply = Some(new_supply);
        self.supply_at_last_restock = Some(new_supply);
        self.reorder_status = None;
        true
    }

    /// Remove `units` after an administration; never goes below zero.
    pub fn draw(&mut self, units: u32) {
        if let Some(supply) = self.current_supply.as_mut() {
            *supply = supply.saturating_sub(units);
        }
    }
}

/// A medication and the stock every regimen referencing it draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    pub dosage_unit: Option<String>,
    pub stock: MedicationStock,
}

impl Medication {
    pub fn new(name: impl Into<String>, stock: MedicationStock) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            dosage_unit: None,
            stock,
        }
    }
}
