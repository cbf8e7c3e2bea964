//! Today's plan across several regimens: what was taken, what comes next.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::administration::{administration_blocked_reason, BlockedReason};
use crate::eligibility::{next_available_time, CycleWindow};
use crate::models::{CyclePeriod, DoseEvent, MedicationStock, Regimen};

/// Already-loaded data for one regimen.
#[derive(Debug, Clone, Copy)]
pub struct RegimenSnapshot<'a> {
    pub regimen: &'a Regimen,
    pub history: &'a [DoseEvent],
    pub stock: &'a MedicationStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayEntryStatus {
    Taken,
    Upcoming,
    OutOfStock,
    Cooldown,
}

impl From<BlockedReason> for DayEntryStatus {
    fn from(reason: BlockedReason) -> Self {
        match reason {
            BlockedReason::OutOfStock => Self::OutOfStock,
            BlockedReason::Cooldown => Self::Cooldown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlanEntry {
    pub regimen_id: Uuid,
    pub person_id: Uuid,
    pub medication_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub taken_at: Option<DateTime<Utc>>,
    pub status: DayEntryStatus,
}

/// Doses taken today plus, per regimen, the next dose if it falls today.
/// Inactive regimens are skipped. Sorted by `scheduled_at`.
pub fn build_day_plan<Tz: TimeZone>(snapshots: &[RegimenSnapshot<'_>], now: &DateTime<Tz>) -> Vec<DayPlanEntry> {
    let today = now.date_naive();
    let day = CycleWindow::containing(CyclePeriod::Daily, now);

    let mut entries = Vec::new();
    for snapshot in snapshots {
        let regimen = snapshot.regimen;
        if !regimen.is_active_on(today) {
            continue;
        }

        let entry = |scheduled_at, taken_at, status| DayPlanEntry {
            regimen_id: regimen.id,
            person_id: regimen.person_id,
            medication_id: regimen.medication_id,
            scheduled_at,
            taken_at,
            status,
        };

        entries.extend(
            snapshot
                .history
                .iter()
                .filter(|event| day.contains(event.taken_at))
                .map(|event| entry(event.taken_at, Some(event.taken_at), DayEntryStatus::Taken)),
        );

        if let Some(next) = next_available_time(regimen, snapshot.history, now) {
            if day.contains(next) {
                let status = administration_blocked_reason(regimen, snapshot.history, snapshot.stock, now)
                    .map_or(DayEntryStatus::Upcoming, DayEntryStatus::from);
                entries.push(entry(next, None, status));
            }
        }
    }

    entries.sort_by_key(|entry| entry.scheduled_at);
    tracing::debug!(entries = entries.len(), "built day plan");
    entries
}
