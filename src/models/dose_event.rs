use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// One recorded administration. Owned by exactly one regimen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    pub id: Uuid,
    pub regimen_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub amount: Option<f64>,
}

impl DoseEvent {
    /// Create a dose record, rejecting future timestamps and non-positive amounts.
    pub fn record(
        regimen_id: Uuid,
        taken_at: DateTime<Utc>,
        amount: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if taken_at > now {
            return Err(ValidationError::FutureDose);
        }
        if let Some(value) = amount {
            if value.is_nan() || value <= 0.0 {
                return Err(ValidationError::InvalidAmount(value));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            regimen_id,
            taken_at,
            amount,
        })
    }
}

/// Most recent event at or before `instant`, if any.
pub fn last_dose_at_or_before(history: &[DoseEvent], instant: DateTime<Utc>) -> Option<&DoseEvent> {
    history
        .iter()
        .filter(|event| event.taken_at <= instant)
        .max_by_key(|event| event.taken_at)
}
