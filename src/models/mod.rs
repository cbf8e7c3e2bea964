//! Plain data the engine consumes: regimens, dose events and stock.
//!
//! Validation here is construction-time only. Evaluators assume every
//! value they receive already passed it and never re-check.

pub mod dose_event;
pub mod enums;
pub mod regimen;
pub mod stock;

pub use dose_event::*;
pub use enums::*;
pub use regimen::*;
pub use stock::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("min_hours_between_doses must be a finite non-negative number, got {0}")]
    InvalidSpacing(f64),

    #[error("min_hours_between_doses must not exceed {max} hours, got {hours}")]
    SpacingTooLarge { hours: f64, max: f64 },

    #[error("active window ends ({end}) before it starts ({start})")]
    InvalidActiveWindow {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("units_per_dose must be at least 1")]
    ZeroUnitsPerDose,

    #[error("dose amount must be greater than 0, got {0}")]
    InvalidAmount(f64),

    #[error("taken_at cannot be in the future")]
    FutureDose,
}
