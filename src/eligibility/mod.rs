//! Dose eligibility: may a dose be taken now, and if not, when.
//!
//! Every function takes the regimen, that regimen's own dose history and an
//! injected `now`. The timezone carried by `now` defines where calendar
//! days, weeks and months begin for the cycle-count cap.
//!
//! Two constraints exist, each only when configured:
//! 1. Cycle cap — fewer than `max_doses_per_cycle` doses in the current
//!    calendar cycle window
//! 2. Spacing — at least `min_hours_between_doses` since the latest dose
//!
//! A regimen outside its active window is never eligible.

mod countdown;
mod window;

pub use countdown::format_countdown;
pub use window::{local_midnight, CycleWindow};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::models::{last_dose_at_or_before, DoseEvent, Regimen};

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Everything the presentation layer needs about one regimen at `now`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eligibility {
    pub can_take_now: bool,
    pub next_available_at: Option<DateTime<Utc>>,
    pub seconds_until_next_dose: Option<i64>,
    pub countdown: Option<String>,
    pub doses_in_cycle: u32,
    pub remaining_in_cycle: Option<u32>,
}

// ═══════════════════════════════════════════
// Evaluation
// ═══════════════════════════════════════════

/// Convert a fractional hour count to a duration (millisecond precision).
/// Saturates at `Duration::MAX`; negative and NaN input give zero.
pub fn hours_to_duration(hours: f64) -> Duration {
    let millis = (hours * 3_600_000.0).round();
    if millis.is_nan() || millis <= 0.0 {
        return Duration::zero();
    }
    Duration::try_milliseconds(millis as i64).unwrap_or(Duration::MAX)
}

/// True when every configured constraint passes at `now`.
pub fn can_take_now<Tz: TimeZone>(regimen: &Regimen, history: &[DoseEvent], now: &DateTime<Tz>) -> bool {
    if !regimen.is_active_on(now.date_naive()) {
        return false;
    }
    if !regimen.has_timing_restrictions() {
        return true;
    }

    let now_utc = now.with_timezone(&Utc);
    !cycle_cap_reached(regimen, history, now) && !spacing_violated(regimen, history, now_utc)
}

/// Earliest instant at which every configured constraint passes.
///
/// `None` when the regimen has no constraints, is retired, or the spacing
/// would push the time past the representable date range. Returns `now`
/// itself when a dose may already be taken, never an earlier instant.
///
/// The result only accounts for the constraints that block at `now`. With
/// `max_doses_per_cycle == 0` the next window start is reported, but the
/// regimen stays blocked there too; callers should treat a zero cap as
/// "never" rather than schedule a dose at that time.
pub fn next_available_time<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    now: &DateTime<Tz>,
) -> Option<DateTime<Utc>> {
    if !regimen.has_timing_restrictions() {
        return None;
    }
    let today = now.date_naive();
    if regimen.is_retired_on(today) {
        return None;
    }

    let now_utc = now.with_timezone(&Utc);
    if can_take_now(regimen, history, now) {
        return Some(now_utc);
    }

    let spacing_ready = match (min_spacing(regimen), last_dose_at_or_before(history, now_utc)) {
        (Some(gap), Some(last)) => last.taken_at.checked_add_signed(gap)?,
        _ => now_utc,
    };

    let cycle_ready = if cycle_cap_reached(regimen, history, now) {
        CycleWindow::containing(regimen.cycle_period, now).end
    } else {
        now_utc
    };

    let start_ready = if today < regimen.active_window.start {
        local_midnight(&now.timezone(), regimen.active_window.start)
    } else {
        now_utc
    };

    Some(spacing_ready.max(cycle_ready).max(start_ready))
}

/// Time left until the next dose; `None` when a dose may be taken now or
/// no next time exists.
pub fn time_until_next_dose<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    now: &DateTime<Tz>,
) -> Option<Duration> {
    if can_take_now(regimen, history, now) {
        return None;
    }

    let next = next_available_time(regimen, history, now)?;
    let remaining = next - now.with_timezone(&Utc);
    Some(remaining.max(Duration::zero()))
}

/// Countdown text for a blocked regimen; `None` when a dose may be taken now.
pub fn countdown_display<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    now: &DateTime<Tz>,
) -> Option<String> {
    time_until_next_dose(regimen, history, now).map(format_countdown)
}

/// Doses recorded in the cycle window containing `now`.
pub fn doses_in_current_cycle<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    now: &DateTime<Tz>,
) -> u32 {
    CycleWindow::containing(regimen.cycle_period, now).count(history)
}

/// Doses still allowed this cycle; `None` when the regimen is uncapped.
pub fn remaining_doses_in_cycle<Tz: TimeZone>(
    regimen: &Regimen,
    history: &[DoseEvent],
    now: &DateTime<Tz>,
) -> Option<u32> {
    regimen
        .max_doses_per_cycle
        .map(|max| max.saturating_sub(doses_in_current_cycle(regimen, history, now)))
}

/// Evaluate every eligibility question at once.
pub fn evaluate<Tz: TimeZone>(regimen: &Regimen, history: &[DoseEvent], now: &DateTime<Tz>) -> Eligibility {
    let can_take_now = can_take_now(regimen, history, now);
    let remaining = time_until_next_dose(regimen, history, now);

    tracing::trace!(
        regimen_id = %regimen.id,
        can_take_now,
        "evaluated dose eligibility"
    );

    Eligibility {
        can_take_now,
        next_available_at: next_available_time(regimen, history, now),
        seconds_until_next_dose: remaining.map(|d| d.num_seconds()),
        countdown: remaining.map(format_countdown),
        doses_in_cycle: doses_in_current_cycle(regimen, history, now),
        remaining_in_cycle: remaining_doses_in_cycle(regimen, history, now),
    }
}

fn min_spacing(regimen: &Regimen) -> Option<Duration> {
    regimen.min_hours_between_doses.map(hours_to_duration)
}

fn cycle_cap_reached<Tz: TimeZone>(regimen: &Regimen, history: &[DoseEvent], now: &DateTime<Tz>) -> bool {
    match regimen.max_doses_per_cycle {
        Some(max) => doses_in_current_cycle(regimen, history, now) >= max,
        None => false,
    }
}

fn spacing_violated(regimen: &Regimen, history: &[DoseEvent], now: DateTime<Utc>) -> bool {
    let Some(gap) = min_spacing(regimen) else {
        return false;
    };

    last_dose_at_or_before(history, now).is_some_and(|last| now - last.taken_at < gap)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
