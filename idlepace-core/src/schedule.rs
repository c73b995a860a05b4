//! Persisted per-agent schedule personality and the timing ranges that drive it.
use chrono::Weekday;
use rand::Rng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::path::PathBuf;
use thiserror::Error;

use crate::random::draw_between;

pub const SPEED_FACTOR_MIN: f64 = 0.75;
pub const SPEED_FACTOR_MAX: f64 = 1.25;
pub const ACTIVE_DURATION_MIN: f64 = 2.0;
pub const ACTIVE_DURATION_MAX: f64 = 8.0;
pub const HOURS_PER_DAY: f64 = 24.0;
pub const DAYS_OFF_PROBABILITY_MAX: f64 = 0.5;
pub const FIXED_DAYS_OFF_MAX: usize = 3;
const DAYS_PER_WEEK: usize = 7;

/// Weekly days off, numbered from Sunday = 0.
pub type DaysOff = SmallVec<[u8; FIXED_DAYS_OFF_MAX]>;

/// Randomized personality plus resumable progress for one agent.
///
/// Every field except `remaining_playtime_hours` is drawn once and reloaded
/// verbatim on every later start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentScheduleState {
    /// Multiplier on every pacing draw.
    #[serde(alias = "globalRandomAchievementFactor")]
    pub speed_factor: f64,
    /// Simulated play hours left before the next unlock.
    #[serde(alias = "remainingPlaytime")]
    pub remaining_playtime_hours: f64,
    pub active_hours_duration: f64,
    pub active_hours_offset: f64,
    pub days_off_probability: f64,
    pub days_off: DaysOff,
}

/// Invariant violations found in a loaded schedule state.
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleValidationError {
    #[error("{field} must be finite (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("speedFactor must be positive (got {0})")]
    SpeedFactor(f64),
    #[error("day off {0} is not a weekday number (0-6)")]
    InvalidDayOff(u8),
    #[error("day off {0} is listed more than once")]
    DuplicateDayOff(u8),
    #[error("at most {max} fixed days off are allowed (got {0})", max = FIXED_DAYS_OFF_MAX)]
    TooManyDaysOff(usize),
}

/// Failures reading or writing persisted schedule state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to access schedule state at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schedule state at {} is malformed", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("schedule state at {} is invalid", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ScheduleValidationError,
    },
}

impl AgentScheduleState {
    /// Draw a fresh personality. `remaining_playtime_hours` starts at zero and
    /// is expected to be replaced with a pacing draw by the caller.
    pub fn draw_personality(rng: &mut impl Rng) -> Self {
        let speed_factor = draw_between(rng, SPEED_FACTOR_MIN, SPEED_FACTOR_MAX);
        let active_hours_duration = draw_between(rng, ACTIVE_DURATION_MIN, ACTIVE_DURATION_MAX);
        let active_hours_offset = draw_between(rng, 0.0, HOURS_PER_DAY);
        let days_off_probability = draw_between(rng, 0.0, DAYS_OFF_PROBABILITY_MAX);

        let count = rng.gen_range(0..=FIXED_DAYS_OFF_MAX);
        let mut days_off: DaysOff = sample(rng, DAYS_PER_WEEK, count)
            .into_iter()
            .filter_map(|day| u8::try_from(day).ok())
            .collect();
        days_off.sort_unstable();

        Self {
            speed_factor,
            remaining_playtime_hours: 0.0,
            active_hours_duration,
            active_hours_offset,
            days_off_probability,
            days_off,
        }
    }

    /// Check every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        for (field, value) in [
            ("speedFactor", self.speed_factor),
            ("remainingPlaytimeHours", self.remaining_playtime_hours),
            ("activeHoursDuration", self.active_hours_duration),
            ("activeHoursOffset", self.active_hours_offset),
            ("daysOffProbability", self.days_off_probability),
        ] {
            if !value.is_finite() {
                return Err(ScheduleValidationError::NotFinite { field, value });
            }
        }
        if self.speed_factor <= 0.0 {
            return Err(ScheduleValidationError::SpeedFactor(self.speed_factor));
        }
        check_range(
            "activeHoursDuration",
            self.active_hours_duration,
            ACTIVE_DURATION_MIN,
            ACTIVE_DURATION_MAX,
        )?;
        if !(0.0..HOURS_PER_DAY).contains(&self.active_hours_offset) {
            return Err(ScheduleValidationError::OutOfRange {
                field: "activeHoursOffset",
                min: 0.0,
                max: HOURS_PER_DAY,
                value: self.active_hours_offset,
            });
        }
        check_range(
            "daysOffProbability",
            self.days_off_probability,
            0.0,
            DAYS_OFF_PROBABILITY_MAX,
        )?;

        if self.days_off.len() > FIXED_DAYS_OFF_MAX {
            return Err(ScheduleValidationError::TooManyDaysOff(self.days_off.len()));
        }
        let mut seen = [false; DAYS_PER_WEEK];
        for &day in &self.days_off {
            let slot = seen
                .get_mut(usize::from(day))
                .ok_or(ScheduleValidationError::InvalidDayOff(day))?;
            if *slot {
                return Err(ScheduleValidationError::DuplicateDayOff(day));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Whether `hour` (0-23 local wall clock) falls in the daily active window.
    #[must_use]
    pub fn is_active_at(&self, hour: u32) -> bool {
        is_active_hour(
            f64::from(hour),
            self.active_hours_offset,
            self.active_hours_duration,
        )
    }

    /// Whether `weekday` is one of the fixed weekly days off.
    #[must_use]
    pub fn is_fixed_day_off(&self, weekday: Weekday) -> bool {
        let day = u8::try_from(weekday.num_days_from_sunday()).unwrap_or(u8::MAX);
        self.days_off.contains(&day)
    }

    /// Decide whether a new calendar day is taken off.
    ///
    /// Fixed days off short-circuit without consuming a draw.
    pub fn draw_day_off(&self, weekday: Weekday, rng: &mut impl Rng) -> bool {
        self.is_fixed_day_off(weekday) || rng.r#gen::<f64>() < self.days_off_probability
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ScheduleValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ScheduleValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

/// Wrap-around test for the window `[offset, offset + duration) mod 24`.
#[must_use]
pub fn is_active_hour(hour: f64, offset: f64, duration: f64) -> bool {
    (hour - offset + HOURS_PER_DAY).rem_euclid(HOURS_PER_DAY) < duration
}

/// Inclusive-low, exclusive-high range of hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourRange {
    pub min: f64,
    pub max: f64,
}

impl HourRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range that always yields `hours`.
    #[must_use]
    pub const fn fixed(hours: f64) -> Self {
        Self::new(hours, hours)
    }

    pub fn draw(&self, rng: &mut impl Rng) -> f64 {
        draw_between(rng, self.min, self.max)
    }
}

/// Random ranges for sessions, breaks, idle re-checks and simulated increments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTiming {
    pub session: HourRange,
    pub break_after_session: HourRange,
    pub idle_recheck: HourRange,
    pub increment: HourRange,
}

impl Default for ScheduleTiming {
    fn default() -> Self {
        Self {
            session: HourRange::new(0.5, 5.0),
            break_after_session: HourRange::new(0.5, 5.0),
            idle_recheck: HourRange::new(1.0, 2.0),
            increment: HourRange::new(30.0 / 3600.0, 90.0 / 3600.0),
        }
    }
}
