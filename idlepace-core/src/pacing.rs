//! Achievement pacing curve and unlock selection.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random::draw_between;
use crate::schedule::SPEED_FACTOR_MAX;

const DEFAULT_PACING_DATA: &str = include_str!("../data/pacing.json");

/// Per-unlock jitter bounds applied on top of the agent's speed factor.
pub const JITTER_MIN: f64 = 0.75;
pub const JITTER_MAX: f64 = 1.25;

/// Upper bound on a single time-to-next draw, in hours.
pub const MAX_HOURS_TO_NEXT: f64 = 1.0e6;

/// Share of the most common locked achievements eligible for the next unlock.
pub const TOP_SLICE_RATIO: f64 = 0.2;

/// Tunable constants for the exponential pacing curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacingConfig {
    /// Hours to the first unlock before any scaling.
    pub base_factor: f64,
    /// Exponent applied to the unlocked fraction.
    pub scale_factor: f64,
    /// Unlock count from which the late-game ramp applies.
    pub final_ramp_trigger: u32,
    /// Exponent applied to progress through the ramp segment.
    pub final_ramp_factor: f64,
}

/// Errors raised when pacing configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum PacingConfigError {
    #[error("baseFactor must be positive and finite (got {0})")]
    BaseFactor(f64),
    #[error("{field} must be finite (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("curve peaks at {peak} hours per unlock, above the {limit} hour limit")]
    Unbounded { peak: f64, limit: f64 },
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self::load_from_static()
    }
}

impl PacingConfig {
    /// Built-in tuning shipped with the crate.
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_PACING_DATA).unwrap_or(Self {
            base_factor: 1.5,
            scale_factor: 3.0,
            final_ramp_trigger: 150,
            final_ramp_factor: 2.0,
        })
    }

    /// Parse and validate a pacing configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed; validation failures are
    /// reported through [`PacingConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the constants describe a usable curve.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), PacingConfigError> {
        if !(self.base_factor.is_finite() && self.base_factor > 0.0) {
            return Err(PacingConfigError::BaseFactor(self.base_factor));
        }
        for (field, value) in [
            ("scaleFactor", self.scale_factor),
            ("finalRampFactor", self.final_ramp_factor),
        ] {
            if !value.is_finite() {
                return Err(PacingConfigError::NotFinite { field, value });
            }
        }
        // Both exponents see progress in [0, 1], so the curve peaks at full progress.
        let peak = self.base_factor
            * self.scale_factor.max(0.0).exp()
            * self.final_ramp_factor.max(0.0).exp()
            * JITTER_MAX
            * SPEED_FACTOR_MAX;
        if peak > MAX_HOURS_TO_NEXT {
            return Err(PacingConfigError::Unbounded {
                peak,
                limit: MAX_HOURS_TO_NEXT,
            });
        }
        Ok(())
    }
}

/// Hours of play until the next unlock, given an explicit jitter draw.
///
/// This is the deterministic core of [`time_to_next`]; `jitter` is normally
/// drawn in `[JITTER_MIN, JITTER_MAX)`. The result is capped at
/// [`MAX_HOURS_TO_NEXT`], which also absorbs overflow to infinity.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn time_to_next_with_jitter(
    cfg: &PacingConfig,
    unlocked: usize,
    total: usize,
    speed_factor: f64,
    jitter: f64,
) -> f64 {
    let unlocked_f = unlocked as f64;
    let progress = if total == 0 {
        0.0
    } else {
        unlocked_f / total as f64
    };
    let mut estimate = cfg.base_factor * (cfg.scale_factor * progress).exp();

    let trigger = cfg.final_ramp_trigger as usize;
    if unlocked >= trigger && total > trigger {
        let ramp_progress = (unlocked - trigger) as f64 / (total - trigger) as f64;
        estimate *= (cfg.final_ramp_factor * ramp_progress).exp();
    }

    (estimate * jitter * speed_factor).min(MAX_HOURS_TO_NEXT)
}

/// Hours of play until the next unlock with a fresh jitter draw.
pub fn time_to_next(
    cfg: &PacingConfig,
    unlocked: usize,
    total: usize,
    speed_factor: f64,
    rng: &mut impl Rng,
) -> f64 {
    let jitter = draw_between(rng, JITTER_MIN, JITTER_MAX);
    time_to_next_with_jitter(cfg, unlocked, total, speed_factor, jitter)
}

/// Pick the next unlock from `locked`, which must be ordered most common first.
///
/// The candidate slice is the top [`TOP_SLICE_RATIO`] of the list, rounded
/// down but never empty while anything remains locked.
pub fn select_next<'a, T>(locked: &'a [T], rng: &mut impl Rng) -> Option<&'a T> {
    if locked.is_empty() {
        return None;
    }
    let slice_len = top_slice_len(locked.len());
    locked.get(rng.gen_range(0..slice_len))
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn top_slice_len(remaining: usize) -> usize {
    let size = (remaining as f64 * TOP_SLICE_RATIO).floor() as usize;
    size.max(1)
}
