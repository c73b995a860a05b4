//! idlepace core
//!
//! Platform-agnostic logic for simulated idling agents: the persisted schedule
//! personality, the achievement pacing curve, unlock selection, and the text
//! protocol spoken to the command endpoint. Nothing in this crate performs I/O
//! on its own; storage and transport are provided by the caller.

pub mod achievements;
pub mod estimate;
pub mod pacing;
pub mod protocol;
pub mod random;
pub mod schedule;

pub use achievements::{Achievement, AchievementCatalog, AchievementId, AchievementProgress};
pub use estimate::{PacingRow, pacing_table, simulate_unlock_order};
pub use pacing::{
    MAX_HOURS_TO_NEXT, PacingConfig, PacingConfigError, select_next, time_to_next, time_to_next_with_jitter,
};
pub use protocol::{Command, UnlockOutcome, parse_listing};
pub use random::{agent_seed, draw_between};
pub use schedule::{
    AgentScheduleState, DaysOff, HourRange, ScheduleTiming, ScheduleValidationError, StateError,
    is_active_hour,
};

/// Storage seam for per-agent schedule state.
///
/// Implementations must make `save` durable before returning: the session loop
/// calls it after every simulated increment and relies on it for resume.
pub trait ScheduleStore: Send + Sync {
    /// Load the persisted state for `agent`, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if stored state exists but cannot be read or is invalid.
    fn load(&self, agent: &str) -> Result<Option<AgentScheduleState>, StateError>;

    /// Persist the full state for `agent`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, agent: &str, state: &AgentScheduleState) -> Result<(), StateError>;
}
