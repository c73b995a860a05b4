//! One simulated player: its persisted personality, progress and control loop.
mod commands;
mod scheduler;
mod session;

pub use commands::BotControl;
pub use session::SessionEnd;

use scheduler::DayTracker;

use idlepace_core::{
    AchievementCatalog, AchievementProgress, AgentScheduleState, PacingConfig, ScheduleStore,
    ScheduleTiming, StateError, time_to_next,
};
use log::{error, info, warn};
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

use crate::channel::Endpoint;
use crate::clock::Clock;

/// Immutable name and endpoint of an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub name: String,
    pub endpoint: Endpoint,
}

/// Collaborators and settings shared by every agent in the process.
pub struct AgentServices {
    pub store: Arc<dyn ScheduleStore>,
    pub catalog: Arc<AchievementCatalog>,
    pub pacing: PacingConfig,
    pub clock: Arc<dyn Clock>,
    pub timing: ScheduleTiming,
    pub app_id: u32,
}

pub struct Agent {
    identity: AgentIdentity,
    control: BotControl,
    services: Arc<AgentServices>,
    state: AgentScheduleState,
    progress: AchievementProgress,
    day: DayTracker,
    rng: ChaCha20Rng,
}

impl Agent {
    pub(crate) fn new(
        identity: AgentIdentity,
        control: BotControl,
        services: Arc<AgentServices>,
        state: AgentScheduleState,
        rng: ChaCha20Rng,
    ) -> Self {
        Self {
            identity,
            control,
            services,
            state,
            progress: AchievementProgress::default(),
            day: DayTracker::default(),
            rng,
        }
    }

    /// Load the agent's stored personality, or draw and persist a new one,
    /// after fetching its current achievement progress.
    ///
    /// # Errors
    ///
    /// Returns an error if stored state exists but is unreadable or invalid.
    pub async fn initialize(
        identity: AgentIdentity,
        control: BotControl,
        services: Arc<AgentServices>,
        mut rng: ChaCha20Rng,
    ) -> Result<Self, StateError> {
        let stored = services.store.load(&identity.name)?;
        let fresh = stored.is_none();
        let state = stored.unwrap_or_else(|| AgentScheduleState::draw_personality(&mut rng));

        let mut agent = Self::new(identity, control, services, state, rng);
        agent.refresh_progress().await;

        if fresh {
            agent.state.remaining_playtime_hours = agent.draw_time_to_next();
            warn!("[{}] No saved state found, created a new one", agent.name());
            agent.persist();
        } else {
            crate::success!("[{}] Loaded saved state", agent.name());
        }
        agent.log_state();
        Ok(agent)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Replace locally held progress with the endpoint's listing. On failure
    /// the previous progress is kept.
    async fn refresh_progress(&mut self) {
        match self.control.list_achievements(self.services.app_id).await {
            Ok(progress) => {
                self.progress = progress;
                crate::success!(
                    "[{}] Achievements data updated: {}/{}",
                    self.name(),
                    self.progress.unlocked_count(),
                    self.services.catalog.len()
                );
            }
            Err(err) => error!(
                "[{}] Error while getting achievement data: {err}",
                self.name()
            ),
        }
    }

    fn draw_time_to_next(&mut self) -> f64 {
        time_to_next(
            &self.services.pacing,
            self.progress.unlocked_count(),
            self.services.catalog.len(),
            self.state.speed_factor,
            &mut self.rng,
        )
    }

    /// Write the full state; a failed write is logged and the run continues.
    fn persist(&self) {
        if let Err(err) = self.services.store.save(self.name(), &self.state) {
            error!("[{}] Failed to save state: {err}", self.name());
        }
    }

    fn log_state(&self) {
        let state = &self.state;
        info!(
            "[{}] Config: [speedFactor: {:.2} | remainingPlaytimeHours: {:.2} | activeHoursDuration: {:.2} | activeHoursOffset: {:.2} | daysOffProbability: {:.2} | daysOff: {:?}]",
            self.name(),
            state.speed_factor,
            state.remaining_playtime_hours,
            state.active_hours_duration,
            state.active_hours_offset,
            state.days_off_probability,
            state.days_off.as_slice()
        );
    }
}
