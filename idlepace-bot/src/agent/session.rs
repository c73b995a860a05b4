use idlepace_core::{UnlockOutcome, select_next};
use log::{error, info, warn};
use std::sync::Arc;

use super::Agent;
use crate::clock::hours;
use crate::shutdown::Shutdown;

/// How a play session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Completed,
    /// Shutdown arrived mid-session; stopping play is left to the registry.
    Interrupted,
}

impl Agent {
    /// Idle the configured app for `duration_hours` of simulated play,
    /// spending playtime in small increments and unlocking an achievement
    /// each time the remaining playtime runs out.
    pub async fn play_session(
        &mut self,
        duration_hours: f64,
        shutdown: &mut Shutdown,
    ) -> SessionEnd {
        if shutdown.is_triggered() {
            return SessionEnd::Interrupted;
        }
        let app_id = self.services.app_id;
        let clock = Arc::clone(&self.services.clock);
        info!(
            "[{}] Playing game {app_id} for {duration_hours:.2} hour(s)",
            self.name()
        );
        info!(
            "[{}] Remaining playtime for the next achievement: {:.2} hour(s)",
            self.name(),
            self.state.remaining_playtime_hours
        );

        match self.control.start(app_id).await {
            Ok(()) => crate::success!("[{}] Game session started: {app_id}", self.name()),
            Err(err) => error!("[{}] Error starting the game: {err}", self.name()),
        }

        let mut increment = self.services.timing.increment.draw(&mut self.rng);
        let mut elapsed = 0.0;
        while elapsed < duration_hours {
            tokio::select! {
                () = clock.sleep(hours(increment)) => {}
                () = shutdown.triggered() => {
                    info!("[{}] Session interrupted by shutdown", self.name());
                    return SessionEnd::Interrupted;
                }
            }
            elapsed += increment;
            self.state.remaining_playtime_hours -= increment;
            self.persist();

            if self.state.remaining_playtime_hours <= 0.0 {
                self.unlock_next().await;
                increment = self.services.timing.increment.draw(&mut self.rng);
            }
        }

        match self.control.stop().await {
            Ok(()) => crate::success!("[{}] Game session finished", self.name()),
            Err(err) => error!("[{}] Error stopping the game: {err}", self.name()),
        }
        SessionEnd::Completed
    }

    /// Refresh progress, unlock one of the most common locked achievements,
    /// and draw the playtime until the next one.
    pub(crate) async fn unlock_next(&mut self) {
        self.refresh_progress().await;

        let catalog = Arc::clone(&self.services.catalog);
        let locked = catalog.locked_by_rarity(&self.progress.unlocked);
        let next = select_next(&locked, &mut self.rng).map(|&achievement| achievement.clone());

        match next {
            None => info!(
                "[{}] Every achievement is already unlocked",
                self.name()
            ),
            Some(achievement) => {
                info!("[{}] Unlocking achievement: {achievement}", self.name());
                match self
                    .control
                    .set_achievement(self.services.app_id, &achievement.id)
                    .await
                {
                    Ok(UnlockOutcome::Unlocked) => {
                        self.progress.mark_unlocked(&achievement.id);
                        crate::success!("[{}] Achievement unlocked: {achievement}", self.name());
                    }
                    Ok(UnlockOutcome::AlreadyUnlocked) => warn!(
                        "[{}] Achievement is already unlocked: {}",
                        self.name(),
                        achievement.id
                    ),
                    Ok(UnlockOutcome::Unexpected(response)) => error!(
                        "[{}] Unexpected response from endpoint: {response}",
                        self.name()
                    ),
                    Err(err) => error!(
                        "[{}] Error unlocking achievement {}: {err}",
                        self.name(),
                        achievement.id
                    ),
                }
            }
        }

        self.state.remaining_playtime_hours = self.draw_time_to_next();
        self.persist();
        info!(
            "[{}] Remaining playtime for the next achievement: {:.2} hour(s)",
            self.name(),
            self.state.remaining_playtime_hours
        );
    }
}
