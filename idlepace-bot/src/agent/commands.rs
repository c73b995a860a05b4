//! Per-bot command wrappers over the shared channel.
use idlepace_core::{AchievementId, AchievementProgress, Command, UnlockOutcome, parse_listing};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::channel::{CommandChannel, CommandError};

/// A start or stop command that did not complete as expected.
#[derive(Debug, Error)]
pub enum AckError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("expected '{expected}' but received '{received}'")]
    ProtocolMismatch { expected: String, received: String },
}

/// Sends commands for one bot and tracks whether it may currently be playing.
///
/// Clones share the playing flag, so the registry can stop a bot whose agent
/// task has already wound down.
#[derive(Clone)]
pub struct BotControl {
    name: String,
    channel: Arc<dyn CommandChannel>,
    playing: Arc<AtomicBool>,
}

impl BotControl {
    pub fn new(name: impl Into<String>, channel: Arc<dyn CommandChannel>) -> Self {
        Self {
            name: name.into(),
            channel,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    async fn send(&self, command: &Command<'_>) -> Result<String, CommandError> {
        let text = command.to_string();
        info!("[{}] Executing command '{text}'", self.name);
        self.channel.execute(&text).await
    }

    async fn send_expecting_ack(&self, command: &Command<'_>) -> Result<(), AckError> {
        let received = self.send(command).await?;
        if command.is_acknowledged_by(&received) {
            Ok(())
        } else {
            Err(AckError::ProtocolMismatch {
                expected: command.expected_ack().unwrap_or_default(),
                received,
            })
        }
    }

    /// Start idling `app_id`.
    ///
    /// The bot counts as playing from the moment the command is sent, whatever
    /// the outcome, so a later stop is never skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or is not acknowledged.
    pub async fn start(&self, app_id: u32) -> Result<(), AckError> {
        self.playing.store(true, Ordering::SeqCst);
        self.send_expecting_ack(&Command::Play {
            bot: &self.name,
            app_id,
        })
        .await
    }

    /// Stop idling. The playing flag clears only on an acknowledged stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or is not acknowledged.
    pub async fn stop(&self) -> Result<(), AckError> {
        self.send_expecting_ack(&Command::Reset { bot: &self.name })
            .await?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Fetch the bot's current achievement states.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing command fails.
    pub async fn list_achievements(&self, app_id: u32) -> Result<AchievementProgress, CommandError> {
        let listing = self
            .send(&Command::ListAchievements {
                bot: &self.name,
                app_id,
            })
            .await?;
        Ok(parse_listing(&listing))
    }

    /// Ask the endpoint to unlock `id` and classify its answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the unlock command fails.
    pub async fn set_achievement(
        &self,
        app_id: u32,
        id: &AchievementId,
    ) -> Result<UnlockOutcome, CommandError> {
        let response = self
            .send(&Command::SetAchievement {
                bot: &self.name,
                app_id,
                id,
            })
            .await?;
        Ok(UnlockOutcome::classify(&response, id))
    }
}
