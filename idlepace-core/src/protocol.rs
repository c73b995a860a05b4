//! Text commands understood by the ASF IPC endpoint and their acknowledgments.
use std::fmt;

use crate::achievements::{AchievementId, AchievementProgress};

const LOCKED_MARK: char = '\u{274C}';
const UNLOCKED_MARK: char = '\u{2705}';
const UNLOCK_SUCCESS: &str = "Success!";

/// A single command addressed to one bot on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Start idling `app_id`.
    Play { bot: &'a str, app_id: u32 },
    /// Stop whatever the bot is playing.
    Reset { bot: &'a str },
    /// List achievement states for `app_id`.
    ListAchievements { bot: &'a str, app_id: u32 },
    /// Unlock a single achievement.
    SetAchievement {
        bot: &'a str,
        app_id: u32,
        id: &'a AchievementId,
    },
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Play { bot, app_id } => write!(f, "play {bot} {app_id}"),
            Self::Reset { bot } => write!(f, "reset {bot}"),
            Self::ListAchievements { bot, app_id } => write!(f, "alist {bot} {app_id}"),
            Self::SetAchievement { bot, app_id, id } => write!(f, "aset {bot} {app_id} {id}"),
        }
    }
}

impl Command<'_> {
    /// Exact response that confirms the command, for commands that have one.
    #[must_use]
    pub fn expected_ack(&self) -> Option<String> {
        match self {
            Self::Play { bot, app_id } => {
                Some(format!("<{bot}> Playing selected gameIDs: {app_id}"))
            }
            Self::Reset { bot } => Some(format!("<{bot}> Done!")),
            Self::ListAchievements { .. } | Self::SetAchievement { .. } => None,
        }
    }

    /// Whether `response` is the acknowledgment this command expects.
    #[must_use]
    pub fn is_acknowledged_by(&self, response: &str) -> bool {
        self.expected_ack()
            .is_some_and(|expected| response.trim() == expected)
    }
}

/// Classified endpoint response to an unlock command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    AlreadyUnlocked,
    Unexpected(String),
}

impl UnlockOutcome {
    #[must_use]
    pub fn classify(response: &str, id: &AchievementId) -> Self {
        if response.contains(UNLOCK_SUCCESS) {
            Self::Unlocked
        } else if response.contains(&format!("Achievement #{id} is already unlocked")) {
            Self::AlreadyUnlocked
        } else {
            Self::Unexpected(response.to_string())
        }
    }
}

/// Parse an achievement listing into locked and unlocked ids.
///
/// Each line names its achievement in the first whitespace-separated token and
/// carries a cross or a check mark; lines with neither are ignored.
#[must_use]
pub fn parse_listing(listing: &str) -> AchievementProgress {
    let mut progress = AchievementProgress::default();
    for line in listing.lines() {
        let Some(token) = line.split_whitespace().next() else {
            continue;
        };
        let id = AchievementId::new(token);
        if line.contains(LOCKED_MARK) {
            progress.locked.insert(id);
        } else if line.contains(UNLOCKED_MARK) {
            progress.unlocked.insert(id);
        }
    }
    progress
}
