//! Achievement metadata and per-agent unlock progress.
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of a single achievement as understood by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct AchievementId(pub String);

impl AchievementId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<AchievementId> for String {
    fn from(value: AchievementId) -> Self {
        value.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for AchievementId {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(text) => Self::new(&text),
            RawId::Number(number) => Self(number.to_string()),
        }
    }
}

/// Static description of an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: AchievementId,
    #[serde(default)]
    pub name: String,
    /// Percent of players holding the achievement; higher is more common.
    #[serde(alias = "rare", deserialize_with = "deserialize_percent")]
    pub rarity_percent: f64,
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} ({}%)", self.id, self.name, self.rarity_percent)
    }
}

fn deserialize_percent<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPercent {
        Number(f64),
        Text(String),
    }

    match RawPercent::deserialize(deserializer)? {
        RawPercent::Number(value) => Ok(value),
        RawPercent::Text(text) => text
            .trim()
            .trim_end_matches('%')
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid rarity percent: {text}"))),
    }
}

/// Ordered achievement metadata for the target title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct AchievementCatalog {
    achievements: Vec<Achievement>,
}

impl AchievementCatalog {
    #[must_use]
    pub const fn new(achievements: Vec<Achievement>) -> Self {
        Self { achievements }
    }

    /// Load metadata from a JSON array of achievements.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.achievements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }

    #[must_use]
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    /// Achievements not contained in `unlocked`, most common first.
    ///
    /// Ties keep catalog order.
    #[must_use]
    pub fn locked_by_rarity(&self, unlocked: &BTreeSet<AchievementId>) -> Vec<&Achievement> {
        let mut locked: Vec<&Achievement> = self
            .achievements
            .iter()
            .filter(|achievement| !unlocked.contains(&achievement.id))
            .collect();
        locked.sort_by(|a, b| b.rarity_percent.total_cmp(&a.rarity_percent));
        locked
    }
}

/// Locked/unlocked split for one agent, as last reported by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AchievementProgress {
    pub unlocked: BTreeSet<AchievementId>,
    pub locked: BTreeSet<AchievementId>,
}

impl AchievementProgress {
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Record a confirmed unlock.
    pub fn mark_unlocked(&mut self, id: &AchievementId) {
        self.locked.remove(id);
        self.unlocked.insert(id.clone());
    }
}
