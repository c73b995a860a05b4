//! Doubles shared by the agent, registry and scheduler tests.
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use idlepace_core::{
    Achievement, AchievementCatalog, AchievementId, AgentScheduleState, DaysOff, PacingConfig,
    ScheduleStore, ScheduleTiming, StateError,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::agent::{AgentIdentity, AgentServices};
use crate::channel::{CommandChannel, CommandError, Endpoint};
use crate::clock::Clock;

/// Wall clock that starts at `origin` and advances with tokio time.
pub struct VirtualClock {
    origin: NaiveDateTime,
    started: Instant,
}

impl VirtualClock {
    pub fn starting_at(origin: NaiveDateTime) -> Arc<Self> {
        Arc::new(Self {
            origin,
            started: Instant::now(),
        })
    }

    pub fn monday_midnight() -> Arc<Self> {
        Self::starting_at(at(2024, 1, 8, 0))
    }
}

#[async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> NaiveDateTime {
        self.origin + TimeDelta::from_std(self.started.elapsed()).unwrap_or_default()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Achievements `1..=count`, most common first.
pub fn catalog_of(count: u32) -> AchievementCatalog {
    AchievementCatalog::new(
        (1..=count)
            .map(|i| Achievement {
                id: AchievementId::new(&i.to_string()),
                name: format!("Achievement {i}"),
                rarity_percent: 100.0 - f64::from(i) * 0.5,
            })
            .collect(),
    )
}

#[derive(Default)]
pub struct MemoryStore {
    states: Mutex<HashMap<String, AgentScheduleState>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with(agent: &str, state: AgentScheduleState) -> Arc<Self> {
        let store = Self::default();
        store
            .states
            .lock()
            .unwrap()
            .insert(agent.to_string(), state);
        Arc::new(store)
    }

    pub fn state(&self, agent: &str) -> Option<AgentScheduleState> {
        self.states.lock().unwrap().get(agent).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ScheduleStore for MemoryStore {
    fn load(&self, agent: &str) -> Result<Option<AgentScheduleState>, StateError> {
        Ok(self.state(agent))
    }

    fn save(&self, agent: &str, state: &AgentScheduleState) -> Result<(), StateError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .unwrap()
            .insert(agent.to_string(), state.clone());
        Ok(())
    }
}

/// Endpoint double answering like ASF for one bot and recording every command.
pub struct ScriptedChannel {
    bot: String,
    clock: Arc<dyn Clock>,
    catalog: Vec<AchievementId>,
    unlocked: Mutex<BTreeSet<AchievementId>>,
    sent: Mutex<Vec<(NaiveDateTime, String)>>,
    failing: AtomicBool,
    wrong_ack: AtomicBool,
    reset_delay_ms: AtomicU64,
}

impl ScriptedChannel {
    pub fn new(bot: &str, catalog: &AchievementCatalog, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            bot: bot.to_string(),
            clock,
            catalog: catalog.achievements().iter().map(|a| a.id.clone()).collect(),
            unlocked: Mutex::new(BTreeSet::new()),
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            wrong_ack: AtomicBool::new(false),
            reset_delay_ms: AtomicU64::new(0),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_wrong_ack(&self, wrong: bool) {
        self.wrong_ack.store(wrong, Ordering::SeqCst);
    }

    /// Hold every `reset` reply back by `delay`.
    pub fn set_reset_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.reset_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(NaiveDateTime, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.texts()
            .iter()
            .filter(|text| text.split_whitespace().next() == Some(verb))
            .count()
    }

    pub fn unlocked(&self) -> BTreeSet<AchievementId> {
        self.unlocked.lock().unwrap().clone()
    }

    fn listing(&self) -> String {
        let unlocked = self.unlocked.lock().unwrap();
        let mut listing = format!("<{}> Achievements:", self.bot);
        for id in &self.catalog {
            let mark = if unlocked.contains(id) {
                '\u{2705}'
            } else {
                '\u{274C}'
            };
            listing.push_str(&format!("\n{id} {mark} Achievement {id}"));
        }
        listing
    }
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn execute(&self, command: &str) -> Result<String, CommandError> {
        self.sent
            .lock()
            .unwrap()
            .push((self.clock.now(), command.to_string()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(CommandError::Status {
                endpoint: "scripted".to_string(),
                status: 503,
            });
        }
        let delay = self.reset_delay_ms.load(Ordering::SeqCst);
        if delay > 0 && command.starts_with("reset ") {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let bot = &self.bot;
        let words: Vec<&str> = command.split_whitespace().collect();
        let response = match words.as_slice() {
            ["play", _, app] if !self.wrong_ack.load(Ordering::SeqCst) => {
                format!("<{bot}> Playing selected gameIDs: {app}")
            }
            ["play", ..] => format!("<{bot}> Bot is not connected!"),
            ["reset", ..] => format!("<{bot}> Done!"),
            ["alist", ..] => self.listing(),
            ["aset", _, _, id] => {
                let id = AchievementId::new(id);
                if self.unlocked.lock().unwrap().insert(id.clone()) {
                    format!("<{bot}> Success!")
                } else {
                    format!("<{bot}> Achievement #{id} is already unlocked")
                }
            }
            _ => format!("<{bot}> Unknown command!"),
        };
        Ok(response)
    }
}

pub fn identity(name: &str) -> AgentIdentity {
    AgentIdentity {
        name: name.to_string(),
        endpoint: Endpoint {
            host: "127.0.0.1".to_string(),
            port: 1242,
            password: String::new(),
        },
    }
}

pub fn services(
    clock: Arc<dyn Clock>,
    store: Arc<dyn ScheduleStore>,
    catalog: AchievementCatalog,
    timing: ScheduleTiming,
) -> Arc<AgentServices> {
    Arc::new(AgentServices {
        store,
        catalog: Arc::new(catalog),
        pacing: PacingConfig::default(),
        clock,
        timing,
        app_id: 730,
    })
}

/// A valid state active from midnight for eight hours, never off.
pub fn midnight_shift_state(remaining_playtime_hours: f64) -> AgentScheduleState {
    AgentScheduleState {
        speed_factor: 1.0,
        remaining_playtime_hours,
        active_hours_duration: 8.0,
        active_hours_offset: 0.0,
        days_off_probability: 0.0,
        days_off: DaysOff::new(),
    }
}
