use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use idlepace_core::AgentScheduleState;
use log::info;
use rand::Rng;
use std::sync::Arc;

use super::{Agent, SessionEnd};
use crate::clock::hours;
use crate::shutdown::Shutdown;

/// What the agent should be doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Active,
}

/// Day-off decision, drawn once per calendar date.
#[derive(Debug, Clone, Default)]
pub struct DayTracker {
    date: Option<NaiveDate>,
    day_off: bool,
}

impl DayTracker {
    /// Redraw the day-off flag when `now` falls on a new date. Returns the new
    /// flag on a date change.
    pub fn update(
        &mut self,
        now: NaiveDateTime,
        state: &AgentScheduleState,
        rng: &mut impl Rng,
    ) -> Option<bool> {
        let date = now.date();
        if self.date == Some(date) {
            return None;
        }
        self.date = Some(date);
        self.day_off = state.draw_day_off(date.weekday(), rng);
        Some(self.day_off)
    }

    #[must_use]
    pub const fn is_day_off(&self) -> bool {
        self.day_off
    }
}

impl Agent {
    /// Decide between playing and waiting at `now`.
    pub fn activity_at(&mut self, now: NaiveDateTime) -> Activity {
        if let Some(day_off) = self.day.update(now, &self.state, &mut self.rng) {
            info!(
                "[{}] New day. Is it a day off? {}",
                self.name(),
                if day_off { "Yes" } else { "No" }
            );
        }
        if self.state.is_active_at(now.hour()) && !self.day.is_day_off() {
            Activity::Active
        } else {
            Activity::Idle
        }
    }

    /// Alternate sessions and breaks inside the active window, re-checking
    /// periodically outside it, until shutdown.
    pub async fn run(&mut self, shutdown: &mut Shutdown) {
        let timing = self.services.timing;
        let clock = Arc::clone(&self.services.clock);
        while !shutdown.is_triggered() {
            let wait = match self.activity_at(clock.now()) {
                Activity::Active => {
                    info!(
                        "[{}] Active hour and not a day off. Time to play!",
                        self.name()
                    );
                    let session = timing.session.draw(&mut self.rng);
                    if self.play_session(session, shutdown).await == SessionEnd::Interrupted {
                        break;
                    }
                    let pause = timing.break_after_session.draw(&mut self.rng);
                    info!(
                        "[{}] Finished playing. Taking a break for {pause:.2} hour(s).",
                        self.name()
                    );
                    pause
                }
                Activity::Idle => {
                    info!(
                        "[{}] Not an active hour or it's a day off. Waiting until conditions are met.",
                        self.name()
                    );
                    timing.idle_recheck.draw(&mut self.rng)
                }
            };
            tokio::select! {
                () = clock.sleep(hours(wait)) => {}
                () = shutdown.triggered() => break,
            }
        }
        info!("[{}] Scheduler stopped", self.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::BotControl;
    use crate::channel::CommandChannel;
    use crate::shutdown;
    use crate::test_support::{
        MemoryStore, ScriptedChannel, VirtualClock, at, catalog_of, identity, services,
    };
    use chrono::Weekday;
    use idlepace_core::{DaysOff, ScheduleTiming};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::time::Duration;

    fn sunday_off_state() -> AgentScheduleState {
        AgentScheduleState {
            speed_factor: 1.0,
            remaining_playtime_hours: 2.0,
            active_hours_duration: 8.0,
            active_hours_offset: 0.0,
            days_off_probability: 0.0,
            days_off: DaysOff::from_slice(&[0]),
        }
    }

    #[test]
    fn day_off_is_drawn_once_per_date() {
        let state = AgentScheduleState {
            days_off_probability: 0.5,
            days_off: DaysOff::new(),
            ..sunday_off_state()
        };
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut day = DayTracker::default();
        let first = day.update(at(2024, 1, 9, 1), &state, &mut rng);
        assert!(first.is_some());
        for hour in 2..24 {
            assert_eq!(day.update(at(2024, 1, 9, hour), &state, &mut rng), None);
            assert_eq!(Some(day.is_day_off()), first);
        }
        assert!(day.update(at(2024, 1, 10, 0), &state, &mut rng).is_some());
    }

    #[test]
    fn fixed_day_off_is_always_off() {
        let state = sunday_off_state();
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut day = DayTracker::default();
        let sunday = at(2024, 1, 7, 3);
        assert_eq!(sunday.weekday(), Weekday::Sun);
        assert_eq!(day.update(sunday, &state, &mut rng), Some(true));
        assert_eq!(day.update(at(2024, 1, 8, 3), &state, &mut rng), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn no_session_starts_on_a_fixed_day_off() {
        let clock = VirtualClock::starting_at(at(2024, 1, 6, 0));
        let catalog = catalog_of(50);
        let channel = ScriptedChannel::new("alpha", &catalog, clock.clone());
        let state = sunday_off_state();
        let store = MemoryStore::with("alpha", state.clone());
        let services = services(clock.clone(), store, catalog, ScheduleTiming::default());
        let control = BotControl::new("alpha", channel.clone() as Arc<dyn CommandChannel>);
        let mut agent = Agent::new(
            identity("alpha"),
            control,
            services,
            state,
            ChaCha20Rng::seed_from_u64(1_337),
        );
        let (trigger, mut shutdown) = shutdown::channel();

        let runner = tokio::spawn(async move {
            agent.run(&mut shutdown).await;
            agent
        });
        tokio::time::sleep(Duration::from_secs(100 * 24 * 3600)).await;
        trigger.trigger();
        let agent = runner.await.unwrap();

        let plays: Vec<NaiveDateTime> = channel
            .sent()
            .into_iter()
            .filter(|(_, text)| text.starts_with("play "))
            .map(|(when, _)| when)
            .collect();
        assert!(plays.len() > 50, "only {} sessions", plays.len());
        assert!(plays.iter().all(|when| when.weekday() != Weekday::Sun));
        assert!(plays.iter().all(|when| when.hour() < 8));
        assert!(agent.progress.unlocked_count() > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_an_idle_wait() {
        let clock = VirtualClock::starting_at(at(2024, 1, 8, 12));
        let catalog = catalog_of(5);
        let channel = ScriptedChannel::new("alpha", &catalog, clock.clone());
        let state = sunday_off_state();
        let services = services(
            clock,
            MemoryStore::with("alpha", state.clone()),
            catalog,
            ScheduleTiming::default(),
        );
        let control = BotControl::new("alpha", channel.clone() as Arc<dyn CommandChannel>);
        let mut agent = Agent::new(
            identity("alpha"),
            control,
            services,
            state,
            ChaCha20Rng::seed_from_u64(8),
        );
        let (trigger, mut shutdown) = shutdown::channel();

        let started = tokio::time::Instant::now();
        let runner = tokio::spawn(async move { agent.run(&mut shutdown).await });
        tokio::time::sleep(Duration::from_secs(60)).await;
        trigger.trigger();
        runner.await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(120));
        assert!(channel.sent().is_empty());
    }
}
