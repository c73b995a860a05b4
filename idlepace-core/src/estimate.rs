//! Offline tuning helpers: the jitter-free pacing table and a simulated unlock order.
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::achievements::{Achievement, AchievementCatalog};
use crate::pacing::{PacingConfig, select_next, time_to_next_with_jitter};

/// One row of the pacing table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacingRow {
    pub unlocked: usize,
    pub hours_to_next: f64,
    pub cumulative_hours: f64,
}

/// Time to next unlock and running playtime for every unlock count `0..=total`,
/// with jitter and speed factor held at 1.
#[must_use]
pub fn pacing_table(cfg: &PacingConfig, total: usize) -> Vec<PacingRow> {
    let mut cumulative_hours = 0.0;
    (0..=total)
        .map(|unlocked| {
            let hours_to_next = time_to_next_with_jitter(cfg, unlocked, total, 1.0, 1.0);
            cumulative_hours += hours_to_next;
            PacingRow {
                unlocked,
                hours_to_next,
                cumulative_hours,
            }
        })
        .collect()
}

/// Simulate unlocking the whole catalog one `select_next` at a time.
pub fn simulate_unlock_order<'a>(
    catalog: &'a AchievementCatalog,
    rng: &mut impl Rng,
) -> Vec<&'a Achievement> {
    let mut unlocked = BTreeSet::new();
    let mut order = Vec::with_capacity(catalog.len());
    loop {
        let locked = catalog.locked_by_rarity(&unlocked);
        let Some(&next) = select_next(&locked, rng) else {
            break;
        };
        unlocked.insert(next.id.clone());
        order.push(next);
    }
    order
}
