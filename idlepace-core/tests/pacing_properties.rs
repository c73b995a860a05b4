use std::collections::BTreeSet;

use idlepace_core::{
    Achievement, AchievementCatalog, AchievementId, PacingConfig, select_next,
    time_to_next_with_jitter,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

const TOTAL: usize = 167;

fn catalog(len: u32) -> AchievementCatalog {
    AchievementCatalog::new(
        (0..len)
            .map(|i| Achievement {
                id: AchievementId::new(&format!("ach-{i}")),
                name: format!("Achievement {i}"),
                rarity_percent: 100.0 - f64::from(i) * 0.5,
            })
            .collect(),
    )
}

#[test]
fn ramp_is_non_decreasing_past_trigger() {
    let cfg = PacingConfig::load_from_static();
    let trigger = cfg.final_ramp_trigger as usize;
    for jitter in [0.75, 1.0, 1.249] {
        let mut previous = time_to_next_with_jitter(&cfg, trigger, TOTAL, 1.0, jitter);
        for unlocked in trigger + 1..=TOTAL {
            let current = time_to_next_with_jitter(&cfg, unlocked, TOTAL, 1.0, jitter);
            assert!(
                current >= previous,
                "time dropped at {unlocked}: {current} < {previous}"
            );
            previous = current;
        }
    }
}

#[test]
fn ramp_steepens_the_curve() {
    let cfg = PacingConfig::load_from_static();
    let without_ramp = PacingConfig {
        final_ramp_factor: 0.0,
        ..cfg.clone()
    };
    let last = TOTAL - 1;
    let ramped = time_to_next_with_jitter(&cfg, last, TOTAL, 1.0, 1.0);
    let flat = time_to_next_with_jitter(&without_ramp, last, TOTAL, 1.0, 1.0);
    assert!(ramped > flat);
}

#[test]
fn select_next_only_returns_locked_top_slice() {
    let catalog = catalog(57);
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let mut unlocked: BTreeSet<AchievementId> = BTreeSet::new();

    while unlocked.len() < catalog.len() {
        let locked = catalog.locked_by_rarity(&unlocked);
        let slice_len = (locked.len() / 5).max(1);
        let allowed: BTreeSet<&AchievementId> =
            locked.iter().take(slice_len).map(|a| &a.id).collect();

        let next = select_next(&locked, &mut rng).expect("locked achievements remain");
        assert!(allowed.contains(&next.id));
        assert!(!unlocked.contains(&next.id));
        unlocked.insert(next.id.clone());
    }

    let locked = catalog.locked_by_rarity(&unlocked);
    assert!(select_next(&locked, &mut rng).is_none());
}

#[test]
fn single_locked_achievement_is_selected() {
    let catalog = catalog(3);
    let unlocked = BTreeSet::from([AchievementId::new("ach-0"), AchievementId::new("ach-2")]);
    let locked = catalog.locked_by_rarity(&unlocked);
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let next = select_next(&locked, &mut rng).unwrap();
    assert_eq!(next.id, AchievementId::new("ach-1"));
}
