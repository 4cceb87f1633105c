//! Deterministic NPC generation.
//!
//! One NPC is a pure function of `(seed, site_id)`. The generator draws
//! from the canonical [`Lcg`] in a fixed order — tier, age, gender, job,
//! criminality, corruption, traits, wealth, reputation, home, position —
//! and that order is part of the contract: changing it silently regenerates
//! every NPC in every world.

use chrono::{DateTime, Duration, Utc};

use crate::catalog::{Catalogs, Job};
use crate::rng::Lcg;
use crate::state::world::{Dims, Gender, Npc, Position};

/// Lifetime of a generated NPC before it is considered expired.
pub const NPC_TTL_DAYS: i64 = 14;

/// Generates one NPC deterministically from `(seed, site_id)`.
///
/// `anchor` supplies the macro coordinates for the NPC's position; `now`
/// stamps creation and expiry. Neither participates in any draw, so the
/// generated identity is reproducible regardless of wall clock.
pub fn generate_npc(
    seed: u32,
    site_id: &str,
    anchor: (i32, i32),
    l1: Dims,
    now: DateTime<Utc>,
    catalogs: &Catalogs,
) -> Npc {
    let mut rng = Lcg::new(seed);

    // 1. Social tier.
    let r_tier = rng.next_f64();
    let tier = if r_tier < 0.05 {
        1
    } else if r_tier < 0.25 {
        2
    } else if r_tier < 0.90 {
        3
    } else {
        4
    };

    // 2. Age, 5..=84.
    let age = 5 + (rng.next_f64() * 80.0) as u32;

    // 3. Gender.
    let gender = if rng.next_f64() < 0.5 {
        Gender::Male
    } else {
        Gender::Female
    };

    // 4. Job, filtered by minimum age within the tier.
    let eligible: Vec<&Job> = catalogs
        .jobs_for_tier(tier)
        .into_iter()
        .filter(|j| age >= j.min_age)
        .collect();
    let job = if eligible.is_empty() {
        &Job::UNEMPLOYED
    } else {
        let idx = (rng.next_f64() * eligible.len() as f64) as usize;
        eligible[idx.min(eligible.len() - 1)]
    };

    // 5. Criminality. The draw is consumed only for fractional weights.
    let is_criminal = if job.criminal_weight >= 1.0 {
        true
    } else if job.criminal_weight == 0.0 {
        false
    } else {
        rng.next_f64() < job.criminal_weight
    };

    // 6. Corruption: band first, then uniform within the band.
    let r_corr = rng.next_f64();
    let (lo, hi) = if r_corr < 0.60 {
        (0.0, 0.3)
    } else if r_corr < 0.90 {
        (0.3, 0.7)
    } else {
        (0.7, 1.0)
    };
    let corruption_level = lo + rng.next_f64() * (hi - lo);

    // 7. Traits: count, then distinct catalog indices.
    let r_count = rng.next_f64();
    let trait_count = if r_count < 0.35 {
        1
    } else if r_count < 0.75 {
        2
    } else {
        3
    };
    let mut trait_indices: Vec<usize> = Vec::with_capacity(trait_count);
    while trait_indices.len() < trait_count {
        let idx = (rng.next_f64() * catalogs.traits.len() as f64) as usize;
        let idx = idx.min(catalogs.traits.len() - 1);
        if !trait_indices.contains(&idx) {
            trait_indices.push(idx);
        }
    }
    let traits = trait_indices
        .iter()
        .map(|&i| catalogs.traits[i].name.to_string())
        .collect();

    // 8. Wealth tier by social tier.
    let (wlo, whi) = match tier {
        1 => (7, 9),
        2 => (5, 8),
        3 => (2, 5),
        _ => (0, 1),
    };
    let wealth_tier = wlo + (rng.next_f64() * f64::from(whi - wlo + 1)) as u8;

    // 9. Reputation in [-25, 24].
    let player_reputation = ((rng.next_f64() - 0.5) * 50.0).floor() as i32;

    // 10. Home location.
    let r_home = rng.next_f64();
    let home_location = if r_home < 0.8 {
        Some(site_id.to_string())
    } else if r_home < 0.95 {
        Some("wanderer".to_string())
    } else {
        None
    };

    // 11. Position within the L1 grid.
    let lx = (rng.next_f64() * f64::from(l1.w)) as i32;
    let ly = (rng.next_f64() * f64::from(l1.h)) as i32;

    // 12-13. Timestamps and identifier.
    let created_at_utc = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let expires_at_utc = (now + Duration::days(NPC_TTL_DAYS))
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    Npc {
        id: format!("{site_id}#npc_{seed}"),
        site_id: site_id.to_string(),
        age,
        gender,
        tier,
        job_category: job.name.to_string(),
        home_location,
        faction_id: None,
        wealth_tier: wealth_tier.min(9),
        player_reputation,
        traits,
        corruption_level,
        is_criminal,
        position: Position {
            mx: anchor.0,
            my: anchor.1,
            lx: lx.min(l1.w - 1),
            ly: ly.min(l1.h - 1),
        },
        state: "active".to_string(),
        created_at_utc,
        expires_at_utc,
        schedule: None,
        is_quest_giver: false,
        quest_giver_rank: 0,
    }
}

/// Generates a pool of NPCs with consecutive seeds
/// `base_seed, base_seed+1, …`.
pub fn generate_npc_pool(
    site_id: &str,
    count: u32,
    base_seed: u32,
    anchor: (i32, i32),
    l1: Dims,
    now: DateTime<Utc>,
    catalogs: &Catalogs,
) -> Vec<Npc> {
    (0..count)
        .map(|i| {
            generate_npc(
                base_seed.wrapping_add(i),
                site_id,
                anchor,
                l1,
                now,
                catalogs,
            )
        })
        .collect()
}
