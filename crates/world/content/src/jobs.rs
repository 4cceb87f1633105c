//! The 72-entry job catalog, partitioned 11/22/27/12 across social tiers.
//!
//! `criminal_weight` is the probability that a holder is a criminal
//! (weights of exactly 0 or 1 short-circuit the draw); `min_age` filters
//! the pool during NPC generation.

use world_core::catalog::Job;

macro_rules! jobs {
    ($($name:literal, $tier:literal, $weight:literal, $min_age:literal);* $(;)?) => {
        [$(Job {
            name: $name,
            tier: $tier,
            criminal_weight: $weight,
            min_age: $min_age,
        }),*]
    };
}

pub static JOBS: [Job; 72] = jobs![
    // Tier 1 — ruling and commanding (11)
    "magistrate", 1, 0.05, 30;
    "high priest", 1, 0.02, 35;
    "guild master", 1, 0.15, 35;
    "noble", 1, 0.10, 18;
    "court mage", 1, 0.05, 30;
    "admiral", 1, 0.05, 35;
    "general", 1, 0.05, 35;
    "banker", 1, 0.20, 30;
    "judge", 1, 0.05, 35;
    "ambassador", 1, 0.10, 30;
    "spymaster", 1, 0.90, 30;
    // Tier 2 — professions and trades (22)
    "merchant", 2, 0.15, 18;
    "trader", 2, 0.20, 18;
    "blacksmith", 2, 0.02, 16;
    "physician", 2, 0.02, 25;
    "alchemist", 2, 0.10, 22;
    "scribe", 2, 0.02, 16;
    "captain", 2, 0.05, 25;
    "priest", 2, 0.02, 22;
    "jeweler", 2, 0.10, 18;
    "shipwright", 2, 0.02, 20;
    "brewer", 2, 0.05, 18;
    "innkeeper", 2, 0.10, 20;
    "moneylender", 2, 0.30, 25;
    "cartographer", 2, 0.02, 20;
    "engineer", 2, 0.02, 22;
    "apothecary", 2, 0.05, 20;
    "tailor", 2, 0.02, 16;
    "mason", 2, 0.02, 18;
    "glassblower", 2, 0.02, 18;
    "notary", 2, 0.05, 25;
    "navigator", 2, 0.05, 20;
    "armorer", 2, 0.02, 18;
    // Tier 3 — common labor (27)
    "farmer", 3, 0.02, 12;
    "fisher", 3, 0.02, 12;
    "hunter", 3, 0.05, 14;
    "carpenter", 3, 0.02, 16;
    "baker", 3, 0.02, 14;
    "butcher", 3, 0.05, 16;
    "miner", 3, 0.05, 14;
    "shepherd", 3, 0.02, 10;
    "weaver", 3, 0.02, 12;
    "potter", 3, 0.02, 14;
    "cook", 3, 0.02, 14;
    "stablehand", 3, 0.02, 10;
    "dockworker", 3, 0.10, 16;
    "guard", 3, 0.05, 18;
    "soldier", 3, 0.05, 18;
    "sailor", 3, 0.10, 16;
    "courier", 3, 0.05, 12;
    "barkeep", 3, 0.05, 16;
    "midwife", 3, 0.0, 20;
    "gravedigger", 3, 0.05, 16;
    "lamplighter", 3, 0.02, 12;
    "farrier", 3, 0.02, 16;
    "tanner", 3, 0.02, 14;
    "thatcher", 3, 0.02, 14;
    "fletcher", 3, 0.02, 14;
    "herbalist", 3, 0.02, 16;
    "ratcatcher", 3, 0.10, 12;
    // Tier 4 — the margins (12)
    "beggar", 4, 0.30, 5;
    "pickpocket", 4, 1.0, 8;
    "thief", 4, 1.0, 10;
    "smuggler", 4, 1.0, 16;
    "fence", 4, 1.0, 18;
    "bandit", 4, 1.0, 14;
    "urchin", 4, 0.40, 5;
    "vagrant", 4, 0.20, 10;
    "scavenger", 4, 0.25, 8;
    "poacher", 4, 0.90, 14;
    "charlatan", 4, 0.85, 16;
    "drifter", 4, 0.15, 12;
];
