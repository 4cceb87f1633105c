//! Quest difficulty tables, enemy vocabularies, forbidden keywords, and
//! fallback narrative templates.
//!
//! Every constraint a quest roll draws from lives here. Fallback templates
//! reference only `${settlement}`, `${reward_gold}`, and `${enemy}` so the
//! filled text can never drift outside the rolled constraints.

use world_core::catalog::DifficultySpec;
use world_core::quest::Difficulty;

pub static DIFFICULTIES: [DifficultySpec; 5] = [
    DifficultySpec {
        difficulty: Difficulty::Trivial,
        weight: 0.15,
        gold: (5, 25),
        enemy_count: (0, 1),
        travel: (0, 1),
        allowed_enemies: &["rat", "stray dog", "petty thief"],
        forbidden_keywords: &["dragon", "god", "demon", "lich", "archmage"],
        fallback_template: "Someone in ${settlement} needs a small matter handled: a ${enemy} \
                            has been making a nuisance of itself. They offer ${reward_gold} gold.",
    },
    DifficultySpec {
        difficulty: Difficulty::Easy,
        weight: 0.30,
        gold: (25, 75),
        enemy_count: (0, 2),
        travel: (1, 3),
        allowed_enemies: &["wolf", "bandit", "goblin", "boar"],
        forbidden_keywords: &["dragon", "god", "demon", "lich"],
        fallback_template: "Word in ${settlement} is that a ${enemy} has been troubling the \
                            outlying paths. The purse on offer is ${reward_gold} gold.",
    },
    DifficultySpec {
        difficulty: Difficulty::Moderate,
        weight: 0.35,
        gold: (75, 250),
        enemy_count: (1, 4),
        travel: (2, 5),
        allowed_enemies: &["bandit", "goblin", "ghoul", "mercenary", "giant spider"],
        forbidden_keywords: &["dragon", "god"],
        fallback_template: "A petitioner in ${settlement} lays out the trouble plainly: a ${enemy} \
                            and its kind have dug in nearby, and ${reward_gold} gold awaits \
                            whoever ends it.",
    },
    DifficultySpec {
        difficulty: Difficulty::Hard,
        weight: 0.15,
        gold: (250, 750),
        enemy_count: (2, 6),
        travel: (3, 8),
        allowed_enemies: &["ogre", "troll", "wraith", "cult fanatic", "dire wolf"],
        forbidden_keywords: &["god"],
        fallback_template: "The elders of ${settlement} speak in lowered voices of a ${enemy} \
                            that has claimed the far roads. They have pooled ${reward_gold} gold \
                            for its head.",
    },
    DifficultySpec {
        difficulty: Difficulty::Deadly,
        weight: 0.05,
        gold: (750, 2000),
        enemy_count: (3, 10),
        travel: (5, 12),
        allowed_enemies: &["dragon", "lich", "demon", "elder horror"],
        forbidden_keywords: &[],
        fallback_template: "No one in ${settlement} will say the name of the ${enemy} twice. The \
                            bounty stands at ${reward_gold} gold, unclaimed.",
    },
];

/// Settlement-size multipliers applied to the difficulty weights above,
/// in [`Difficulty`] order. Hamlets and outposts cannot roll deadly.
pub static SIZE_MODIFIERS: [(world_core::SettlementKind, [f64; 5]); 6] = {
    use world_core::SettlementKind::*;
    [
        (Outpost, [1.6, 1.2, 0.6, 0.2, 0.0]),
        (Hamlet, [1.4, 1.3, 0.8, 0.3, 0.0]),
        (Village, [1.0, 1.2, 1.0, 0.6, 0.1]),
        (Town, [0.8, 1.0, 1.2, 0.9, 0.4]),
        (City, [0.5, 0.9, 1.2, 1.1, 0.8]),
        (Metropolis, [0.3, 0.8, 1.1, 1.2, 1.0]),
    ]
};
