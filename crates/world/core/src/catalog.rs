//! Catalog types and load-time validation.
//!
//! Catalogs are static tables loaded once at startup and shared immutably
//! across sessions. The data itself lives in the `world-content` crate; this
//! module owns the shapes and the invariants that make a catalog usable:
//! trait counts and distinctness, the job tier partition, required job
//! fields, and full coverage of the biome and settlement vocabularies.
//!
//! A violated invariant is fatal: [`Catalogs::validate`] returns a
//! [`CatalogError`] and the process must not start serving sessions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::quest::Difficulty;

/// Expected number of NPC traits.
pub const TRAIT_COUNT: usize = 104;
/// Expected trait polarity partition: positive / negative / neutral.
pub const TRAIT_PARTITION: [usize; 3] = [40, 40, 24];
/// Expected number of jobs.
pub const JOB_COUNT: usize = 72;
/// Expected job partition across social tiers 1..=4.
pub const JOB_TIER_PARTITION: [usize; 4] = [11, 22, 27, 12];

/// Behavioral polarity of an NPC trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraitPolarity {
    Positive,
    Negative,
    Neutral,
}

/// A single entry in the NPC trait catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraitDef {
    pub name: &'static str,
    pub polarity: TraitPolarity,
}

/// A job an NPC can hold, bound to one social tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Job {
    pub name: &'static str,
    /// Social tier 1 (elite) through 4 (destitute).
    pub tier: u8,
    /// Probability that a holder of this job is a criminal, in `[0, 1]`.
    pub criminal_weight: f64,
    /// Minimum age required to hold this job.
    pub min_age: u32,
}

impl Job {
    /// Placeholder used when an age filter empties a tier's job pool.
    pub const UNEMPLOYED: Job = Job {
        name: "unemployed",
        tier: 4,
        criminal_weight: 0.0,
        min_age: 0,
    };
}

/// The nine macro biomes, in the fixed enumeration order used to break
/// keyword-detection ties.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Biome {
    Urban,
    Rural,
    Forest,
    Desert,
    Tundra,
    Jungle,
    Coast,
    Mountain,
    Wetland,
}

/// Detection keywords, terrain palette, and description templates for one
/// biome.
///
/// Palette entries are `(type, subtype)` pairs. Templates may reference
/// `${type}` and `${subtype}` placeholders.
#[derive(Clone, Copy, Debug)]
pub struct BiomeSpec {
    pub biome: Biome,
    pub keywords: &'static [&'static str],
    pub palette: &'static [(&'static str, &'static str)],
    pub templates: &'static [&'static str],
}

/// Settlement size classes, smallest to largest.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SettlementKind {
    Outpost,
    Hamlet,
    Village,
    Town,
    City,
    Metropolis,
}

/// Per-kind settlement parameters.
#[derive(Clone, Copy, Debug)]
pub struct SettlementSpec {
    pub kind: SettlementKind,
    /// Chebyshev spacing required between this kind and any other cluster.
    pub spacing: u32,
    /// Number of L1 cells the cluster occupies.
    pub footprint: u32,
    /// Interior grid edge length at L2.
    pub interior_size: u32,
    /// Buildings scattered over the interior.
    pub building_count: u32,
    /// NPC pool size.
    pub npc_count: u32,
}

/// NPC pool size when a settlement kind has no table entry.
pub const DEFAULT_NPC_COUNT: u32 = 10;

/// Building purposes recognized at L3.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BuildingPurpose {
    House,
    Shop,
    Tavern,
    Temple,
    Guildhall,
    Palace,
}

impl BuildingPurpose {
    /// Inclusive room-count range for interiors of this purpose.
    pub fn room_range(self) -> (u32, u32) {
        match self {
            Self::House => (1, 2),
            Self::Shop => (2, 3),
            Self::Tavern => (3, 4),
            Self::Temple => (3, 5),
            Self::Guildhall => (5, 7),
            Self::Palace => (6, 8),
        }
    }
}

/// Name pool for buildings of one purpose.
#[derive(Clone, Copy, Debug)]
pub struct BuildingNamePool {
    pub purpose: BuildingPurpose,
    pub names: &'static [&'static str],
}

/// Per-difficulty quest constraint table.
#[derive(Clone, Copy, Debug)]
pub struct DifficultySpec {
    pub difficulty: Difficulty,
    /// Base weight before the settlement-size modifier.
    pub weight: f64,
    /// Inclusive gold reward range.
    pub gold: (u32, u32),
    /// Inclusive enemy count range.
    pub enemy_count: (u32, u32),
    /// Inclusive travel distance range.
    pub travel: (u32, u32),
    pub allowed_enemies: &'static [&'static str],
    pub forbidden_keywords: &'static [&'static str],
    /// Fallback narrative template with `${settlement}`, `${reward_gold}`,
    /// and `${enemy}` placeholders.
    pub fallback_template: &'static str,
}

/// Quest availability probability range per settlement kind.
#[derive(Clone, Copy, Debug)]
pub struct AvailabilitySpec {
    pub kind: SettlementKind,
    pub range: (f64, f64),
}

/// The full immutable catalog set shared across sessions.
#[derive(Clone, Debug)]
pub struct Catalogs {
    pub traits: &'static [TraitDef],
    pub jobs: &'static [Job],
    pub biomes: &'static [BiomeSpec],
    pub settlements: &'static [SettlementSpec],
    pub settlement_prefixes: &'static [&'static str],
    pub settlement_suffixes: &'static [&'static str],
    pub building_names: &'static [BuildingNamePool],
    pub difficulties: &'static [DifficultySpec],
    pub availability: &'static [AvailabilitySpec],
    /// Settlement-size multipliers applied to difficulty weights, indexed in
    /// [`Difficulty`] order.
    pub size_modifiers: &'static [(SettlementKind, [f64; 5])],
}

impl Catalogs {
    /// Checks every catalog invariant, returning the first violation.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.validate_traits()?;
        self.validate_jobs()?;
        self.validate_biomes()?;
        self.validate_settlements()?;
        self.validate_quests()?;
        Ok(())
    }

    fn validate_traits(&self) -> Result<(), CatalogError> {
        if self.traits.len() != TRAIT_COUNT {
            return Err(CatalogError::TraitCount {
                expected: TRAIT_COUNT,
                actual: self.traits.len(),
            });
        }
        let mut counts = [0usize; 3];
        let mut seen = BTreeSet::new();
        for def in self.traits {
            if def.name.is_empty() || def.name != def.name.to_lowercase() {
                return Err(CatalogError::TraitName(def.name.to_string()));
            }
            if !seen.insert(def.name) {
                return Err(CatalogError::DuplicateTrait(def.name.to_string()));
            }
            counts[def.polarity as usize] += 1;
        }
        if counts != TRAIT_PARTITION {
            return Err(CatalogError::TraitPartition {
                expected: TRAIT_PARTITION,
                actual: counts,
            });
        }
        Ok(())
    }

    fn validate_jobs(&self) -> Result<(), CatalogError> {
        if self.jobs.len() != JOB_COUNT {
            return Err(CatalogError::JobCount {
                expected: JOB_COUNT,
                actual: self.jobs.len(),
            });
        }
        let mut counts = [0usize; 4];
        for job in self.jobs {
            if job.name.is_empty() {
                return Err(CatalogError::JobField {
                    job: job.name.to_string(),
                    field: "name",
                });
            }
            if !(0.0..=1.0).contains(&job.criminal_weight) {
                return Err(CatalogError::JobField {
                    job: job.name.to_string(),
                    field: "criminal_weight",
                });
            }
            match job.tier {
                1..=4 => counts[usize::from(job.tier) - 1] += 1,
                _ => {
                    return Err(CatalogError::JobField {
                        job: job.name.to_string(),
                        field: "tier",
                    });
                }
            }
        }
        if counts != JOB_TIER_PARTITION {
            return Err(CatalogError::JobPartition {
                expected: JOB_TIER_PARTITION,
                actual: counts,
            });
        }
        Ok(())
    }

    fn validate_biomes(&self) -> Result<(), CatalogError> {
        let covered: BTreeSet<Biome> = self.biomes.iter().map(|b| b.biome).collect();
        for biome in Biome::iter() {
            if !covered.contains(&biome) {
                return Err(CatalogError::MissingBiome(biome));
            }
        }
        for spec in self.biomes {
            if spec.keywords.is_empty() || spec.palette.is_empty() || spec.templates.is_empty() {
                return Err(CatalogError::EmptyBiomeSpec(spec.biome));
            }
        }
        Ok(())
    }

    fn validate_settlements(&self) -> Result<(), CatalogError> {
        let covered: BTreeSet<SettlementKind> =
            self.settlements.iter().map(|s| s.kind).collect();
        for kind in SettlementKind::iter() {
            if !covered.contains(&kind) {
                return Err(CatalogError::MissingSettlement(kind));
            }
        }
        if self.settlement_prefixes.is_empty() || self.settlement_suffixes.is_empty() {
            return Err(CatalogError::EmptyNamePool("settlement"));
        }
        for purpose in BuildingPurpose::iter() {
            let pool = self.building_names.iter().find(|p| p.purpose == purpose);
            if pool.is_none_or(|p| p.names.is_empty()) {
                return Err(CatalogError::EmptyNamePool("building"));
            }
        }
        Ok(())
    }

    fn validate_quests(&self) -> Result<(), CatalogError> {
        if self.difficulties.len() != 5 {
            return Err(CatalogError::DifficultyTable);
        }
        for spec in self.difficulties {
            if spec.weight <= 0.0 || spec.allowed_enemies.is_empty() {
                return Err(CatalogError::DifficultyTable);
            }
        }
        Ok(())
    }

    /// Looks up the biome spec for a biome. Valid catalogs cover all nine.
    pub fn biome_spec(&self, biome: Biome) -> &BiomeSpec {
        self.biomes
            .iter()
            .find(|b| b.biome == biome)
            .unwrap_or(&self.biomes[0])
    }

    /// Looks up the settlement spec for a kind.
    pub fn settlement_spec(&self, kind: SettlementKind) -> &SettlementSpec {
        self.settlements
            .iter()
            .find(|s| s.kind == kind)
            .unwrap_or(&self.settlements[0])
    }

    /// Looks up the constraint table for a difficulty.
    pub fn difficulty_spec(&self, difficulty: Difficulty) -> &DifficultySpec {
        self.difficulties
            .iter()
            .find(|d| d.difficulty == difficulty)
            .unwrap_or(&self.difficulties[0])
    }

    /// Jobs belonging to one social tier, in catalog order.
    pub fn jobs_for_tier(&self, tier: u8) -> Vec<&Job> {
        self.jobs.iter().filter(|j| j.tier == tier).collect()
    }
}

/// Fatal catalog violations detected at startup.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("trait catalog has {actual} entries, expected {expected}")]
    TraitCount { expected: usize, actual: usize },

    #[error("trait name {0:?} is empty or not lowercase")]
    TraitName(String),

    #[error("duplicate trait {0:?}")]
    DuplicateTrait(String),

    #[error("trait partition {actual:?} does not match {expected:?}")]
    TraitPartition {
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("job catalog has {actual} entries, expected {expected}")]
    JobCount { expected: usize, actual: usize },

    #[error("job {job:?} has an invalid {field}")]
    JobField { job: String, field: &'static str },

    #[error("job tier partition {actual:?} does not match {expected:?}")]
    JobPartition {
        expected: [usize; 4],
        actual: [usize; 4],
    },

    #[error("biome {0} has no catalog entry")]
    MissingBiome(Biome),

    #[error("biome {0} has an empty keyword, palette, or template table")]
    EmptyBiomeSpec(Biome),

    #[error("settlement kind {0} has no catalog entry")]
    MissingSettlement(SettlementKind),

    #[error("{0} name pool is empty")]
    EmptyNamePool(&'static str),

    #[error("difficulty table is incomplete or has non-positive weights")]
    DifficultyTable,
}
