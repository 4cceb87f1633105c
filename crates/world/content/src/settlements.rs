//! Settlement size tables and name pools.

use world_core::catalog::{
    AvailabilitySpec, BuildingNamePool, BuildingPurpose, SettlementKind, SettlementSpec,
};

pub static SETTLEMENTS: [SettlementSpec; 6] = [
    SettlementSpec {
        kind: SettlementKind::Outpost,
        spacing: 1,
        footprint: 1,
        interior_size: 5,
        building_count: 1,
        npc_count: 3,
    },
    SettlementSpec {
        kind: SettlementKind::Hamlet,
        spacing: 2,
        footprint: 1,
        interior_size: 7,
        building_count: 3,
        npc_count: 8,
    },
    SettlementSpec {
        kind: SettlementKind::Village,
        spacing: 2,
        footprint: 1,
        interior_size: 8,
        building_count: 5,
        npc_count: 15,
    },
    SettlementSpec {
        kind: SettlementKind::Town,
        spacing: 3,
        footprint: 1,
        interior_size: 10,
        building_count: 8,
        npc_count: 30,
    },
    SettlementSpec {
        kind: SettlementKind::City,
        spacing: 4,
        footprint: 3,
        interior_size: 14,
        building_count: 14,
        npc_count: 60,
    },
    SettlementSpec {
        kind: SettlementKind::Metropolis,
        spacing: 6,
        footprint: 7,
        interior_size: 18,
        building_count: 22,
        npc_count: 120,
    },
];

/// Quest availability probability ranges per settlement kind.
pub static AVAILABILITY: [AvailabilitySpec; 6] = [
    AvailabilitySpec {
        kind: SettlementKind::Outpost,
        range: (0.05, 0.15),
    },
    AvailabilitySpec {
        kind: SettlementKind::Hamlet,
        range: (0.10, 0.20),
    },
    AvailabilitySpec {
        kind: SettlementKind::Village,
        range: (0.30, 0.40),
    },
    AvailabilitySpec {
        kind: SettlementKind::Town,
        range: (0.50, 0.70),
    },
    AvailabilitySpec {
        kind: SettlementKind::City,
        range: (0.80, 1.00),
    },
    AvailabilitySpec {
        kind: SettlementKind::Metropolis,
        range: (0.80, 1.00),
    },
];

pub static SETTLEMENT_PREFIXES: [&str; 20] = [
    "Ash", "Brack", "Cold", "Dun", "Elm", "Fair", "Gray", "High", "Iron", "Mill", "North", "Oak",
    "Raven", "Salt", "Stone", "Thorn", "West", "Winter", "Wolf", "Marsh",
];

pub static SETTLEMENT_SUFFIXES: [&str; 18] = [
    "brook", "bury", "combe", "dale", "field", "ford", "gate", "ham", "hollow", "march", "mere",
    "moor", "stead", "ton", "vale", "wick", "worth", "haven",
];

pub static BUILDING_NAMES: [BuildingNamePool; 6] = [
    BuildingNamePool {
        purpose: BuildingPurpose::House,
        names: &[
            "the low cottage",
            "the stone house",
            "the crooked house",
            "the widow's house",
            "the long house",
        ],
    },
    BuildingNamePool {
        purpose: BuildingPurpose::Shop,
        names: &[
            "the dry goods shop",
            "the chandlery",
            "the ironmonger",
            "the curio shop",
            "the provisioner",
        ],
    },
    BuildingNamePool {
        purpose: BuildingPurpose::Tavern,
        names: &[
            "the gilded cup",
            "the broken oar",
            "the sleeping hound",
            "the last lantern",
            "the crow and anchor",
        ],
    },
    BuildingNamePool {
        purpose: BuildingPurpose::Temple,
        names: &[
            "the shrine of the hearth",
            "the old chapel",
            "the tide temple",
            "the quiet sanctum",
        ],
    },
    BuildingNamePool {
        purpose: BuildingPurpose::Guildhall,
        names: &[
            "the weavers' hall",
            "the mariners' hall",
            "the masons' lodge",
            "the charter house",
        ],
    },
    BuildingNamePool {
        purpose: BuildingPurpose::Palace,
        names: &["the high seat", "the governor's keep", "the old palace"],
    },
];
