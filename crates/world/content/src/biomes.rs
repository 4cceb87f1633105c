//! Biome detection keywords, terrain palettes, and description templates.
//!
//! Biomes are listed in the canonical enumeration order used to break
//! detection ties: urban, rural, forest, desert, tundra, jungle, coast,
//! mountain, wetland. Keyword sets are deliberately disjoint enough that a
//! coastal prompt mentioning pines is still a coast.

use world_core::catalog::{Biome, BiomeSpec};

pub static BIOMES: [BiomeSpec; 9] = [
    BiomeSpec {
        biome: Biome::Urban,
        keywords: &["city", "urban", "street", "metropol", "slum", "alley"],
        palette: &[
            ("street", "cobbled"),
            ("street", "muddy"),
            ("plaza", "market"),
            ("ruin", "burned"),
            ("yard", "walled"),
            ("row", "tenement"),
        ],
        templates: &[
            "A ${subtype} ${type} hemmed in by leaning facades.",
            "The ${type} here is ${subtype}, loud with passing carts.",
            "A cramped ${subtype} ${type} where washing lines cross overhead.",
            "Soot and handbills mark this ${subtype} ${type}.",
        ],
    },
    BiomeSpec {
        biome: Biome::Rural,
        keywords: &["farm", "field", "pasture", "meadow", "countryside", "hedge"],
        palette: &[
            ("field", "fallow"),
            ("field", "wheat"),
            ("pasture", "grazed"),
            ("orchard", "apple"),
            ("lane", "hedged"),
            ("pond", "mill"),
        ],
        templates: &[
            "A ${subtype} ${type} bounded by a low stone wall.",
            "The ${type} lies ${subtype} under a wide sky.",
            "A ${subtype} ${type}, birdsong and little else.",
            "Cart ruts cut across this ${subtype} ${type}.",
        ],
    },
    BiomeSpec {
        biome: Biome::Forest,
        keywords: &["forest", "wood", "grove", "timber", "glade", "thicket"],
        palette: &[
            ("woods", "oak"),
            ("woods", "birch"),
            ("glade", "mossy"),
            ("thicket", "bramble"),
            ("trail", "deer"),
            ("hollow", "fern"),
        ],
        templates: &[
            "A ${subtype} ${type} where the light falls in narrow blades.",
            "The ${type} is ${subtype} and close; every sound is near.",
            "A quiet ${subtype} ${type}, the floor soft underfoot.",
            "Old growth shadows this ${subtype} ${type}.",
        ],
    },
    BiomeSpec {
        biome: Biome::Desert,
        keywords: &["desert", "dune", "sand", "canyon", "arid", "dry"],
        palette: &[
            ("dunes", "red"),
            ("flat", "salt"),
            ("canyon", "dry"),
            ("scrub", "thorn"),
            ("wash", "gravel"),
            ("mesa", "wind-cut"),
        ],
        templates: &[
            "A ${subtype} ${type} shimmering under the heat.",
            "The ${type} runs ${subtype} to the horizon.",
            "Wind has carved this ${subtype} ${type} into ridges.",
            "A ${subtype} ${type}, silent except for grit on stone.",
        ],
    },
    BiomeSpec {
        biome: Biome::Tundra,
        keywords: &["tundra", "frozen", "ice", "snow", "glacier", "frost"],
        palette: &[
            ("plain", "snow"),
            ("ridge", "wind-scoured"),
            ("lake", "frozen"),
            ("moss", "lichen"),
            ("drift", "deep"),
            ("shelf", "ice"),
        ],
        templates: &[
            "A ${subtype} ${type} under a hard white sky.",
            "The ${type} is ${subtype}; breath hangs in the air.",
            "Crusted snow squeaks across this ${subtype} ${type}.",
            "A ${subtype} ${type} where nothing moves for miles.",
        ],
    },
    BiomeSpec {
        biome: Biome::Jungle,
        keywords: &["jungle", "rainforest", "vine", "tropic", "canopy", "liana"],
        palette: &[
            ("canopy", "triple"),
            ("undergrowth", "vine"),
            ("clearing", "fern"),
            ("river", "brown"),
            ("ruin", "overgrown"),
            ("grove", "fig"),
        ],
        templates: &[
            "A dripping ${subtype} ${type} loud with insects.",
            "The ${type} presses in, ${subtype} and green-dark.",
            "Steam rises off this ${subtype} ${type}.",
            "A ${subtype} ${type}; something calls from the leaves.",
        ],
    },
    BiomeSpec {
        biome: Biome::Coast,
        keywords: &["coast", "shore", "beach", "island", "cliff", "sea", "harbor", "tide"],
        palette: &[
            ("beach", "shingle"),
            ("beach", "sand"),
            ("cliff", "chalk"),
            ("cove", "sheltered"),
            ("headland", "pine"),
            ("flat", "tidal"),
        ],
        templates: &[
            "A ${subtype} ${type} raked by salt wind.",
            "The ${type} is ${subtype}; gulls argue over the wrack line.",
            "Spray reaches even this ${subtype} ${type}.",
            "A ${subtype} ${type} smelling of kelp and tar.",
        ],
    },
    BiomeSpec {
        biome: Biome::Mountain,
        keywords: &["mountain", "peak", "crag", "ridge", "summit", "highland"],
        palette: &[
            ("slope", "scree"),
            ("ridge", "knife"),
            ("col", "wind"),
            ("meadow", "alpine"),
            ("face", "granite"),
            ("tarn", "cold"),
        ],
        templates: &[
            "A ${subtype} ${type} where the air thins.",
            "The ${type} climbs ${subtype} toward the clouds.",
            "Loose stone shifts on this ${subtype} ${type}.",
            "A ${subtype} ${type} with the valley far below.",
        ],
    },
    BiomeSpec {
        biome: Biome::Wetland,
        keywords: &["swamp", "marsh", "bog", "fen", "wetland", "mire"],
        palette: &[
            ("marsh", "reed"),
            ("bog", "peat"),
            ("channel", "slow"),
            ("hummock", "sedge"),
            ("pool", "black"),
            ("causeway", "rotten"),
        ],
        templates: &[
            "A ${subtype} ${type} breathing marsh gas.",
            "The ${type} is ${subtype}; each step finds water.",
            "Midges cloud over this ${subtype} ${type}.",
            "A ${subtype} ${type} laced with standing water.",
        ],
    },
];
