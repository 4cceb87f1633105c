//! Biome detection and world seeding from the opening prompt.

use sha2::{Digest, Sha256};

use crate::catalog::{Biome, Catalogs};

/// Detects the macro biome from a player prompt.
///
/// The prompt is lowercased and scanned against each biome's keyword set in
/// the fixed catalog enumeration order; the first biome with any match wins.
/// A prompt matching nothing falls back to `rural`.
pub fn detect_biome(prompt: &str, catalogs: &Catalogs) -> Biome {
    let haystack = prompt.to_lowercase();
    for spec in catalogs.biomes {
        if spec.keywords.iter().any(|kw| haystack.contains(kw)) {
            return spec.biome;
        }
    }
    Biome::Rural
}

/// Derives a 32-bit non-negative world seed by hashing the prompt.
pub fn seed_from_prompt(prompt: &str) -> u32 {
    let digest = Sha256::digest(prompt.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) & 0x7FFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coast_prompt_detects_coast() {
        let catalogs = world_content::catalogs();
        assert_eq!(
            detect_biome("A windy coast of pine islands.", &catalogs),
            Biome::Coast
        );
    }

    #[test]
    fn first_matching_biome_wins_ties() {
        let catalogs = world_content::catalogs();
        // "city" (urban) precedes "farm" (rural) in enumeration order.
        assert_eq!(
            detect_biome("A city surrounded by farms.", &catalogs),
            Biome::Urban
        );
    }

    #[test]
    fn unmatched_prompt_falls_back_to_rural() {
        let catalogs = world_content::catalogs();
        assert_eq!(detect_biome("xyzzy", &catalogs), Biome::Rural);
    }

    #[test]
    fn prompt_seed_is_stable_and_non_negative() {
        let a = seed_from_prompt("A dry canyon.");
        let b = seed_from_prompt("A dry canyon.");
        assert_eq!(a, b);
        assert!(a <= i32::MAX as u32);
    }
}
