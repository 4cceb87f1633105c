//! The 104-entry NPC trait catalog: 40 positive, 40 negative, 24 neutral.
//!
//! Names are lowercase and globally distinct; both properties are enforced
//! at load time.

use world_core::catalog::{TraitDef, TraitPolarity};

use TraitPolarity::{Negative, Neutral, Positive};

macro_rules! traits {
    ($($name:literal => $polarity:expr),* $(,)?) => {
        [$(TraitDef { name: $name, polarity: $polarity }),*]
    };
}

pub static TRAITS: [TraitDef; 104] = traits![
    // Positive (40)
    "brave" => Positive,
    "honest" => Positive,
    "loyal" => Positive,
    "generous" => Positive,
    "cheerful" => Positive,
    "diligent" => Positive,
    "patient" => Positive,
    "humble" => Positive,
    "kind" => Positive,
    "clever" => Positive,
    "curious" => Positive,
    "gracious" => Positive,
    "steadfast" => Positive,
    "prudent" => Positive,
    "candid" => Positive,
    "merciful" => Positive,
    "devout" => Positive,
    "thrifty" => Positive,
    "hearty" => Positive,
    "witty" => Positive,
    "gentle" => Positive,
    "shrewd" => Positive,
    "earnest" => Positive,
    "valiant" => Positive,
    "amiable" => Positive,
    "stoic" => Positive,
    "fair-minded" => Positive,
    "hospitable" => Positive,
    "industrious" => Positive,
    "resolute" => Positive,
    "perceptive" => Positive,
    "eloquent" => Positive,
    "temperate" => Positive,
    "chivalrous" => Positive,
    "optimistic" => Positive,
    "meticulous" => Positive,
    "selfless" => Positive,
    "discreet" => Positive,
    "adaptable" => Positive,
    "courteous" => Positive,
    // Negative (40)
    "cruel" => Negative,
    "greedy" => Negative,
    "deceitful" => Negative,
    "cowardly" => Negative,
    "lazy" => Negative,
    "arrogant" => Negative,
    "spiteful" => Negative,
    "jealous" => Negative,
    "reckless" => Negative,
    "vengeful" => Negative,
    "gluttonous" => Negative,
    "paranoid" => Negative,
    "callous" => Negative,
    "treacherous" => Negative,
    "petty" => Negative,
    "wrathful" => Negative,
    "slothful" => Negative,
    "miserly" => Negative,
    "vain" => Negative,
    "sullen" => Negative,
    "bitter" => Negative,
    "manipulative" => Negative,
    "craven" => Negative,
    "boorish" => Negative,
    "duplicitous" => Negative,
    "obstinate" => Negative,
    "impatient" => Negative,
    "gloomy" => Negative,
    "scornful" => Negative,
    "tactless" => Negative,
    "belligerent" => Negative,
    "covetous" => Negative,
    "dishonest" => Negative,
    "malicious" => Negative,
    "morose" => Negative,
    "nervous" => Negative,
    "quarrelsome" => Negative,
    "ruthless" => Negative,
    "secretive" => Negative,
    "volatile" => Negative,
    // Neutral (24)
    "quiet" => Neutral,
    "talkative" => Neutral,
    "superstitious" => Neutral,
    "pragmatic" => Neutral,
    "wandering" => Neutral,
    "bookish" => Neutral,
    "blunt" => Neutral,
    "dreamy" => Neutral,
    "formal" => Neutral,
    "frugal" => Neutral,
    "nostalgic" => Neutral,
    "restless" => Neutral,
    "skeptical" => Neutral,
    "solitary" => Neutral,
    "traditional" => Neutral,
    "whimsical" => Neutral,
    "cautious" => Neutral,
    "ambitious" => Neutral,
    "competitive" => Neutral,
    "fatalistic" => Neutral,
    "inquisitive" => Neutral,
    "methodical" => Neutral,
    "private" => Neutral,
    "worldly" => Neutral,
];
