//! Player identity, stats, and inventory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An inventory or cell item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub props: ItemProps,
    pub property_revision: u64,
}

/// Slot and rarity properties of an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemProps {
    pub slot: String,
    pub rarity: String,
}

impl Item {
    /// The mergeable gold reward item.
    pub fn gold(amount: u32) -> Self {
        Self {
            id: "gold".to_string(),
            name: format!("{amount} gold"),
            aliases: vec!["gold".to_string(), "coins".to_string()],
            props: ItemProps {
                slot: "pouch".to_string(),
                rarity: "common".to_string(),
            },
            property_revision: u64::from(amount),
        }
    }

    /// Gold amount carried by a gold item, zero for anything else.
    pub fn gold_amount(&self) -> u32 {
        if self.id == "gold" {
            self.property_revision as u32
        } else {
            0
        }
    }
}

/// The player character.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// `stamina` and `clarity`, both in `[0, 100]`.
    pub stats: BTreeMap<String, u32>,
    pub inventory: Vec<Item>,
}

impl Player {
    pub fn new(id: impl Into<String>) -> Self {
        let mut stats = BTreeMap::new();
        stats.insert("stamina".to_string(), 100);
        stats.insert("clarity".to_string(), 100);
        Self {
            id: id.into(),
            aliases: Vec::new(),
            stats,
            inventory: Vec::new(),
        }
    }

    /// Adds gold, merging with an existing gold item if present.
    pub fn add_gold(&mut self, amount: u32) {
        if let Some(gold) = self.inventory.iter_mut().find(|i| i.id == "gold") {
            let total = gold.gold_amount() + amount;
            gold.property_revision = u64::from(total);
            gold.name = format!("{total} gold");
        } else {
            self.inventory.push(Item::gold(amount));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gold_merges_into_existing_item() {
        let mut player = Player::new("player");
        player.add_gold(25);
        player.add_gold(75);
        assert_eq!(player.inventory.len(), 1);
        assert_eq!(player.inventory[0].gold_amount(), 100);
        assert_eq!(player.inventory[0].name, "100 gold");
    }
}
