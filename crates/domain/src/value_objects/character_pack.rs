//! The character's persistent pack: everything they carry between events.

use serde::{Deserialize, Serialize};

use crate::ids::{ExoticId, FactionId, ItemId, PackId, SampleId};
use crate::value_objects::results::ResultEvent;

/// A held quantity of one exotic substance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExoticHolding {
    pub exotic_id: ExoticId,
    pub amount: u32,
}

/// A message delivered into the pack for the player to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PackMessage {
    InventionDeclined {
        summary: String,
        response: String,
    },
    ReputationResponse {
        faction_id: FactionId,
        question: String,
        response: String,
    },
}

/// Results of one resolved downtime, kept for the player to review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedDowntime {
    pub pack_id: PackId,
    pub results: Vec<ResultEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterPack {
    pub items: Vec<ItemId>,
    pub exotics: Vec<ExoticHolding>,
    pub samples: Vec<SampleId>,
    /// Physical currency waiting to be handed over at the next event.
    pub chits: i64,
    pub messages: Vec<PackMessage>,
    pub downtime_results: Vec<CompletedDowntime>,
}

impl CharacterPack {
    pub fn add_item(&mut self, item_id: ItemId) {
        if !self.items.contains(&item_id) {
            self.items.push(item_id);
        }
    }

    pub fn has_item(&self, item_id: ItemId) -> bool {
        self.items.contains(&item_id)
    }

    pub fn remove_item(&mut self, item_id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| *i != item_id);
        self.items.len() != before
    }

    /// Merge a quantity into the holding for this substance.
    pub fn add_exotic(&mut self, exotic_id: ExoticId, amount: u32) {
        if amount == 0 {
            return;
        }
        match self.exotics.iter_mut().find(|e| e.exotic_id == exotic_id) {
            Some(holding) => holding.amount += amount,
            None => self.exotics.push(ExoticHolding { exotic_id, amount }),
        }
    }

    pub fn exotic_amount(&self, exotic_id: ExoticId) -> u32 {
        self.exotics
            .iter()
            .find(|e| e.exotic_id == exotic_id)
            .map_or(0, |e| e.amount)
    }

    /// Remove up to `amount` of a substance; fails without change when the
    /// holding is short. Empty holdings are dropped.
    pub fn remove_exotic(&mut self, exotic_id: ExoticId, amount: u32) -> bool {
        let Some(holding) = self.exotics.iter_mut().find(|e| e.exotic_id == exotic_id) else {
            return false;
        };
        if holding.amount < amount {
            return false;
        }
        holding.amount -= amount;
        self.exotics.retain(|e| e.amount > 0);
        true
    }

    pub fn add_sample(&mut self, sample_id: SampleId) {
        if !self.samples.contains(&sample_id) {
            self.samples.push(sample_id);
        }
    }

    pub fn has_sample(&self, sample_id: SampleId) -> bool {
        self.samples.contains(&sample_id)
    }

    pub fn remove_sample(&mut self, sample_id: SampleId) -> bool {
        let before = self.samples.len();
        self.samples.retain(|s| *s != sample_id);
        self.samples.len() != before
    }

    pub fn add_chits(&mut self, amount: i64) {
        self.chits += amount;
    }

    pub fn add_message(&mut self, message: PackMessage) {
        self.messages.push(message);
    }

    pub fn add_downtime_results(&mut self, pack_id: PackId, results: Vec<ResultEvent>) {
        self.downtime_results.push(CompletedDowntime { pack_id, results });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exotics_merge_and_deplete() {
        let mut pack = CharacterPack::default();
        let exotic = ExoticId::new();

        pack.add_exotic(exotic, 2);
        pack.add_exotic(exotic, 3);
        assert_eq!(pack.exotic_amount(exotic), 5);

        assert!(!pack.remove_exotic(exotic, 6));
        assert_eq!(pack.exotic_amount(exotic), 5);

        assert!(pack.remove_exotic(exotic, 5));
        assert_eq!(pack.exotic_amount(exotic), 0);
        assert!(pack.exotics.is_empty());
    }

    #[test]
    fn items_and_samples_deduplicate() {
        let mut pack = CharacterPack::default();
        let item = ItemId::new();
        let sample = SampleId::new();

        pack.add_item(item);
        pack.add_item(item);
        pack.add_sample(sample);
        pack.add_sample(sample);

        assert_eq!(pack.items.len(), 1);
        assert_eq!(pack.samples.len(), 1);

        assert!(pack.remove_item(item));
        assert!(!pack.remove_item(item));
        assert!(pack.remove_sample(sample));
        assert!(!pack.has_sample(sample));
    }
}
