//! In-memory working set for batch processing.
//!
//! The orchestrator loads everything a period's packs can touch, the
//! phases mutate this state as plain functions, and persistence happens
//! once at the end. A failure anywhere aborts the run with nothing
//! written.

use std::collections::HashMap;

use interlude_domain::{
    BlueprintId, Character, CharacterId, CharacterResearch, DowntimePack, DowntimePeriod,
    ExoticId, ExoticSubstance, Group, GroupId, Item, ItemBlueprint, ItemId, ItemType, ItemTypeId,
    Mod, ModId, PackId, Research, ResearchId, ResultEvent, Sample, SampleId, ScienceType,
};

pub struct BatchState {
    pub event_number: i32,
    pub period: DowntimePeriod,
    pub packs: Vec<DowntimePack>,

    pub characters: HashMap<CharacterId, Character>,
    pub groups: HashMap<GroupId, Group>,
    pub items: HashMap<ItemId, Item>,

    pub blueprints: HashMap<BlueprintId, ItemBlueprint>,
    pub item_types: HashMap<ItemTypeId, ItemType>,
    pub mods: HashMap<ModId, Mod>,
    pub exotics: HashMap<ExoticId, ExoticSubstance>,
    pub exotics_by_type: HashMap<ScienceType, Vec<ExoticId>>,
    pub samples: HashMap<SampleId, Sample>,

    pub research: HashMap<ResearchId, Research>,
    pub research_by_public_id: HashMap<String, ResearchId>,
    pub enrollments: HashMap<(CharacterId, ResearchId), CharacterResearch>,

    /// Next free serial per blueprint, advanced as purchases mint items.
    pub next_serials: HashMap<BlueprintId, u32>,
    /// Items bought this run, for engineering orders that reference a
    /// same-downtime purchase by blueprint.
    pub purchased: HashMap<(CharacterId, BlueprintId), ItemId>,

    pub results: HashMap<PackId, Vec<ResultEvent>>,
}

impl BatchState {
    pub fn push_event(&mut self, pack_id: PackId, event: ResultEvent) {
        self.results.entry(pack_id).or_default().push(event);
    }

    /// Withdraw from the character's own funds first, the group account
    /// second. Returns false (with no mutation) when the combined balance
    /// is short.
    pub fn try_withdraw(&mut self, character_id: CharacterId, amount: i64) -> bool {
        let split = {
            let Some(character) = self.characters.get(&character_id) else {
                return false;
            };
            let group = character.group_id.and_then(|g| self.groups.get(&g));
            match character.plan_withdrawal(group, amount) {
                Ok(split) => split,
                Err(_) => return false,
            }
        };

        if let Some(character) = self.characters.get_mut(&character_id) {
            character.bank_account -= split.from_character;
            if split.from_group > 0 {
                if let Some(group) = character
                    .group_id
                    .and_then(|g| self.groups.get_mut(&g))
                {
                    group.bank_account -= split.from_group;
                }
            }
        }
        true
    }

    pub fn item_code(&self, item: &Item) -> String {
        self.blueprints
            .get(&item.blueprint_id)
            .and_then(|blueprint| {
                let item_type = self.item_types.get(&blueprint.item_type_id)?;
                Some(item.full_code(blueprint, item_type))
            })
            .unwrap_or_else(|| item.id.to_string())
    }

    pub fn blueprint_name(&self, blueprint_id: BlueprintId) -> String {
        self.blueprints
            .get(&blueprint_id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| blueprint_id.to_string())
    }

    pub fn mod_name(&self, mod_id: ModId) -> String {
        self.mods
            .get(&mod_id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| mod_id.to_string())
    }

    /// Mint a serial for a blueprint, starting from the loader's value.
    pub fn mint_serial(&mut self, blueprint_id: BlueprintId) -> u32 {
        let serial = self.next_serials.entry(blueprint_id).or_insert(1);
        let minted = *serial;
        *serial += 1;
        minted
    }

    pub fn register_research(&mut self, research: Research) {
        self.research_by_public_id
            .insert(research.public_id.clone(), research.id);
        self.research.insert(research.id, research);
    }

    pub fn find_research_by_public_id(&self, public_id: &str) -> Option<&Research> {
        self.research_by_public_id
            .get(public_id)
            .and_then(|id| self.research.get(id))
    }

    /// Existing public ids, for collision-free generation during review.
    pub fn has_public_id(&self, public_id: &str) -> bool {
        self.research_by_public_id.contains_key(public_id)
    }
}
