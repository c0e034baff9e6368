//! Rules-reference catalog: item types, blueprints, physical items,
//! modifications, exotic substances, samples, conditions, cybernetics,
//! skills, and factions.

use serde::{Deserialize, Serialize};

use crate::entities::research::ScienceType;
use crate::ids::{
    BlueprintId, CharacterId, ConditionId, CyberneticId, ExoticId, FactionId, ItemId, ItemTypeId,
    ModId, SampleId, SkillId,
};

/// Cost growth base for applied modifications. Each mod multiplies the
/// effective cost by e^(1/2.5).
const MOD_COST_DIVISOR: f64 = 2.5;

fn effective_cost(base_cost: i64, mods_applied: usize) -> i64 {
    let scaled = (base_cost as f64) * (mods_applied as f64 / MOD_COST_DIVISOR).exp();
    scaled.ceil() as i64
}

fn maintenance_cost(effective: i64) -> i64 {
    ((effective as f64) * 0.1).ceil() as i64
}

fn modification_cost(effective: i64) -> i64 {
    ((effective as f64) * 0.5).ceil() as i64
}

/// A category of item, carrying the prefix used in printed codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemType {
    pub id: ItemTypeId,
    pub name: String,
    /// Short prefix for item codes, e.g. "W" for weapons.
    pub id_prefix: String,
}

/// A purchasable design. The blueprint code is the numeric part of the
/// printed item code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBlueprint {
    pub id: BlueprintId,
    pub name: String,
    pub item_type_id: ItemTypeId,
    pub blueprint_code: u32,
    pub base_cost: i64,
    pub purchaseable: bool,
}

impl ItemBlueprint {
    /// Printed code of the blueprint, e.g. "W0042".
    pub fn full_code(&self, item_type: &ItemType) -> String {
        format!("{}{:04}", item_type.id_prefix, self.blueprint_code)
    }

    /// Purchase price including any pre-applied mods.
    pub fn cost(&self, mods_applied: usize) -> i64 {
        effective_cost(self.base_cost, mods_applied)
    }
}

/// A physical item held by a character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub blueprint_id: BlueprintId,
    pub owner: Option<CharacterId>,
    /// Per-blueprint serial, the suffix of the printed code.
    pub serial: u32,
    /// Event number after which the item lapses without maintenance.
    pub expiry_event: i32,
    pub mods_applied: Vec<ModId>,
}

impl Item {
    pub fn new(blueprint_id: BlueprintId, serial: u32, expiry_event: i32) -> Self {
        Self {
            id: ItemId::new(),
            blueprint_id,
            owner: None,
            serial,
            expiry_event,
            mods_applied: Vec::new(),
        }
    }

    /// Printed code of this item, e.g. "W0042-007".
    pub fn full_code(&self, blueprint: &ItemBlueprint, item_type: &ItemType) -> String {
        format!("{}-{:03}", blueprint.full_code(item_type), self.serial)
    }

    /// Current effective cost given the mods applied so far.
    pub fn effective_cost(&self, blueprint: &ItemBlueprint) -> i64 {
        effective_cost(blueprint.base_cost, self.mods_applied.len())
    }

    /// Per-downtime upkeep, 10% of effective cost rounded up.
    pub fn maintenance_cost(&self, blueprint: &ItemBlueprint) -> i64 {
        maintenance_cost(self.effective_cost(blueprint))
    }

    /// Cost of applying one further mod, 50% of effective cost rounded up.
    pub fn modification_cost(&self, blueprint: &ItemBlueprint) -> i64 {
        modification_cost(self.effective_cost(blueprint))
    }
}

/// An engineering modification that can be learned and applied to items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mod {
    pub id: ModId,
    pub name: String,
    pub description: Option<String>,
}

/// A synthesizable or lootable exotic substance, typed by discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExoticSubstance {
    pub id: ExoticId,
    pub name: String,
    pub science_type: ScienceType,
}

/// A collectible sample. Tags drive requirement matching; `is_researched`
/// flips once any character has studied it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    pub name: String,
    pub tags: Vec<String>,
    pub is_researched: bool,
}

/// A character condition applied and cleared by staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    pub name: String,
    pub description: Option<String>,
}

/// An installed augment. May grant extra downtime slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cybernetic {
    pub id: CyberneticId,
    pub name: String,
    pub adds_science_downtime: u32,
    pub science_type: Option<ScienceType>,
    pub adds_engineering_downtime: u32,
}

/// A purchasable character skill. May grant extra downtime slots per
/// purchase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub adds_science_downtime: u32,
    pub science_type: Option<ScienceType>,
    pub adds_engineering_downtime: u32,
}

/// An in-game faction. Research-team factions grant a generic science
/// slot to members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub is_research_team: bool,
}
