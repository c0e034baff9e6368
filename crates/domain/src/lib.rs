//! Core domain model for the downtime resolution service: characters and
//! their funds, the rules-reference catalog, research projects with
//! per-character progress, and the downtime period/pack workflow.
//!
//! This crate is persistence-free. Entities are plain structs with
//! behavior; storage and orchestration live in the engine crate.

pub mod entities;
pub mod error;
pub mod identity;
pub mod ids;
pub mod value_objects;

pub use entities::audit::{AuditAction, AuditEntry, AuditSubject};
pub use entities::catalog::{
    Condition, Cybernetic, ExoticSubstance, Faction, Item, ItemBlueprint, ItemType, Mod, Sample,
    Skill,
};
pub use entities::character::{
    engineering_slots, science_slots, Character, CharacterSkill, EngineeringSlot, FundsSplit,
    ScienceSlot,
};
pub use entities::downtime::{
    DowntimePack, DowntimePeriod, ExoticGrant, PackContents, PackPhase, PeriodStatus,
};
pub use entities::event::{Event, EventTicket};
pub use entities::group::Group;
pub use entities::research::{
    CharacterResearch, Contribution, RequirementKind, RequirementProgress, Research, ResearchKind,
    ResearchStage, ScienceType, StageProgress, StageRequirement,
};
pub use error::DomainError;
pub use identity::{Actor, Role};
pub use ids::*;
pub use value_objects::character_pack::{
    CharacterPack, CompletedDowntime, ExoticHolding, PackMessage,
};
pub use value_objects::declarations::{
    ContributedExotic, ContributionTarget, Declarations, EngineeringOrder, ModificationAction,
    Purchase, ReputationAnswer, ResearchContribution, ScienceOrder,
};
pub use value_objects::results::{
    MaintenanceFailure, ModifyFailure, PurchaseFailure, ResultEvent, TeachFailure,
};
pub use value_objects::review::{
    InventionReview, RequirementSpec, ReputationResponse, ReviewData, StageSpec,
};
