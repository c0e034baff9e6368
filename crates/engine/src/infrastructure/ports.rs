//! Port traits for storage and external effects.
//!
//! Use cases depend on these traits, never on concrete adapters. Mocks are
//! generated for tests via mockall.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use interlude_domain::{
    AuditEntry, AuditSubject, BlueprintId, Character, CharacterId, CharacterResearch, Condition, ConditionId,
    Cybernetic, CyberneticId, DowntimePack, DowntimePeriod, Event, EventId, EventTicket, ExoticId,
    ExoticSubstance, Faction, FactionId, Group, GroupId, Item, ItemBlueprint, ItemId, ItemType,
    ItemTypeId, Mod, ModId, PackId, PeriodId, Research, ResearchId, Sample, SampleId, ScienceType,
    Skill, SkillId, UserId,
};

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Business constraint violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl RepoError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn constraint(message: impl ToString) -> Self {
        Self::ConstraintViolation(message.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// =============================================================================
// People
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepo: Send + Sync {
    async fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError>;
    async fn save(&self, character: &Character) -> Result<(), RepoError>;
    async fn list(&self) -> Result<Vec<Character>, RepoError>;
    async fn find_by_player_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Character>, RepoError>;
    async fn list_by_group(&self, group_id: GroupId) -> Result<Vec<Character>, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepo: Send + Sync {
    async fn get(&self, id: GroupId) -> Result<Option<Group>, RepoError>;
    async fn save(&self, group: &Group) -> Result<(), RepoError>;
}

// =============================================================================
// Events
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepo: Send + Sync {
    async fn get(&self, id: EventId) -> Result<Option<Event>, RepoError>;
    /// Event with the highest event number.
    async fn latest(&self) -> Result<Option<Event>, RepoError>;
    async fn save(&self, event: &Event) -> Result<(), RepoError>;

    /// A second ticket for the same (event, character) pair is a
    /// constraint violation.
    async fn save_ticket(&self, ticket: &EventTicket) -> Result<(), RepoError>;
    async fn list_tickets(&self, event_id: EventId) -> Result<Vec<EventTicket>, RepoError>;
}

// =============================================================================
// Rules-reference catalog
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn get_item_type(&self, id: ItemTypeId) -> Result<Option<ItemType>, RepoError>;
    async fn get_blueprint(&self, id: BlueprintId) -> Result<Option<ItemBlueprint>, RepoError>;
    async fn list_blueprints(&self) -> Result<Vec<ItemBlueprint>, RepoError>;
    async fn get_mod(&self, id: ModId) -> Result<Option<Mod>, RepoError>;
    async fn get_exotic(&self, id: ExoticId) -> Result<Option<ExoticSubstance>, RepoError>;
    async fn list_exotics_by_type(
        &self,
        science_type: ScienceType,
    ) -> Result<Vec<ExoticSubstance>, RepoError>;
    async fn get_sample(&self, id: SampleId) -> Result<Option<Sample>, RepoError>;
    async fn save_sample(&self, sample: &Sample) -> Result<(), RepoError>;
    async fn get_condition(&self, id: ConditionId) -> Result<Option<Condition>, RepoError>;
    async fn get_cybernetic(&self, id: CyberneticId) -> Result<Option<Cybernetic>, RepoError>;
    async fn get_skill(&self, id: SkillId) -> Result<Option<Skill>, RepoError>;
    async fn get_faction(&self, id: FactionId) -> Result<Option<Faction>, RepoError>;
}

// =============================================================================
// Physical items
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepo: Send + Sync {
    async fn get(&self, id: ItemId) -> Result<Option<Item>, RepoError>;
    async fn save(&self, item: &Item) -> Result<(), RepoError>;
    async fn list_owned_by(&self, owner: CharacterId) -> Result<Vec<Item>, RepoError>;
    /// Next unused serial for a blueprint, starting at 1.
    async fn next_serial(&self, blueprint_id: BlueprintId) -> Result<u32, RepoError>;
}

// =============================================================================
// Research
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResearchRepo: Send + Sync {
    async fn get(&self, id: ResearchId) -> Result<Option<Research>, RepoError>;
    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<Research>, RepoError>;
    async fn save(&self, research: &Research) -> Result<(), RepoError>;
    async fn list(&self) -> Result<Vec<Research>, RepoError>;

    async fn get_enrollment(
        &self,
        character_id: CharacterId,
        research_id: ResearchId,
    ) -> Result<Option<CharacterResearch>, RepoError>;
    async fn save_enrollment(&self, enrollment: &CharacterResearch) -> Result<(), RepoError>;
    async fn list_enrollments_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<CharacterResearch>, RepoError>;
}

// =============================================================================
// Downtime workflow
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DowntimeRepo: Send + Sync {
    /// The single pending period, if one is open.
    async fn pending_period(&self) -> Result<Option<DowntimePeriod>, RepoError>;
    async fn get_period(&self, id: PeriodId) -> Result<Option<DowntimePeriod>, RepoError>;
    /// Saving a second pending period fails the one-pending invariant.
    async fn save_period(&self, period: &DowntimePeriod) -> Result<(), RepoError>;

    async fn get_pack(&self, id: PackId) -> Result<Option<DowntimePack>, RepoError>;
    async fn save_pack(&self, pack: &DowntimePack) -> Result<(), RepoError>;
    async fn find_pack(
        &self,
        period_id: PeriodId,
        character_id: CharacterId,
    ) -> Result<Option<DowntimePack>, RepoError>;
    async fn list_packs(&self, period_id: PeriodId) -> Result<Vec<DowntimePack>, RepoError>;
}

// =============================================================================
// Audit trail
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepo: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<(), RepoError>;
    async fn list_for_subject(&self, subject: AuditSubject) -> Result<Vec<AuditEntry>, RepoError>;
}

// =============================================================================
// Transactional writes
// =============================================================================

/// Everything a processed downtime period writes back.
#[derive(Debug)]
pub struct BatchWrite {
    pub period: DowntimePeriod,
    pub packs: Vec<DowntimePack>,
    pub characters: Vec<Character>,
    pub groups: Vec<Group>,
    pub items: Vec<Item>,
    pub samples: Vec<Sample>,
    pub research: Vec<Research>,
    pub enrollments: Vec<CharacterResearch>,
}

/// Groups of writes that must land together or not at all. Each method is
/// one database transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// A funds mutation and the audit entry describing it.
    async fn commit_funds(
        &self,
        character: &Character,
        group: Option<Group>,
        entry: &AuditEntry,
    ) -> Result<(), RepoError>;

    /// A confirmed pack-contents entry: the pack, the granted character
    /// and group state, and the audit entries for the grants.
    async fn commit_pack_contents(
        &self,
        pack: &DowntimePack,
        character: &Character,
        group: Option<Group>,
        entries: &[AuditEntry],
    ) -> Result<(), RepoError>;

    /// The full working set of a processed downtime period.
    async fn commit_batch(&self, batch: &BatchWrite) -> Result<(), RepoError>;
}

// =============================================================================
// External effects
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Inclusive range.
    fn gen_range(&self, min: i32, max: i32) -> i32;
    fn gen_uuid(&self) -> Uuid;
}

/// Out-of-band notification to a player (mail, push, whatever the deploy
/// wires in). The default adapter just logs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn notify(&self, user_id: UserId, message: String);
}
