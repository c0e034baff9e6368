//! Downtime periods and per-character packs.
//!
//! A period is opened against an event and resolved as a batch. Each
//! character gets one pack per period; the pack walks a strictly forward
//! state machine as staff and the player fill it in.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{
    CharacterId, ConditionId, CyberneticId, EventId, ExoticId, FactionId, ItemId, PackId, PeriodId,
    SampleId,
};
use crate::value_objects::declarations::Declarations;
use crate::value_objects::results::ResultEvent;
use crate::value_objects::review::ReviewData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for PeriodStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::parse(format!("Unknown period status: {s}"))),
        }
    }
}

/// One downtime window between events. At most one period may be pending
/// at a time; that uniqueness is enforced by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimePeriod {
    pub id: PeriodId,
    pub event_id: EventId,
    pub status: PeriodStatus,
}

impl DowntimePeriod {
    pub fn open(event_id: EventId) -> Self {
        Self {
            id: PeriodId::new(),
            event_id,
            status: PeriodStatus::Pending,
        }
    }

    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status == PeriodStatus::Completed {
            return Err(DomainError::invalid_state_transition(
                "Downtime period is already completed",
            ));
        }
        self.status = PeriodStatus::Completed;
        Ok(())
    }
}

/// Workflow phase of a single character's pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackPhase {
    /// Waiting for staff to enter the physical pack's contents.
    EnterPack,
    /// Waiting for the player to declare downtime activities.
    EnterDowntime,
    /// Waiting for staff review before batch processing.
    ManualReview,
    /// Resolved by batch processing.
    Completed,
}

impl std::fmt::Display for PackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnterPack => write!(f, "enter_pack"),
            Self::EnterDowntime => write!(f, "enter_downtime"),
            Self::ManualReview => write!(f, "manual_review"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for PackPhase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter_pack" => Ok(Self::EnterPack),
            "enter_downtime" => Ok(Self::EnterDowntime),
            "manual_review" => Ok(Self::ManualReview),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::parse(format!("Unknown pack phase: {s}"))),
        }
    }
}

/// A quantity of one exotic substance handed in with the pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExoticGrant {
    pub exotic_id: ExoticId,
    pub amount: u32,
}

/// What came back from the event inside the character's physical pack,
/// entered by staff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackContents {
    pub energy_credits: i64,
    pub items: Vec<ItemId>,
    pub exotics: Vec<ExoticGrant>,
    pub samples: Vec<SampleId>,
    pub conditions: Vec<ConditionId>,
    pub cybernetics: Vec<CyberneticId>,
    pub research_teams: Vec<FactionId>,
}

/// One character's downtime pack within a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimePack {
    pub id: PackId,
    pub period_id: PeriodId,
    pub character_id: CharacterId,
    pub phase: PackPhase,
    pub contents: PackContents,
    pub declarations: Declarations,
    pub review: ReviewData,
    pub results: Vec<ResultEvent>,
}

impl DowntimePack {
    pub fn open(period_id: PeriodId, character_id: CharacterId) -> Self {
        Self {
            id: PackId::new(),
            period_id,
            character_id,
            phase: PackPhase::EnterPack,
            contents: PackContents::default(),
            declarations: Declarations::default(),
            review: ReviewData::default(),
            results: Vec::new(),
        }
    }

    fn require_phase(&self, expected: PackPhase) -> Result<(), DomainError> {
        if self.phase != expected {
            return Err(DomainError::invalid_state_transition(format!(
                "Pack is in phase {}, expected {}",
                self.phase, expected
            )));
        }
        Ok(())
    }

    /// Staff record what the physical pack contained. Confirming moves the
    /// pack to the player-entry phase; without confirmation the contents
    /// stay editable.
    pub fn enter_contents(
        &mut self,
        contents: PackContents,
        confirm: bool,
    ) -> Result<(), DomainError> {
        self.require_phase(PackPhase::EnterPack)?;
        self.contents = contents;
        if confirm {
            self.phase = PackPhase::EnterDowntime;
        }
        Ok(())
    }

    /// The player submits their declared activities. Confirming moves the
    /// pack to staff review; otherwise the declarations are saved and the
    /// pack stays editable.
    pub fn submit_activities(
        &mut self,
        declarations: Declarations,
        confirm: bool,
    ) -> Result<(), DomainError> {
        self.require_phase(PackPhase::EnterDowntime)?;
        self.declarations = declarations;
        if confirm {
            self.phase = PackPhase::ManualReview;
        }
        Ok(())
    }

    /// Staff attach their review decisions. Confirming completes the pack,
    /// making it eligible for batch processing.
    pub fn record_review(&mut self, review: ReviewData, confirm: bool) -> Result<(), DomainError> {
        self.require_phase(PackPhase::ManualReview)?;
        self.review = review;
        if confirm {
            self.phase = PackPhase::Completed;
        }
        Ok(())
    }
}
