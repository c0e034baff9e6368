//! Append-only audit trail for staff edits to character and group state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{AuditEntryId, CharacterId, GroupId, UserId};

/// What the audited edit touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "subject_type", content = "subject_id", rename_all = "snake_case")]
pub enum AuditSubject {
    Character(CharacterId),
    Group(GroupId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    FundsAdded,
    FundsRemoved,
    FundsSet,
    ConditionChange,
    CyberneticsChange,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FundsAdded => write!(f, "funds_added"),
            Self::FundsRemoved => write!(f, "funds_removed"),
            Self::FundsSet => write!(f, "funds_set"),
            Self::ConditionChange => write!(f, "condition_change"),
            Self::CyberneticsChange => write!(f, "cybernetics_change"),
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "funds_added" => Ok(Self::FundsAdded),
            "funds_removed" => Ok(Self::FundsRemoved),
            "funds_set" => Ok(Self::FundsSet),
            "condition_change" => Ok(Self::ConditionChange),
            "cybernetics_change" => Ok(Self::CyberneticsChange),
            _ => Err(DomainError::parse(format!("Unknown audit action: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub subject: AuditSubject,
    pub actor: UserId,
    pub action: AuditAction,
    pub details: String,
    pub at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        subject: AuditSubject,
        actor: UserId,
        action: AuditAction,
        details: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            subject,
            actor,
            action,
            details,
            at,
        }
    }
}
