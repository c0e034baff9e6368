use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Identity and people
define_id!(UserId);
define_id!(CharacterId);
define_id!(GroupId);

// Events and downtime workflow
define_id!(EventId);
define_id!(TicketId);
define_id!(PeriodId);
define_id!(PackId);

// Research graph
define_id!(ResearchId);
define_id!(StageId);
define_id!(RequirementId);
define_id!(EnrollmentId);

// Rules-reference catalog
define_id!(ItemId);
define_id!(BlueprintId);
define_id!(ItemTypeId);
define_id!(ModId);
define_id!(ExoticId);
define_id!(SampleId);
define_id!(ConditionId);
define_id!(CyberneticId);
define_id!(FactionId);
define_id!(SkillId);

// Audit trail
define_id!(AuditEntryId);
