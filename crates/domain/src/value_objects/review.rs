//! Staff review decisions attached to a pack before batch processing.

use serde::{Deserialize, Serialize};

use crate::entities::research::{RequirementKind, ResearchKind};
use crate::ids::{FactionId, ResearchId};

/// A requirement to attach to a reviewed stage. The kind's fields are
/// flattened alongside `amount`, so strictness here comes from the kind
/// tag alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementSpec {
    #[serde(flatten)]
    pub kind: RequirementKind,
    pub amount: u32,
}

/// A stage to create from review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageSpec {
    pub stage_number: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<RequirementSpec>,
}

impl StageSpec {
    /// Materialize this spec as a stage with fresh ids.
    pub fn build_stage(&self) -> crate::entities::research::ResearchStage {
        crate::entities::research::ResearchStage {
            id: crate::ids::StageId::new(),
            stage_number: self.stage_number,
            name: self.name.clone(),
            description: self.description.clone(),
            requirements: self
                .requirements
                .iter()
                .map(|spec| crate::entities::research::StageRequirement {
                    id: crate::ids::RequirementId::new(),
                    kind: spec.kind.clone(),
                    amount: spec.amount,
                })
                .collect(),
        }
    }
}

/// Staff verdict on a theorised invention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum InventionReview {
    /// Rejected; the response goes to the player's inbox.
    Declined { response: String },
    /// Approved as a brand-new project the character is enrolled in.
    ApprovedNew {
        name: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        kind: Option<ResearchKind>,
        stages: Vec<StageSpec>,
    },
    /// Approved as a further stage on an existing, fully completed project.
    ApprovedImprovement {
        research_id: ResearchId,
        stage: StageSpec,
    },
}

/// Staff answer to a reputation question, delivered to the player's inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReputationResponse {
    pub faction_id: FactionId,
    pub question: String,
    pub response: String,
}

/// Everything staff recorded while reviewing one pack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewData {
    pub invention: Option<InventionReview>,
    pub reputation_responses: Vec<ReputationResponse>,
}
