//! Player-declared downtime activities.
//!
//! Declarations arrive as JSON and are parsed strictly: an unknown action
//! tag or malformed payload rejects the whole submission rather than being
//! silently dropped.

use serde::{Deserialize, Serialize};

use crate::entities::research::ScienceType;
use crate::error::DomainError;
use crate::ids::{BlueprintId, CharacterId, ExoticId, FactionId, ItemId, ModId, SampleId};

/// A request to buy one item from a blueprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Purchase {
    pub blueprint_id: BlueprintId,
}

/// Learning or forgetting an engineering modification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModificationAction {
    Learning { mod_id: ModId },
    Forgetting { mod_id: ModId },
}

/// One engineering downtime slot spent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EngineeringOrder {
    /// Pay upkeep on an owned item to extend its expiry.
    Maintain { item_id: ItemId },
    /// Apply a known mod to an owned item, or to an item purchased this
    /// same downtime referenced by its blueprint.
    Modify {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_id: Option<ItemId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        blueprint_id: Option<BlueprintId>,
        mod_id: ModId,
    },
}

impl EngineeringOrder {
    fn validate(&self) -> Result<(), DomainError> {
        if let Self::Modify {
            item_id,
            blueprint_id,
            ..
        } = self
        {
            match (item_id, blueprint_id) {
                (Some(_), Some(_)) => Err(DomainError::validation(
                    "Modification must target an item or a blueprint, not both",
                )),
                (None, None) => Err(DomainError::validation(
                    "Modification must target an item or a blueprint",
                )),
                _ => Ok(()),
            }
        } else {
            Ok(())
        }
    }
}

/// One science downtime slot spent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScienceOrder {
    /// Produce a random exotic substance of the slot's discipline.
    Synthesize {
        #[serde(default)]
        science_type: ScienceType,
    },
    /// Study a sample held in the character's pack.
    ResearchSample { sample_id: SampleId },
    /// Put the slot towards a research project's current stage.
    ResearchProject {
        /// Public id of the project.
        project: String,
        #[serde(default)]
        science_type: ScienceType,
    },
    /// Pass a completed stage's understanding on to another character.
    TeachInvention {
        project: String,
        student: CharacterId,
    },
    /// Propose a new invention for staff review.
    Theorise { summary: String },
}

/// Who receives a research contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContributionTarget {
    /// The declaring character's own enrollment.
    #[serde(rename = "self")]
    Own,
    /// A named member of the declaring character's group.
    Group { member: CharacterId },
    /// Any character, referenced by printed player reference.
    Other { player: String },
}

/// A quantity of one exotic substance handed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContributedExotic {
    pub exotic_id: ExoticId,
    pub quantity: u32,
}

/// Materials handed over towards a project's current stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResearchContribution {
    /// Public id of the project.
    pub project: String,
    pub target: ContributionTarget,
    #[serde(default)]
    pub exotics: Vec<ContributedExotic>,
    #[serde(default)]
    pub items: Vec<ItemId>,
    #[serde(default)]
    pub samples: Vec<SampleId>,
}

/// A free-text answer to a faction's reputation question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReputationAnswer {
    pub faction_id: FactionId,
    pub question: String,
    pub answer: String,
}

/// The full set of activities a player declares for one downtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Declarations {
    pub modifications: Vec<ModificationAction>,
    pub purchases: Vec<Purchase>,
    pub engineering: Vec<EngineeringOrder>,
    pub science: Vec<ScienceOrder>,
    pub contributions: Vec<ResearchContribution>,
    pub reputation: Vec<ReputationAnswer>,
}

impl Declarations {
    /// Cross-field checks serde cannot express.
    pub fn validate(&self) -> Result<(), DomainError> {
        for order in &self.engineering {
            order.validate()?;
        }
        for contribution in &self.contributions {
            if contribution.exotics.is_empty()
                && contribution.items.is_empty()
                && contribution.samples.is_empty()
            {
                return Err(DomainError::validation(
                    "Research contribution must include at least one material",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_science_orders_by_action_tag() {
        let json = r#"{
            "science": [
                {"action": "synthesize", "science_type": "etheric"},
                {"action": "synthesize"},
                {"action": "research_project", "project": "amber-signal-vault"},
                {"action": "theorise", "summary": "Resonant shielding"}
            ]
        }"#;
        let parsed: Declarations = serde_json::from_str(json).expect("parses");
        assert_eq!(parsed.science.len(), 4);
        assert!(matches!(
            parsed.science[0],
            ScienceOrder::Synthesize {
                science_type: ScienceType::Etheric
            }
        ));
        // Discipline defaults to generic when omitted.
        assert!(matches!(
            parsed.science[1],
            ScienceOrder::Synthesize {
                science_type: ScienceType::Generic
            }
        ));
    }

    #[test]
    fn unknown_action_tag_rejects_submission() {
        let json = r#"{"science": [{"action": "transmute", "summary": "lead to gold"}]}"#;
        assert!(serde_json::from_str::<Declarations>(json).is_err());
    }

    #[test]
    fn unknown_field_on_struct_payload_rejected() {
        let json = r#"{"purchases": [{"blueprint_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "discount": 5}]}"#;
        assert!(serde_json::from_str::<Declarations>(json).is_err());
    }

    #[test]
    fn modify_requires_exactly_one_target() {
        let both = Declarations {
            engineering: vec![EngineeringOrder::Modify {
                item_id: Some(ItemId::new()),
                blueprint_id: Some(BlueprintId::new()),
                mod_id: ModId::new(),
            }],
            ..Declarations::default()
        };
        assert!(both.validate().is_err());

        let neither = Declarations {
            engineering: vec![EngineeringOrder::Modify {
                item_id: None,
                blueprint_id: None,
                mod_id: ModId::new(),
            }],
            ..Declarations::default()
        };
        assert!(neither.validate().is_err());

        let item_only = Declarations {
            engineering: vec![EngineeringOrder::Modify {
                item_id: Some(ItemId::new()),
                blueprint_id: None,
                mod_id: ModId::new(),
            }],
            ..Declarations::default()
        };
        assert!(item_only.validate().is_ok());
    }

    #[test]
    fn empty_contribution_rejected() {
        let declarations = Declarations {
            contributions: vec![ResearchContribution {
                project: "amber-signal-vault".into(),
                target: ContributionTarget::Own,
                exotics: vec![],
                items: vec![],
                samples: vec![],
            }],
            ..Declarations::default()
        };
        assert!(declarations.validate().is_err());
    }

    #[test]
    fn contribution_target_tags() {
        let json = r#"{
            "contributions": [
                {"project": "p", "target": {"kind": "self"}, "items": ["3fa85f64-5717-4562-b3fc-2c963f66afa6"]},
                {"project": "p", "target": {"kind": "other", "player": "12.3"}, "samples": ["3fa85f64-5717-4562-b3fc-2c963f66afa6"]}
            ]
        }"#;
        let parsed: Declarations = serde_json::from_str(json).expect("parses");
        assert!(matches!(parsed.contributions[0].target, ContributionTarget::Own));
        assert!(matches!(
            parsed.contributions[1].target,
            ContributionTarget::Other { .. }
        ));
    }
}
