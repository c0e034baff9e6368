//! Structured outcomes of batch processing.
//!
//! Every line a player sees in their downtime results is recorded as a
//! typed event with its parameters, so the outcome is queryable and the
//! display text is derived, not stored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ResultEvent {
    ModLearned { mod_name: String },
    ModForgotten { mod_name: String },

    ItemPurchased { item_code: String, blueprint_name: String, cost: i64 },
    PurchaseFailed { blueprint_name: String, cost: i64, reason: PurchaseFailure },

    ItemMaintained { item_code: String, cost: i64, expiry_event: i32 },
    MaintenanceFailed { item_code: String, cost: i64, reason: MaintenanceFailure },

    ModApplied { mod_name: String, item_code: String, cost: i64 },
    ModifyFailed { mod_name: String, item_code: String, reason: ModifyFailure },

    Synthesized { exotic_name: String },
    SynthesisFailed { science_type: String },

    SampleResearched { sample_name: String },
    SampleAlreadyResearched { sample_name: String },
    SampleNotHeld { sample: String },

    ResearchProgress { project_name: String },
    ResearchProgressFailed { project_name: String, science_type: String },
    ResearchAlreadyComplete { project_name: String },
    ResearchNotFound { project: String },

    InventionTaught { project_name: String, student_name: String },
    TeachFailed { project: String, reason: TeachFailure },

    ContributionApplied { project_name: String, material: String },
    ContributionFailed { project_name: String, material: String },

    ProjectCreated { project_name: String, public_id: String },
    ProjectImproved { project_name: String },

    StageCompleted { project_name: String, stage_name: String },
    ProjectCompleted { project_name: String },

    Income { amount: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseFailure {
    InsufficientFunds,
    NotForSale,
    UnknownBlueprint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceFailure {
    InsufficientFunds,
    ItemNotHeld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyFailure {
    InsufficientFunds,
    UnknownModification,
    ItemNotHeld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeachFailure {
    ProjectNotFound,
    TeacherNotEnrolled,
    StageNotCompleted,
    StudentNotFound,
}

impl ResultEvent {
    /// Player-facing line for this event.
    pub fn render(&self) -> String {
        match self {
            Self::ModLearned { mod_name } => format!("Learnt modification {mod_name}"),
            Self::ModForgotten { mod_name } => format!("Forgot modification {mod_name}"),

            Self::ItemPurchased {
                item_code,
                blueprint_name,
                cost,
            } => format!("Purchased {blueprint_name} ({item_code}) for {cost}"),
            Self::PurchaseFailed {
                blueprint_name,
                cost,
                reason,
            } => match reason {
                PurchaseFailure::InsufficientFunds => {
                    format!("Could not purchase {blueprint_name} ({cost}) - insufficient funds")
                }
                PurchaseFailure::NotForSale => {
                    format!("Could not purchase {blueprint_name} - not available for purchase")
                }
                PurchaseFailure::UnknownBlueprint => {
                    format!("Could not purchase {blueprint_name} - no such blueprint")
                }
            },

            Self::ItemMaintained {
                item_code,
                cost,
                expiry_event,
            } => format!("Maintained {item_code} for {cost}, now expires after event {expiry_event}"),
            Self::MaintenanceFailed {
                item_code,
                cost,
                reason,
            } => match reason {
                MaintenanceFailure::InsufficientFunds => {
                    format!("Could not maintain {item_code} ({cost}) - insufficient funds")
                }
                MaintenanceFailure::ItemNotHeld => {
                    format!("Could not maintain {item_code} - item not held")
                }
            },

            Self::ModApplied {
                mod_name,
                item_code,
                cost,
            } => format!("Applied {mod_name} to {item_code} for {cost}"),
            Self::ModifyFailed {
                mod_name,
                item_code,
                reason,
            } => match reason {
                ModifyFailure::InsufficientFunds => {
                    format!("Could not apply {mod_name} to {item_code} - insufficient funds")
                }
                ModifyFailure::UnknownModification => {
                    format!("Could not apply {mod_name} to {item_code} - modification not known")
                }
                ModifyFailure::ItemNotHeld => {
                    format!("Could not apply {mod_name} to {item_code} - item not held")
                }
            },

            Self::Synthesized { exotic_name } => format!("Synthesized {exotic_name}"),
            Self::SynthesisFailed { science_type } => {
                format!("Could not synthesize - no {science_type} substances exist")
            }

            Self::SampleResearched { sample_name } => format!("Researched sample {sample_name}"),
            Self::SampleAlreadyResearched { sample_name } => {
                format!("Sample {sample_name} has already been researched")
            }
            Self::SampleNotHeld { sample } => {
                format!("Could not research sample {sample} - not in your pack")
            }

            Self::ResearchProgress { project_name } => {
                format!("Progressed research on {project_name}")
            }
            Self::ResearchProgressFailed {
                project_name,
                science_type,
            } => format!("{project_name} has no outstanding {science_type} science requirement"),
            Self::ResearchAlreadyComplete { project_name } => {
                format!("Research on {project_name} is already complete")
            }
            Self::ResearchNotFound { project } => {
                format!("No research project found for {project}")
            }

            Self::InventionTaught {
                project_name,
                student_name,
            } => format!("Taught {project_name} to {student_name}"),
            Self::TeachFailed { project, reason } => match reason {
                TeachFailure::ProjectNotFound => {
                    format!("Could not teach {project} - project not found")
                }
                TeachFailure::TeacherNotEnrolled => {
                    format!("Could not teach {project} - you are not enrolled")
                }
                TeachFailure::StageNotCompleted => {
                    format!("Could not teach {project} - you have not completed a stage")
                }
                TeachFailure::StudentNotFound => {
                    format!("Could not teach {project} - student not found")
                }
            },

            Self::ContributionApplied {
                project_name,
                material,
            } => format!("Contributed {material} to {project_name}"),
            Self::ContributionFailed {
                project_name,
                material,
            } => format!("{material} did not match any outstanding requirement of {project_name}"),

            Self::ProjectCreated {
                project_name,
                public_id,
            } => format!("New research project {project_name} created ({public_id})"),
            Self::ProjectImproved { project_name } => {
                format!("A further stage has been added to {project_name}")
            }

            Self::StageCompleted {
                project_name,
                stage_name,
            } => format!("Completed stage {stage_name} of {project_name}"),
            Self::ProjectCompleted { project_name } => {
                format!("Completed research project {project_name}")
            }

            Self::Income { amount } => format!("Received {amount} energy credits income"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_purchase_outcomes() {
        let bought = ResultEvent::ItemPurchased {
            item_code: "W0042-007".into(),
            blueprint_name: "Pulse Carbine".into(),
            cost: 10,
        };
        assert_eq!(bought.render(), "Purchased Pulse Carbine (W0042-007) for 10");

        let failed = ResultEvent::PurchaseFailed {
            blueprint_name: "Pulse Carbine".into(),
            cost: 15,
            reason: PurchaseFailure::InsufficientFunds,
        };
        assert_eq!(
            failed.render(),
            "Could not purchase Pulse Carbine (15) - insufficient funds"
        );

        let unknown = ResultEvent::PurchaseFailed {
            blueprint_name: "Pulse Carbine".into(),
            cost: 0,
            reason: PurchaseFailure::UnknownBlueprint,
        };
        assert_eq!(
            unknown.render(),
            "Could not purchase Pulse Carbine - no such blueprint"
        );
    }

    #[test]
    fn missing_targets_render_their_own_lines() {
        let maintain = ResultEvent::MaintenanceFailed {
            item_code: "W0042-007".into(),
            cost: 0,
            reason: MaintenanceFailure::ItemNotHeld,
        };
        assert_eq!(
            maintain.render(),
            "Could not maintain W0042-007 - item not held"
        );

        let sample = ResultEvent::SampleNotHeld {
            sample: "Xeno Flora".into(),
        };
        assert_eq!(
            sample.render(),
            "Could not research sample Xeno Flora - not in your pack"
        );
    }

    #[test]
    fn serializes_with_code_tag() {
        let event = ResultEvent::Income { amount: 30 };
        let json = serde_json::to_value(&event).expect("serializes");
        assert_eq!(json["code"], "income");
        assert_eq!(json["amount"], 30);
    }

    #[test]
    fn modify_failure_reasons_render_distinctly() {
        let funds = ResultEvent::ModifyFailed {
            mod_name: "Overclock".into(),
            item_code: "W0042-007".into(),
            reason: ModifyFailure::InsufficientFunds,
        };
        let unknown = ResultEvent::ModifyFailed {
            mod_name: "Overclock".into(),
            item_code: "W0042-007".into(),
            reason: ModifyFailure::UnknownModification,
        };
        assert!(funds.render().contains("insufficient funds"));
        assert!(unknown.render().contains("not known"));
    }
}
