//! Research projects and per-character progress.
//!
//! A `Research` project is an ordered ladder of stages, each gated by typed
//! unlock requirements. A character's participation is tracked separately
//! per character as a `CharacterResearch` enrollment owning one
//! `StageProgress` row per attempted stage; `current_stage_id == None`
//! means the character has finished every stage.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{
    CharacterId, EnrollmentId, ExoticId, ItemTypeId, RequirementId, ResearchId, StageId,
};

/// Science disciplines used for slots, synthesis, and requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScienceType {
    #[default]
    Generic,
    Life,
    Corporeal,
    Etheric,
}

impl std::fmt::Display for ScienceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Life => write!(f, "life"),
            Self::Corporeal => write!(f, "corporeal"),
            Self::Etheric => write!(f, "etheric"),
        }
    }
}

impl std::str::FromStr for ScienceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            "life" => Ok(Self::Life),
            "corporeal" => Ok(Self::Corporeal),
            "etheric" => Ok(Self::Etheric),
            _ => Err(DomainError::parse(format!("Unknown science type: {s}"))),
        }
    }
}

/// What kind of project this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchKind {
    Invention,
    Artefact,
}

impl std::fmt::Display for ResearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invention => write!(f, "invention"),
            Self::Artefact => write!(f, "artefact"),
        }
    }
}

impl std::str::FromStr for ResearchKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invention" => Ok(Self::Invention),
            "artefact" => Ok(Self::Artefact),
            _ => Err(DomainError::parse(format!("Unknown research kind: {s}"))),
        }
    }
}

/// A typed, quantified unlock condition on a research stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRequirement {
    pub id: RequirementId,
    pub kind: RequirementKind,
    pub amount: u32,
}

/// The matchable part of a requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "requirement_type", rename_all = "snake_case")]
pub enum RequirementKind {
    Science { science_type: ScienceType },
    Item { item_type: ItemTypeId },
    Exotic { exotic_id: ExoticId },
    Sample { tag: String, requires_researched: bool },
}

/// One discrete contribution unit offered against a stage's requirements.
#[derive(Debug, Clone)]
pub enum Contribution {
    Science(ScienceType),
    Item(ItemTypeId),
    Exotic(ExoticId),
    Sample { tags: Vec<String>, researched: bool },
}

impl RequirementKind {
    fn matches(&self, contribution: &Contribution) -> bool {
        match (self, contribution) {
            (Self::Science { science_type }, Contribution::Science(offered)) => {
                science_type == offered
            }
            (Self::Item { item_type }, Contribution::Item(offered)) => item_type == offered,
            (Self::Exotic { exotic_id }, Contribution::Exotic(offered)) => exotic_id == offered,
            (
                Self::Sample {
                    tag,
                    requires_researched,
                },
                Contribution::Sample { tags, researched },
            ) => tags.iter().any(|t| t == tag) && (!requires_researched || *researched),
            _ => false,
        }
    }
}

/// One gated step of a research project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchStage {
    pub id: StageId,
    pub stage_number: u32,
    pub name: String,
    pub description: Option<String>,
    pub requirements: Vec<StageRequirement>,
}

/// A research project definition. Stage numbers are unique within a
/// project; requirements are immutable once created (growth happens by
/// appending stages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Research {
    pub id: ResearchId,
    /// Human-memorable identifier used in player declarations.
    pub public_id: String,
    pub name: String,
    pub kind: ResearchKind,
    pub description: Option<String>,
    pub stages: Vec<ResearchStage>,
}

impl Research {
    pub fn new(public_id: String, name: String, kind: ResearchKind) -> Self {
        Self {
            id: ResearchId::new(),
            public_id,
            name,
            kind,
            description: None,
            stages: Vec::new(),
        }
    }

    /// Lowest-numbered stage, if any exist.
    pub fn first_stage(&self) -> Option<&ResearchStage> {
        self.stages.iter().min_by_key(|s| s.stage_number)
    }

    pub fn stage(&self, id: StageId) -> Option<&ResearchStage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Next stage strictly after the given number, in ascending order.
    pub fn next_stage_after(&self, stage_number: u32) -> Option<&ResearchStage> {
        self.stages
            .iter()
            .filter(|s| s.stage_number > stage_number)
            .min_by_key(|s| s.stage_number)
    }

    /// Previous stage strictly before the given number.
    pub fn prev_stage_before(&self, stage_number: u32) -> Option<&ResearchStage> {
        self.stages
            .iter()
            .filter(|s| s.stage_number < stage_number)
            .max_by_key(|s| s.stage_number)
    }

    /// Append a stage, enforcing unique stage numbers.
    pub fn add_stage(&mut self, stage: ResearchStage) -> Result<(), DomainError> {
        if self.stages.iter().any(|s| s.stage_number == stage.stage_number) {
            return Err(DomainError::constraint(format!(
                "Stage number {} already exists in project {}",
                stage.stage_number, self.name
            )));
        }
        self.stages.push(stage);
        Ok(())
    }

    pub fn highest_stage_number(&self) -> u32 {
        self.stages.iter().map(|s| s.stage_number).max().unwrap_or(0)
    }
}

/// Progress against a single requirement of a stage. Carries a copy of the
/// requirement definition so matching needs no extra lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementProgress {
    pub requirement: StageRequirement,
    pub progress: u32,
}

/// A character's attempt at one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage_id: StageId,
    pub completed: bool,
    pub requirements: Vec<RequirementProgress>,
}

impl StageProgress {
    fn for_stage(stage: &ResearchStage) -> Self {
        Self {
            stage_id: stage.id,
            completed: false,
            requirements: stage
                .requirements
                .iter()
                .map(|r| RequirementProgress {
                    requirement: r.clone(),
                    progress: 0,
                })
                .collect(),
        }
    }

    /// True iff every requirement's counter has reached its target.
    pub fn meets_requirements(&self) -> bool {
        self.requirements
            .iter()
            .all(|r| r.progress >= r.requirement.amount)
    }

    /// `floor(100 * sum(min(progress, amount)) / sum(amount))`, 0 when the
    /// stage has no requirements.
    pub fn progress_percent(&self) -> u32 {
        let total: u64 = self
            .requirements
            .iter()
            .map(|r| u64::from(r.requirement.amount))
            .sum();
        if total == 0 {
            return 0;
        }
        let done: u64 = self
            .requirements
            .iter()
            .map(|r| u64::from(r.progress.min(r.requirement.amount)))
            .sum();
        (done * 100 / total) as u32
    }

    /// Apply `quantity` units of a contribution to the first matching
    /// requirement whose counter is still below target. At most one
    /// requirement row absorbs the contribution. Returns false when no
    /// requirement matched.
    pub fn apply_contribution(&mut self, contribution: &Contribution, quantity: u32) -> bool {
        for req in &mut self.requirements {
            if req.requirement.kind.matches(contribution) && req.progress < req.requirement.amount {
                req.progress += quantity;
                return true;
            }
        }
        false
    }

    /// Mark every requirement fully satisfied (used when a completed stage
    /// is taught to another character).
    pub fn satisfy_all(&mut self) {
        for req in &mut self.requirements {
            req.progress = req.requirement.amount;
        }
    }
}

/// One character's enrollment in one project, owning its stage-progress
/// rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterResearch {
    pub id: EnrollmentId,
    pub character_id: CharacterId,
    pub research_id: ResearchId,
    pub current_stage_id: Option<StageId>,
    pub progress: Vec<StageProgress>,
}

impl CharacterResearch {
    /// Enroll a character: progress rows for the lowest-numbered stage are
    /// created zeroed and made current. A project with no stages enrolls as
    /// already complete.
    pub fn enroll(research: &Research, character_id: CharacterId) -> Self {
        let mut enrollment = Self {
            id: EnrollmentId::new(),
            character_id,
            research_id: research.id,
            current_stage_id: None,
            progress: Vec::new(),
        };
        if let Some(first) = research.first_stage() {
            enrollment.progress.push(StageProgress::for_stage(first));
            enrollment.current_stage_id = Some(first.id);
        }
        enrollment
    }

    /// The project is finished for this character.
    pub fn is_complete(&self) -> bool {
        self.current_stage_id.is_none()
    }

    pub fn current_stage(&self) -> Option<&StageProgress> {
        let current = self.current_stage_id?;
        self.progress.iter().find(|p| p.stage_id == current)
    }

    pub fn current_stage_mut(&mut self) -> Option<&mut StageProgress> {
        let current = self.current_stage_id?;
        self.progress.iter_mut().find(|p| p.stage_id == current)
    }

    /// Has this character completed the given stage?
    pub fn has_completed_stage(&self, stage_id: StageId) -> bool {
        self.progress
            .iter()
            .any(|p| p.stage_id == stage_id && p.completed)
    }

    /// Mark the current stage complete and move to the next-numbered stage,
    /// creating its zeroed progress rows. Returns the new current stage id,
    /// or None when the project is now finished for this character.
    pub fn advance_stage(&mut self, research: &Research) -> Result<Option<StageId>, DomainError> {
        let current_id = self.current_stage_id.ok_or_else(|| {
            DomainError::invalid_state_transition("Cannot advance a completed enrollment")
        })?;
        let current_number = research
            .stage(current_id)
            .ok_or_else(|| DomainError::not_found("ResearchStage", current_id.to_string()))?
            .stage_number;

        if let Some(progress) = self.current_stage_mut() {
            progress.completed = true;
        }

        match research.next_stage_after(current_number) {
            Some(next) => {
                self.progress.push(StageProgress::for_stage(next));
                self.current_stage_id = Some(next.id);
                Ok(Some(next.id))
            }
            None => {
                self.current_stage_id = None;
                Ok(None)
            }
        }
    }

    /// Inverse of `advance_stage`, used for staff correction: delete the
    /// current stage's progress, zero and un-complete the previous stage,
    /// and make it current again. Returns the restored stage id, or None if
    /// there is no previous stage to fall back to.
    pub fn regress_stage(&mut self, research: &Research) -> Result<Option<StageId>, DomainError> {
        let current_id = self.current_stage_id.ok_or_else(|| {
            DomainError::invalid_state_transition("Cannot regress a completed enrollment")
        })?;
        let current_number = research
            .stage(current_id)
            .ok_or_else(|| DomainError::not_found("ResearchStage", current_id.to_string()))?
            .stage_number;

        let Some(prev) = research.prev_stage_before(current_number) else {
            return Ok(None);
        };

        self.progress.retain(|p| p.stage_id != current_id);
        if let Some(prev_progress) = self.progress.iter_mut().find(|p| p.stage_id == prev.id) {
            prev_progress.completed = false;
            for req in &mut prev_progress.requirements {
                req.progress = 0;
            }
        }
        self.current_stage_id = Some(prev.id);
        Ok(Some(prev.id))
    }

    /// Begin a freshly appended stage (used by the "improve project" review
    /// outcome after the character has finished every prior stage).
    pub fn start_stage(&mut self, stage: &ResearchStage) {
        self.progress.push(StageProgress::for_stage(stage));
        self.current_stage_id = Some(stage.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(kind: RequirementKind, amount: u32) -> StageRequirement {
        StageRequirement {
            id: RequirementId::new(),
            kind,
            amount,
        }
    }

    fn two_stage_project() -> Research {
        let mut research = Research::new(
            "amber-signal-vault".into(),
            "Etheric Resonator".into(),
            ResearchKind::Invention,
        );
        research
            .add_stage(ResearchStage {
                id: StageId::new(),
                stage_number: 1,
                name: "Theory".into(),
                description: None,
                requirements: vec![requirement(
                    RequirementKind::Science {
                        science_type: ScienceType::Generic,
                    },
                    3,
                )],
            })
            .expect("stage 1");
        research
            .add_stage(ResearchStage {
                id: StageId::new(),
                stage_number: 2,
                name: "Prototype".into(),
                description: None,
                requirements: vec![requirement(
                    RequirementKind::Science {
                        science_type: ScienceType::Etheric,
                    },
                    1,
                )],
            })
            .expect("stage 2");
        research
    }

    #[test]
    fn enroll_starts_at_lowest_stage_with_zeroed_progress() {
        let research = two_stage_project();
        let enrollment = CharacterResearch::enroll(&research, CharacterId::new());

        let first = research.first_stage().expect("has stages");
        assert_eq!(enrollment.current_stage_id, Some(first.id));
        let stage = enrollment.current_stage().expect("current stage");
        assert!(!stage.completed);
        assert!(stage.requirements.iter().all(|r| r.progress == 0));
    }

    #[test]
    fn duplicate_stage_numbers_rejected() {
        let mut research = two_stage_project();
        let err = research.add_stage(ResearchStage {
            id: StageId::new(),
            stage_number: 2,
            name: "Duplicate".into(),
            description: None,
            requirements: vec![],
        });
        assert!(err.is_err());
    }

    #[test]
    fn contribution_applies_to_first_unmet_matching_requirement() {
        let research = two_stage_project();
        let mut enrollment = CharacterResearch::enroll(&research, CharacterId::new());

        let stage = enrollment.current_stage_mut().expect("current");
        assert!(stage.apply_contribution(&Contribution::Science(ScienceType::Generic), 1));
        assert_eq!(stage.requirements[0].progress, 1);
        // Wrong discipline does not match.
        assert!(!stage.apply_contribution(&Contribution::Science(ScienceType::Life), 1));
    }

    #[test]
    fn meets_requirements_and_advance() {
        let research = two_stage_project();
        let mut enrollment = CharacterResearch::enroll(&research, CharacterId::new());

        for _ in 0..3 {
            let stage = enrollment.current_stage_mut().expect("current");
            stage.apply_contribution(&Contribution::Science(ScienceType::Generic), 1);
        }
        assert!(enrollment.current_stage().expect("current").meets_requirements());

        let next = enrollment.advance_stage(&research).expect("advance");
        assert!(next.is_some());
        assert_eq!(enrollment.current_stage_id, next);
        let stage2 = enrollment.current_stage().expect("stage 2");
        assert!(stage2.requirements.iter().all(|r| r.progress == 0));
    }

    #[test]
    fn advancing_past_last_stage_completes_the_project() {
        let research = two_stage_project();
        let mut enrollment = CharacterResearch::enroll(&research, CharacterId::new());

        enrollment.advance_stage(&research).expect("to stage 2");
        let done = enrollment.advance_stage(&research).expect("finish");
        assert!(done.is_none());
        assert!(enrollment.is_complete());
        assert!(enrollment.advance_stage(&research).is_err());
    }

    #[test]
    fn advance_then_regress_restores_prior_stage_zeroed() {
        let research = two_stage_project();
        let mut enrollment = CharacterResearch::enroll(&research, CharacterId::new());
        let first_id = enrollment.current_stage_id.expect("current");

        for _ in 0..3 {
            let stage = enrollment.current_stage_mut().expect("current");
            stage.apply_contribution(&Contribution::Science(ScienceType::Generic), 1);
        }
        enrollment.advance_stage(&research).expect("advance");
        let restored = enrollment.regress_stage(&research).expect("regress");

        assert_eq!(restored, Some(first_id));
        assert_eq!(enrollment.current_stage_id, Some(first_id));
        let stage = enrollment.current_stage().expect("restored stage");
        assert!(!stage.completed);
        assert!(stage.requirements.iter().all(|r| r.progress == 0));
        // The abandoned attempt's rows are gone.
        assert_eq!(enrollment.progress.len(), 1);
    }

    #[test]
    fn progress_percent_caps_overshoot() {
        let research = two_stage_project();
        let mut enrollment = CharacterResearch::enroll(&research, CharacterId::new());
        let stage = enrollment.current_stage_mut().expect("current");
        stage.apply_contribution(&Contribution::Science(ScienceType::Generic), 2);
        assert_eq!(stage.progress_percent(), 66);
        stage.apply_contribution(&Contribution::Science(ScienceType::Generic), 5);
        assert_eq!(stage.progress_percent(), 100);
    }

    #[test]
    fn empty_stage_has_zero_percent() {
        let stage = StageProgress {
            stage_id: StageId::new(),
            completed: false,
            requirements: vec![],
        };
        assert_eq!(stage.progress_percent(), 0);
        assert!(stage.meets_requirements());
    }

    #[test]
    fn sample_requirement_honours_researched_flag() {
        let req = RequirementKind::Sample {
            tag: "xeno-flora".into(),
            requires_researched: true,
        };
        let raw = Contribution::Sample {
            tags: vec!["xeno-flora".into()],
            researched: false,
        };
        let studied = Contribution::Sample {
            tags: vec!["xeno-flora".into(), "toxic".into()],
            researched: true,
        };
        assert!(!req.matches(&raw));
        assert!(req.matches(&studied));
    }

    #[test]
    fn satisfy_all_completes_every_requirement() {
        let research = two_stage_project();
        let mut enrollment = CharacterResearch::enroll(&research, CharacterId::new());
        let stage = enrollment.current_stage_mut().expect("current");
        stage.satisfy_all();
        assert!(stage.meets_requirements());
    }
}
