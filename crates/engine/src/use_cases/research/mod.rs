//! Research project administration and progress queries.

use std::sync::Arc;

use interlude_domain::{
    Actor, CharacterId, CharacterResearch, DomainError, RequirementKind, Research, ResearchId,
    ResearchKind, Role, StageSpec,
};

use crate::infrastructure::ports::{RandomPort, RepoError, ResearchRepo};
use crate::use_cases::funds::require_staff;
use crate::use_cases::UseCaseError;

/// Roles allowed to create and correct research projects.
const RESEARCH_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::RulesTeam, Role::PlotTeam];

/// Word pool for memorable project identifiers.
const PUBLIC_ID_WORDS: &[&str] = &[
    "amber", "anchor", "basalt", "beacon", "cinder", "cobalt", "comet", "coral", "crystal",
    "desert", "drift", "ember", "falcon", "fathom", "garnet", "glacier", "harbor", "hollow",
    "indigo", "iron", "jasper", "kestrel", "lantern", "lattice", "marble", "meridian", "nebula",
    "north", "obsidian", "onyx", "opal", "orbit", "pallid", "prism", "quartz", "quiet", "raven",
    "reef", "rift", "saffron", "signal", "silver", "slate", "spiral", "summit", "tether", "thorn",
    "tide", "umber", "vault", "vector", "violet", "warden", "willow", "zenith",
];

/// Three random words, dash-joined, e.g. "amber-signal-vault".
pub fn random_public_id(random: &dyn RandomPort) -> String {
    let top = (PUBLIC_ID_WORDS.len() - 1) as i32;
    let mut words = Vec::with_capacity(3);
    for _ in 0..3 {
        let index = random.gen_range(0, top) as usize;
        words.push(PUBLIC_ID_WORDS[index]);
    }
    words.join("-")
}

/// One requirement of the current stage, with progress.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RequirementView {
    pub description: String,
    pub progress: u32,
    pub amount: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CurrentStageView {
    pub stage_number: u32,
    pub name: String,
    pub percent: u32,
    pub requirements: Vec<RequirementView>,
}

/// A character's standing in one project.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EnrollmentView {
    pub research_id: ResearchId,
    pub public_id: String,
    pub name: String,
    pub kind: ResearchKind,
    pub complete: bool,
    pub current_stage: Option<CurrentStageView>,
}

fn describe_requirement(kind: &RequirementKind) -> String {
    match kind {
        RequirementKind::Science { science_type } => format!("{science_type} science"),
        RequirementKind::Item { item_type } => format!("item of type {item_type}"),
        RequirementKind::Exotic { exotic_id } => format!("exotic substance {exotic_id}"),
        RequirementKind::Sample {
            tag,
            requires_researched,
        } => {
            if *requires_researched {
                format!("researched sample tagged '{tag}'")
            } else {
                format!("sample tagged '{tag}'")
            }
        }
    }
}

pub fn enrollment_view(research: &Research, enrollment: &CharacterResearch) -> EnrollmentView {
    let current_stage = enrollment.current_stage().and_then(|progress| {
        let stage = research.stage(progress.stage_id)?;
        Some(CurrentStageView {
            stage_number: stage.stage_number,
            name: stage.name.clone(),
            percent: progress.progress_percent(),
            requirements: progress
                .requirements
                .iter()
                .map(|r| RequirementView {
                    description: describe_requirement(&r.requirement.kind),
                    progress: r.progress,
                    amount: r.requirement.amount,
                })
                .collect(),
        })
    });
    EnrollmentView {
        research_id: research.id,
        public_id: research.public_id.clone(),
        name: research.name.clone(),
        kind: research.kind,
        complete: enrollment.is_complete(),
        current_stage,
    }
}

pub struct ResearchOps {
    research: Arc<dyn ResearchRepo>,
    random: Arc<dyn RandomPort>,
}

impl ResearchOps {
    pub fn new(research: Arc<dyn ResearchRepo>, random: Arc<dyn RandomPort>) -> Self {
        Self { research, random }
    }

    async fn unique_public_id(&self) -> Result<String, UseCaseError> {
        for _ in 0..16 {
            let candidate = random_public_id(self.random.as_ref());
            if self.research.find_by_public_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(RepoError::constraint("Could not allocate a unique public id").into())
    }

    pub async fn create_project(
        &self,
        actor: &Actor,
        name: String,
        kind: ResearchKind,
        description: Option<String>,
        stages: Vec<StageSpec>,
    ) -> Result<Research, UseCaseError> {
        require_staff(actor, RESEARCH_ROLES, "Creating research")?;
        if name.trim().is_empty() {
            return Err(DomainError::validation("Project name cannot be empty").into());
        }
        let mut research = Research::new(self.unique_public_id().await?, name, kind);
        research.description = description;
        for spec in &stages {
            research.add_stage(spec.build_stage())?;
        }
        self.research.save(&research).await?;
        tracing::info!(research_id = %research.id, public_id = %research.public_id, "Research project created");
        Ok(research)
    }

    pub async fn get(&self, public_id: &str) -> Result<Research, UseCaseError> {
        self.research
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Research", public_id.to_string()).into())
    }

    pub async fn list(&self) -> Result<Vec<Research>, UseCaseError> {
        Ok(self.research.list().await?)
    }

    /// Enroll a character in a project. A character holds at most one
    /// enrollment per project.
    pub async fn enroll(
        &self,
        actor: &Actor,
        character_id: CharacterId,
        research_id: ResearchId,
    ) -> Result<CharacterResearch, UseCaseError> {
        require_staff(actor, RESEARCH_ROLES, "Enrolling a character")?;
        let research = self
            .research
            .get(research_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Research", research_id.to_string()))?;
        if self
            .research
            .get_enrollment(character_id, research_id)
            .await?
            .is_some()
        {
            return Err(DomainError::constraint(format!(
                "Character is already enrolled in {}",
                research.public_id
            ))
            .into());
        }
        let enrollment = CharacterResearch::enroll(&research, character_id);
        self.research.save_enrollment(&enrollment).await?;
        Ok(enrollment)
    }

    /// Staff correction: mark the current stage complete and move on.
    pub async fn advance(
        &self,
        actor: &Actor,
        character_id: CharacterId,
        research_id: ResearchId,
    ) -> Result<EnrollmentView, UseCaseError> {
        require_staff(actor, RESEARCH_ROLES, "Advancing research")?;
        let (research, mut enrollment) = self.load_pair(character_id, research_id).await?;
        enrollment.advance_stage(&research)?;
        self.research.save_enrollment(&enrollment).await?;
        Ok(enrollment_view(&research, &enrollment))
    }

    /// Staff correction: fall back to the previous stage with zeroed
    /// progress.
    pub async fn regress(
        &self,
        actor: &Actor,
        character_id: CharacterId,
        research_id: ResearchId,
    ) -> Result<EnrollmentView, UseCaseError> {
        require_staff(actor, RESEARCH_ROLES, "Regressing research")?;
        let (research, mut enrollment) = self.load_pair(character_id, research_id).await?;
        enrollment.regress_stage(&research)?;
        self.research.save_enrollment(&enrollment).await?;
        Ok(enrollment_view(&research, &enrollment))
    }

    pub async fn progress_for_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<EnrollmentView>, UseCaseError> {
        let enrollments = self
            .research
            .list_enrollments_for_character(character_id)
            .await?;
        let mut views = Vec::with_capacity(enrollments.len());
        for enrollment in &enrollments {
            let research = self
                .research
                .get(enrollment.research_id)
                .await?
                .ok_or_else(|| {
                    DomainError::not_found("Research", enrollment.research_id.to_string())
                })?;
            views.push(enrollment_view(&research, enrollment));
        }
        Ok(views)
    }

    async fn load_pair(
        &self,
        character_id: CharacterId,
        research_id: ResearchId,
    ) -> Result<(Research, CharacterResearch), UseCaseError> {
        let research = self
            .research
            .get(research_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Research", research_id.to_string()))?;
        let enrollment = self
            .research
            .get_enrollment(character_id, research_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found("CharacterResearch", character_id.to_string())
            })?;
        Ok((research, enrollment))
    }
}
