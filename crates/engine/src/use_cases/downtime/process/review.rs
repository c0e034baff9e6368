//! Resolution of staff review decisions: declined theories, approved
//! inventions, improvements, and reputation responses.

use interlude_domain::{
    CharacterResearch, InventionReview, PackMessage, Research, ResearchKind, ResultEvent,
    ScienceOrder,
};

use crate::infrastructure::ports::RandomPort;
use crate::use_cases::research::random_public_id;

use super::state::BatchState;

pub(super) fn apply_review(state: &mut BatchState, random: &dyn RandomPort) {
    for index in 0..state.packs.len() {
        let pack_id = state.packs[index].id;
        let character_id = state.packs[index].character_id;
        let review = state.packs[index].review.clone();
        let declarations = state.packs[index].declarations.clone();

        match review.invention {
            None => {}
            Some(InventionReview::Declined { response }) => {
                let summary = declarations
                    .science
                    .iter()
                    .find_map(|order| match order {
                        ScienceOrder::Theorise { summary } => Some(summary.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();
                if let Some(character) = state.characters.get_mut(&character_id) {
                    character
                        .pack
                        .add_message(PackMessage::InventionDeclined { summary, response });
                }
            }
            Some(InventionReview::ApprovedNew {
                name,
                description,
                kind,
                stages,
            }) => {
                let public_id = fresh_public_id(state, random);
                let mut research = Research::new(
                    public_id.clone(),
                    name,
                    kind.unwrap_or(ResearchKind::Invention),
                );
                research.description = description;
                for spec in &stages {
                    // Duplicate stage numbers in the review payload lose
                    // all but the first.
                    let _ = research.add_stage(spec.build_stage());
                }
                let enrollment = CharacterResearch::enroll(&research, character_id);
                let project_name = research.name.clone();
                state
                    .enrollments
                    .insert((character_id, research.id), enrollment);
                state.register_research(research);
                state.push_event(
                    pack_id,
                    ResultEvent::ProjectCreated {
                        project_name,
                        public_id,
                    },
                );
            }
            Some(InventionReview::ApprovedImprovement { research_id, stage }) => {
                let Some(research) = state.research.get_mut(&research_id) else {
                    continue;
                };
                let next_number = research.highest_stage_number() + 1;
                let mut built = stage.build_stage();
                if research.stages.iter().any(|s| s.stage_number == built.stage_number) {
                    built.stage_number = next_number;
                }
                if research.add_stage(built.clone()).is_err() {
                    continue;
                }
                let project_name = research.name.clone();
                // Only an enrollment that has finished every prior stage
                // picks the new stage up immediately.
                if let Some(enrollment) =
                    state.enrollments.get_mut(&(character_id, research_id))
                {
                    if enrollment.is_complete() {
                        enrollment.start_stage(&built);
                    }
                }
                state.push_event(pack_id, ResultEvent::ProjectImproved { project_name });
            }
        }

        for answer in review.reputation_responses {
            if let Some(character) = state.characters.get_mut(&character_id) {
                character.pack.add_message(PackMessage::ReputationResponse {
                    faction_id: answer.faction_id,
                    question: answer.question,
                    response: answer.response,
                });
            }
        }
    }
}

/// A public id no project in the working set already uses.
fn fresh_public_id(state: &BatchState, random: &dyn RandomPort) -> String {
    for _ in 0..16 {
        let candidate = random_public_id(random);
        if !state.has_public_id(&candidate) {
            return candidate;
        }
    }
    // The pool is large enough that sustained collision means a stuck
    // random source; fall back to a uuid-derived id.
    random.gen_uuid().to_string()
}
