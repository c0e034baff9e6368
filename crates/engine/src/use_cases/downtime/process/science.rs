//! Science phase: synthesis, sample study, project work, and teaching.

use interlude_domain::{
    CharacterResearch, Contribution, ResultEvent, ScienceOrder, TeachFailure,
};

use crate::infrastructure::ports::RandomPort;

use super::state::BatchState;

pub(super) fn apply_science(state: &mut BatchState, random: &dyn RandomPort) {
    for index in 0..state.packs.len() {
        let pack_id = state.packs[index].id;
        let character_id = state.packs[index].character_id;
        let orders = state.packs[index].declarations.science.clone();

        for order in orders {
            match order {
                ScienceOrder::Synthesize { science_type } => {
                    let pool = state
                        .exotics_by_type
                        .get(&science_type)
                        .cloned()
                        .unwrap_or_default();
                    if pool.is_empty() {
                        state.push_event(
                            pack_id,
                            ResultEvent::SynthesisFailed {
                                science_type: science_type.to_string(),
                            },
                        );
                        continue;
                    }
                    let pick = random.gen_range(0, (pool.len() - 1) as i32) as usize;
                    let exotic_id = pool[pick];
                    let exotic_name = state
                        .exotics
                        .get(&exotic_id)
                        .map(|e| e.name.clone())
                        .unwrap_or_else(|| exotic_id.to_string());
                    if let Some(character) = state.characters.get_mut(&character_id) {
                        character.pack.add_exotic(exotic_id, 1);
                    }
                    state.push_event(pack_id, ResultEvent::Synthesized { exotic_name });
                }
                ScienceOrder::ResearchSample { sample_id } => {
                    let held = state
                        .characters
                        .get(&character_id)
                        .is_some_and(|c| c.pack.has_sample(sample_id));
                    if !held {
                        let sample = state
                            .samples
                            .get(&sample_id)
                            .map(|s| s.name.clone())
                            .unwrap_or_else(|| sample_id.to_string());
                        state.push_event(pack_id, ResultEvent::SampleNotHeld { sample });
                        continue;
                    }
                    let Some(sample) = state.samples.get_mut(&sample_id) else {
                        state.push_event(
                            pack_id,
                            ResultEvent::SampleNotHeld {
                                sample: sample_id.to_string(),
                            },
                        );
                        continue;
                    };
                    let sample_name = sample.name.clone();
                    if sample.is_researched {
                        state.push_event(
                            pack_id,
                            ResultEvent::SampleAlreadyResearched { sample_name },
                        );
                    } else {
                        sample.is_researched = true;
                        state.push_event(pack_id, ResultEvent::SampleResearched { sample_name });
                    }
                }
                ScienceOrder::ResearchProject {
                    project,
                    science_type,
                } => {
                    let Some(research) = state.find_research_by_public_id(&project).cloned()
                    else {
                        state.push_event(pack_id, ResultEvent::ResearchNotFound { project });
                        continue;
                    };
                    let Some(enrollment) =
                        state.enrollments.get_mut(&(character_id, research.id))
                    else {
                        // No enrollment means the project is invisible to
                        // this character.
                        state.push_event(pack_id, ResultEvent::ResearchNotFound { project });
                        continue;
                    };
                    if enrollment.is_complete() {
                        state.push_event(
                            pack_id,
                            ResultEvent::ResearchAlreadyComplete {
                                project_name: research.name,
                            },
                        );
                        continue;
                    }
                    let applied = enrollment
                        .current_stage_mut()
                        .is_some_and(|stage| {
                            stage.apply_contribution(&Contribution::Science(science_type), 1)
                        });
                    let event = if applied {
                        ResultEvent::ResearchProgress {
                            project_name: research.name,
                        }
                    } else {
                        ResultEvent::ResearchProgressFailed {
                            project_name: research.name,
                            science_type: science_type.to_string(),
                        }
                    };
                    state.push_event(pack_id, event);
                }
                ScienceOrder::TeachInvention { project, student } => {
                    teach(state, pack_id, character_id, &project, student);
                }
                // Theories are resolved by staff review, not processing.
                ScienceOrder::Theorise { .. } => {}
            }
        }
    }
}

fn teach(
    state: &mut BatchState,
    pack_id: interlude_domain::PackId,
    teacher_id: interlude_domain::CharacterId,
    project: &str,
    student_id: interlude_domain::CharacterId,
) {
    let Some(research) = state.find_research_by_public_id(project).cloned() else {
        state.push_event(
            pack_id,
            ResultEvent::TeachFailed {
                project: project.to_string(),
                reason: TeachFailure::ProjectNotFound,
            },
        );
        return;
    };
    let Some(teacher) = state.enrollments.get(&(teacher_id, research.id)).cloned() else {
        state.push_event(
            pack_id,
            ResultEvent::TeachFailed {
                project: project.to_string(),
                reason: TeachFailure::TeacherNotEnrolled,
            },
        );
        return;
    };
    let Some(student_name) = state.characters.get(&student_id).map(|c| c.name.clone())
    else {
        state.push_event(
            pack_id,
            ResultEvent::TeachFailed {
                project: project.to_string(),
                reason: TeachFailure::StudentNotFound,
            },
        );
        return;
    };

    // Teaching enrolls the student when they are not already working on
    // the project.
    let enrollment = state
        .enrollments
        .entry((student_id, research.id))
        .or_insert_with(|| CharacterResearch::enroll(&research, student_id));
    if enrollment.is_complete() {
        state.push_event(
            pack_id,
            ResultEvent::ResearchAlreadyComplete {
                project_name: research.name,
            },
        );
        return;
    }
    let current = enrollment.current_stage_id;
    let teachable = current.is_some_and(|stage_id| teacher.has_completed_stage(stage_id));
    if !teachable {
        state.push_event(
            pack_id,
            ResultEvent::TeachFailed {
                project: project.to_string(),
                reason: TeachFailure::StageNotCompleted,
            },
        );
        return;
    }
    if let Some(stage) = enrollment.current_stage_mut() {
        stage.satisfy_all();
    }
    state.push_event(
        pack_id,
        ResultEvent::InventionTaught {
            project_name: research.name,
            student_name,
        },
    );
}
