//! End-of-run sweep: complete every stage whose requirements are now met.
//!
//! Contributions and science work may have pushed several stages over the
//! line at once, so each enrollment advances repeatedly until its current
//! stage is unmet or the project finishes.

use std::collections::HashMap;

use interlude_domain::{CharacterId, PackId, ResultEvent};

use super::state::BatchState;

pub(super) fn apply_advancement(state: &mut BatchState) {
    let pack_by_character: HashMap<CharacterId, PackId> = state
        .packs
        .iter()
        .map(|pack| (pack.character_id, pack.id))
        .collect();

    let keys: Vec<_> = state.enrollments.keys().copied().collect();
    for key in keys {
        let (character_id, research_id) = key;
        let Some(research) = state.research.get(&research_id).cloned() else {
            continue;
        };

        let mut completions = Vec::new();
        if let Some(enrollment) = state.enrollments.get_mut(&key) {
            while let Some(stage) = enrollment.current_stage() {
                if !stage.meets_requirements() {
                    break;
                }
                let completed_name = research
                    .stage(stage.stage_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                match enrollment.advance_stage(&research) {
                    Ok(Some(_)) => completions.push(ResultEvent::StageCompleted {
                        project_name: research.name.clone(),
                        stage_name: completed_name,
                    }),
                    Ok(None) => {
                        completions.push(ResultEvent::StageCompleted {
                            project_name: research.name.clone(),
                            stage_name: completed_name,
                        });
                        completions.push(ResultEvent::ProjectCompleted {
                            project_name: research.name.clone(),
                        });
                        break;
                    }
                    Err(_) => break,
                }
            }
        }

        if let Some(pack_id) = pack_by_character.get(&character_id) {
            for event in completions {
                state.push_event(*pack_id, event);
            }
        }
    }
}
