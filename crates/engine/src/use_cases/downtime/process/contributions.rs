//! Material contributions handed over towards research stages.
//!
//! A contribution unit is applied to the first unmet matching requirement
//! of the target's current stage. Materials that match nothing stay with
//! the contributor.

use interlude_domain::{
    CharacterId, Contribution, ContributionTarget, ResearchContribution, ResultEvent,
};

use super::state::BatchState;

pub(super) fn apply_contributions(state: &mut BatchState) {
    for index in 0..state.packs.len() {
        let pack_id = state.packs[index].id;
        let character_id = state.packs[index].character_id;
        let contributions = state.packs[index].declarations.contributions.clone();

        for contribution in contributions {
            apply_one(state, pack_id, character_id, &contribution);
        }
    }
}

fn resolve_target(
    state: &BatchState,
    declarer: CharacterId,
    target: &ContributionTarget,
) -> Option<CharacterId> {
    match target {
        ContributionTarget::Own => Some(declarer),
        ContributionTarget::Group { member } => {
            let declarer_group = state.characters.get(&declarer)?.group_id?;
            let member_group = state.characters.get(member)?.group_id?;
            (declarer_group == member_group).then_some(*member)
        }
        ContributionTarget::Other { player } => state
            .characters
            .values()
            .find(|c| c.player_reference == *player)
            .map(|c| c.id),
    }
}

fn apply_one(
    state: &mut BatchState,
    pack_id: interlude_domain::PackId,
    declarer: CharacterId,
    contribution: &ResearchContribution,
) {
    let Some(research) = state
        .find_research_by_public_id(&contribution.project)
        .cloned()
    else {
        state.push_event(
            pack_id,
            ResultEvent::ResearchNotFound {
                project: contribution.project.clone(),
            },
        );
        return;
    };
    let Some(target) = resolve_target(state, declarer, &contribution.target) else {
        state.push_event(
            pack_id,
            ResultEvent::ResearchNotFound {
                project: contribution.project.clone(),
            },
        );
        return;
    };
    let key = (target, research.id);
    let Some(enrollment) = state.enrollments.get(&key) else {
        state.push_event(
            pack_id,
            ResultEvent::ResearchNotFound {
                project: contribution.project.clone(),
            },
        );
        return;
    };
    if enrollment.is_complete() {
        state.push_event(
            pack_id,
            ResultEvent::ResearchAlreadyComplete {
                project_name: research.name,
            },
        );
        return;
    }

    for offered in &contribution.exotics {
        let material = format!(
            "{} x {}",
            offered.quantity,
            state
                .exotics
                .get(&offered.exotic_id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| offered.exotic_id.to_string())
        );
        let held = state
            .characters
            .get(&declarer)
            .is_some_and(|c| c.pack.exotic_amount(offered.exotic_id) >= offered.quantity);
        let matched = held
            && offer(
                state,
                key,
                &Contribution::Exotic(offered.exotic_id),
                offered.quantity,
            );
        if matched {
            if let Some(character) = state.characters.get_mut(&declarer) {
                character.pack.remove_exotic(offered.exotic_id, offered.quantity);
            }
        }
        push_outcome(state, pack_id, &research.name, material, matched);
    }

    for item_id in &contribution.items {
        let owned = state
            .items
            .get(item_id)
            .filter(|item| item.owner == Some(declarer));
        let Some((material, item_type)) = owned.and_then(|item| {
            let blueprint = state.blueprints.get(&item.blueprint_id)?;
            Some((state.item_code(item), blueprint.item_type_id))
        }) else {
            continue;
        };
        let matched = offer(state, key, &Contribution::Item(item_type), 1);
        if matched {
            if let Some(item) = state.items.get_mut(item_id) {
                item.owner = None;
            }
            if let Some(character) = state.characters.get_mut(&declarer) {
                character.pack.remove_item(*item_id);
            }
        }
        push_outcome(state, pack_id, &research.name, material, matched);
    }

    for sample_id in &contribution.samples {
        let held = state
            .characters
            .get(&declarer)
            .is_some_and(|c| c.pack.has_sample(*sample_id));
        let Some(sample) = state.samples.get(sample_id).filter(|_| held) else {
            continue;
        };
        let material = sample.name.clone();
        let offered = Contribution::Sample {
            tags: sample.tags.clone(),
            researched: sample.is_researched,
        };
        let matched = offer(state, key, &offered, 1);
        if matched {
            if let Some(character) = state.characters.get_mut(&declarer) {
                character.pack.remove_sample(*sample_id);
            }
        }
        push_outcome(state, pack_id, &research.name, material, matched);
    }
}

fn offer(
    state: &mut BatchState,
    key: (CharacterId, interlude_domain::ResearchId),
    contribution: &Contribution,
    quantity: u32,
) -> bool {
    state
        .enrollments
        .get_mut(&key)
        .and_then(|enrollment| enrollment.current_stage_mut())
        .is_some_and(|stage| stage.apply_contribution(contribution, quantity))
}

fn push_outcome(
    state: &mut BatchState,
    pack_id: interlude_domain::PackId,
    project_name: &str,
    material: String,
    matched: bool,
) {
    let event = if matched {
        ResultEvent::ContributionApplied {
            project_name: project_name.to_string(),
            material,
        }
    } else {
        ResultEvent::ContributionFailed {
            project_name: project_name.to_string(),
            material,
        }
    };
    state.push_event(pack_id, event);
}
