//! Spending phases: learning modifications, purchases, maintenance, and
//! applying mods to items.

use interlude_domain::{
    EngineeringOrder, Item, MaintenanceFailure, ModificationAction, ModifyFailure,
    PurchaseFailure, ResultEvent,
};

use super::state::BatchState;

/// Items lapse this many events after purchase or maintenance.
const ITEM_LIFETIME_EVENTS: i32 = 4;

pub(super) fn apply_modifications(state: &mut BatchState) {
    for index in 0..state.packs.len() {
        let pack_id = state.packs[index].id;
        let character_id = state.packs[index].character_id;
        let actions = state.packs[index].declarations.modifications.clone();

        for action in actions {
            match action {
                ModificationAction::Learning { mod_id } => {
                    let mod_name = state.mod_name(mod_id);
                    if let Some(character) = state.characters.get_mut(&character_id) {
                        if !character.known_modifications.contains(&mod_id) {
                            character.known_modifications.push(mod_id);
                        }
                    }
                    state.push_event(pack_id, ResultEvent::ModLearned { mod_name });
                }
                ModificationAction::Forgetting { mod_id } => {
                    let mod_name = state.mod_name(mod_id);
                    if let Some(character) = state.characters.get_mut(&character_id) {
                        character.known_modifications.retain(|m| *m != mod_id);
                    }
                    state.push_event(pack_id, ResultEvent::ModForgotten { mod_name });
                }
            }
        }
    }
}

pub(super) fn apply_purchases(state: &mut BatchState) {
    for index in 0..state.packs.len() {
        let pack_id = state.packs[index].id;
        let character_id = state.packs[index].character_id;
        let purchases = state.packs[index].declarations.purchases.clone();

        for purchase in purchases {
            let Some(blueprint) = state.blueprints.get(&purchase.blueprint_id) else {
                state.push_event(
                    pack_id,
                    ResultEvent::PurchaseFailed {
                        blueprint_name: purchase.blueprint_id.to_string(),
                        cost: 0,
                        reason: PurchaseFailure::UnknownBlueprint,
                    },
                );
                continue;
            };
            let blueprint_name = blueprint.name.clone();
            let cost = blueprint.cost(0);
            if !blueprint.purchaseable {
                state.push_event(
                    pack_id,
                    ResultEvent::PurchaseFailed {
                        blueprint_name,
                        cost,
                        reason: PurchaseFailure::NotForSale,
                    },
                );
                continue;
            }
            if !state.try_withdraw(character_id, cost) {
                state.push_event(
                    pack_id,
                    ResultEvent::PurchaseFailed {
                        blueprint_name,
                        cost,
                        reason: PurchaseFailure::InsufficientFunds,
                    },
                );
                continue;
            }

            let serial = state.mint_serial(purchase.blueprint_id);
            let mut item = Item::new(
                purchase.blueprint_id,
                serial,
                state.event_number + ITEM_LIFETIME_EVENTS,
            );
            item.owner = Some(character_id);
            let item_code = state.item_code(&item);

            state
                .purchased
                .insert((character_id, purchase.blueprint_id), item.id);
            if let Some(character) = state.characters.get_mut(&character_id) {
                character.pack.add_item(item.id);
            }
            state.items.insert(item.id, item);
            state.push_event(
                pack_id,
                ResultEvent::ItemPurchased {
                    item_code,
                    blueprint_name,
                    cost,
                },
            );
        }
    }
}

pub(super) fn apply_engineering(state: &mut BatchState) {
    for index in 0..state.packs.len() {
        let pack_id = state.packs[index].id;
        let character_id = state.packs[index].character_id;
        let orders = state.packs[index].declarations.engineering.clone();

        for order in orders {
            match order {
                EngineeringOrder::Maintain { item_id } => {
                    let Some((cost, item_code)) = state
                        .items
                        .get(&item_id)
                        .filter(|item| item.owner == Some(character_id))
                        .and_then(|item| {
                            let blueprint = state.blueprints.get(&item.blueprint_id)?;
                            Some((item.maintenance_cost(blueprint), state.item_code(item)))
                        })
                    else {
                        state.push_event(
                            pack_id,
                            ResultEvent::MaintenanceFailed {
                                item_code: item_id.to_string(),
                                cost: 0,
                                reason: MaintenanceFailure::ItemNotHeld,
                            },
                        );
                        continue;
                    };

                    if !state.try_withdraw(character_id, cost) {
                        state.push_event(
                            pack_id,
                            ResultEvent::MaintenanceFailed {
                                item_code,
                                cost,
                                reason: MaintenanceFailure::InsufficientFunds,
                            },
                        );
                        continue;
                    }
                    let expiry_event = state.event_number + ITEM_LIFETIME_EVENTS;
                    if let Some(item) = state.items.get_mut(&item_id) {
                        item.expiry_event = expiry_event;
                    }
                    state.push_event(
                        pack_id,
                        ResultEvent::ItemMaintained {
                            item_code,
                            cost,
                            expiry_event,
                        },
                    );
                }
                EngineeringOrder::Modify {
                    item_id,
                    blueprint_id,
                    mod_id,
                } => {
                    // An order against a blueprint targets the item bought
                    // from it earlier in this same run.
                    let target = item_id.or_else(|| {
                        blueprint_id
                            .and_then(|bp| state.purchased.get(&(character_id, bp)).copied())
                    });
                    let Some(target) = target else {
                        let item_code = blueprint_id
                            .map(|bp| state.blueprint_name(bp))
                            .unwrap_or_else(|| "unspecified item".to_string());
                        state.push_event(
                            pack_id,
                            ResultEvent::ModifyFailed {
                                mod_name: state.mod_name(mod_id),
                                item_code,
                                reason: ModifyFailure::ItemNotHeld,
                            },
                        );
                        continue;
                    };
                    let Some((cost, item_code)) = state
                        .items
                        .get(&target)
                        .filter(|item| item.owner == Some(character_id))
                        .and_then(|item| {
                            let blueprint = state.blueprints.get(&item.blueprint_id)?;
                            Some((item.modification_cost(blueprint), state.item_code(item)))
                        })
                    else {
                        state.push_event(
                            pack_id,
                            ResultEvent::ModifyFailed {
                                mod_name: state.mod_name(mod_id),
                                item_code: target.to_string(),
                                reason: ModifyFailure::ItemNotHeld,
                            },
                        );
                        continue;
                    };
                    let mod_name = state.mod_name(mod_id);

                    let known = state
                        .characters
                        .get(&character_id)
                        .is_some_and(|c| c.known_modifications.contains(&mod_id));
                    if !known {
                        state.push_event(
                            pack_id,
                            ResultEvent::ModifyFailed {
                                mod_name,
                                item_code,
                                reason: ModifyFailure::UnknownModification,
                            },
                        );
                        continue;
                    }
                    if !state.try_withdraw(character_id, cost) {
                        state.push_event(
                            pack_id,
                            ResultEvent::ModifyFailed {
                                mod_name,
                                item_code,
                                reason: ModifyFailure::InsufficientFunds,
                            },
                        );
                        continue;
                    }
                    if let Some(item) = state.items.get_mut(&target) {
                        item.mods_applied.push(mod_id);
                    }
                    state.push_event(
                        pack_id,
                        ResultEvent::ModApplied {
                            mod_name,
                            item_code,
                            cost,
                        },
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::state::fixtures::*;
    use super::*;
    use interlude_domain::{Declarations, Group, Purchase};

    #[test]
    fn purchase_debits_funds_and_mints_an_item() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 10);
        let character_id = add_character(&mut state, 25);
        let pack_id = add_pack(
            &mut state,
            character_id,
            Declarations {
                purchases: vec![Purchase { blueprint_id }],
                ..Declarations::default()
            },
        );

        apply_purchases(&mut state);

        let character = &state.characters[&character_id];
        assert_eq!(character.bank_account, 15);
        assert_eq!(character.pack.items.len(), 1);

        let item = state.items.values().next().expect("minted item");
        assert_eq!(item.owner, Some(character_id));
        assert_eq!(item.serial, 1);
        assert_eq!(item.expiry_event, state.event_number + 4);

        assert!(matches!(
            state.results[&pack_id][0],
            ResultEvent::ItemPurchased { cost: 10, .. }
        ));
    }

    #[test]
    fn purchase_beyond_combined_balance_fails_without_debit() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 15);
        let character_id = add_character(&mut state, 10);
        let pack_id = add_pack(
            &mut state,
            character_id,
            Declarations {
                purchases: vec![Purchase { blueprint_id }],
                ..Declarations::default()
            },
        );

        apply_purchases(&mut state);

        assert_eq!(state.characters[&character_id].bank_account, 10);
        assert!(state.items.is_empty());
        assert!(matches!(
            state.results[&pack_id][0],
            ResultEvent::PurchaseFailed { cost: 15, .. }
        ));
    }

    #[test]
    fn purchase_of_unknown_blueprint_is_recorded() {
        let mut state = empty_state();
        let character_id = add_character(&mut state, 25);
        let ghost = interlude_domain::BlueprintId::new();
        let pack_id = add_pack(
            &mut state,
            character_id,
            Declarations {
                purchases: vec![Purchase { blueprint_id: ghost }],
                ..Declarations::default()
            },
        );

        apply_purchases(&mut state);

        assert_eq!(state.characters[&character_id].bank_account, 25);
        assert!(matches!(
            state.results[&pack_id][0],
            ResultEvent::PurchaseFailed {
                reason: PurchaseFailure::UnknownBlueprint,
                ..
            }
        ));
    }

    #[test]
    fn maintaining_an_item_you_do_not_hold_is_recorded() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 25);
        let owner_id = add_character(&mut state, 50);
        let interloper_id = add_character(&mut state, 50);

        let mut item = Item::new(blueprint_id, 1, state.event_number);
        item.owner = Some(owner_id);
        let item_id = item.id;
        state.items.insert(item_id, item);

        let pack_id = add_pack(
            &mut state,
            interloper_id,
            Declarations {
                engineering: vec![EngineeringOrder::Maintain { item_id }],
                ..Declarations::default()
            },
        );
        apply_engineering(&mut state);

        assert_eq!(state.characters[&interloper_id].bank_account, 50);
        assert!(matches!(
            state.results[&pack_id][0],
            ResultEvent::MaintenanceFailed {
                reason: MaintenanceFailure::ItemNotHeld,
                ..
            }
        ));
    }

    #[test]
    fn modifying_a_missing_item_is_recorded() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 10);
        let mod_id = add_mod(&mut state, "Overclock");
        let character_id = add_character(&mut state, 100);
        if let Some(character) = state.characters.get_mut(&character_id) {
            character.known_modifications.push(mod_id);
        }

        // No purchase this run, so the blueprint reference resolves to
        // nothing.
        let pack_id = add_pack(
            &mut state,
            character_id,
            Declarations {
                engineering: vec![EngineeringOrder::Modify {
                    item_id: None,
                    blueprint_id: Some(blueprint_id),
                    mod_id,
                }],
                ..Declarations::default()
            },
        );
        apply_engineering(&mut state);

        assert_eq!(state.characters[&character_id].bank_account, 100);
        assert!(matches!(
            state.results[&pack_id][0],
            ResultEvent::ModifyFailed {
                reason: ModifyFailure::ItemNotHeld,
                ..
            }
        ));
    }

    #[test]
    fn purchase_draws_on_group_funds_after_own() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 15);
        let character_id = add_character(&mut state, 10);

        let mut group = Group::new("Free Traders".into());
        group.bank_account = 20;
        let group_id = group.id;
        state.groups.insert(group_id, group);
        if let Some(character) = state.characters.get_mut(&character_id) {
            character.group_id = Some(group_id);
        }

        add_pack(
            &mut state,
            character_id,
            Declarations {
                purchases: vec![Purchase { blueprint_id }],
                ..Declarations::default()
            },
        );
        apply_purchases(&mut state);

        assert_eq!(state.characters[&character_id].bank_account, 0);
        assert_eq!(state.groups[&group_id].bank_account, 15);
    }

    #[test]
    fn modify_requires_a_known_modification() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 10);
        let mod_id = add_mod(&mut state, "Overclock");
        let character_id = add_character(&mut state, 100);

        let mut item = Item::new(blueprint_id, 1, 11);
        item.owner = Some(character_id);
        let item_id = item.id;
        state.items.insert(item_id, item);

        let pack_id = add_pack(
            &mut state,
            character_id,
            Declarations {
                engineering: vec![EngineeringOrder::Modify {
                    item_id: Some(item_id),
                    blueprint_id: None,
                    mod_id,
                }],
                ..Declarations::default()
            },
        );
        apply_engineering(&mut state);

        assert!(state.items[&item_id].mods_applied.is_empty());
        assert!(matches!(
            state.results[&pack_id][0],
            ResultEvent::ModifyFailed {
                reason: ModifyFailure::UnknownModification,
                ..
            }
        ));
    }

    #[test]
    fn modify_targets_a_same_run_purchase_by_blueprint() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 10);
        let mod_id = add_mod(&mut state, "Overclock");
        let character_id = add_character(&mut state, 100);
        if let Some(character) = state.characters.get_mut(&character_id) {
            character.known_modifications.push(mod_id);
        }

        let pack_id = add_pack(
            &mut state,
            character_id,
            Declarations {
                purchases: vec![Purchase { blueprint_id }],
                engineering: vec![EngineeringOrder::Modify {
                    item_id: None,
                    blueprint_id: Some(blueprint_id),
                    mod_id,
                }],
                ..Declarations::default()
            },
        );
        apply_purchases(&mut state);
        apply_engineering(&mut state);

        let item = state.items.values().next().expect("minted item");
        assert_eq!(item.mods_applied, vec![mod_id]);
        // 10 purchase + 5 modification (50% of base, no mods yet applied).
        assert_eq!(state.characters[&character_id].bank_account, 85);
        assert!(matches!(
            state.results[&pack_id][1],
            ResultEvent::ModApplied { cost: 5, .. }
        ));
    }

    #[test]
    fn maintenance_extends_expiry() {
        let mut state = empty_state();
        let blueprint_id = add_blueprint(&mut state, 25);
        let character_id = add_character(&mut state, 10);

        let mut item = Item::new(blueprint_id, 1, state.event_number);
        item.owner = Some(character_id);
        let item_id = item.id;
        state.items.insert(item_id, item);

        let pack_id = add_pack(
            &mut state,
            character_id,
            Declarations {
                engineering: vec![EngineeringOrder::Maintain { item_id }],
                ..Declarations::default()
            },
        );
        apply_engineering(&mut state);

        // 10% of 25, rounded up.
        assert_eq!(state.characters[&character_id].bank_account, 7);
        assert_eq!(state.items[&item_id].expiry_event, state.event_number + 4);
        assert!(matches!(
            state.results[&pack_id][0],
            ResultEvent::ItemMaintained { cost: 3, .. }
        ));
    }

    #[test]
    fn learning_and_forgetting_update_known_modifications() {
        let mut state = empty_state();
        let learn = add_mod(&mut state, "Overclock");
        let forget = add_mod(&mut state, "Dampener");
        let character_id = add_character(&mut state, 0);
        if let Some(character) = state.characters.get_mut(&character_id) {
            character.known_modifications.push(forget);
        }

        add_pack(
            &mut state,
            character_id,
            Declarations {
                modifications: vec![
                    ModificationAction::Learning { mod_id: learn },
                    ModificationAction::Forgetting { mod_id: forget },
                ],
                ..Declarations::default()
            },
        );
        apply_modifications(&mut state);

        let character = &state.characters[&character_id];
        assert_eq!(character.known_modifications, vec![learn]);
    }
}
