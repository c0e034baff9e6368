//! Batch resolution of a downtime period.
//!
//! Processing loads everything the period's packs can touch into one
//! in-memory working set, runs the phases as pure functions, and persists
//! the whole set at the end. Any error aborts the run before anything is
//! written.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use interlude_domain::{
    Actor, BlueprintId, DomainError, DowntimePeriod, EngineeringOrder, ExoticId, ItemId, ModId,
    ModificationAction, PackPhase, PeriodId, PeriodStatus, ResultEvent, SampleId, ScienceOrder,
    ScienceType,
};

use crate::infrastructure::ports::{
    BatchWrite, CatalogRepo, CharacterRepo, DowntimeRepo, EventRepo, GroupRepo, ItemRepo,
    NotifierPort, RandomPort, ResearchRepo, UnitOfWork,
};
use crate::use_cases::downtime::DOWNTIME_ROLES;
use crate::use_cases::funds::require_staff;
use crate::use_cases::UseCaseError;

mod advancement;
mod contributions;
mod review;
mod science;
mod state;
mod trade;

use state::BatchState;

/// Energy credits every character receives each downtime.
const BASE_INCOME: i64 = 30;

pub struct ProcessPeriod {
    downtime: Arc<dyn DowntimeRepo>,
    characters: Arc<dyn CharacterRepo>,
    groups: Arc<dyn GroupRepo>,
    events: Arc<dyn EventRepo>,
    catalog: Arc<dyn CatalogRepo>,
    items: Arc<dyn ItemRepo>,
    research: Arc<dyn ResearchRepo>,
    tx: Arc<dyn UnitOfWork>,
    notifier: Arc<dyn NotifierPort>,
    random: Arc<dyn RandomPort>,
}

impl ProcessPeriod {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        downtime: Arc<dyn DowntimeRepo>,
        characters: Arc<dyn CharacterRepo>,
        groups: Arc<dyn GroupRepo>,
        events: Arc<dyn EventRepo>,
        catalog: Arc<dyn CatalogRepo>,
        items: Arc<dyn ItemRepo>,
        research: Arc<dyn ResearchRepo>,
        tx: Arc<dyn UnitOfWork>,
        notifier: Arc<dyn NotifierPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            downtime,
            characters,
            groups,
            events,
            catalog,
            items,
            research,
            tx,
            notifier,
            random,
        }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        period_id: PeriodId,
    ) -> Result<DowntimePeriod, UseCaseError> {
        require_staff(actor, DOWNTIME_ROLES, "Processing a downtime period")?;

        let mut state = self.load(period_id).await?;

        absorb_contents(&mut state);
        trade::apply_modifications(&mut state);
        trade::apply_purchases(&mut state);
        trade::apply_engineering(&mut state);
        science::apply_science(&mut state, self.random.as_ref());
        contributions::apply_contributions(&mut state);
        review::apply_review(&mut state, self.random.as_ref());
        advancement::apply_advancement(&mut state);
        finalize(&mut state)?;

        self.persist(&state).await?;

        for pack in &state.packs {
            if let Some(character) = state.characters.get(&pack.character_id) {
                self.notifier
                    .notify(
                        character.user_id,
                        "Your downtime results are ready".to_string(),
                    )
                    .await;
            }
        }
        tracing::info!(
            period_id = %state.period.id,
            packs = state.packs.len(),
            "Downtime period processed"
        );
        Ok(state.period.clone())
    }

    async fn load(&self, period_id: PeriodId) -> Result<BatchState, UseCaseError> {
        let period = self
            .downtime
            .get_period(period_id)
            .await?
            .ok_or_else(|| DomainError::not_found("DowntimePeriod", period_id.to_string()))?;
        if period.status != PeriodStatus::Pending {
            return Err(DomainError::invalid_state_transition(
                "Downtime period has already been processed",
            )
            .into());
        }
        let event = self
            .events
            .get(period.event_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", period.event_id.to_string()))?;

        let packs = self.downtime.list_packs(period_id).await?;
        if packs.iter().any(|p| p.phase != PackPhase::Completed) {
            return Err(DomainError::constraint(
                "Every pack must be completed before processing",
            )
            .into());
        }

        let refs = Referenced::collect(&packs);

        let characters: HashMap<_, _> = self
            .characters
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut groups = HashMap::new();
        for group_id in characters.values().filter_map(|c| c.group_id) {
            if let std::collections::hash_map::Entry::Vacant(entry) = groups.entry(group_id) {
                let group = self
                    .groups
                    .get(group_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Group", group_id.to_string()))?;
                entry.insert(group);
            }
        }

        let mut items = HashMap::new();
        for character_id in characters.keys() {
            for item in self.items.list_owned_by(*character_id).await? {
                items.insert(item.id, item);
            }
        }
        for item_id in refs.items {
            if !items.contains_key(&item_id) {
                if let Some(item) = self.items.get(item_id).await? {
                    items.insert(item.id, item);
                }
            }
        }

        let blueprints: HashMap<_, _> = self
            .catalog
            .list_blueprints()
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let mut item_types = HashMap::new();
        for blueprint in blueprints.values() {
            if !item_types.contains_key(&blueprint.item_type_id) {
                if let Some(item_type) = self.catalog.get_item_type(blueprint.item_type_id).await?
                {
                    item_types.insert(item_type.id, item_type);
                }
            }
        }

        let mut mods = HashMap::new();
        for mod_id in refs.mods {
            if let Some(modification) = self.catalog.get_mod(mod_id).await? {
                mods.insert(modification.id, modification);
            }
        }

        let mut exotics = HashMap::new();
        let mut exotics_by_type: HashMap<ScienceType, Vec<ExoticId>> = HashMap::new();
        for science_type in [
            ScienceType::Generic,
            ScienceType::Life,
            ScienceType::Corporeal,
            ScienceType::Etheric,
        ] {
            for exotic in self.catalog.list_exotics_by_type(science_type).await? {
                exotics_by_type
                    .entry(science_type)
                    .or_default()
                    .push(exotic.id);
                exotics.insert(exotic.id, exotic);
            }
        }
        for exotic_id in refs.exotics {
            if !exotics.contains_key(&exotic_id) {
                if let Some(exotic) = self.catalog.get_exotic(exotic_id).await? {
                    exotics.insert(exotic.id, exotic);
                }
            }
        }

        let mut samples = HashMap::new();
        for sample_id in refs.samples {
            if let Some(sample) = self.catalog.get_sample(sample_id).await? {
                samples.insert(sample.id, sample);
            }
        }

        let mut research = HashMap::new();
        let mut research_by_public_id = HashMap::new();
        for project in self.research.list().await? {
            research_by_public_id.insert(project.public_id.clone(), project.id);
            research.insert(project.id, project);
        }
        let mut enrollments = HashMap::new();
        for character_id in characters.keys() {
            for enrollment in self
                .research
                .list_enrollments_for_character(*character_id)
                .await?
            {
                enrollments.insert((enrollment.character_id, enrollment.research_id), enrollment);
            }
        }

        let mut next_serials = HashMap::new();
        for blueprint_id in refs.purchased_blueprints {
            let serial = self.items.next_serial(blueprint_id).await?;
            next_serials.insert(blueprint_id, serial);
        }

        Ok(BatchState {
            event_number: event.event_number,
            period,
            packs,
            characters,
            groups,
            items,
            blueprints,
            item_types,
            mods,
            exotics,
            exotics_by_type,
            samples,
            research,
            research_by_public_id,
            enrollments,
            next_serials,
            purchased: HashMap::new(),
            results: HashMap::new(),
        })
    }

    /// The whole working set is written in one transaction; a failed run
    /// leaves the period untouched.
    async fn persist(&self, state: &BatchState) -> Result<(), UseCaseError> {
        let batch = BatchWrite {
            period: state.period.clone(),
            packs: state.packs.clone(),
            characters: state.characters.values().cloned().collect(),
            groups: state.groups.values().cloned().collect(),
            items: state.items.values().cloned().collect(),
            samples: state.samples.values().cloned().collect(),
            research: state.research.values().cloned().collect(),
            enrollments: state.enrollments.values().cloned().collect(),
        };
        self.tx.commit_batch(&batch).await?;
        Ok(())
    }
}

/// Materials handed in with the packs join the characters' holdings before
/// any declarations resolve, so this period's hand-ins can be spent on this
/// period's orders. Credits, conditions, and cybernetics were already
/// granted when staff entered the pack contents.
fn absorb_contents(state: &mut BatchState) {
    for index in 0..state.packs.len() {
        let character_id = state.packs[index].character_id;
        let contents = state.packs[index].contents.clone();

        for item_id in &contents.items {
            if let Some(item) = state.items.get_mut(item_id) {
                item.owner = Some(character_id);
            }
        }
        if let Some(character) = state.characters.get_mut(&character_id) {
            for item_id in contents.items {
                character.pack.add_item(item_id);
            }
            for grant in contents.exotics {
                character.pack.add_exotic(grant.exotic_id, grant.amount);
            }
            for sample_id in contents.samples {
                character.pack.add_sample(sample_id);
            }
        }
    }
}

/// Pay income as chits, attach each pack's result log, and complete the
/// period.
fn finalize(state: &mut BatchState) -> Result<(), DomainError> {
    for index in 0..state.packs.len() {
        let pack_id = state.packs[index].id;
        let character_id = state.packs[index].character_id;

        if let Some(character) = state.characters.get_mut(&character_id) {
            character.pack.add_chits(BASE_INCOME);
        }
        state.push_event(pack_id, ResultEvent::Income {
            amount: BASE_INCOME,
        });

        let results = state.results.remove(&pack_id).unwrap_or_default();
        if let Some(character) = state.characters.get_mut(&character_id) {
            character.pack.add_downtime_results(pack_id, results.clone());
        }
        state.packs[index].results = results;
    }
    state.period.complete()
}

/// Ids the declarations and pack contents mention, gathered up front so the
/// loader can fetch them in one pass.
#[derive(Default)]
struct Referenced {
    mods: HashSet<ModId>,
    items: HashSet<ItemId>,
    exotics: HashSet<ExoticId>,
    samples: HashSet<SampleId>,
    purchased_blueprints: HashSet<BlueprintId>,
}

impl Referenced {
    fn collect(packs: &[interlude_domain::DowntimePack]) -> Self {
        let mut refs = Self::default();
        for pack in packs {
            refs.items.extend(pack.contents.items.iter().copied());
            refs.samples.extend(pack.contents.samples.iter().copied());
            refs.exotics
                .extend(pack.contents.exotics.iter().map(|g| g.exotic_id));

            let declarations = &pack.declarations;
            for action in &declarations.modifications {
                match action {
                    ModificationAction::Learning { mod_id }
                    | ModificationAction::Forgetting { mod_id } => {
                        refs.mods.insert(*mod_id);
                    }
                }
            }
            for purchase in &declarations.purchases {
                refs.purchased_blueprints.insert(purchase.blueprint_id);
            }
            for order in &declarations.engineering {
                match order {
                    EngineeringOrder::Maintain { item_id } => {
                        refs.items.insert(*item_id);
                    }
                    EngineeringOrder::Modify {
                        item_id, mod_id, ..
                    } => {
                        refs.mods.insert(*mod_id);
                        if let Some(item_id) = item_id {
                            refs.items.insert(*item_id);
                        }
                    }
                }
            }
            for order in &declarations.science {
                if let ScienceOrder::ResearchSample { sample_id } = order {
                    refs.samples.insert(*sample_id);
                }
            }
            for contribution in &declarations.contributions {
                refs.exotics
                    .extend(contribution.exotics.iter().map(|e| e.exotic_id));
                refs.items.extend(contribution.items.iter().copied());
                refs.samples.extend(contribution.samples.iter().copied());
            }
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::infrastructure::ports::{
        MockCatalogRepo, MockCharacterRepo, MockDowntimeRepo, MockEventRepo, MockGroupRepo,
        MockItemRepo, MockNotifierPort, MockResearchRepo, MockUnitOfWork,
    };
    use interlude_domain::{
        Character, Declarations, DowntimePack, Event, ItemBlueprint, ItemType, ItemTypeId,
        PackContents, Purchase, Role, UserId,
    };

    fn staff() -> Actor {
        Actor::new(UserId::new(), vec![Role::DowntimeTeam])
    }

    struct Repos {
        downtime: MockDowntimeRepo,
        characters: MockCharacterRepo,
        groups: MockGroupRepo,
        events: MockEventRepo,
        catalog: MockCatalogRepo,
        items: MockItemRepo,
        research: MockResearchRepo,
        tx: MockUnitOfWork,
        notifier: MockNotifierPort,
    }

    impl Repos {
        fn new() -> Self {
            Self {
                downtime: MockDowntimeRepo::new(),
                characters: MockCharacterRepo::new(),
                groups: MockGroupRepo::new(),
                events: MockEventRepo::new(),
                catalog: MockCatalogRepo::new(),
                items: MockItemRepo::new(),
                research: MockResearchRepo::new(),
                tx: MockUnitOfWork::new(),
                notifier: MockNotifierPort::new(),
            }
        }

        fn into_use_case(self) -> ProcessPeriod {
            ProcessPeriod::new(
                Arc::new(self.downtime),
                Arc::new(self.characters),
                Arc::new(self.groups),
                Arc::new(self.events),
                Arc::new(self.catalog),
                Arc::new(self.items),
                Arc::new(self.research),
                Arc::new(self.tx),
                Arc::new(self.notifier),
                Arc::new(FixedRandom(0)),
            )
        }
    }

    #[tokio::test]
    async fn refuses_incomplete_packs() {
        let mut repos = Repos::new();
        let event = Event::new("Summer Event".into(), 7);
        let period = DowntimePeriod::open(event.id);
        let period_id = period.id;
        // Still waiting on staff to enter contents.
        let pack = DowntimePack::open(period_id, interlude_domain::CharacterId::new());

        repos
            .downtime
            .expect_get_period()
            .returning(move |_| Ok(Some(period.clone())));
        repos
            .events
            .expect_get()
            .returning(move |_| Ok(Some(event.clone())));
        repos
            .downtime
            .expect_list_packs()
            .returning(move |_| Ok(vec![pack.clone()]));
        repos.tx.expect_commit_batch().never();

        let err = repos
            .into_use_case()
            .execute(&staff(), period_id)
            .await
            .expect_err("not ready");
        assert!(matches!(
            err,
            UseCaseError::Domain(DomainError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn purchase_income_and_completion_roundtrip() {
        let mut repos = Repos::new();

        let event = Event::new("Summer Event".into(), 7);
        let period = DowntimePeriod::open(event.id);
        let period_id = period.id;

        let mut character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        character.bank_account = 25;
        let character_id = character.id;

        let item_type = ItemType {
            id: ItemTypeId::new(),
            name: "Weapon".into(),
            id_prefix: "W".into(),
        };
        let blueprint = ItemBlueprint {
            id: BlueprintId::new(),
            name: "Pulse Carbine".into(),
            item_type_id: item_type.id,
            blueprint_code: 42,
            base_cost: 10,
            purchaseable: true,
        };
        let blueprint_id = blueprint.id;

        let mut pack = DowntimePack::open(period_id, character_id);
        pack.enter_contents(PackContents::default(), true).expect("contents");
        pack.submit_activities(
            Declarations {
                purchases: vec![Purchase { blueprint_id }],
                ..Declarations::default()
            },
            true,
        )
        .expect("activities");
        pack.record_review(interlude_domain::ReviewData::default(), true)
            .expect("review");

        repos
            .downtime
            .expect_get_period()
            .returning(move |_| Ok(Some(period.clone())));
        repos
            .events
            .expect_get()
            .returning(move |_| Ok(Some(event.clone())));
        repos
            .downtime
            .expect_list_packs()
            .returning(move |_| Ok(vec![pack.clone()]));
        repos
            .characters
            .expect_list()
            .returning(move || Ok(vec![character.clone()]));
        repos.items.expect_list_owned_by().returning(|_| Ok(vec![]));
        repos
            .catalog
            .expect_list_blueprints()
            .returning(move || Ok(vec![blueprint.clone()]));
        repos
            .catalog
            .expect_get_item_type()
            .returning(move |_| Ok(Some(item_type.clone())));
        repos
            .catalog
            .expect_list_exotics_by_type()
            .returning(|_| Ok(vec![]));
        repos.research.expect_list().returning(|| Ok(vec![]));
        repos
            .research
            .expect_list_enrollments_for_character()
            .returning(|_| Ok(vec![]));
        repos.items.expect_next_serial().returning(|_| Ok(1));

        // 25 - 10 purchase; income arrives as chits in the pack. The whole
        // working set goes through one batch commit.
        repos
            .tx
            .expect_commit_batch()
            .withf(move |batch| {
                batch.period.status == PeriodStatus::Completed
                    && batch.characters.iter().any(|c| {
                        c.bank_account == 15 && c.pack.items.len() == 1 && c.pack.chits == 30
                    })
                    && batch
                        .items
                        .iter()
                        .any(|item| item.owner == Some(character_id) && item.serial == 1)
                    && batch.packs.iter().any(|p| {
                        p.phase == PackPhase::Completed
                            && p.results.iter().any(|e| {
                                matches!(e, ResultEvent::ItemPurchased { cost: 10, .. })
                            })
                            && p.results.contains(&ResultEvent::Income { amount: 30 })
                    })
            })
            .times(1)
            .returning(|_| Ok(()));
        repos.notifier.expect_notify().times(1).returning(|_, _| ());

        let completed = repos
            .into_use_case()
            .execute(&staff(), period_id)
            .await
            .expect("processed");
        assert_eq!(completed.status, PeriodStatus::Completed);
    }

    #[tokio::test]
    async fn completed_period_cannot_be_processed_again() {
        let mut repos = Repos::new();
        let mut period = DowntimePeriod::open(interlude_domain::EventId::new());
        period.complete().expect("completed");
        let period_id = period.id;
        repos
            .downtime
            .expect_get_period()
            .returning(move |_| Ok(Some(period.clone())));

        let err = repos
            .into_use_case()
            .execute(&staff(), period_id)
            .await
            .expect_err("already processed");
        assert!(matches!(
            err,
            UseCaseError::Domain(DomainError::InvalidStateTransition(_))
        ));
    }
}
