//! Staff entry of a physical pack's contents.
//!
//! Confirming the contents applies them straight away rather than waiting
//! for batch processing: samples join the group inventory, conditions and
//! cybernetics go onto the character with audit entries, research-team
//! assignments become faction memberships so the player sees the extra
//! science slots, and energy credits are banked immediately. The pack,
//! the granted state, and the audit entries land in one transaction.

use std::sync::Arc;

use interlude_domain::{
    Actor, AuditAction, AuditEntry, AuditSubject, Character, DomainError, DowntimePack, Group,
    PackContents, PackId,
};

use crate::infrastructure::ports::{
    CatalogRepo, CharacterRepo, ClockPort, DowntimeRepo, GroupRepo, NotifierPort, UnitOfWork,
};
use crate::use_cases::downtime::DOWNTIME_ROLES;
use crate::use_cases::funds::require_staff;
use crate::use_cases::UseCaseError;

pub struct EnterPackContents {
    downtime: Arc<dyn DowntimeRepo>,
    characters: Arc<dyn CharacterRepo>,
    groups: Arc<dyn GroupRepo>,
    catalog: Arc<dyn CatalogRepo>,
    tx: Arc<dyn UnitOfWork>,
    clock: Arc<dyn ClockPort>,
    notifier: Arc<dyn NotifierPort>,
}

impl EnterPackContents {
    pub fn new(
        downtime: Arc<dyn DowntimeRepo>,
        characters: Arc<dyn CharacterRepo>,
        groups: Arc<dyn GroupRepo>,
        catalog: Arc<dyn CatalogRepo>,
        tx: Arc<dyn UnitOfWork>,
        clock: Arc<dyn ClockPort>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        Self {
            downtime,
            characters,
            groups,
            catalog,
            tx,
            clock,
            notifier,
        }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        pack_id: PackId,
        contents: PackContents,
        confirm: bool,
    ) -> Result<DowntimePack, UseCaseError> {
        require_staff(actor, DOWNTIME_ROLES, "Entering pack contents")?;
        let mut pack = self
            .downtime
            .get_pack(pack_id)
            .await?
            .ok_or_else(|| DomainError::not_found("DowntimePack", pack_id.to_string()))?;
        let mut character = self
            .characters
            .get(pack.character_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found("Character", pack.character_id.to_string())
            })?;

        pack.enter_contents(contents, confirm)?;
        if confirm {
            let (group, entries) = self
                .apply_to_character(actor, &pack, &mut character)
                .await?;
            self.tx
                .commit_pack_contents(&pack, &character, group, &entries)
                .await?;
            self.notifier
                .notify(
                    character.user_id,
                    "Your downtime pack is ready to fill in".to_string(),
                )
                .await;
        } else {
            self.downtime.save_pack(&pack).await?;
        }
        tracing::info!(pack_id = %pack_id, character_id = %character.id, "Pack contents entered");
        Ok(pack)
    }

    /// Grants that take effect as soon as the pack is handed back, before
    /// the period is processed. Returns the mutated group, if any, and the
    /// audit entries describing the grants; nothing is persisted here.
    async fn apply_to_character(
        &self,
        actor: &Actor,
        pack: &DowntimePack,
        character: &mut Character,
    ) -> Result<(Option<Group>, Vec<AuditEntry>), UseCaseError> {
        let contents = &pack.contents;
        let mut entries = Vec::new();

        let mut granted_group = None;
        if let Some(group_id) = character.group_id {
            if !contents.samples.is_empty() {
                let mut group = self
                    .groups
                    .get(group_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Group", group_id.to_string()))?;
                for sample_id in &contents.samples {
                    group.add_sample(*sample_id);
                }
                granted_group = Some(group);
            }
        }

        for condition_id in &contents.conditions {
            if character.conditions.contains(condition_id) {
                continue;
            }
            let Some(condition) = self.catalog.get_condition(*condition_id).await? else {
                continue;
            };
            character.conditions.push(*condition_id);
            entries.push(self.entry(
                actor,
                character,
                AuditAction::ConditionChange,
                format!("Condition added via downtime: {}", condition.name),
            ));
        }

        for cybernetic_id in &contents.cybernetics {
            if character.cybernetics.contains(cybernetic_id) {
                continue;
            }
            let Some(cybernetic) = self.catalog.get_cybernetic(*cybernetic_id).await? else {
                continue;
            };
            character.cybernetics.push(*cybernetic_id);
            entries.push(self.entry(
                actor,
                character,
                AuditAction::CyberneticsChange,
                format!("Cybernetic added via downtime: {}", cybernetic.name),
            ));
        }

        for faction_id in &contents.research_teams {
            if !character.factions.contains(faction_id) {
                character.factions.push(*faction_id);
            }
        }

        if contents.energy_credits > 0 {
            character.deposit(contents.energy_credits)?;
            entries.push(self.entry(
                actor,
                character,
                AuditAction::FundsAdded,
                format!(
                    "Added {}: Energy credits from downtime pack {}",
                    contents.energy_credits, pack.id
                ),
            ));
        }

        Ok((granted_group, entries))
    }

    fn entry(
        &self,
        actor: &Actor,
        character: &Character,
        action: AuditAction,
        details: String,
    ) -> AuditEntry {
        AuditEntry::new(
            AuditSubject::Character(character.id),
            actor.user_id,
            action,
            details,
            self.clock.now(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        MockCatalogRepo, MockCharacterRepo, MockClockPort, MockDowntimeRepo, MockGroupRepo,
        MockNotifierPort, MockUnitOfWork,
    };
    use chrono::TimeZone;
    use interlude_domain::{
        Condition, ConditionId, Group, PackPhase, PeriodId, Role, SampleId, UserId,
    };

    struct Harness {
        downtime: MockDowntimeRepo,
        characters: MockCharacterRepo,
        groups: MockGroupRepo,
        catalog: MockCatalogRepo,
        tx: MockUnitOfWork,
        notifier: MockNotifierPort,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                downtime: MockDowntimeRepo::new(),
                characters: MockCharacterRepo::new(),
                groups: MockGroupRepo::new(),
                catalog: MockCatalogRepo::new(),
                tx: MockUnitOfWork::new(),
                notifier: MockNotifierPort::new(),
            }
        }

        fn into_use_case(self) -> EnterPackContents {
            let mut clock = MockClockPort::new();
            clock
                .expect_now()
                .returning(|| chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
            EnterPackContents::new(
                Arc::new(self.downtime),
                Arc::new(self.characters),
                Arc::new(self.groups),
                Arc::new(self.catalog),
                Arc::new(self.tx),
                Arc::new(clock),
                Arc::new(self.notifier),
            )
        }
    }

    fn staff() -> Actor {
        Actor::new(UserId::new(), vec![Role::DowntimeTeam])
    }

    #[tokio::test]
    async fn moves_pack_to_player_entry_phase() {
        let mut harness = Harness::new();
        let character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        let pack = DowntimePack::open(PeriodId::new(), character.id);
        let pack_id = pack.id;

        harness
            .downtime
            .expect_get_pack()
            .returning(move |_| Ok(Some(pack.clone())));
        harness
            .characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        harness
            .tx
            .expect_commit_pack_contents()
            .withf(|pack, _, _, _| pack.phase == PackPhase::EnterDowntime)
            .returning(|_, _, _, _| Ok(()));
        harness
            .notifier
            .expect_notify()
            .times(1)
            .returning(|_, _| ());

        let updated = harness
            .into_use_case()
            .execute(&staff(), pack_id, PackContents::default(), true)
            .await
            .expect("contents entered");
        assert_eq!(updated.phase, PackPhase::EnterDowntime);
    }

    #[tokio::test]
    async fn saving_without_confirmation_defers_grants() {
        let mut harness = Harness::new();
        let character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        let pack = DowntimePack::open(PeriodId::new(), character.id);
        let pack_id = pack.id;

        harness
            .downtime
            .expect_get_pack()
            .returning(move |_| Ok(Some(pack.clone())));
        harness
            .characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        harness.tx.expect_commit_pack_contents().never();
        harness
            .downtime
            .expect_save_pack()
            .withf(|p| p.phase == PackPhase::EnterPack && p.contents.energy_credits == 5)
            .returning(|_| Ok(()));
        harness.notifier.expect_notify().never();

        let contents = PackContents {
            energy_credits: 5,
            ..PackContents::default()
        };
        let updated = harness
            .into_use_case()
            .execute(&staff(), pack_id, contents, false)
            .await
            .expect("contents saved");
        assert_eq!(updated.phase, PackPhase::EnterPack);
    }

    #[tokio::test]
    async fn confirmation_commits_grants_and_audit_in_one_write() {
        let mut harness = Harness::new();

        let group = Group::new("Free Traders".into());
        let group_id = group.id;
        let mut character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        character.group_id = Some(group_id);
        let pack = DowntimePack::open(PeriodId::new(), character.id);
        let pack_id = pack.id;

        let condition = Condition {
            id: ConditionId::new(),
            name: "Etheric Burn".into(),
            description: None,
        };
        let condition_id = condition.id;
        let sample_id = SampleId::new();

        harness
            .downtime
            .expect_get_pack()
            .returning(move |_| Ok(Some(pack.clone())));
        harness
            .characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        harness
            .groups
            .expect_get()
            .returning(move |_| Ok(Some(group.clone())));
        harness
            .catalog
            .expect_get_condition()
            .returning(move |_| Ok(Some(condition.clone())));
        harness
            .tx
            .expect_commit_pack_contents()
            .withf(move |pack, character, group, entries| {
                pack.phase == PackPhase::EnterDowntime
                    && character.bank_account == 5
                    && character.conditions == vec![condition_id]
                    && group.as_ref().is_some_and(|g| g.samples == vec![sample_id])
                    && entries.iter().any(|e| {
                        e.action == AuditAction::ConditionChange
                            && e.details == "Condition added via downtime: Etheric Burn"
                    })
                    && entries.iter().any(|e| {
                        e.action == AuditAction::FundsAdded
                            && e.details.starts_with("Added 5: Energy credits")
                    })
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        harness
            .notifier
            .expect_notify()
            .times(1)
            .returning(|_, _| ());

        let contents = PackContents {
            energy_credits: 5,
            conditions: vec![condition_id],
            samples: vec![sample_id],
            ..PackContents::default()
        };
        harness
            .into_use_case()
            .execute(&staff(), pack_id, contents, true)
            .await
            .expect("contents entered");
    }

    #[tokio::test]
    async fn rejects_non_staff() {
        let harness = Harness::new();
        let player = Actor::new(UserId::new(), vec![]);
        let err = harness
            .into_use_case()
            .execute(&player, PackId::new(), PackContents::default(), true)
            .await
            .expect_err("forbidden");
        assert!(matches!(err, UseCaseError::Forbidden(_)));
    }
}
