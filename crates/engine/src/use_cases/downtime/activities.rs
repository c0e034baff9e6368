//! Player submission of declared downtime activities.

use std::sync::Arc;

use interlude_domain::{Actor, Declarations, DomainError, DowntimePack, PackId, Role};

use crate::infrastructure::ports::{CharacterRepo, DowntimeRepo};
use crate::use_cases::UseCaseError;

/// Accepts a player's declarations for their own pack. Staff may submit on
/// a player's behalf. Malformed or unknown declarations reject the whole
/// submission.
pub struct SubmitActivities {
    downtime: Arc<dyn DowntimeRepo>,
    characters: Arc<dyn CharacterRepo>,
}

impl SubmitActivities {
    pub fn new(downtime: Arc<dyn DowntimeRepo>, characters: Arc<dyn CharacterRepo>) -> Self {
        Self {
            downtime,
            characters,
        }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        pack_id: PackId,
        declarations: Declarations,
        confirm: bool,
    ) -> Result<DowntimePack, UseCaseError> {
        let mut pack = self
            .downtime
            .get_pack(pack_id)
            .await?
            .ok_or_else(|| DomainError::not_found("DowntimePack", pack_id.to_string()))?;

        let character = self
            .characters
            .get(pack.character_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Character", pack.character_id.to_string()))?;
        let is_staff = actor.has_role(Role::Owner)
            || actor.has_role(Role::Admin)
            || actor.has_role(Role::DowntimeTeam);
        if character.user_id != actor.user_id && !is_staff {
            return Err(UseCaseError::forbidden(
                "Only the owning player or downtime staff may submit activities",
            ));
        }

        declarations.validate()?;
        pack.submit_activities(declarations, confirm)?;
        self.downtime.save_pack(&pack).await?;
        tracing::info!(pack_id = %pack_id, character_id = %pack.character_id, "Activities submitted");
        Ok(pack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockCharacterRepo, MockDowntimeRepo};
    use interlude_domain::{
        Character, CharacterId, PackContents, PackPhase, PeriodId, ResearchContribution,
        ContributionTarget, UserId,
    };

    fn pack_awaiting_activities(character_id: CharacterId) -> DowntimePack {
        let mut pack = DowntimePack::open(PeriodId::new(), character_id);
        pack.enter_contents(PackContents::default(), true).expect("contents");
        pack
    }

    #[tokio::test]
    async fn owning_player_can_submit() {
        let mut downtime = MockDowntimeRepo::new();
        let mut characters = MockCharacterRepo::new();

        let user_id = UserId::new();
        let character = Character::new(user_id, "Vex".into(), "12.3".into());
        let pack = pack_awaiting_activities(character.id);
        let pack_id = pack.id;

        downtime
            .expect_get_pack()
            .returning(move |_| Ok(Some(pack.clone())));
        characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        downtime
            .expect_save_pack()
            .withf(|p| p.phase == PackPhase::ManualReview)
            .returning(|_| Ok(()));

        let use_case = SubmitActivities::new(Arc::new(downtime), Arc::new(characters));
        let actor = Actor::new(user_id, vec![]);
        let updated = use_case
            .execute(&actor, pack_id, Declarations::default(), true)
            .await
            .expect("submitted");
        assert_eq!(updated.phase, PackPhase::ManualReview);
    }

    #[tokio::test]
    async fn unconfirmed_submission_stays_editable() {
        let mut downtime = MockDowntimeRepo::new();
        let mut characters = MockCharacterRepo::new();

        let user_id = UserId::new();
        let character = Character::new(user_id, "Vex".into(), "12.3".into());
        let pack = pack_awaiting_activities(character.id);
        let pack_id = pack.id;

        downtime
            .expect_get_pack()
            .returning(move |_| Ok(Some(pack.clone())));
        characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        downtime
            .expect_save_pack()
            .withf(|p| p.phase == PackPhase::EnterDowntime)
            .returning(|_| Ok(()));

        let use_case = SubmitActivities::new(Arc::new(downtime), Arc::new(characters));
        let actor = Actor::new(user_id, vec![]);
        let updated = use_case
            .execute(&actor, pack_id, Declarations::default(), false)
            .await
            .expect("saved");
        assert_eq!(updated.phase, PackPhase::EnterDowntime);
    }

    #[tokio::test]
    async fn other_players_are_rejected() {
        let mut downtime = MockDowntimeRepo::new();
        let mut characters = MockCharacterRepo::new();

        let character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        let pack = pack_awaiting_activities(character.id);
        let pack_id = pack.id;

        downtime
            .expect_get_pack()
            .returning(move |_| Ok(Some(pack.clone())));
        characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        downtime.expect_save_pack().never();

        let use_case = SubmitActivities::new(Arc::new(downtime), Arc::new(characters));
        let stranger = Actor::new(UserId::new(), vec![]);
        let err = use_case
            .execute(&stranger, pack_id, Declarations::default(), true)
            .await
            .expect_err("forbidden");
        assert!(matches!(err, UseCaseError::Forbidden(_)));
    }

    #[tokio::test]
    async fn invalid_declarations_reject_whole_submission() {
        let mut downtime = MockDowntimeRepo::new();
        let mut characters = MockCharacterRepo::new();

        let user_id = UserId::new();
        let character = Character::new(user_id, "Vex".into(), "12.3".into());
        let pack = pack_awaiting_activities(character.id);
        let pack_id = pack.id;

        downtime
            .expect_get_pack()
            .returning(move |_| Ok(Some(pack.clone())));
        characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        downtime.expect_save_pack().never();

        let use_case = SubmitActivities::new(Arc::new(downtime), Arc::new(characters));
        let actor = Actor::new(user_id, vec![]);

        let empty_contribution = Declarations {
            contributions: vec![ResearchContribution {
                project: "amber-signal-vault".into(),
                target: ContributionTarget::Own,
                exotics: vec![],
                items: vec![],
                samples: vec![],
            }],
            ..Declarations::default()
        };
        let err = use_case
            .execute(&actor, pack_id, empty_contribution, true)
            .await
            .expect_err("invalid");
        assert!(matches!(
            err,
            UseCaseError::Domain(DomainError::Validation(_))
        ));
    }
}
