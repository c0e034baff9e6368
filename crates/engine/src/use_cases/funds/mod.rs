//! Staff operations on character and group funds.
//!
//! Every mutation is written to the audit trail with the acting staff
//! member and a reason.

use std::sync::Arc;

use interlude_domain::{
    Actor, AuditAction, AuditEntry, AuditSubject, CharacterId, DomainError, Group, Role,
};

use crate::infrastructure::ports::{AuditRepo, CharacterRepo, ClockPort, GroupRepo, UnitOfWork};
use crate::use_cases::UseCaseError;

/// Roles allowed to edit funds.
const FUNDS_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::DowntimeTeam];

pub fn require_staff(actor: &Actor, allowed: &[Role], operation: &str) -> Result<(), UseCaseError> {
    if allowed.iter().any(|role| actor.has_role(*role)) {
        return Ok(());
    }
    Err(UseCaseError::forbidden(format!(
        "{operation} requires one of: {}",
        allowed
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

/// A character's spendable funds, split by source.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FundsBalance {
    pub character: i64,
    pub group: i64,
    pub available: i64,
}

pub struct LedgerOps {
    characters: Arc<dyn CharacterRepo>,
    groups: Arc<dyn GroupRepo>,
    audit: Arc<dyn AuditRepo>,
    tx: Arc<dyn UnitOfWork>,
    clock: Arc<dyn ClockPort>,
}

impl LedgerOps {
    pub fn new(
        characters: Arc<dyn CharacterRepo>,
        groups: Arc<dyn GroupRepo>,
        audit: Arc<dyn AuditRepo>,
        tx: Arc<dyn UnitOfWork>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            characters,
            groups,
            audit,
            tx,
            clock,
        }
    }

    async fn load(
        &self,
        character_id: CharacterId,
    ) -> Result<(interlude_domain::Character, Option<Group>), UseCaseError> {
        let character = self
            .characters
            .get(character_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Character", character_id.to_string()))?;
        let group = match character.group_id {
            Some(group_id) => self.groups.get(group_id).await?,
            None => None,
        };
        Ok((character, group))
    }

    fn entry(
        &self,
        actor: &Actor,
        character_id: CharacterId,
        action: AuditAction,
        details: String,
    ) -> AuditEntry {
        AuditEntry::new(
            AuditSubject::Character(character_id),
            actor.user_id,
            action,
            details,
            self.clock.now(),
        )
    }

    pub async fn balance(&self, character_id: CharacterId) -> Result<FundsBalance, UseCaseError> {
        let (character, group) = self.load(character_id).await?;
        let group_funds = group.as_ref().map_or(0, |g| g.bank_account);
        Ok(FundsBalance {
            character: character.bank_account,
            group: group_funds,
            available: character.bank_account + group_funds,
        })
    }

    pub async fn add_funds(
        &self,
        actor: &Actor,
        character_id: CharacterId,
        amount: i64,
        reason: &str,
    ) -> Result<FundsBalance, UseCaseError> {
        require_staff(actor, FUNDS_ROLES, "Adding funds")?;
        let (mut character, _) = self.load(character_id).await?;
        character.deposit(amount)?;
        let entry = self.entry(
            actor,
            character_id,
            AuditAction::FundsAdded,
            format!("Added {amount}: {reason}"),
        );
        self.tx.commit_funds(&character, None, &entry).await?;
        tracing::info!(character_id = %character_id, amount, "Funds added");
        self.balance(character_id).await
    }

    /// Withdraw funds, draining the character's own account before the
    /// group account. Fails whole when the combined balance is short.
    pub async fn remove_funds(
        &self,
        actor: &Actor,
        character_id: CharacterId,
        amount: i64,
        reason: &str,
    ) -> Result<FundsBalance, UseCaseError> {
        require_staff(actor, FUNDS_ROLES, "Removing funds")?;
        let (mut character, group) = self.load(character_id).await?;
        let split = character.plan_withdrawal(group.as_ref(), amount)?;

        character.bank_account -= split.from_character;
        let drained_group = if split.from_group > 0 {
            let mut group = group.ok_or_else(|| {
                DomainError::constraint("Withdrawal plan drew on a missing group")
            })?;
            group.withdraw(split.from_group)?;
            Some(group)
        } else {
            None
        };

        let entry = self.entry(
            actor,
            character_id,
            AuditAction::FundsRemoved,
            format!(
                "Removed {amount} for {reason} (Character: {}, Group: {})",
                split.from_character, split.from_group
            ),
        );
        self.tx
            .commit_funds(&character, drained_group, &entry)
            .await?;
        tracing::info!(character_id = %character_id, amount, "Funds removed");
        self.balance(character_id).await
    }

    pub async fn set_funds(
        &self,
        actor: &Actor,
        character_id: CharacterId,
        amount: i64,
        reason: &str,
    ) -> Result<FundsBalance, UseCaseError> {
        require_staff(actor, FUNDS_ROLES, "Setting funds")?;
        if amount < 0 {
            return Err(DomainError::validation("Balance cannot be set negative").into());
        }
        let (mut character, _) = self.load(character_id).await?;
        character.bank_account = amount;
        let entry = self.entry(
            actor,
            character_id,
            AuditAction::FundsSet,
            format!("Set funds to {amount}: {reason}"),
        );
        self.tx.commit_funds(&character, None, &entry).await?;
        self.balance(character_id).await
    }

    /// The full mutation history for one character's funds.
    pub async fn history(
        &self,
        actor: &Actor,
        character_id: CharacterId,
    ) -> Result<Vec<AuditEntry>, UseCaseError> {
        require_staff(actor, FUNDS_ROLES, "Reading the funds audit trail")?;
        Ok(self
            .audit
            .list_for_subject(AuditSubject::Character(character_id))
            .await?)
    }
}
