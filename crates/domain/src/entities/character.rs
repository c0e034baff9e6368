//! Player characters, their funds, and derived downtime capacity.

use serde::{Deserialize, Serialize};

use crate::entities::catalog::{Cybernetic, Skill};
use crate::entities::research::ScienceType;
use crate::error::DomainError;
use crate::ids::{CharacterId, ConditionId, CyberneticId, FactionId, GroupId, ModId, SkillId, UserId};
use crate::value_objects::character_pack::CharacterPack;

use super::group::Group;

/// A skill held by a character, with purchase count (slot-granting skills
/// stack per purchase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSkill {
    pub skill_id: SkillId,
    pub times_purchased: u32,
}

/// How a withdrawal splits across the character's own funds and the
/// group account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundsSplit {
    pub from_character: i64,
    pub from_group: i64,
}

/// One science downtime action the character may declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScienceSlot {
    /// Name of the skill, cybernetic, or faction granting the slot.
    pub source: String,
    pub science_type: ScienceType,
}

/// One engineering downtime action the character may declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineeringSlot {
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub user_id: UserId,
    pub name: String,
    /// Printed player reference, "{player_number}.{character_number}".
    pub player_reference: String,
    pub group_id: Option<GroupId>,
    pub bank_account: i64,
    pub known_modifications: Vec<ModId>,
    pub skills: Vec<CharacterSkill>,
    pub cybernetics: Vec<CyberneticId>,
    pub conditions: Vec<ConditionId>,
    pub factions: Vec<FactionId>,
    pub pack: CharacterPack,
}

impl Character {
    pub fn new(user_id: UserId, name: String, player_reference: String) -> Self {
        Self {
            id: CharacterId::new(),
            user_id,
            name,
            player_reference,
            group_id: None,
            bank_account: 0,
            known_modifications: Vec::new(),
            skills: Vec::new(),
            cybernetics: Vec::new(),
            conditions: Vec::new(),
            factions: Vec::new(),
            pack: CharacterPack::default(),
        }
    }

    /// Total the character can spend: own funds plus the group account.
    pub fn available_funds(&self, group: Option<&Group>) -> i64 {
        self.bank_account + group.map_or(0, |g| g.bank_account)
    }

    /// Decide how a withdrawal is covered: the character's own account is
    /// drained first, the group account covers the remainder. Fails without
    /// side effects when the combined balance is short.
    pub fn plan_withdrawal(
        &self,
        group: Option<&Group>,
        amount: i64,
    ) -> Result<FundsSplit, DomainError> {
        if amount < 0 {
            return Err(DomainError::validation("Withdrawal amount cannot be negative"));
        }
        let available = self.available_funds(group);
        if amount > available {
            return Err(DomainError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let from_character = self.bank_account.min(amount);
        Ok(FundsSplit {
            from_character,
            from_group: amount - from_character,
        })
    }

    pub fn deposit(&mut self, amount: i64) -> Result<(), DomainError> {
        if amount < 0 {
            return Err(DomainError::validation("Deposit amount cannot be negative"));
        }
        self.bank_account += amount;
        Ok(())
    }
}

/// Science slots granted by the character's skills, cybernetics, and
/// research-team faction memberships. Callers pass the resolved catalog
/// rows for the character's holdings.
pub fn science_slots(
    skills: &[(&Skill, u32)],
    cybernetics: &[&Cybernetic],
    research_team_factions: &[String],
) -> Vec<ScienceSlot> {
    let mut slots = Vec::new();
    for (skill, times_purchased) in skills {
        let granted = skill.adds_science_downtime * times_purchased;
        for _ in 0..granted {
            slots.push(ScienceSlot {
                source: skill.name.clone(),
                science_type: skill.science_type.unwrap_or_default(),
            });
        }
    }
    for cybernetic in cybernetics {
        for _ in 0..cybernetic.adds_science_downtime {
            slots.push(ScienceSlot {
                source: cybernetic.name.clone(),
                science_type: cybernetic.science_type.unwrap_or_default(),
            });
        }
    }
    for faction in research_team_factions {
        slots.push(ScienceSlot {
            source: faction.clone(),
            science_type: ScienceType::Generic,
        });
    }
    slots
}

/// Engineering slots granted by skills and cybernetics.
pub fn engineering_slots(
    skills: &[(&Skill, u32)],
    cybernetics: &[&Cybernetic],
) -> Vec<EngineeringSlot> {
    let mut slots = Vec::new();
    for (skill, times_purchased) in skills {
        let granted = skill.adds_engineering_downtime * times_purchased;
        for _ in 0..granted {
            slots.push(EngineeringSlot {
                source: skill.name.clone(),
            });
        }
    }
    for cybernetic in cybernetics {
        for _ in 0..cybernetic.adds_engineering_downtime {
            slots.push(EngineeringSlot {
                source: cybernetic.name.clone(),
            });
        }
    }
    slots
}
