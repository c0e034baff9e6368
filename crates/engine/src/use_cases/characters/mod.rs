//! Character views derived from catalog holdings.

use std::sync::Arc;

use interlude_domain::{
    engineering_slots, science_slots, CharacterId, Cybernetic, DomainError, EngineeringSlot,
    ScienceSlot, Skill,
};

use crate::infrastructure::ports::{CatalogRepo, CharacterRepo};
use crate::use_cases::UseCaseError;

/// The downtime actions a character is entitled to declare, shown to the
/// player while they fill in their pack.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CapacityView {
    pub science: Vec<ScienceSlot>,
    pub engineering: Vec<EngineeringSlot>,
}

pub struct DowntimeCapacity {
    characters: Arc<dyn CharacterRepo>,
    catalog: Arc<dyn CatalogRepo>,
}

impl DowntimeCapacity {
    pub fn new(characters: Arc<dyn CharacterRepo>, catalog: Arc<dyn CatalogRepo>) -> Self {
        Self {
            characters,
            catalog,
        }
    }

    /// Resolve the character's skills, cybernetics, and research-team
    /// memberships into slots. Holdings that no longer exist in the catalog
    /// grant nothing.
    pub async fn execute(&self, character_id: CharacterId) -> Result<CapacityView, UseCaseError> {
        let character = self
            .characters
            .get(character_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Character", character_id.to_string()))?;

        let mut skills: Vec<(Skill, u32)> = Vec::new();
        for held in &character.skills {
            if let Some(skill) = self.catalog.get_skill(held.skill_id).await? {
                skills.push((skill, held.times_purchased));
            }
        }
        let mut cybernetics: Vec<Cybernetic> = Vec::new();
        for cybernetic_id in &character.cybernetics {
            if let Some(cybernetic) = self.catalog.get_cybernetic(*cybernetic_id).await? {
                cybernetics.push(cybernetic);
            }
        }
        let mut research_teams = Vec::new();
        for faction_id in &character.factions {
            if let Some(faction) = self.catalog.get_faction(*faction_id).await? {
                if faction.is_research_team {
                    research_teams.push(faction.name);
                }
            }
        }

        let skill_refs: Vec<(&Skill, u32)> = skills.iter().map(|(s, n)| (s, *n)).collect();
        let cybernetic_refs: Vec<&Cybernetic> = cybernetics.iter().collect();

        Ok(CapacityView {
            science: science_slots(&skill_refs, &cybernetic_refs, &research_teams),
            engineering: engineering_slots(&skill_refs, &cybernetic_refs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockCatalogRepo, MockCharacterRepo};
    use interlude_domain::{
        Character, CharacterSkill, Faction, FactionId, ScienceType, SkillId, UserId,
    };

    #[tokio::test]
    async fn slots_combine_skills_and_research_teams() {
        let mut characters = MockCharacterRepo::new();
        let mut catalog = MockCatalogRepo::new();

        let skill = Skill {
            id: SkillId::new(),
            name: "Etheric Theory".into(),
            adds_science_downtime: 1,
            science_type: Some(ScienceType::Etheric),
            adds_engineering_downtime: 0,
        };
        let faction = Faction {
            id: FactionId::new(),
            name: "Ministry of Sciences".into(),
            is_research_team: true,
        };

        let mut character = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        character.skills.push(CharacterSkill {
            skill_id: skill.id,
            times_purchased: 2,
        });
        character.factions.push(faction.id);
        let character_id = character.id;

        characters
            .expect_get()
            .returning(move |_| Ok(Some(character.clone())));
        catalog
            .expect_get_skill()
            .returning(move |_| Ok(Some(skill.clone())));
        catalog
            .expect_get_faction()
            .returning(move |_| Ok(Some(faction.clone())));

        let use_case = DowntimeCapacity::new(Arc::new(characters), Arc::new(catalog));
        let view = use_case.execute(character_id).await.expect("capacity");

        assert_eq!(view.science.len(), 3);
        assert_eq!(
            view.science
                .iter()
                .filter(|s| s.science_type == ScienceType::Etheric)
                .count(),
            2
        );
        assert!(view.engineering.is_empty());
    }

    #[tokio::test]
    async fn missing_character_is_not_found() {
        let mut characters = MockCharacterRepo::new();
        characters.expect_get().returning(|_| Ok(None));

        let use_case =
            DowntimeCapacity::new(Arc::new(characters), Arc::new(MockCatalogRepo::new()));
        let err = use_case
            .execute(CharacterId::new())
            .await
            .expect_err("missing");
        assert!(err.is_not_found());
    }
}
