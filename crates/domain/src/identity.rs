//! Actor identity consumed from the upstream auth collaborator.
//!
//! Authentication, sessions, and password handling live outside this
//! service; requests arrive already identified and carry the actor's user
//! id and role set.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Staff and player roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    UserAdmin,
    RulesTeam,
    PlotTeam,
    DowntimeTeam,
    Npc,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::UserAdmin => write!(f, "user_admin"),
            Self::RulesTeam => write!(f, "rules_team"),
            Self::PlotTeam => write!(f, "plot_team"),
            Self::DowntimeTeam => write!(f, "downtime_team"),
            Self::Npc => write!(f, "npc"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "user_admin" => Ok(Self::UserAdmin),
            "rules_team" => Ok(Self::RulesTeam),
            "plot_team" => Ok(Self::PlotTeam),
            "downtime_team" => Ok(Self::DowntimeTeam),
            "npc" => Ok(Self::Npc),
            _ => Err(crate::error::DomainError::parse(format!(
                "Unknown role: {s}"
            ))),
        }
    }
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        let role: Role = "downtime_team".parse().expect("parses");
        assert_eq!(role, Role::DowntimeTeam);
        assert_eq!(role.to_string(), "downtime_team");
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("quartermaster".parse::<Role>().is_err());
    }

    #[test]
    fn test_has_role() {
        let actor = Actor::new(UserId::new(), vec![Role::DowntimeTeam]);
        assert!(actor.has_role(Role::DowntimeTeam));
        assert!(!actor.has_role(Role::PlotTeam));
    }
}
