//! Use cases: one struct per operation, depending on ports only.

use interlude_domain::DomainError;

use crate::infrastructure::ports::RepoError;

pub mod characters;
pub mod downtime;
pub mod events;
pub mod funds;
pub mod research;

/// Error surface shared by all use cases.
#[derive(Debug, thiserror::Error)]
pub enum UseCaseError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    /// The actor lacks the role the operation requires.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl UseCaseError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Domain(DomainError::NotFound { .. }) | Self::Repo(RepoError::NotFound { .. })
        )
    }
}
