//! Staff review of a submitted pack.

use std::sync::Arc;

use interlude_domain::{Actor, DomainError, DowntimePack, PackId, ReviewData};

use crate::infrastructure::ports::DowntimeRepo;
use crate::use_cases::downtime::DOWNTIME_ROLES;
use crate::use_cases::funds::require_staff;
use crate::use_cases::UseCaseError;

pub struct RecordReview {
    downtime: Arc<dyn DowntimeRepo>,
}

impl RecordReview {
    pub fn new(downtime: Arc<dyn DowntimeRepo>) -> Self {
        Self { downtime }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        pack_id: PackId,
        review: ReviewData,
        confirm: bool,
    ) -> Result<DowntimePack, UseCaseError> {
        require_staff(actor, DOWNTIME_ROLES, "Reviewing a pack")?;
        let mut pack = self
            .downtime
            .get_pack(pack_id)
            .await?
            .ok_or_else(|| DomainError::not_found("DowntimePack", pack_id.to_string()))?;
        pack.record_review(review, confirm)?;
        self.downtime.save_pack(&pack).await?;
        tracing::info!(pack_id = %pack_id, "Pack review recorded");
        Ok(pack)
    }
}
