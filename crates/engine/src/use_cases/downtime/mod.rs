//! The downtime workflow: opening a period, filling packs, staff review,
//! and batch processing.

use interlude_domain::Role;

pub mod activities;
pub mod pack_contents;
pub mod process;
pub mod review;
pub mod start_period;

/// Roles allowed to drive the downtime workflow.
pub(crate) const DOWNTIME_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::DowntimeTeam];
