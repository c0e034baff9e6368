//! Application state and composition.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    notifier::LogNotifier,
    ports::{
        AuditRepo, CatalogRepo, CharacterRepo, ClockPort, DowntimeRepo, EventRepo, GroupRepo,
        ItemRepo, NotifierPort, RandomPort, ResearchRepo, UnitOfWork,
    },
    sqlite::{
        SqliteAuditRepo, SqliteCatalogRepo, SqliteCharacterRepo, SqliteDowntimeRepo,
        SqliteEventRepo, SqliteGroupRepo, SqliteItemRepo, SqliteResearchRepo, SqliteUnitOfWork,
    },
};
use crate::use_cases;

/// Main application state, passed to HTTP handlers via axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Port traits injected directly; handlers and use cases never see the
/// concrete adapters.
pub struct Repositories {
    pub characters: Arc<dyn CharacterRepo>,
    pub groups: Arc<dyn GroupRepo>,
    pub events: Arc<dyn EventRepo>,
    pub catalog: Arc<dyn CatalogRepo>,
    pub items: Arc<dyn ItemRepo>,
    pub research: Arc<dyn ResearchRepo>,
    pub downtime: Arc<dyn DowntimeRepo>,
    pub audit: Arc<dyn AuditRepo>,
}

pub struct UseCases {
    pub funds: use_cases::funds::LedgerOps,
    pub capacity: use_cases::characters::DowntimeCapacity,
    pub events: use_cases::events::EventOps,
    pub research: use_cases::research::ResearchOps,
    pub start_period: use_cases::downtime::start_period::StartPeriod,
    pub enter_pack_contents: use_cases::downtime::pack_contents::EnterPackContents,
    pub submit_activities: use_cases::downtime::activities::SubmitActivities,
    pub record_review: use_cases::downtime::review::RecordReview,
    pub process_period: use_cases::downtime::process::ProcessPeriod,
}

impl App {
    /// Wire every use case against the SQLite adapters.
    pub fn new(pool: SqlitePool) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());
        let notifier: Arc<dyn NotifierPort> = Arc::new(LogNotifier::new());

        let characters: Arc<dyn CharacterRepo> = Arc::new(SqliteCharacterRepo::new(pool.clone()));
        let groups: Arc<dyn GroupRepo> = Arc::new(SqliteGroupRepo::new(pool.clone()));
        let events: Arc<dyn EventRepo> = Arc::new(SqliteEventRepo::new(pool.clone()));
        let catalog: Arc<dyn CatalogRepo> = Arc::new(SqliteCatalogRepo::new(pool.clone()));
        let items: Arc<dyn ItemRepo> = Arc::new(SqliteItemRepo::new(pool.clone()));
        let research: Arc<dyn ResearchRepo> = Arc::new(SqliteResearchRepo::new(pool.clone()));
        let downtime: Arc<dyn DowntimeRepo> = Arc::new(SqliteDowntimeRepo::new(pool.clone()));
        let audit: Arc<dyn AuditRepo> = Arc::new(SqliteAuditRepo::new(pool.clone()));
        let tx: Arc<dyn UnitOfWork> = Arc::new(SqliteUnitOfWork::new(pool));

        let use_cases = UseCases {
            funds: use_cases::funds::LedgerOps::new(
                characters.clone(),
                groups.clone(),
                audit.clone(),
                tx.clone(),
                clock.clone(),
            ),
            capacity: use_cases::characters::DowntimeCapacity::new(
                characters.clone(),
                catalog.clone(),
            ),
            events: use_cases::events::EventOps::new(events.clone(), characters.clone()),
            research: use_cases::research::ResearchOps::new(research.clone(), random.clone()),
            start_period: use_cases::downtime::start_period::StartPeriod::new(
                downtime.clone(),
                events.clone(),
                characters.clone(),
                notifier.clone(),
            ),
            enter_pack_contents: use_cases::downtime::pack_contents::EnterPackContents::new(
                downtime.clone(),
                characters.clone(),
                groups.clone(),
                catalog.clone(),
                tx.clone(),
                clock.clone(),
                notifier.clone(),
            ),
            submit_activities: use_cases::downtime::activities::SubmitActivities::new(
                downtime.clone(),
                characters.clone(),
            ),
            record_review: use_cases::downtime::review::RecordReview::new(downtime.clone()),
            process_period: use_cases::downtime::process::ProcessPeriod::new(
                downtime.clone(),
                characters.clone(),
                groups.clone(),
                events.clone(),
                catalog.clone(),
                items.clone(),
                research.clone(),
                tx,
                notifier,
                random,
            ),
        };

        Self {
            repositories: Repositories {
                characters,
                groups,
                events,
                catalog,
                items,
                research,
                downtime,
                audit,
            },
            use_cases,
        }
    }
}
