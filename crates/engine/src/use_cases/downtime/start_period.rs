//! Open a downtime period for a chosen event.

use std::collections::HashSet;
use std::sync::Arc;

use interlude_domain::{Actor, DomainError, DowntimePack, DowntimePeriod, EventId};

use crate::infrastructure::ports::{CharacterRepo, DowntimeRepo, EventRepo, NotifierPort};
use crate::use_cases::downtime::DOWNTIME_ROLES;
use crate::use_cases::funds::require_staff;
use crate::use_cases::UseCaseError;

/// Opens a period against a staff-chosen event and creates one pack per
/// ticketed character. Fails when a period is already pending.
pub struct StartPeriod {
    downtime: Arc<dyn DowntimeRepo>,
    events: Arc<dyn EventRepo>,
    characters: Arc<dyn CharacterRepo>,
    notifier: Arc<dyn NotifierPort>,
}

impl StartPeriod {
    pub fn new(
        downtime: Arc<dyn DowntimeRepo>,
        events: Arc<dyn EventRepo>,
        characters: Arc<dyn CharacterRepo>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        Self {
            downtime,
            events,
            characters,
            notifier,
        }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        event_id: EventId,
    ) -> Result<DowntimePeriod, UseCaseError> {
        require_staff(actor, DOWNTIME_ROLES, "Starting a downtime period")?;

        if self.downtime.pending_period().await?.is_some() {
            return Err(
                DomainError::constraint("A downtime period is already pending").into(),
            );
        }
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", event_id.to_string()))?;

        let period = DowntimePeriod::open(event.id);
        self.downtime.save_period(&period).await?;

        let tickets = self.events.list_tickets(event.id).await?;
        let holders: HashSet<_> = tickets.iter().map(|t| t.character_id).collect();
        let mut packs = 0usize;
        for character_id in holders {
            let Some(character) = self.characters.get(character_id).await? else {
                tracing::warn!(
                    character_id = %character_id,
                    "Ticket holder has no character record, skipping pack"
                );
                continue;
            };
            let pack = DowntimePack::open(period.id, character.id);
            self.downtime.save_pack(&pack).await?;
            self.notifier
                .notify(
                    character.user_id,
                    format!("Downtime for {} is open", event.name),
                )
                .await;
            packs += 1;
        }

        tracing::info!(
            period_id = %period.id,
            event = %event.name,
            packs,
            "Downtime period opened"
        );
        Ok(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        MockCharacterRepo, MockDowntimeRepo, MockEventRepo, MockNotifierPort,
    };
    use interlude_domain::{Character, Event, EventTicket, Role, UserId};
    use mockall::predicate::eq;

    fn staff() -> Actor {
        Actor::new(UserId::new(), vec![Role::DowntimeTeam])
    }

    #[tokio::test]
    async fn packs_open_only_for_ticket_holders() {
        let mut downtime = MockDowntimeRepo::new();
        let mut events = MockEventRepo::new();
        let mut characters = MockCharacterRepo::new();
        let mut notifier = MockNotifierPort::new();

        let event = Event::new("Summer Event".into(), 7);
        let event_id = event.id;
        let attending = Character::new(UserId::new(), "Vex".into(), "12.3".into());
        let attending_id = attending.id;

        downtime.expect_pending_period().returning(|| Ok(None));
        events
            .expect_get()
            .with(eq(event_id))
            .returning(move |_| Ok(Some(event.clone())));
        downtime.expect_save_period().returning(|_| Ok(()));
        events
            .expect_list_tickets()
            .with(eq(event_id))
            .returning(move |_| Ok(vec![EventTicket::new(event_id, attending_id)]));
        characters
            .expect_get()
            .with(eq(attending_id))
            .returning(move |_| Ok(Some(attending.clone())));
        downtime
            .expect_save_pack()
            .withf(move |pack| pack.character_id == attending_id)
            .times(1)
            .returning(|_| Ok(()));
        notifier.expect_notify().times(1).returning(|_, _| ());

        let use_case = StartPeriod::new(
            Arc::new(downtime),
            Arc::new(events),
            Arc::new(characters),
            Arc::new(notifier),
        );
        let period = use_case
            .execute(&staff(), event_id)
            .await
            .expect("period opened");
        assert_eq!(period.status, interlude_domain::PeriodStatus::Pending);
        assert_eq!(period.event_id, event_id);
    }

    #[tokio::test]
    async fn refuses_second_pending_period() {
        let mut downtime = MockDowntimeRepo::new();
        downtime
            .expect_pending_period()
            .returning(|| Ok(Some(DowntimePeriod::open(EventId::new()))));
        downtime.expect_save_period().never();

        let use_case = StartPeriod::new(
            Arc::new(downtime),
            Arc::new(MockEventRepo::new()),
            Arc::new(MockCharacterRepo::new()),
            Arc::new(MockNotifierPort::new()),
        );
        let err = use_case
            .execute(&staff(), EventId::new())
            .await
            .expect_err("already open");
        assert!(matches!(
            err,
            UseCaseError::Domain(DomainError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn requires_the_chosen_event_to_exist() {
        let mut downtime = MockDowntimeRepo::new();
        let mut events = MockEventRepo::new();
        downtime.expect_pending_period().returning(|| Ok(None));
        events.expect_get().returning(|_| Ok(None));

        let use_case = StartPeriod::new(
            Arc::new(downtime),
            Arc::new(events),
            Arc::new(MockCharacterRepo::new()),
            Arc::new(MockNotifierPort::new()),
        );
        let err = use_case
            .execute(&staff(), EventId::new())
            .await
            .expect_err("missing event");
        assert!(matches!(
            err,
            UseCaseError::Domain(DomainError::NotFound { .. })
        ));
    }
}
