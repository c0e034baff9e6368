//! Staff management of events and attendance tickets.

use std::sync::Arc;

use interlude_domain::{Actor, CharacterId, DomainError, Event, EventId, EventTicket, Role};

use crate::infrastructure::ports::{CharacterRepo, EventRepo};
use crate::use_cases::funds::require_staff;
use crate::use_cases::UseCaseError;

const EVENT_ROLES: &[Role] = &[Role::Owner, Role::Admin, Role::DowntimeTeam];

pub struct EventOps {
    events: Arc<dyn EventRepo>,
    characters: Arc<dyn CharacterRepo>,
}

impl EventOps {
    pub fn new(events: Arc<dyn EventRepo>, characters: Arc<dyn CharacterRepo>) -> Self {
        Self { events, characters }
    }

    pub async fn create_event(
        &self,
        actor: &Actor,
        name: String,
        event_number: i32,
    ) -> Result<Event, UseCaseError> {
        require_staff(actor, EVENT_ROLES, "Creating an event")?;
        let event = Event::new(name, event_number);
        self.events.save(&event).await?;
        tracing::info!(event_id = %event.id, event_number, "Event created");
        Ok(event)
    }

    pub async fn latest_event(&self) -> Result<Option<Event>, UseCaseError> {
        Ok(self.events.latest().await?)
    }

    /// Book a character onto an event. Duplicate bookings are rejected by
    /// storage.
    pub async fn assign_ticket(
        &self,
        actor: &Actor,
        event_id: EventId,
        character_id: CharacterId,
    ) -> Result<EventTicket, UseCaseError> {
        require_staff(actor, EVENT_ROLES, "Assigning an event ticket")?;
        self.events
            .get(event_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event", event_id.to_string()))?;
        self.characters
            .get(character_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Character", character_id.to_string()))?;

        let ticket = EventTicket::new(event_id, character_id);
        self.events.save_ticket(&ticket).await?;
        tracing::info!(event_id = %event_id, character_id = %character_id, "Ticket assigned");
        Ok(ticket)
    }

    pub async fn list_tickets(
        &self,
        actor: &Actor,
        event_id: EventId,
    ) -> Result<Vec<EventTicket>, UseCaseError> {
        require_staff(actor, EVENT_ROLES, "Listing event tickets")?;
        Ok(self.events.list_tickets(event_id).await?)
    }
}
