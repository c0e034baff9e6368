//! Live events. The monotonically increasing event number anchors item
//! expiry and downtime periods.

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, EventId, TicketId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub event_number: i32,
}

impl Event {
    pub fn new(name: String, event_number: i32) -> Self {
        Self {
            id: EventId::new(),
            name,
            event_number,
        }
    }
}

/// A character's booked attendance at an event. Downtime packs are opened
/// for ticket holders only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTicket {
    pub id: TicketId,
    pub event_id: EventId,
    pub character_id: CharacterId,
}

impl EventTicket {
    pub fn new(event_id: EventId, character_id: CharacterId) -> Self {
        Self {
            id: TicketId::new(),
            event_id,
            character_id,
        }
    }
}
