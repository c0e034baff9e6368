//! SQLite adapter for live events.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use interlude_domain::{Event, EventId, EventTicket};

use super::{decode, encode};
use crate::infrastructure::ports::{EventRepo, RepoError};

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepo for SqliteEventRepo {
    async fn get(&self, id: EventId) -> Result<Option<Event>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM events WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("events.get", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn latest(&self) -> Result<Option<Event>, RepoError> {
        let row = sqlx::query("SELECT data_json FROM events ORDER BY event_number DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("events.latest", e))?;
        row.map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .transpose()
    }

    async fn save(&self, event: &Event) -> Result<(), RepoError> {
        let json = encode(event)?;
        sqlx::query(
            r#"
            INSERT INTO events (id, event_number, data_json) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                event_number = excluded.event_number,
                data_json = excluded.data_json
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.event_number)
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("events.save", e))?;
        Ok(())
    }

    async fn save_ticket(&self, ticket: &EventTicket) -> Result<(), RepoError> {
        let json = encode(ticket)?;
        let result = sqlx::query(
            r#"
            INSERT INTO event_tickets (id, event_id, character_id, data_json)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(ticket.event_id.to_string())
        .bind(ticket.character_id.to_string())
        .bind(json)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(RepoError::constraint(
                "Character already has a ticket for this event",
            )),
            Err(e) => Err(RepoError::database("events.save_ticket", e)),
        }
    }

    async fn list_tickets(&self, event_id: EventId) -> Result<Vec<EventTicket>, RepoError> {
        let rows = sqlx::query("SELECT data_json FROM event_tickets WHERE event_id = ?")
            .bind(event_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database("events.list_tickets", e))?;
        rows.iter()
            .map(|r| decode(r.get::<String, _>("data_json").as_str()))
            .collect()
    }
}
