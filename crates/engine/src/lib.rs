//! Interlude Engine library.
//!
//! Server-side code for the downtime resolution service.
//!
//! ## Structure
//!
//! - `use_cases/` - One struct per operation, orchestrating domain entities
//! - `infrastructure/` - Ports and their SQLite/system adapters
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
