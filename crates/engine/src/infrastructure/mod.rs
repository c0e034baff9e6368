pub mod clock;
pub mod notifier;
pub mod ports;
pub mod sqlite;
