pub mod audit;
pub mod catalog;
pub mod character;
pub mod downtime;
pub mod event;
pub mod group;
pub mod research;
