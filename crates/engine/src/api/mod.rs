//! HTTP surface.

pub mod http;
