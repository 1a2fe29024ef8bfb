//! Request / response types for the HTTP API.

pub mod chat;
pub mod feedback;
