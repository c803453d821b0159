//! API module
//!
//! Contains the wire DTOs and HTTP request handlers for the subscription
//! endpoints.

pub mod dto;
pub mod subscriptions;
