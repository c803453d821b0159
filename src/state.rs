//! Shared application state
//!
//! Collaborators are constructed once at startup and threaded into the
//! handlers through this state; there is no ambient global.

use crate::services::SubscriptionService;

/// State shared across request handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription use-case service
    pub service: SubscriptionService,
}

impl AppState {
    /// Bundle the startup-constructed collaborators
    pub fn new(service: SubscriptionService) -> Self {
        Self { service }
    }
}
