//! Subscription use-case orchestration
//!
//! Coordinates the repository calls behind each endpoint and applies the
//! cross-record business checks that do not belong to a single entity.
//! Persistence errors arrive pre-classified and pass through unchanged.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{PagingBase, Subscription, SubscriptionFilter, SumResult};
use crate::error::AppError;
use crate::repository::SubscriptionRepository;

/// Use-case layer over the persistence collaborator
#[derive(Clone)]
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionService {
    /// Build the service around any repository implementation
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    /// Persist a new subscription and return its id
    pub async fn create(&self, sub: Subscription) -> Result<Uuid, AppError> {
        info!(
            user_id = %sub.user_id(),
            service_name = %sub.service_name(),
            price = sub.price(),
            "creating subscription"
        );

        self.repo.create(&sub).await.map_err(|e| {
            error!(user_id = %sub.user_id(), error = %e, "create failed");
            e
        })?;

        info!(id = %sub.id(), "subscription created");
        Ok(sub.id())
    }

    /// Fetch one subscription by id
    pub async fn get(&self, id: Uuid) -> Result<Subscription, AppError> {
        debug!(id = %id, "fetching subscription");

        self.repo.get(id).await.map_err(|e| {
            error!(id = %id, error = %e, "get failed");
            e
        })
    }

    /// Page of subscriptions plus the total row count
    pub async fn list(&self, paging: &PagingBase) -> Result<(Vec<Subscription>, i64), AppError> {
        debug!(limit = paging.limit, offset = paging.offset, "listing subscriptions");

        let rows = self.repo.list(paging).await.map_err(|e| {
            error!(limit = paging.limit, offset = paging.offset, error = %e, "list failed");
            e
        })?;

        let total = self.repo.count().await.map_err(|e| {
            error!(error = %e, "total count failed");
            e
        })?;

        Ok((rows, total))
    }

    /// Filtered page plus the aggregate price over the whole filtered set.
    ///
    /// The reported count is the unfiltered table total, matching the
    /// figure the HTTP surface has always exposed.
    pub async fn sum(&self, filter: &SubscriptionFilter) -> Result<SumResult, AppError> {
        debug!(
            user_id = ?filter.user_id,
            service_name = ?filter.service_name,
            "summing subscription prices"
        );

        let (rows, total_sum) = self.repo.sum(filter).await.map_err(|e| {
            error!(user_id = ?filter.user_id, error = %e, "sum failed");
            e
        })?;

        let total_count = self.repo.count().await.map_err(|e| {
            error!(error = %e, "total count failed");
            e
        })?;

        Ok(SumResult {
            rows,
            total_sum,
            total_count,
        })
    }

    /// Replace an existing subscription.
    ///
    /// The stored record is fetched through the path id first; its id must
    /// equal the incoming entity's id, otherwise the request is rejected
    /// before any mutation.
    pub async fn update(&self, id: Uuid, sub: Subscription) -> Result<Uuid, AppError> {
        debug!(id = %id, "updating subscription");

        let existing = self.repo.get(id).await.map_err(|e| {
            if matches!(e, AppError::NotFound) {
                warn!(id = %id, "subscription not found for update");
            } else {
                error!(id = %id, error = %e, "existence check failed");
            }
            e
        })?;

        if existing.id() != sub.id() {
            warn!(path_id = %id, body_id = %sub.id(), "id mismatch");
            return Err(AppError::InvalidData);
        }

        self.repo.update(&sub).await.map_err(|e| {
            error!(id = %id, error = %e, "update failed");
            e
        })?;

        info!(id = %id, "subscription updated");
        Ok(id)
    }

    /// Delete one subscription by id
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        info!(id = %id, "deleting subscription");

        self.repo.delete(id).await.map_err(|e| {
            error!(id = %id, error = %e, "delete failed");
            e
        })?;

        info!(id = %id, "subscription deleted");
        Ok(())
    }
}
