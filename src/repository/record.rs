//! Row-level representation of subscriptions
//!
//! The record mirrors the `subscriptions` table; conversions to and from
//! the domain aggregate are pure. Rows re-enter the domain through the
//! validating factory, so stored data never bypasses the invariants.

use chrono::NaiveDate;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{DomainError, MonthDate, Subscription};

/// Row shape of the `subscriptions` table
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRecord {
    /// Primary key
    pub id: Uuid,
    /// Service name column
    pub service_name: String,
    /// Owning user column
    pub user_id: Uuid,
    /// Price column, minor currency units
    pub price: i32,
    /// First-of-month start date
    pub start_date: NaiveDate,
    /// Nullable first-of-month end date
    pub end_date: Option<NaiveDate>,
}

impl SubscriptionRecord {
    /// Flatten the aggregate into a row
    pub fn from_domain(sub: &Subscription) -> Self {
        Self {
            id: sub.id(),
            service_name: sub.service_name().to_string(),
            user_id: sub.user_id(),
            price: sub.price(),
            start_date: sub.start_date().as_date(),
            end_date: sub.end_date().map(|d| d.as_date()),
        }
    }

    /// Rebuild the aggregate, re-running the factory validation
    pub fn into_domain(self) -> Result<Subscription, DomainError> {
        Subscription::new(
            Some(self.id),
            self.service_name,
            self.price,
            self.user_id,
            MonthDate::from_date(self.start_date),
            self.end_date.map(MonthDate::from_date),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Utc};

    fn first_of_current_month() -> NaiveDate {
        let now = Utc::now().date_naive();
        NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap()
    }

    #[test]
    fn test_record_round_trips_through_domain() {
        let record = SubscriptionRecord {
            id: Uuid::new_v4(),
            service_name: "Spotify".to_string(),
            user_id: Uuid::new_v4(),
            price: 499,
            start_date: first_of_current_month(),
            end_date: None,
        };

        let sub = record.clone().into_domain().unwrap();
        assert_eq!(sub.id(), record.id);
        assert_eq!(sub.service_name(), "Spotify");
        assert_eq!(sub.price(), 499);
        assert_eq!(sub.user_id(), record.user_id);
        assert_eq!(sub.end_date(), None);

        let back = SubscriptionRecord::from_domain(&sub);
        assert_eq!(back.id, record.id);
        assert_eq!(back.start_date, record.start_date);
        assert_eq!(back.end_date, None);
    }

    #[test]
    fn test_record_rejects_rows_violating_invariants() {
        let record = SubscriptionRecord {
            id: Uuid::new_v4(),
            service_name: String::new(),
            user_id: Uuid::new_v4(),
            price: 499,
            start_date: first_of_current_month(),
            end_date: None,
        };

        assert_eq!(
            record.into_domain(),
            Err(DomainError::EmptyServiceName)
        );
    }
}
