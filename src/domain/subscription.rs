//! Subscription aggregate and its value types
//!
//! Everything is constructed through validating factories; there is no
//! partial state. Dates are month-granular and normalized to the first
//! of the month in UTC.

use chrono::{Datelike, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Default page size when a non-positive limit is supplied
pub const DEFAULT_LIMIT: i64 = 10;

/// Validation errors produced by the domain factories
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    /// Date text does not match the wire format
    #[error("invalid date format, expected MM-YYYY")]
    InvalidDateFormat,
    /// Start date falls before the current calendar month
    #[error("invalid start date")]
    InvalidStartDate,
    /// End date failed the same validity check as the start date
    #[error("invalid end date")]
    InvalidEndDate,
    /// Price must be a positive amount of minor currency units
    #[error("invalid price")]
    InvalidPrice,
    /// Service name must be non-empty
    #[error("service name is empty")]
    EmptyServiceName,
    /// Start bound is after the end bound
    #[error("start date cannot be after end date")]
    StartAfterEnd,
}

/// Subscription price in minor currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price(i32);

impl Price {
    /// Accepts positive values only; there is no upper bound.
    pub fn new(value: i32) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidPrice);
        }
        Ok(Self(value))
    }

    /// Raw amount in minor units
    pub fn value(self) -> i32 {
        self.0
    }
}

/// Month-granularity date, normalized to the first of the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDate(NaiveDate);

impl MonthDate {
    /// Parse the `"MM-YYYY"` wire format.
    ///
    /// The month must be two digits in 01-12 and the year four digits;
    /// anything else is rejected as [`DomainError::InvalidDateFormat`].
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let (month, year) = text
            .split_once('-')
            .ok_or(DomainError::InvalidDateFormat)?;
        if month.len() != 2 || year.len() != 4 {
            return Err(DomainError::InvalidDateFormat);
        }
        let month: u32 = month.parse().map_err(|_| DomainError::InvalidDateFormat)?;
        let year: i32 = year.parse().map_err(|_| DomainError::InvalidDateFormat)?;

        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(DomainError::InvalidDateFormat)
    }

    /// Normalize a stored calendar date to month granularity.
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 always exists in a month that produced a valid date.
        Self(NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date))
    }

    /// Reject dates strictly before the current calendar month (UTC).
    ///
    /// Filters deliberately skip this check; it guards only data entering
    /// storage.
    pub fn validate(&self) -> Result<(), DomainError> {
        let current = Self::from_date(Utc::now().date_naive());
        if *self < current {
            return Err(DomainError::InvalidStartDate);
        }
        Ok(())
    }

    /// Re-encode as the `"MM-YYYY"` wire format
    pub fn format(&self) -> String {
        self.0.format("%m-%Y").to_string()
    }

    /// Underlying first-of-month date
    pub fn as_date(&self) -> NaiveDate {
        self.0
    }
}

/// Subscription aggregate
///
/// Fields are private; the only way in is [`Subscription::new`], which
/// enforces every cross-field invariant. Updates replace the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: Uuid,
    service_name: String,
    price: Price,
    user_id: Uuid,
    start_date: MonthDate,
    end_date: Option<MonthDate>,
}

impl Subscription {
    /// Validating factory.
    ///
    /// Checks, in order: non-empty service name, positive price, start
    /// date validity, then (when present) end date validity and end being
    /// on or after start. Generates a v4 id when `id` is `None`.
    pub fn new(
        id: Option<Uuid>,
        service_name: String,
        price: i32,
        user_id: Uuid,
        start_date: MonthDate,
        end_date: Option<MonthDate>,
    ) -> Result<Self, DomainError> {
        if service_name.is_empty() {
            return Err(DomainError::EmptyServiceName);
        }

        let price = Price::new(price)?;

        start_date.validate()?;

        if let Some(end) = end_date {
            end.validate().map_err(|_| DomainError::InvalidEndDate)?;
            if end < start_date {
                return Err(DomainError::StartAfterEnd);
            }
        }

        Ok(Self {
            id: id.unwrap_or_else(Uuid::new_v4),
            service_name,
            price,
            user_id,
            start_date,
            end_date,
        })
    }

    /// Unique identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the subscribed service
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Price in minor currency units
    pub fn price(&self) -> i32 {
        self.price.value()
    }

    /// Owning user
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// First month of the subscription
    pub fn start_date(&self) -> MonthDate {
        self.start_date
    }

    /// Last month of the subscription, if bounded
    pub fn end_date(&self) -> Option<MonthDate> {
        self.end_date
    }
}

/// Predicate set narrowing list and sum queries
///
/// Unlike the entity, filter bounds may reference historical months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFilter {
    /// Match rows owned by this user
    pub user_id: Option<Uuid>,
    /// Exact service-name match
    pub service_name: Option<String>,
    /// Rows starting in or after this month
    pub start_date: Option<MonthDate>,
    /// Rows ending in or before this month
    pub end_date: Option<MonthDate>,
    /// Page size, already clamped
    pub limit: i64,
    /// Page offset, already clamped
    pub offset: i64,
}

impl SubscriptionFilter {
    /// Build a filter from optional query inputs.
    ///
    /// Present date texts are parsed (propagating the parse error), the
    /// paging pair is clamped, and `start > end` is rejected.
    pub fn new(
        user_id: Option<Uuid>,
        service_name: Option<String>,
        start: Option<&str>,
        end: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Self, DomainError> {
        let start_date = start.map(MonthDate::parse).transpose()?;
        let end_date = end.map(MonthDate::parse).transpose()?;

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(DomainError::StartAfterEnd);
            }
        }

        let paging = PagingBase::new(limit, offset);

        Ok(Self {
            user_id,
            service_name,
            start_date,
            end_date,
            limit: paging.limit,
            offset: paging.offset,
        })
    }
}

/// Aggregate result of a sum query
#[derive(Debug, Clone)]
pub struct SumResult {
    /// Matched rows, bounded by the filter's limit/offset
    pub rows: Vec<Subscription>,
    /// Sum of prices over the whole filtered set, not just the page
    pub total_sum: i64,
    /// Reported row count
    pub total_count: i64,
}

/// Limit/offset pair shared by list and sum queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingBase {
    /// Page size
    pub limit: i64,
    /// Page offset
    pub offset: i64,
}

impl PagingBase {
    /// Non-positive values fall back to the defaults (10 and 0).
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: if limit <= 0 { DEFAULT_LIMIT } else { limit },
            offset: if offset <= 0 { 0 } else { offset },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "MM-YYYY" text for the month `delta` months away from now
    fn month_text(delta: i32) -> String {
        let now = Utc::now().date_naive();
        let total = now.year() * 12 + now.month0() as i32 + delta;
        format!("{:02}-{:04}", total.rem_euclid(12) + 1, total.div_euclid(12))
    }

    fn current_month() -> MonthDate {
        MonthDate::parse(&month_text(0)).unwrap()
    }

    #[test]
    fn test_parse_format_round_trip() {
        for text in ["01-2030", "07-2031", "12-2099"] {
            let date = MonthDate::parse(text).unwrap();
            assert_eq!(date.format(), text);
        }
    }

    #[test]
    fn test_parse_normalizes_to_first_of_month() {
        let date = MonthDate::parse("07-2030").unwrap();
        assert_eq!(date.as_date(), NaiveDate::from_ymd_opt(2030, 7, 1).unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        for text in [
            "", "07", "2030-07", "7-2030", "07-30", "007-2030", "13-2030", "00-2030",
            "ab-2030", "07-abcd", "07/2030",
        ] {
            assert_eq!(
                MonthDate::parse(text),
                Err(DomainError::InvalidDateFormat),
                "expected {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_validate_accepts_current_and_future_months() {
        assert!(MonthDate::parse(&month_text(0)).unwrap().validate().is_ok());
        assert!(MonthDate::parse(&month_text(6)).unwrap().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_past_months() {
        let past = MonthDate::parse(&month_text(-1)).unwrap();
        assert_eq!(past.validate(), Err(DomainError::InvalidStartDate));
    }

    #[test]
    fn test_from_date_drops_day_component() {
        let date = MonthDate::from_date(NaiveDate::from_ymd_opt(2030, 3, 17).unwrap());
        assert_eq!(date.as_date(), NaiveDate::from_ymd_opt(2030, 3, 1).unwrap());
    }

    #[test]
    fn test_price_rejects_non_positive_values() {
        assert_eq!(Price::new(0), Err(DomainError::InvalidPrice));
        assert_eq!(Price::new(-5), Err(DomainError::InvalidPrice));
        assert_eq!(Price::new(1).unwrap().value(), 1);
        assert_eq!(Price::new(i32::MAX).unwrap().value(), i32::MAX);
    }

    fn build(
        name: &str,
        price: i32,
        start: MonthDate,
        end: Option<MonthDate>,
    ) -> Result<Subscription, DomainError> {
        Subscription::new(None, name.to_string(), price, Uuid::new_v4(), start, end)
    }

    #[test]
    fn test_subscription_generates_id_when_absent() {
        let a = build("Netflix", 999, current_month(), None).unwrap();
        let b = build("Netflix", 999, current_month(), None).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_subscription_keeps_supplied_id() {
        let id = Uuid::new_v4();
        let sub = Subscription::new(
            Some(id),
            "Netflix".to_string(),
            999,
            Uuid::new_v4(),
            current_month(),
            None,
        )
        .unwrap();
        assert_eq!(sub.id(), id);
    }

    #[test]
    fn test_subscription_rejects_empty_service_name() {
        assert_eq!(
            build("", 999, current_month(), None),
            Err(DomainError::EmptyServiceName)
        );
    }

    #[test]
    fn test_subscription_rejects_non_positive_price() {
        assert_eq!(
            build("Netflix", 0, current_month(), None),
            Err(DomainError::InvalidPrice)
        );
        assert_eq!(
            build("Netflix", -100, current_month(), None),
            Err(DomainError::InvalidPrice)
        );
    }

    #[test]
    fn test_subscription_rejects_past_start_date() {
        let past = MonthDate::parse(&month_text(-3)).unwrap();
        assert_eq!(
            build("Netflix", 999, past, None),
            Err(DomainError::InvalidStartDate)
        );
    }

    #[test]
    fn test_subscription_rejects_invalid_end_date() {
        // An end date in the past fails its own validity check before the
        // order comparison is reached.
        let start = current_month();
        let past_end = MonthDate::parse(&month_text(-1)).unwrap();
        assert_eq!(
            build("Netflix", 999, start, Some(past_end)),
            Err(DomainError::InvalidEndDate)
        );
    }

    #[test]
    fn test_subscription_rejects_end_before_start() {
        let start = MonthDate::parse(&month_text(4)).unwrap();
        let end = MonthDate::parse(&month_text(2)).unwrap();
        assert_eq!(
            build("Netflix", 999, start, Some(end)),
            Err(DomainError::StartAfterEnd)
        );
    }

    #[test]
    fn test_subscription_accepts_end_equal_to_start() {
        let start = current_month();
        let sub = build("Netflix", 999, start, Some(start)).unwrap();
        assert_eq!(sub.end_date(), Some(start));
    }

    #[test]
    fn test_filter_parses_historical_bounds() {
        // Unlike the entity, filters may reference past months.
        let filter = SubscriptionFilter::new(
            None,
            None,
            Some("01-2020"),
            Some("12-2020"),
            10,
            0,
        )
        .unwrap();
        assert_eq!(filter.start_date.unwrap().format(), "01-2020");
        assert_eq!(filter.end_date.unwrap().format(), "12-2020");
    }

    #[test]
    fn test_filter_propagates_parse_errors() {
        let err = SubscriptionFilter::new(None, None, Some("2020-01"), None, 10, 0);
        assert_eq!(err, Err(DomainError::InvalidDateFormat));

        let err = SubscriptionFilter::new(None, None, None, Some("13-2020"), 10, 0);
        assert_eq!(err, Err(DomainError::InvalidDateFormat));
    }

    #[test]
    fn test_filter_rejects_start_after_end() {
        let err = SubscriptionFilter::new(None, None, Some("05-2030"), Some("04-2030"), 10, 0);
        assert_eq!(err, Err(DomainError::StartAfterEnd));
    }

    #[test]
    fn test_filter_accepts_equal_bounds() {
        let filter =
            SubscriptionFilter::new(None, None, Some("05-2030"), Some("05-2030"), 10, 0).unwrap();
        assert_eq!(filter.start_date, filter.end_date);
    }

    #[test]
    fn test_filter_clamps_paging() {
        let filter = SubscriptionFilter::new(None, None, None, None, 0, -3).unwrap();
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn test_paging_defaults_for_non_positive_values() {
        let paging = PagingBase::new(0, 0);
        assert_eq!(paging.limit, 10);
        assert_eq!(paging.offset, 0);

        let paging = PagingBase::new(-7, -1);
        assert_eq!(paging.limit, 10);
        assert_eq!(paging.offset, 0);
    }

    #[test]
    fn test_paging_passes_positive_values_through() {
        let paging = PagingBase::new(25, 40);
        assert_eq!(paging.limit, 25);
        assert_eq!(paging.offset, 40);
    }
}
