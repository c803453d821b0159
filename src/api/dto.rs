//! Wire representation of subscriptions
//!
//! Request/response shapes and the pure conversions between them and the
//! domain model. Date fields travel as `"MM-YYYY"` text; an absent end
//! date is an omitted field, never `null`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DomainError, MonthDate, PagingBase, Subscription, SubscriptionFilter, SumResult,
};
use crate::error::AppError;

/// Body shape shared by create and update requests
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionRequest {
    /// Optional client-supplied id; ignored on create, cross-checked
    /// against the path id on update
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Name of the subscribed service
    pub service_name: String,
    /// Price in minor currency units
    pub price: i32,
    /// Owning user
    pub user_id: Uuid,
    /// First month, "MM-YYYY"
    pub start_date: String,
    /// Optional last month, "MM-YYYY"
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Subscription as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    /// Unique identifier
    pub id: Uuid,
    /// Name of the subscribed service
    pub service_name: String,
    /// Price in minor currency units
    pub price: i32,
    /// Owning user
    pub user_id: Uuid,
    /// First month, "MM-YYYY"
    pub start_date: String,
    /// Last month, omitted when the subscription is open-ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// `{id}` envelope returned by create and update
#[derive(Debug, Serialize)]
pub struct SubscriptionIdResponse {
    /// Identifier of the affected subscription
    pub id: Uuid,
}

/// Paging metadata echoed in list and sum responses
#[derive(Debug, Serialize)]
pub struct PagingResponse {
    /// Page size applied to the query
    pub limit: i64,
    /// Page offset applied to the query
    pub offset: i64,
    /// Reported total row count
    pub total: i64,
}

/// Response envelope for the list endpoint
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Paging metadata
    pub paging: PagingResponse,
    /// The returned page
    pub rows: Vec<SubscriptionResponse>,
}

/// Response envelope for the sum endpoint
#[derive(Debug, Serialize)]
pub struct SumResponse {
    /// Paging metadata
    pub paging: PagingResponse,
    /// The returned page
    pub rows: Vec<SubscriptionResponse>,
    /// Price sum over the whole filtered set
    pub total_sum: i64,
}

/// Query parameters for the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Requested page size
    #[serde(default)]
    pub limit: Option<i64>,
    /// Requested page offset
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Query parameters for the sum endpoint
///
/// `user_id` stays text here so a malformed token maps to the service's
/// own error body instead of a framework rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SumParams {
    /// Optional owning-user filter
    #[serde(default)]
    pub user_id: Option<String>,
    /// Optional exact service-name filter
    #[serde(default)]
    pub service_name: Option<String>,
    /// Optional lower month bound, "MM-YYYY"
    #[serde(default)]
    pub start: Option<String>,
    /// Optional upper month bound, "MM-YYYY"
    #[serde(default)]
    pub end: Option<String>,
    /// Requested page size
    #[serde(default)]
    pub limit: Option<i64>,
    /// Requested page offset
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Decode a request body into the domain aggregate.
///
/// `id` is the resolved identity: `None` on create (a fresh id is
/// generated, any body id is ignored), the cross-check id on update.
pub fn request_to_subscription(
    id: Option<Uuid>,
    req: SubscriptionRequest,
) -> Result<Subscription, DomainError> {
    let start = MonthDate::parse(&req.start_date)?;
    let end = req.end_date.as_deref().map(MonthDate::parse).transpose()?;

    Subscription::new(id, req.service_name, req.price, req.user_id, start, end)
}

/// Re-encode a domain aggregate for the wire
pub fn subscription_to_response(sub: &Subscription) -> SubscriptionResponse {
    SubscriptionResponse {
        id: sub.id(),
        service_name: sub.service_name().to_string(),
        price: sub.price(),
        user_id: sub.user_id(),
        start_date: sub.start_date().format(),
        end_date: sub.end_date().map(|d| d.format()),
    }
}

/// Decode sum query parameters into a validated filter
pub fn params_to_filter(params: SumParams) -> Result<SubscriptionFilter, AppError> {
    let user_id = params
        .user_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| AppError::InvalidId)?;

    let filter = SubscriptionFilter::new(
        user_id,
        params.service_name,
        params.start.as_deref(),
        params.end.as_deref(),
        params.limit.unwrap_or(0),
        params.offset.unwrap_or(0),
    )?;

    Ok(filter)
}

/// Assemble the list envelope
pub fn list_response(rows: &[Subscription], paging: &PagingBase, total: i64) -> ListResponse {
    ListResponse {
        paging: PagingResponse {
            limit: paging.limit,
            offset: paging.offset,
            total,
        },
        rows: rows.iter().map(subscription_to_response).collect(),
    }
}

/// Assemble the sum envelope
pub fn sum_response(result: &SumResult, filter: &SubscriptionFilter) -> SumResponse {
    SumResponse {
        paging: PagingResponse {
            limit: filter.limit,
            offset: filter.offset,
            total: result.total_count,
        },
        rows: result.rows.iter().map(subscription_to_response).collect(),
        total_sum: result.total_sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Utc};

    fn current_month_text() -> String {
        let now = Utc::now().date_naive();
        format!("{:02}-{:04}", now.month(), now.year())
    }

    fn request(id: Option<Uuid>) -> SubscriptionRequest {
        SubscriptionRequest {
            id,
            service_name: "Netflix".to_string(),
            price: 999,
            user_id: Uuid::new_v4(),
            start_date: current_month_text(),
            end_date: None,
        }
    }

    #[test]
    fn test_create_mapping_ignores_body_id() {
        let body_id = Uuid::new_v4();
        let sub = request_to_subscription(None, request(Some(body_id))).unwrap();
        assert_ne!(sub.id(), body_id);
    }

    #[test]
    fn test_update_mapping_uses_resolved_id() {
        let resolved = Uuid::new_v4();
        let sub = request_to_subscription(Some(resolved), request(None)).unwrap();
        assert_eq!(sub.id(), resolved);
    }

    #[test]
    fn test_mapping_propagates_date_errors_untouched() {
        let mut req = request(None);
        req.start_date = "2030-01".to_string();
        assert_eq!(
            request_to_subscription(None, req),
            Err(DomainError::InvalidDateFormat)
        );

        let mut req = request(None);
        req.end_date = Some("junk".to_string());
        assert_eq!(
            request_to_subscription(None, req),
            Err(DomainError::InvalidDateFormat)
        );
    }

    #[test]
    fn test_response_round_trips_dates_as_text() {
        let text = current_month_text();
        let sub = request_to_subscription(None, request(None)).unwrap();
        let response = subscription_to_response(&sub);
        assert_eq!(response.start_date, text);
    }

    #[test]
    fn test_absent_end_date_is_omitted_not_null() {
        let sub = request_to_subscription(None, request(None)).unwrap();
        let value = serde_json::to_value(subscription_to_response(&sub)).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("end_date"));
        assert!(obj.contains_key("start_date"));
    }

    #[test]
    fn test_params_to_filter_rejects_malformed_user_id() {
        let params = SumParams {
            user_id: Some("not-a-uuid".to_string()),
            ..SumParams::default()
        };
        assert!(matches!(
            params_to_filter(params),
            Err(AppError::InvalidId)
        ));
    }

    #[test]
    fn test_params_to_filter_defaults_paging() {
        let filter = params_to_filter(SumParams::default()).unwrap();
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 0);
    }
}
