//! Subscription API handlers
//!
//! HTTP request handlers for subscription CRUD, list, and sum operations.
//! Handlers decode the wire shapes, hand validated domain objects to the
//! service, and re-encode the result; all failures surface as [`AppError`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::dto::{
    list_response, params_to_filter, request_to_subscription, subscription_to_response,
    sum_response, ListParams, ListResponse, SubscriptionIdResponse, SubscriptionRequest,
    SubscriptionResponse, SumParams, SumResponse,
};
use crate::domain::PagingBase;
use crate::error::AppError;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId)
}

/// POST /subscriptions - Create a new subscription
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<(StatusCode, Json<SubscriptionIdResponse>), AppError> {
    info!(service_name = %request.service_name, "create subscription called");

    let sub = request_to_subscription(None, request)?;
    let id = state.service.create(sub).await?;

    Ok((StatusCode::CREATED, Json(SubscriptionIdResponse { id })))
}

/// GET /subscriptions/:id - Get a subscription by id
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    info!(id = %id, "get subscription called");

    let id = parse_id(&id)?;
    let sub = state.service.get(id).await?;

    Ok(Json(subscription_to_response(&sub)))
}

/// GET /subscriptions - List subscriptions with paging
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    info!(limit = ?params.limit, offset = ?params.offset, "list subscriptions called");

    let paging = PagingBase::new(params.limit.unwrap_or(0), params.offset.unwrap_or(0));
    let (rows, total) = state.service.list(&paging).await?;

    Ok(Json(list_response(&rows, &paging, total)))
}

/// GET /subscriptions/sum - Sum prices over a filtered set
pub async fn sum_subscriptions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SumParams>,
) -> Result<Json<SumResponse>, AppError> {
    info!(
        user_id = ?params.user_id,
        service_name = ?params.service_name,
        "sum subscriptions called"
    );

    let filter = params_to_filter(params)?;
    let result = state.service.sum(&filter).await?;

    Ok(Json(sum_response(&result, &filter)))
}

/// PUT /subscriptions/:id - Replace a subscription
pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<Json<SubscriptionIdResponse>, AppError> {
    info!(id = %id, "update subscription called");

    let path_id = parse_id(&id)?;
    // Identity comes from the path unless the body names one explicitly;
    // the service rejects a mismatch against the stored record.
    let entity_id = request.id.unwrap_or(path_id);
    let sub = request_to_subscription(Some(entity_id), request)?;

    let id = state.service.update(path_id, sub).await?;

    Ok(Json(SubscriptionIdResponse { id }))
}

/// DELETE /subscriptions/:id - Delete a subscription
pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    info!(id = %id, "delete subscription called");

    let id = parse_id(&id)?;
    state.service.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
