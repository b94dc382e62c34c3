//! HTTP routes.
//!
//! ```text
//! POST   /api/sales              create          201 / 400 / 409
//! GET    /api/sales              list            200
//! GET    /api/sales/{id}         get             200 / 404
//! PUT    /api/sales/{id}         update          200 / 400 / 404 / 409
//! PATCH  /api/sales/{id}/cancel  cancel          200 / 404
//! DELETE /api/sales/{id}         delete          200 / 404
//! GET    /health                 health          200
//! ```

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use uuid::Uuid;

use tally_core::{CreateSaleCommand, PagedResult, UpdateSaleCommand};

use crate::dto::{ApiEnvelope, CancelResponse, DeleteResponse, HealthResponse, SaleResponse};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sales", post(create_sale).get(list_sales))
        .route(
            "/api/sales/{id}",
            get(get_sale).put(update_sale).delete(delete_sale),
        )
        .route("/api/sales/{id}/cancel", patch(cancel_sale))
        .with_state(state)
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_id(raw))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.service.database().health_check().await;

    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" }.to_string(),
        database: if connected { "connected" } else { "unavailable" }.to_string(),
    })
}

async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<CreateSaleCommand>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiEnvelope<SaleResponse>>)> {
    let Json(command) = payload?;
    let sale = state.service.create(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok("Sale created successfully", SaleResponse::from(sale))),
    ))
}

async fn update_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CreateSaleCommand>, JsonRejection>,
) -> ApiResult<Json<ApiEnvelope<SaleResponse>>> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;

    // The path decides which sale is updated; an `id` in the body is ignored.
    let sale = state.service.update(UpdateSaleCommand::new(id, body)).await?;

    Ok(Json(ApiEnvelope::ok(
        "Sale updated successfully",
        SaleResponse::from(sale),
    )))
}

async fn cancel_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CancelResponse>> {
    let id = parse_id(&id)?;

    if !state.service.cancel(id).await? {
        return Err(ApiError::NotFound(format!("Sale with ID {id} not found")));
    }

    Ok(Json(CancelResponse { id, cancelled: true }))
}

async fn delete_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;

    if !state.service.delete(id).await? {
        return Err(ApiError::NotFound(format!("Sale with ID {id} not found")));
    }

    Ok(Json(DeleteResponse { id, deleted: true }))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleResponse>> {
    let id = parse_id(&id)?;
    let sale = state.service.get(id).await?;
    Ok(Json(SaleResponse::from(sale)))
}

async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<PagedResult<SaleResponse>>> {
    let page = state.service.list(&params).await?;
    Ok(Json(page.map(SaleResponse::from)))
}
