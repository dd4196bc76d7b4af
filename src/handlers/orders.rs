use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::order::{CreatedOrder, OrderRequest, OrderStatus, OrderView};
use crate::errors::AppError;
use crate::infrastructure::http_gateway::IDEMPOTENCY_HEADER;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates a pending order. Requests carrying an `Idempotency-Key` already
/// seen get the original order back with 200 instead of 201.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = OrderRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Client-generated key for this submission attempt"),
    ),
    responses(
        (status = 201, description = "Order created", body = CreatedOrder),
        (status = 200, description = "Order previously created with this key", body = CreatedOrder),
        (status = 400, description = "Invalid order"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<OrderRequest>,
) -> Result<HttpResponse, AppError> {
    let key = req
        .headers()
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    let (order, fresh) = state.create_order(body.into_inner(), key)?;

    if fresh {
        log::info!("Created order {}", order.id);
        Ok(HttpResponse::Created().json(order))
    } else {
        log::info!("Replayed order {} for repeated key", order.id);
        Ok(HttpResponse::Ok().json(order))
    }
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderView),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    match state.get_order(&path.into_inner()) {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders
///
/// Returns a paginated list of orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let (items, total) = state.list_orders(page, limit);

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items,
        total,
        page,
        limit,
    }))
}

/// PATCH /orders/{id}/status
///
/// Kitchen/admin status change; 409 when the transition is not allowed.
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    request_body = UpdateStatusRequest,
    params(
        ("id" = String, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Status updated", body = OrderView),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let next = body.into_inner().status;
    let order = state.update_status(&id, next)?;
    log::info!("Order {} is now {}", id, order.status);
    Ok(HttpResponse::Ok().json(order))
}
