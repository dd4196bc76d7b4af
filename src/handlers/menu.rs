use actix_web::{web, HttpResponse};

use crate::domain::catalog::MenuItem;
use crate::state::AppState;

/// GET /menu
#[utoipa::path(
    get,
    path = "/menu",
    responses(
        (status = 200, description = "Menu items", body = [MenuItem]),
    ),
    tag = "menu"
)]
pub async fn list_menu(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.menu())
}
