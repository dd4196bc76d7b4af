//! Restaurant ordering core: the client-side cart, the checkout flow that
//! turns it into an order, and the plumbing to the Order and Catalog
//! services.
//!
//! [`build_server`] starts an in-memory Order/Catalog service speaking the
//! same HTTP contract, for local development and integration tests.

pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod state;

use std::net::TcpListener;

use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::cart_store::{CartStore, SharedCart};
pub use application::checkout::{CheckoutFlow, SubmissionState, SubmitFailure};
pub use application::order_service::OrderService;
pub use infrastructure::http_gateway::HttpOrderGateway;
pub use infrastructure::storage::{FileCartStorage, MemoryCartStorage};
pub use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_orders,
        handlers::orders::update_status,
        handlers::menu::list_menu,
    ),
    tags(
        (name = "orders", description = "Order creation and status"),
        (name = "menu", description = "Catalog"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    build_server_on(state, TcpListener::bind((host, port))?)
}

/// Like [`build_server`], on an already bound listener (port 0 in tests).
pub fn build_server_on(
    state: web::Data<AppState>,
    listener: TcpListener,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                errors::AppError::BadRequest(err.to_string()).into()
            }))
            .wrap(Logger::default())
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("/{id}/status", web::patch().to(handlers::orders::update_status)),
            )
            .route("/menu", web::get().to(handlers::menu::list_menu))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .listen(listener)?
    .run())
}
