//! HTTP surface: axum router, shared state, response envelope.

pub mod handlers;
pub mod response;

pub use response::{ApiResponse, ErrorBody, WebError, WebResult};

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::model::ModelRegistry;
use crate::service::{FieldService, ReportService, TableService};

#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<TableService>,
    pub fields: Arc<FieldService>,
    pub reports: Arc<ReportService>,
    pub registry: Arc<ModelRegistry>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/table/create-table", post(handlers::create_table))
        .route(
            "/table/:table_name/data",
            post(handlers::insert_data).get(handlers::get_table_data),
        )
        .route(
            "/table/:table_name/data/:id",
            put(handlers::update_table_data).delete(handlers::delete_table_data),
        )
        .route(
            "/report/get-available-fields",
            get(handlers::get_available_fields),
        )
        .route("/report/get-report-data", post(handlers::get_report))
        .route(
            "/report/export-report-data-excel",
            post(handlers::export_report),
        )
        .route("/report/add-field", post(handlers::add_field))
        .route("/report/get-table", get(handlers::get_table_names))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
