//! Request handlers. Each one is a thin delegation to a service; the
//! envelope and error mapping live in [`super::response`].

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::service::{AddFieldRequest, CreateTableRequest, ReportRequest};
use crate::storage::NamedRow;

use super::AppState;
use super::response::{ApiResponse, WebResult};

mod messages {
    pub const TABLE_CREATED: &str = "Table created successfully";
    pub const DATA_INSERTED: &str = "Data inserted successfully";
    pub const TABLE_DATA: &str = "Table data retrieved successfully";
    pub const TABLE_DATA_UPDATED: &str = "Table data updated";
    pub const TABLE_DATA_DELETED: &str = "Table data deleted";
    pub const AVAILABLE_FIELDS: &str = "Available fields retrieved successfully";
    pub const REPORT_FETCHED: &str = "Report fetched successfully";
    pub const FIELD_ADDED: &str = "Field added successfully";
    pub const TABLE_NAMES: &str = "Table names fetched successfully";
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(
        state.registry.initialization_status().await,
        "OK",
    ))
}

pub async fn create_table(
    State(state): State<AppState>,
    Json(request): Json<CreateTableRequest>,
) -> WebResult<impl IntoResponse> {
    let name = state.tables.create_table(&request).await?;
    Ok(Json(ApiResponse::success(name, messages::TABLE_CREATED)))
}

pub async fn insert_data(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    Json(data): Json<NamedRow>,
) -> WebResult<impl IntoResponse> {
    let inserted = state.tables.insert_data(&table_name, &data).await?;
    Ok(Json(ApiResponse::success(inserted, messages::DATA_INSERTED)))
}

pub async fn get_table_data(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
) -> WebResult<impl IntoResponse> {
    let rows = state.tables.get_table_data(&table_name).await?;
    Ok(Json(ApiResponse::success(rows, messages::TABLE_DATA)))
}

pub async fn update_table_data(
    State(state): State<AppState>,
    Path((table_name, id)): Path<(String, String)>,
    Json(data): Json<NamedRow>,
) -> WebResult<impl IntoResponse> {
    let updated = state.tables.update_table_data(&table_name, &id, &data).await?;
    Ok(Json(ApiResponse::success(
        updated,
        messages::TABLE_DATA_UPDATED,
    )))
}

pub async fn delete_table_data(
    State(state): State<AppState>,
    Path((table_name, id)): Path<(String, String)>,
) -> WebResult<impl IntoResponse> {
    let outcome = state.tables.delete_table_data(&table_name, &id).await?;
    Ok(Json(ApiResponse::success(
        outcome,
        messages::TABLE_DATA_DELETED,
    )))
}

pub async fn get_available_fields(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let fields = state.reports.get_available_fields().await?;
    Ok(Json(ApiResponse::success(fields, messages::AVAILABLE_FIELDS)))
}

pub async fn get_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> WebResult<impl IntoResponse> {
    let report = state.reports.get_report_data(&request).await?;
    Ok(Json(ApiResponse::success(report, messages::REPORT_FETCHED)))
}

pub async fn export_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> WebResult<impl IntoResponse> {
    let bytes = state.reports.export_report_data(&request).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=report.csv",
            ),
        ],
        bytes,
    ))
}

pub async fn add_field(
    State(state): State<AppState>,
    Json(request): Json<AddFieldRequest>,
) -> WebResult<impl IntoResponse> {
    let entry = state.fields.add_fields_in_db(&request, false).await?;
    Ok(Json(ApiResponse::success(entry, messages::FIELD_ADDED)))
}

pub async fn get_table_names(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let names = state.reports.get_table_names().await?;
    Ok(Json(ApiResponse::success(names, messages::TABLE_NAMES)))
}
