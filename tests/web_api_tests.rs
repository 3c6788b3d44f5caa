use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use reportdb::ReportDb;
use reportdb::web::{AppState, build_router};
use serde_json::{Value as Json, json};
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = ReportDb::in_memory().await.unwrap();
    build_router(AppState {
        tables: db.tables.clone(),
        fields: db.fields.clone(),
        reports: db.reports.clone(),
        registry: db.registry.clone(),
    })
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Json {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const CREATE_ORDERS: &str =
    r#"{"tableName":"orders","columns":[{"name":"amount","type":"DECIMAL","required":true}]}"#;

#[tokio::test]
async fn test_create_insert_and_list_over_http() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/table/create-table", CREATE_ORDERS))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"], json!("orders"));
    assert!(body["timestamp"].is_string());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/table/orders/data",
            r#"{"amount":42.5}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["amount"], json!(42.5));
    assert_eq!(body["data"]["id"], json!(1));

    let response = app
        .clone()
        .oneshot(get_request("/table/orders/data"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_validation_error_envelope() {
    let app = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/table/create-table",
            r#"{"tableName":"bad name","columns":[{"name":"x","type":"TEXT"}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_missing_row_maps_to_not_found() {
    let app = test_app().await;

    app.clone()
        .oneshot(json_request("POST", "/table/create-table", CREATE_ORDERS))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/table/orders/data/99")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_report_endpoints_over_http() {
    let app = test_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/table/create-table",
            r#"{"tableName":"orders","columns":[{"name":"amount","type":"DECIMAL"},{"name":"doc_date","type":"DATE"}]}"#,
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/table/orders/data",
            r#"{"amount":42.5,"doc_date":"2023-01-15"}"#,
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/report/get-available-fields"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let fields = body["data"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field_name"] == json!("orders.amount")));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/report/get-report-data",
            r#"{"columns":[{"field_name":"orders.amount"}],"date":"2023-01-15"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["amount"], json!([42.5]));

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/report/export-report-data-excel",
            r#"{"columns":[{"field_name":"orders.amount"}],"date":"2023-01-15"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with("Amount\n42.5\n"));

    let response = app
        .clone()
        .oneshot(get_request("/report/get-table"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"], json!(["orders"]));
}

#[tokio::test]
async fn test_add_field_endpoint() {
    let app = test_app().await;

    app.clone()
        .oneshot(json_request("POST", "/table/create-table", CREATE_ORDERS))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/report/add-field",
            r#"{"sourceTable":"orders","fieldName":"Discount Rate","fieldType":"DECIMAL"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["field_key"], json!("discount_rate"));
    assert_eq!(body["data"]["field_name"], json!("orders.discount_rate"));

    let response = app
        .oneshot(get_request("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["model_count"], json!(1));
}
