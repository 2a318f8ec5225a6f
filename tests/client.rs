//! Dataset, table and error classification behaviour against a mock API.

mod common;

use common::*;
use integrations_bigquery::schema::{load_schema_dir, SchemaSync};
use integrations_bigquery::types::{Dataset, TableFieldSchema, TableSchema};
use integrations_bigquery::BigQueryError;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn events_schema() -> TableSchema {
    TableSchema {
        fields: Some(vec![
            TableFieldSchema {
                name: Some("id".to_string()),
                field_type: Some("STRING".to_string()),
                mode: Some("REQUIRED".to_string()),
                ..Default::default()
            },
            TableFieldSchema {
                name: Some("occurred_at".to_string()),
                field_type: Some("TIMESTAMP".to_string()),
                ..Default::default()
            },
        ]),
        ..Default::default()
    }
}

fn table_body(dataset: &str, table: &str, schema: &TableSchema) -> serde_json::Value {
    json!({
        "tableReference": {
            "projectId": PROJECT_ID,
            "datasetId": dataset,
            "tableId": table
        },
        "schema": schema
    })
}

#[tokio::test]
async fn test_requests_carry_bearer_token() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "bigquery#dataset",
            "id": "analytics-test:events",
            "location": "EU"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dataset: Dataset = client(&server).datasets().get("events").await.unwrap();
    assert_eq!(dataset.id, "analytics-test:events");
    assert_eq!(dataset.location.as_deref(), Some("EU"));
}

#[tokio::test]
async fn test_token_is_shared_across_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(ACCESS_TOKEN))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    for _ in 0..3 {
        client.create_dataset_if_not_exists("events").await.unwrap();
    }
}

#[tokio::test]
async fn test_existing_dataset_is_left_alone() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "analytics-test:events"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    client(&server)
        .create_dataset_if_not_exists("events")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_dataset_is_created() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .respond_with(not_found("Not found: Dataset analytics-test:events"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets")))
        .and(body_json(json!({"datasetReference": {"datasetId": "events"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "analytics-test:events"})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .create_dataset_if_not_exists("events")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_dataset_lookup_failure_propagates() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .respond_with(service_error(403, "PERMISSION_DENIED", "accessDenied", "Access Denied"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_dataset_if_not_exists("events")
        .await
        .unwrap_err();

    match err {
        BigQueryError::Service(e) => {
            assert_eq!(e.code, 403);
            assert_eq!(e.status, "PERMISSION_DENIED");
            assert_eq!(e.errors[0].reason, "accessDenied");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unstructured_not_found_is_not_treated_as_missing() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_dataset_if_not_exists("events")
        .await
        .unwrap_err();

    match err {
        BigQueryError::RequestFailed(e) => {
            assert_eq!(e.status, StatusCode::NOT_FOUND);
            assert_eq!(e.body, "<html>Not Found</html>");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_existing_table_is_patched() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    let schema = events_schema();

    Mock::given(method("GET"))
        .and(path(api_path("datasets/raw/tables/events")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "analytics-test:raw.events"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api_path("datasets/raw/tables/events")))
        .and(body_json(table_body("raw", "events", &schema)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets/raw/tables")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client(&server)
        .create_or_update_table_schema("raw", "events", &schema)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_table_is_created() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    let schema = events_schema();

    Mock::given(method("GET"))
        .and(path(api_path("datasets/raw/tables/events")))
        .respond_with(not_found("Not found: Table analytics-test:raw.events"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets/raw/tables")))
        .and(body_json(table_body("raw", "events", &schema)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api_path("datasets/raw/tables/events")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client(&server)
        .create_or_update_table_schema("raw", "events", &schema)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_table_creation_failure_propagates() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path(api_path("datasets/raw/tables/events")))
        .respond_with(not_found("Not found: Dataset analytics-test:raw"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets/raw/tables")))
        .respond_with(not_found("Not found: Dataset analytics-test:raw"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_or_update_table_schema("raw", "events", &events_schema())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_success_with_malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .respond_with(ResponseTemplate::new(200).set_body_string("{truncated"))
        .mount(&server)
        .await;

    let err = client(&server).datasets().get("events").await.unwrap_err();
    assert!(matches!(err, BigQueryError::Parse(_)));
}

#[tokio::test]
async fn test_token_failure_stops_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "The OAuth client was not found."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/events")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_dataset_if_not_exists("events")
        .await
        .unwrap_err();

    assert!(matches!(err, BigQueryError::Authentication(_)));
}

#[tokio::test]
async fn test_schema_sync_applies_directory() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("events.schema.json"),
        r#"{"fields":[{"name":"id","type":"STRING","mode":"REQUIRED"}]}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("users.schema.json"),
        r#"{"fields":[{"name":"email","type":"STRING"}]}"#,
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path(api_path("datasets/raw")))
        .respond_with(not_found("Not found: Dataset analytics-test:raw"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/raw/tables/stg_events_v2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api_path("datasets/raw/tables/stg_events_v2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("datasets/raw/tables/stg_users_v2")))
        .respond_with(not_found("Not found: Table analytics-test:raw.stg_users_v2"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("datasets/raw/tables")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let schemas = load_schema_dir(dir.path()).await.unwrap();
    SchemaSync::new("raw")
        .table_prefix("stg_")
        .table_suffix("_v2")
        .run(&client(&server), &schemas)
        .await
        .unwrap();

    let created = requests_to(&server, &api_path("datasets/raw/tables")).await;
    let body: serde_json::Value = serde_json::from_slice(&created[0].body).unwrap();
    assert_eq!(body["tableReference"]["tableId"], "stg_users_v2");
}
