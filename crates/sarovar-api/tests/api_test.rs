//! Route-level tests against the in-memory backend.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use sarovar_analysis::ModuleRegistry;
use sarovar_api::{create_router, AppState};
use sarovar_backend::MemoryBackend;
use sarovar_core::error::BackendError;
use sarovar_session::SessionOptions;

const JODHPUR_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Placemark>
    <Polygon><outerBoundaryIs><LinearRing>
      <coordinates>72.9,26.2,0 73.1,26.2,0 73.1,26.4,0 72.9,26.4,0 72.9,26.2,0</coordinates>
    </LinearRing></outerBoundaryIs></Polygon>
  </Placemark>
</kml>"#;

fn rajasthan_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    let mut properties = serde_json::Map::new();
    properties.insert("ADM1_NAME".to_string(), json!("Rajasthan"));
    backend
        .add_feature(
            "FAO/GAUL/2015/level1",
            &[[69.5, 23.0], [78.3, 23.0], [78.3, 30.2], [69.5, 30.2]],
            properties,
        )
        .unwrap();
    backend.script_reduction("mean:suitability", [("suitability", 0.61)].into_iter().collect());
    Arc::new(backend)
}

fn app(backend: Arc<MemoryBackend>) -> Router {
    let state = AppState::new(backend, Arc::new(ModuleRegistry::standard()), SessionOptions::default())
        .with_today(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    create_router(Arc::new(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/api/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phase"], "no_roi");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app(rajasthan_backend());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "sarovar-api");
}

#[tokio::test]
async fn test_list_modules_for_region() {
    let app = app(rajasthan_backend());

    let (status, body) = send(&app, "GET", "/api/v1/modules", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|m| m["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 5);
    for id in ["rainfall", "rwh", "encroachment", "flood", "water-quality"] {
        assert!(ids.contains(&id), "missing module {}", id);
    }

    let (_, body) = send(&app, "GET", "/api/v1/modules?region=Rajasthan", None).await;
    let rwh = body.as_array().unwrap().iter().find(|m| m["id"] == "rwh").unwrap();
    assert_eq!(rwh["name"], "Rainwater Harvesting Potential");
    assert_eq!(rwh["schema"]["note"], "Detected zone: Arid/Semi-Arid");
}

#[tokio::test]
async fn test_full_session_flow() {
    let backend = rajasthan_backend();
    let app = app(backend.clone());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/sessions/{}/roi", id),
        Some(json!({"mode": "boundary_file", "content": JODHPUR_KML})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region"], json!({"kind": "named", "name": "Rajasthan"}));
    assert_eq!(body["session"]["phase"], "roi_locked");
    assert_eq!(body["session"]["region_label"], "Rajasthan");

    let (status, body) =
        send(&app, "PUT", &format!("/api/v1/sessions/{}/module", id), Some(json!({"module": "rwh"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["module"]["short_name"], "Rainwater");
    assert_eq!(body["session"]["selected_module"], "rwh");

    let (status, body) = send(&app, "POST", &format!("/api/v1/sessions/{}/run", id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["phase"], "result_ready");
    assert_eq!(body["result"]["module"], "rwh");
    assert!(!body["result"]["raster"].is_null());
    assert_eq!(body["result"]["vis"]["max"], 0.8);

    let (status, body) = send(&app, "POST", &format!("/api/v1/sessions/{}/export", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "GeoSarovar_Rainwater_20240301");
    assert_eq!(backend.exports().len(), 1);

    let (status, body) =
        send(&app, "POST", &format!("/api/v1/sessions/{}/static-map", id), Some(json!({"title": "Jodhpur"})))
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Jodhpur");
    assert_eq!(body["figure_width_in"], 12.0);

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/sessions/{}/roi", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "no_roi");
    assert!(body["last_result"].is_null());

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_staged_drawing_needs_confirmation() {
    let app = app(rajasthan_backend());
    let id = new_session(&app).await;
    let uri = format!("/api/v1/sessions/{}/roi", id);

    let shape = json!({
        "type": "Polygon",
        "coordinates": [[[73.0, 26.0], [73.2, 26.0], [73.2, 26.2], [73.0, 26.0]]]
    });
    let (status, body) =
        send(&app, "POST", &uri, Some(json!({"mode": "drawn_shape", "shape": shape}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["staged"], true);
    assert_eq!(body["session"]["phase"], "no_roi");

    let (status, body) = send(&app, "POST", &uri, Some(json!({"mode": "confirm_drawing"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region"]["name"], "Rajasthan");
    assert_eq!(body["session"]["roi_locked"], true);
}

#[tokio::test]
async fn test_precondition_errors() {
    let app = app(rajasthan_backend());
    let id = new_session(&app).await;

    let (status, body) = send(&app, "POST", &format!("/api/v1/sessions/{}/run", id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("region of interest"));

    let (status, _) = send(&app, "POST", &format!("/api/v1/sessions/{}/export", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        send(&app, "PUT", &format!("/api/v1/sessions/{}/module", id), Some(json!({"module": "drought"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/sessions/{}/roi", id),
        Some(json!({"mode": "boundary_file", "content": "<kml><Placemark/></kml>"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "GET", "/api/v1/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejected_parameters_are_not_reused() {
    let app = app(rajasthan_backend());
    let id = new_session(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/v1/sessions/{}/roi", id),
        Some(json!({"mode": "point_buffer", "lat": 26.3, "lon": 73.0, "radius_m": 2000.0})),
    )
    .await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/sessions/{}/module", id),
        Some(json!({"module": "flood", "parameters": {"threshold": 1.4}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let run = format!("/api/v1/sessions/{}/run", id);
    let (status, body) = send(&app, "POST", &run, Some(json!({"parameters": {"threshold": 9.0}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("threshold"));

    let (_, body) = send(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(body["phase"], "roi_locked");
    assert!(body["parameters"].is_null());

    let (status, body) = send(&app, "POST", &run, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["parameters"]["threshold"], 1.25);
}

#[tokio::test]
async fn test_second_roi_is_rejected() {
    let app = app(rajasthan_backend());
    let id = new_session(&app).await;
    let uri = format!("/api/v1/sessions/{}/roi", id);
    let point = json!({"mode": "point_buffer", "lat": 26.3, "lon": 73.0, "radius_m": 2000.0});

    let (status, _) = send(&app, "POST", &uri, Some(point.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", &uri, Some(point)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_permission_failure_carries_remediation() {
    let backend = rajasthan_backend();
    let app = app(backend.clone());
    let id = new_session(&app).await;

    send(
        &app,
        "POST",
        &format!("/api/v1/sessions/{}/roi", id),
        Some(json!({"mode": "point_buffer", "lat": 26.3, "lon": 73.0, "radius_m": 2000.0})),
    )
    .await;
    send(&app, "PUT", &format!("/api/v1/sessions/{}/module", id), Some(json!({"module": "flood"}))).await;

    backend.fail_on(
        "locate",
        BackendError::PermissionDenied { message: "Caller does not have required permission".to_string() },
    );
    let (status, body) = send(&app, "POST", &format!("/api/v1/sessions/{}/run", id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["details"].as_str().unwrap().ends_with("project=your-project-id"));

    let (_, body) = send(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
    assert_ne!(body["phase"], "result_ready");
}
