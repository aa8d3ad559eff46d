//! HTTP API tests against a temporary data directory.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use nuoc_dashboard::{server, ServerConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn write(dir: &TempDir, file: &str, value: Value) {
    std::fs::write(dir.path().join(file), value.to_string()).unwrap();
}

fn seeded() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "soctrang-locations.json",
        json!({
            "date_created": "2024-05-01",
            "datetime_format": "%d/%m/%Y",
            "data": [
                {
                    "location": "Vinh Chau",
                    "date": "01/05/2024",
                    "coordinates": [9.33, 105.98],
                    "salinity": { "name": "Salinity", "value": 4.2, "unit": "‰" }
                },
                { "location": "Long Phu", "coordinates": "Unknown" }
            ]
        }),
    );
    write(
        &dir,
        "travinh-locations.json",
        json!({ "data": [{ "location": "Cau Ngang", "coordinates": [9.80, 106.44] }] }),
    );
    write(
        &dir,
        "compiled_historical_data_st.json",
        json!([{
            "location": "Vinh Chau",
            "measurements": [{
                "type": "Salinity",
                "data": [
                    { "date": "15/04/2024", "value": "3.1" },
                    { "date": "02/01/2024", "value": 1.5 },
                    { "date": "01/03/2024", "value": "n/a" }
                ]
            }]
        }]),
    );
    dir
}

fn app(dir: &TempDir) -> axum::Router {
    server::router(&ServerConfig {
        data_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    })
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn root_banner() {
    let dir = seeded();
    let (status, body) = get(app(&dir), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Water Quality Analysis API" }));
}

#[tokio::test]
async fn raw_files_are_served_verbatim() {
    let dir = seeded();

    let (status, body) = get(app(&dir), "/api/data/soc-trang").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][1]["coordinates"], "Unknown");

    let (status, body) = get(app(&dir), "/api/data/tra-vinh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["location"], "Cau Ngang");

    let (status, body) = get(app(&dir), "/api/data/historical/soc-trang").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["measurements"][0]["type"], "Salinity");
}

#[tokio::test]
async fn unreadable_files_report_generic_errors() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("soctrang-locations.json"), "{ not json").unwrap();

    let (status, body) = get(app(&dir), "/api/data/soc-trang").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to load data" }));

    let (status, body) = get(app(&dir), "/api/data/historical/soc-trang").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to load historical data" }));
}

#[tokio::test]
async fn unknown_province_and_missing_history_are_not_found() {
    let dir = seeded();

    let (status, _) = get(app(&dir), "/api/data/can-tho").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(app(&dir), "/api/data/historical/tra-vinh").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Tra Vinh"));
}

#[tokio::test]
async fn markers_use_lon_lat_and_skip_unknown() {
    let dir = seeded();
    let (status, body) = get(app(&dir), "/api/markers").await;
    assert_eq!(status, StatusCode::OK);

    let markers = body.as_array().unwrap();
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0]["location"], "Vinh Chau");
    assert_eq!(markers[0]["province"], "Soc Trang");
    assert_eq!(markers[0]["coordinates"], json!([105.98, 9.33]));
    assert_eq!(markers[0]["data"]["salinity"]["value"], 4.2);
    assert_eq!(markers[1]["province"], "Tra Vinh");
}

#[tokio::test]
async fn search_suggests_and_selects() {
    let dir = seeded();

    let (status, body) = get(app(&dir), "/api/search?q=tra%20vinh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"], json!(["Cau Ngang"]));
    assert_eq!(body["selected"]["location"], "Cau Ngang");

    let (_, body) = get(app(&dir), "/api/search?q=chau").await;
    assert_eq!(body["suggestions"], json!(["Vinh Chau"]));
    assert_eq!(body["selected"]["location"], "Vinh Chau");

    let (_, body) = get(app(&dir), "/api/search").await;
    assert_eq!(body, json!({ "suggestions": [], "selected": null }));
}

#[tokio::test]
async fn history_chart_is_date_ordered() {
    let dir = seeded();
    let (status, body) = get(app(&dir), "/api/history/Vinh%20Chau?measurement=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "Salinity");
    assert_eq!(
        body["labels"],
        json!(["02/01/2024", "01/03/2024", "15/04/2024"])
    );
    assert_eq!(body["values"], json!([1.5, null, 3.1]));
}

#[tokio::test]
async fn history_misses_are_not_found() {
    let dir = seeded();

    let (status, _) = get(app(&dir), "/api/history/Cau%20Ngang").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(app(&dir), "/api/history/Vinh%20Chau?measurement=3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
