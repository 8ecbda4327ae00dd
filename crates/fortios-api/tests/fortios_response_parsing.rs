//! Integration tests for parsing FortiOS REST responses.
//!
//! These tests validate that the envelope model copes with the shapes the
//! device actually returns for monitor, cmdb and error calls.

use fortios_api::models::ApiResponse;
use fortios_core::DeviceVersion;
use std::fs;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_fixture(name: &str) -> ApiResponse {
    let fixture_path = fixtures_dir().join(name);
    let json_data = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&json_data)
        .unwrap_or_else(|e| panic!("Failed to deserialize {name}: {e}\nJSON: {json_data}"))
}

#[test]
fn test_system_status_version() {
    let status = load_fixture("system_status.json");

    assert!(!status.is_error());
    let version: DeviceVersion = status.version.as_deref().unwrap().parse().unwrap();
    assert_eq!(version, DeviceVersion::new(7, 4, 1));
    assert_eq!(status.build, Some(2463));
}

#[test]
fn test_cmdb_table_result() {
    let response = load_fixture("internet_service_extension.json");

    assert_eq!(response.mkey().as_deref(), Some("65536"));
    let object = response.first_result().expect("should carry one object");
    assert_eq!(object["id"], 65536);
    assert_eq!(object["entry"][0]["port-range"][0]["end-port"], 443);
    assert_eq!(object["entry"][0]["dst"][0]["name"], "login.example.com");
}

#[test]
fn test_cmdb_error_body() {
    let response = load_fixture("cmdb_error.json");

    assert!(response.is_error());
    assert_eq!(response.http_status, Some(500));
    assert_eq!(
        response.error_message(),
        "FortiOS error -5: A duplicate entry already exists."
    );
    assert!(response.first_result().is_none());
}
