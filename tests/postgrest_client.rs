//! Wire-level tests for the PostgREST and storage clients against a mock
//! server

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sumbong::blob::{BlobStore, StorageBlobs};
use sumbong::config::Config;
use sumbong::error::Error;
use sumbong::model::{NewGrievance, Status};
use sumbong::store::{DataStore, PostgrestStore, SupportInsert};

fn test_config(server: &MockServer) -> Config {
    Config::new(&server.uri(), "anon-key", "service-key")
}

fn store_for(server: &MockServer) -> PostgrestStore {
    PostgrestStore::new(&test_config(server), reqwest::Client::new())
}

fn grievance_row(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Pothole",
        "description": "A large pothole on Main St has damaged three cars this week.",
        "category": "Road Maintenance",
        "agency_id": "agency-1",
        "status": "pending",
        "created_at": "2026-08-01T00:00:00Z",
    })
}

fn new_grievance() -> NewGrievance {
    NewGrievance {
        title: "Pothole".to_string(),
        description: "A large pothole on Main St has damaged three cars this week.".to_string(),
        category: "Road Maintenance".to_string(),
        agency_id: "agency-1".to_string(),
        location: None,
        submitter_name: None,
        submitter_email: None,
        submitter_phone: None,
        image_url: None,
        status: Status::Pending,
    }
}

#[tokio::test]
async fn insert_goes_out_privileged_and_returns_the_stored_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/grievances"))
        .and(header("apikey", "service-key"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([grievance_row("g-1")])))
        .expect(1)
        .mount(&server)
        .await;

    let stored = store_for(&server)
        .insert_grievance(&new_grievance())
        .await
        .unwrap();
    assert_eq!(stored.id, "g-1");
    assert_eq!(stored.status, Status::Pending);
}

#[tokio::test]
async fn listing_sends_the_filter_order_and_limit_shapes() {
    let server = MockServer::start().await;

    let row = {
        let mut row = grievance_row("g-1");
        row["support_count"] = json!(3);
        row["agencies"] = json!({"name": "Department of Public Works"});
        row
    };

    Mock::given(method("GET"))
        .and(path("/rest/v1/grievance_with_support_count"))
        .and(header("apikey", "anon-key"))
        .and(query_param("select", "*, agencies(name)"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "50"))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = store_for(&server)
        .list_grievances(Some(Status::Pending), 50)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].grievance.id, "g-1");
    assert_eq!(rows[0].support_count, 3);
    assert_eq!(
        rows[0].agencies.as_ref().map(|a| a.name.as_str()),
        Some("Department of Public Works")
    );
}

#[tokio::test]
async fn lookup_of_an_absent_row_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/grievance_with_support_count"))
        .and(query_param("id", "eq.missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let row = store_for(&server).grievance_by_id("missing").await.unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn update_matching_no_rows_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/grievances"))
        .and(header("apikey", "service-key"))
        .and(query_param("id", "eq.missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let patch = sumbong::model::GrievancePatch {
        status: Status::Resolved,
        admin_notes: None,
        updated_at: chrono::Utc::now(),
    };
    let updated = store_for(&server)
        .update_grievance("missing", &patch)
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn support_count_is_read_from_the_content_range_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/grievance_supports"))
        .and(header("Prefer", "count=exact"))
        .and(query_param("grievance_id", "eq.g-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-0/7")
                .set_body_json(json!([])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let count = store_for(&server).support_count("g-1").await.unwrap();
    assert_eq!(count, 7);
}

#[tokio::test]
async fn support_insert_conflict_reads_as_duplicate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/grievance_supports"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
        })))
        .mount(&server)
        .await;

    let outcome = store_for(&server).insert_support("g-1", "tok").await.unwrap();
    assert_eq!(outcome, SupportInsert::Duplicate);
}

#[tokio::test]
async fn support_insert_created_on_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/grievance_supports"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let outcome = store_for(&server).insert_support("g-1", "tok").await.unwrap();
    assert_eq!(outcome, SupportInsert::Created);
}

#[tokio::test]
async fn agency_existence_is_a_filtered_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/agencies"))
        .and(query_param("id", "eq.agency-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "agency-1"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/agencies"))
        .and(query_param("id", "eq.missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(store.agency_exists("agency-1").await.unwrap());
    assert!(!store.agency_exists("missing").await.unwrap());
}

#[tokio::test]
async fn credential_row_is_fetched_privileged() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_password_hash"))
        .and(header("apikey", "service-key"))
        .and(query_param("select", "hash"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"hash": "$2b$12$abcdef"}])),
        )
        .mount(&server)
        .await;

    let hash = store_for(&server).admin_password_hash().await.unwrap();
    assert_eq!(hash.as_deref(), Some("$2b$12$abcdef"));
}

#[tokio::test]
async fn store_failure_surfaces_as_a_persistence_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/agencies"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let err = store_for(&server).agencies().await.unwrap_err();
    assert!(matches!(err, Error::Persistence(_)), "{err:?}");
}

#[tokio::test]
async fn blob_upload_posts_the_object_and_resolves_a_public_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/grievance-images/test.png"))
        .and(header("apikey", "service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Key": "grievance-images/test.png",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let blobs = StorageBlobs::new(&test_config(&server), reqwest::Client::new());
    let stored_path = blobs
        .store("test.png", vec![1, 2, 3], "image/png")
        .await
        .unwrap();

    assert_eq!(stored_path, "test.png");
    assert_eq!(
        blobs.public_url(&stored_path),
        format!("{}/storage/v1/object/public/grievance-images/test.png", server.uri())
    );
}

#[tokio::test]
async fn blob_upload_failure_is_an_upload_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/grievance-images/test.png"))
        .respond_with(ResponseTemplate::new(500).set_body_string("bucket unavailable"))
        .mount(&server)
        .await;

    let blobs = StorageBlobs::new(&test_config(&server), reqwest::Client::new());
    let err = blobs
        .store("test.png", vec![1, 2, 3], "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ImageUploadFailed(_)), "{err:?}");
}
