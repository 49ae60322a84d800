//! Chunk upload integration tests.
//!
//! Run with: `cargo test -p shardbox-api --test upload_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use bytes::Bytes;
use helpers::{patterned_bytes, post_chunk, setup_test_app, upload_file, CHUNK_SIZE};
use shardbox_storage::MetadataStore;
use std::time::Duration;

#[tokio::test]
async fn two_chunk_upload_completes_with_delete_token() {
    let app = setup_test_app();
    let data = patterned_bytes(CHUNK_SIZE as usize + 1000);

    let token = upload_file(app.client(), "report-1", "report.pdf", &data).await;

    assert_eq!(token.len(), 64, "token should be 32 hex-encoded bytes");
    assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(app.backend.object_count(), 2);
}

#[tokio::test]
async fn intermediate_chunk_reports_next_index() {
    let app = setup_test_app();
    let chunk = patterned_bytes(CHUNK_SIZE as usize);

    let response = post_chunk(
        app.client(),
        "partial-1",
        "video.mp4",
        3 * CHUNK_SIZE,
        0,
        3,
        &chunk,
    )
    .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["done"], false);
    assert_eq!(body["fileId"], "partial-1");
    assert_eq!(body["nextChunkIndex"], 1);
    assert!(body.get("deleteToken").is_none());
}

#[tokio::test]
async fn upload_to_completed_file_conflicts_without_backend_call() {
    let app = setup_test_app();
    let data = patterned_bytes(1500);

    upload_file(app.client(), "done-1", "note.txt", &data).await;
    let calls_before = app.backend.upload_calls();

    let response = post_chunk(app.client(), "done-1", "note.txt", 1500, 0, 1, &data).await;
    assert_eq!(response.status_code(), 409);
    // The conflict guard fires before the chunk ever reaches the backend.
    assert_eq!(app.backend.upload_calls(), calls_before);
}

#[tokio::test]
async fn resent_chunk_index_appends_and_keeps_first_declared_metadata() {
    let app = setup_test_app();
    let chunk = patterned_bytes(CHUNK_SIZE as usize);
    let size = 3 * CHUNK_SIZE;

    let response = post_chunk(app.client(), "resent-1", "First Name.bin", size, 0, 3, &chunk).await;
    assert_eq!(response.status_code(), 200);

    // Same index again, with conflicting declared metadata. The call is
    // accepted and appended; the record keeps what the first call pinned.
    let response = post_chunk(app.client(), "resent-1", "other.txt", 999, 0, 3, &chunk).await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["done"], false);
    assert_eq!(body["nextChunkIndex"], 1);

    let record = app
        .store
        .get("resent-1")
        .await
        .expect("store read")
        .expect("record exists");
    assert_eq!(record.chunk_refs.len(), 2);
    assert_eq!(record.file_name, "first-name.bin");
    assert_eq!(record.file_size, size);
    assert_eq!(record.total_chunks, 3);
    assert!(!record.done);
}

#[tokio::test]
async fn missing_field_is_rejected_before_any_side_effect() {
    let app = setup_test_app();

    // No fileSize field.
    let form = MultipartForm::new()
        .add_text("fileId", "bad-1")
        .add_text("fileName", "x.bin")
        .add_text("chunkIndex", "0")
        .add_text("chunkSize", CHUNK_SIZE.to_string())
        .add_text("totalChunks", "1")
        .add_part("chunk", Part::bytes(Bytes::from_static(b"abc")));
    let response = app.client().post("/u").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(app.backend.upload_calls(), 0);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn out_of_bounds_chunk_size_is_rejected() {
    let app = setup_test_app();

    // Below the 1 MiB floor and above the 50 MiB ceiling.
    let too_big = (60 * 1024 * 1024u64).to_string();
    for declared in ["1000", too_big.as_str()] {
        let form = MultipartForm::new()
            .add_text("fileId", "bad-2")
            .add_text("fileName", "x.bin")
            .add_text("fileSize", "1000")
            .add_text("chunkIndex", "0")
            .add_text("chunkSize", declared)
            .add_text("totalChunks", "1")
            .add_part("chunk", Part::bytes(Bytes::from_static(b"abc")));
        let response = app.client().post("/u").multipart(form).await;

        assert_eq!(response.status_code(), 400, "chunkSize {}", declared);
    }
    assert_eq!(app.backend.upload_calls(), 0);
}

#[tokio::test]
async fn malformed_file_id_is_rejected() {
    let app = setup_test_app();
    let chunk = patterned_bytes(16);

    let response = post_chunk(
        app.client(),
        "../escape",
        "x.bin",
        16,
        0,
        1,
        &chunk,
    )
    .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn rate_limited_backend_is_retried_until_accepted() {
    let app = setup_test_app();
    app.backend.inject_rate_limit(Duration::from_millis(5));
    app.backend.inject_rate_limit(Duration::from_millis(5));

    let data = patterned_bytes(2048);
    let token = upload_file(app.client(), "throttled-1", "slow.bin", &data).await;

    assert!(!token.is_empty());
    // Two rejected attempts plus the accepted one.
    assert_eq!(app.backend.upload_calls(), 3);
    assert_eq!(app.backend.object_count(), 1);
}

#[tokio::test]
async fn file_name_is_normalized_in_stored_record() {
    let app = setup_test_app();
    let data = patterned_bytes(512);

    upload_file(app.client(), "folded-1", "Tệp tin (final)v2.PDF", &data).await;

    let record = app
        .store
        .get("folded-1")
        .await
        .expect("store read")
        .expect("record exists");
    assert_eq!(record.file_name, "tep-tin-finalv2.PDF");
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = setup_test_app();

    let response = app.client().get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_u64());
}
