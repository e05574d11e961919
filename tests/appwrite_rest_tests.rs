// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tests for the Appwrite REST adapters against a mock HTTP server.

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workout_tracker::client::AppwriteClient;
use workout_tracker::config::Config;
use workout_tracker::db::{AppwriteDb, DocumentStore, Query};
use workout_tracker::error::AppError;
use workout_tracker::services::{AppwriteAccount, AppwriteFunctions, FunctionRunner, SessionStore};
use workout_tracker::App;

const PROJECT: &str = "proj42";
const DOCS_PATH: &str = "/databases/db1/collections/sets/documents";

fn client(server: &MockServer) -> AppwriteClient {
    AppwriteClient::with_endpoint(&server.uri(), PROJECT, "com.example.workout")
}

#[tokio::test]
async fn test_list_documents_sends_headers_and_queries() {
    let server = MockServer::start().await;
    let equal = Query::equal("workout_id", "w1").to_json_string();

    Mock::given(method("GET"))
        .and(path(DOCS_PATH))
        .and(header("X-Appwrite-Project", PROJECT))
        .and(header("Origin", "appwrite-android://com.example.workout"))
        .and(query_param("queries[]", equal.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [{ "$id": "s1", "exercise": "squat" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = AppwriteDb::new(client(&server), "db1");
    let list = db
        .list_documents("sets", &[Query::equal("workout_id", "w1")])
        .await
        .unwrap();

    assert_eq!(list.total, 1);
    assert_eq!(list.documents[0]["$id"], "s1");
}

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/nope", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Document with the requested ID could not be found.",
            "type": "document_not_found",
            "code": 404
        })))
        .mount(&server)
        .await;

    let db = AppwriteDb::new(client(&server), "db1");
    assert!(db.get_document("sets", "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_document_uses_unique_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(DOCS_PATH))
        .and(body_partial_json(json!({
            "documentId": "unique()",
            "data": { "exercise": "squat", "rep_count": 5 }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "$id": "new-id",
            "$createdAt": "2026-03-01T10:00:00.000+00:00",
            "exercise": "squat",
            "rep_count": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = AppwriteDb::new(client(&server), "db1");
    let created = db
        .create_document("sets", json!({ "exercise": "squat", "rep_count": 5 }))
        .await
        .unwrap();

    assert_eq!(created["$id"], "new-id");
}

#[tokio::test]
async fn test_backend_error_is_mapped() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/s1", DOCS_PATH)))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Server Error",
            "type": "general_unknown"
        })))
        .mount(&server)
        .await;

    let db = AppwriteDb::new(client(&server), "db1");
    let err = db
        .update_document("sets", "s1", json!({ "rep_count": 1 }))
        .await
        .unwrap_err();

    match err {
        AppError::Backend { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Server Error (general_unknown)");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_session_secret_is_captured_and_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/account/sessions/email"))
        .and(body_partial_json(json!({ "email": "a@example.com" })))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header(
                    "Set-Cookie",
                    "a_session_proj42=cookie-secret; path=/; httponly",
                )
                .set_body_json(json!({ "$id": "sess1", "userId": "u1", "secret": "" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("X-Appwrite-Session", "cookie-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "$id": "u1",
            "email": "a@example.com",
            "name": "alice"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = AppwriteAccount::new(client(&server));
    let session = account
        .create_email_session("a@example.com", "password1")
        .await
        .unwrap();
    assert_eq!(session.user_id, "u1");

    let current = account.current_account().await.unwrap();
    assert_eq!(current.id, "u1");
}

#[tokio::test]
async fn test_current_session_without_secret_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account/sessions/current"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let account = AppwriteAccount::new(client(&server));
    assert!(account.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_current_account_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "User (role: guests) missing scope (account)",
            "type": "general_unauthorized_scope"
        })))
        .mount(&server)
        .await;

    let account = AppwriteAccount::new(client(&server));
    assert!(matches!(
        account.current_account().await,
        Err(AppError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_function_execution_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/fn-delete/executions"))
        .and(body_partial_json(json!({ "async": false })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "$id": "exec1",
            "status": "completed",
            "responseBody": "{\"success\":true}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let functions = AppwriteFunctions::new(client(&server));
    let execution = functions
        .execute("fn-delete", r#"{"userId":"u1"}"#)
        .await
        .unwrap();

    assert_eq!(execution.id, "exec1");
    assert_eq!(execution.response_body, r#"{"success":true}"#);
}

#[tokio::test]
async fn test_app_sign_in_with_wrong_password() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/account/sessions/email"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid credentials.",
            "type": "user_invalid_credentials"
        })))
        .mount(&server)
        .await;

    let config = Config {
        endpoint: server.uri(),
        project_id: PROJECT.to_string(),
        ..Config::default()
    };
    let client = AppwriteClient::new(&config);
    let app = App::new(
        config.clone(),
        Arc::new(AppwriteDb::new(client.clone(), &config.database_id)),
        Arc::new(AppwriteAccount::new(client.clone())),
        Arc::new(AppwriteFunctions::new(client)),
    );

    let err = app
        .accounts
        .sign_in("a@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidCredentials));
}
