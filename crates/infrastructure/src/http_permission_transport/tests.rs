use std::time::Duration;

use grantdesk_application::PermissionTransport;
use grantdesk_core::AppError;
use grantdesk_domain::{
    AccountIdentity, FieldName, FormAction, PermissionRequest, PermissionSelection, PermissionType,
    RequestBuilder, ScopeSelection, ScopeType, UserKey,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{HttpPermissionTransport, SessionLogin};

fn transport(server: &MockServer) -> HttpPermissionTransport {
    match HttpPermissionTransport::new(&format!("{}/api/", server.uri()), Duration::from_secs(5)) {
        Ok(transport) => transport,
        Err(error) => panic!("transport should build: {error}"),
    }
}

fn database_grant() -> PermissionRequest {
    let mut selection = ScopeSelection::new(ScopeType::Database);
    assert!(selection.set_value(FieldName::DatabaseName, "sales").is_ok());
    let Ok(identity) = AccountIdentity::new("alice", "%") else {
        panic!("identity should be valid");
    };
    let permissions: PermissionSelection = [PermissionType::CreateTable].into_iter().collect();

    match RequestBuilder::build(
        FormAction::Grant,
        &selection,
        &permissions,
        &identity,
        false,
    ) {
        Ok(request) => request,
        Err(error) => panic!("request should build: {error}"),
    }
}

fn envelope(code: i32, message: &str, data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": code,
        "message": message,
        "data": data,
    }))
}

#[tokio::test]
async fn grant_posts_scope_shaped_payload_with_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/permission/grant"))
        .and(header_exists("X-Request-Id"))
        .and(body_json(json!({
            "username": "alice",
            "host": "%",
            "permissionTypes": ["CREATE TABLE"],
            "scopeType": "DATABASE",
            "withGrantOption": false,
            "databaseName": "sales",
            "allDatabases": false
        })))
        .respond_with(envelope(200, "permissions granted", serde_json::Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let result = transport(&server).grant(&database_grant()).await;

    assert_eq!(result.ok().as_deref(), Some("permissions granted"));
}

#[tokio::test]
async fn non_success_envelope_becomes_application_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/permission/revoke"))
        .respond_with(envelope(
            500,
            "user does not exist: alice",
            serde_json::Value::Null,
        ))
        .mount(&server)
        .await;

    let result = transport(&server).revoke(&database_grant()).await;

    assert!(matches!(
        result,
        Err(AppError::Application { code: 500, message }) if message == "user does not exist: alice"
    ));
}

#[tokio::test]
async fn http_failure_carries_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permission/users"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let result = transport(&server).list_users().await;

    assert!(matches!(
        result,
        Err(AppError::Transport(message)) if message.contains("bad gateway")
    ));
}

#[tokio::test]
async fn malformed_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permission/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = transport(&server).list_users().await;

    assert!(matches!(result, Err(AppError::Transport(_))));
}

#[tokio::test]
async fn list_tolerates_null_permission_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permission/users"))
        .respond_with(envelope(
            200,
            "ok",
            json!([
                {"username": "alice", "host": "%", "hasGrantOption": false, "permissions": [
                    {"permissionType": "SELECT", "databaseName": "sales", "allDatabases": false, "withGrantOption": false}
                ]},
                {"username": "bob", "host": "localhost", "hasGrantOption": false, "permissions": null}
            ]),
        ))
        .mount(&server)
        .await;

    let records = transport(&server).list_users().await;

    let counts = records.map(|records| {
        records
            .iter()
            .map(|record| record.permissions().len())
            .collect::<Vec<_>>()
    });
    assert_eq!(counts.ok(), Some(vec![1, 0]));
}

#[tokio::test]
async fn detail_path_encodes_each_segment_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permission/users/a%25b/10.0.0.0%2F255.0.0.0"))
        .respond_with(envelope(
            200,
            "ok",
            json!({"username": "a%b", "host": "10.0.0.0/255.0.0.0", "permissions": []}),
        ))
        .expect(2)
        .mount(&server)
        .await;
    let transport = transport(&server);

    let Ok(raw) = UserKey::from_raw("a%b", "10.0.0.0/255.0.0.0") else {
        panic!("raw key should be valid");
    };
    let Ok(decoded) = UserKey::from_encoded("a%25b", "10.0.0.0%2F255.0.0.0") else {
        panic!("encoded key should decode");
    };

    let from_raw = transport.user_detail(&raw).await;
    let from_decoded = transport.user_detail(&decoded).await;

    assert_eq!(
        from_raw.map(|record| record.username().to_owned()).ok(),
        Some("a%b".to_owned())
    );
    assert!(from_decoded.is_ok());
}

#[tokio::test]
async fn exists_sends_raw_values_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/permission/users/exists"))
        .and(query_param("username", "alice"))
        .and(query_param("host", "%"))
        .respond_with(envelope(200, "ok", json!(true)))
        .mount(&server)
        .await;

    let Ok(key) = UserKey::from_raw("alice", "%") else {
        panic!("key should be valid");
    };
    let exists = transport(&server).user_exists(&key).await;

    assert_eq!(exists.ok(), Some(true));
}

#[tokio::test]
async fn batch_posts_list_to_action_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/permission/batch/revoke"))
        .and(body_string_contains("\"permissionTypes\":[\"CREATE TABLE\"]"))
        .respond_with(envelope(200, "2 requests applied", serde_json::Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let requests = vec![database_grant(), database_grant()];
    let result = transport(&server)
        .batch(FormAction::Revoke, &requests)
        .await;

    assert_eq!(result.ok().as_deref(), Some("2 requests applied"));
}

#[tokio::test]
async fn login_runs_once_before_first_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/star-guard/login"))
        .and(body_string_contains("username=admin"))
        .respond_with(ResponseTemplate::new(200).insert_header("set-cookie", "JSESSIONID=abc; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/permission/users"))
        .respond_with(envelope(200, "ok", json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let Ok(login_url) = Url::parse(&format!("{}/star-guard/login", server.uri())) else {
        panic!("login url should parse");
    };
    let transport = transport(&server).with_login(SessionLogin {
        url: login_url,
        username: "admin".to_owned(),
        password: "secret".to_owned(),
    });

    assert!(transport.list_users().await.is_ok());
    assert!(transport.list_users().await.is_ok());
}

#[tokio::test]
async fn rejected_login_stops_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/star-guard/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/permission/users"))
        .respond_with(envelope(200, "ok", json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let Ok(login_url) = Url::parse(&format!("{}/star-guard/login", server.uri())) else {
        panic!("login url should parse");
    };
    let transport = transport(&server).with_login(SessionLogin {
        url: login_url,
        username: "admin".to_owned(),
        password: "wrong".to_owned(),
    });

    let result = transport.list_users().await;

    assert!(matches!(
        result,
        Err(AppError::Transport(message)) if message.contains("bad credentials")
    ));
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = HttpPermissionTransport::new("not a url", Duration::from_secs(1));
    assert!(matches!(result, Err(AppError::Validation(_))));
}
