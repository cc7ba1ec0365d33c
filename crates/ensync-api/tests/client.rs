use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use ensync_api::{
    AccessKeyService, ApiError, Client, EventService, ListParams, RequestError, RetryPolicy,
    SortOrder, WorkspaceService,
};
use ensync_domain::{AccessKeyType, CreateAccessKeyRequest, Event, JsonObject, Permissions};
use httpmock::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const ACCESS_KEY: &str = "test-access-key";

fn fast_retries() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        wait_min: Duration::from_millis(1),
        wait_max: Duration::from_millis(5),
    }
}

fn client_for(server: &MockServer) -> Result<Client> {
    Ok(Client::builder(server.base_url())
        .access_key(ACCESS_KEY)
        .retry_policy(fast_retries())
        .timeout(Duration::from_secs(10))
        .build()?)
}

#[tokio::test]
async fn list_events_sends_paging_query_and_headers() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/event")
            .query_param("pageIndex", "0")
            .query_param("limit", "10")
            .query_param("order", "DESC")
            .query_param("orderBy", "createdAt")
            .header("x-access-key", ACCESS_KEY)
            .header("accept", "application/json");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "resultsLength": 2,
                "results": [
                    {"id": "event-1", "name": "event1", "payload": {"key": "value1"}},
                    {"id": "event-2", "name": "event2", "payload": {"key": "value2"}}
                ]
            }));
    });

    let client = client_for(&server)?;
    let events = client
        .list_events(&CancellationToken::new(), &ListParams::default())
        .await?;

    mock.assert();
    assert_eq!(events.results_length, 2);
    assert_eq!(events.results.len(), 2);
    assert_eq!(events.results[0].name, "event1");
    assert_eq!(events.results[1].payload["key"], "value2");
    Ok(())
}

#[tokio::test]
async fn list_access_keys_merges_filters() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/access-key")
            .query_param("pageIndex", "2")
            .query_param("limit", "25")
            .query_param("order", "ASC")
            .query_param("orderBy", "name")
            .query_param("accessKey", "abc");
        then.status(200).json_body(json!({
            "resultsLength": 1,
            "results": [{
                "id": "key-1",
                "key": "abc",
                "type": "SERVICE",
                "permissions": {"send": ["*"], "receive": []}
            }]
        }));
    });

    let client = client_for(&server)?;
    let params = ListParams {
        page_index: 2,
        limit: 25,
        order: SortOrder::Asc,
        order_by: "name".into(),
        ..ListParams::default()
    }
    .with_filter("accessKey", "abc");
    let keys = client
        .list_access_keys(&CancellationToken::new(), &params)
        .await?;

    mock.assert();
    let key = &keys.results[0];
    assert_eq!(key.key_type, Some(AccessKeyType::Service));
    assert!(
        key.permissions
            .as_ref()
            .is_some_and(|permissions| permissions.has_send_permission("anything"))
    );
    Ok(())
}

#[tokio::test]
async fn get_event_is_idempotent() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/event/user.created");
        then.status(200).json_body(json!({
            "id": "event-1",
            "name": "user.created",
            "payload": {"userId": "string"},
            "createdAt": "2024-05-01T10:00:00Z"
        }));
    });

    let client = client_for(&server)?;
    let cancel = CancellationToken::new();
    let first = client.get_event_by_name(&cancel, "user.created").await?;
    let second = client.get_event_by_name(&cancel, "user.created").await?;

    mock.assert_calls(2);
    assert_eq!(first, second);
    assert_eq!(first.id, "event-1");
    Ok(())
}

#[tokio::test]
async fn create_event_posts_name_and_payload() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/event")
            .header("content-type", "application/json")
            .json_body(json!({"name": "new-event", "payload": {"key": "value"}}));
        then.status(201);
    });

    let mut payload = JsonObject::new();
    payload.insert("key".into(), json!("value"));
    let client = client_for(&server)?;
    client
        .create_event(&CancellationToken::new(), &Event::new("new-event", payload))
        .await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn update_event_sends_only_mutable_fields() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/event/event-123")
            .json_body(json!({"name": "updated-event", "payload": {"key": "new-value"}}));
        then.status(200).json_body(json!({}));
    });

    let mut payload = JsonObject::new();
    payload.insert("key".into(), json!("new-value"));
    let event = Event {
        id: "event-123".into(),
        ..Event::new("updated-event", payload)
    };
    let client = client_for(&server)?;
    client
        .update_event(&CancellationToken::new(), &event)
        .await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn update_event_without_id_is_rejected_locally() -> Result<()> {
    let server = MockServer::start_async().await;
    let client = client_for(&server)?;
    let error = client
        .update_event(&CancellationToken::new(), &Event::new("x", JsonObject::new()))
        .await
        .err();

    assert!(matches!(
        error.as_ref().and_then(ApiError::request_error),
        Some(RequestError::InvalidUrl { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn create_access_key_returns_generated_key() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/access-key").json_body(json!({
            "type": "SERVICE",
            "name": "test",
            "permissions": {"send": ["event1", "event2"], "receive": ["event3"]}
        }));
        then.status(201).json_body(json!({
            "id": "new-id-123",
            "accessKey": "new-access-key-123",
            "name": "test",
            "type": "SERVICE",
            "createdAt": "2024-05-01T10:00:00Z"
        }));
    });

    let client = client_for(&server)?;
    let created = client
        .create_access_key(
            &CancellationToken::new(),
            &CreateAccessKeyRequest {
                key_type: AccessKeyType::Service,
                name: "test".into(),
                permissions: Permissions::new(["event1", "event2"], ["event3"]),
            },
        )
        .await?;

    mock.assert();
    assert_eq!(created.access_key, "new-access-key-123");
    assert_eq!(created.id, "new-id-123");
    Ok(())
}

#[tokio::test]
async fn delete_access_key_accepts_empty_no_content() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(DELETE).path("/access-key/key-1");
        then.status(204);
    });

    let client = client_for(&server)?;
    client
        .delete_access_key(&CancellationToken::new(), "key-1")
        .await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn permissions_round_trip_through_sub_resource() -> Result<()> {
    let server = MockServer::start_async().await;
    let set = server.mock(|when, then| {
        when.method(POST)
            .path("/access-key/key-1/permissions")
            .json_body(json!({"send": ["a"], "receive": ["b"]}));
        then.status(200);
    });
    let get = server.mock(|when, then| {
        when.method(GET).path("/access-key/key-1/permissions");
        then.status(200).json_body(json!({
            "id": "key-1",
            "key": "abc",
            "permissions": {"send": ["a"], "receive": ["b"]}
        }));
    });

    let client = client_for(&server)?;
    let cancel = CancellationToken::new();
    let wanted = Permissions::new(["a"], ["b"]);
    client
        .set_access_key_permissions(&cancel, "key-1", &wanted)
        .await?;
    let echoed = client.get_access_key_permissions(&cancel, "key-1").await?;

    set.assert();
    get.assert();
    assert_eq!(echoed.permissions, Some(wanted));
    Ok(())
}

#[tokio::test]
async fn rotation_returns_new_pair() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/access/service-key-pair")
            .json_body(json!({"access_key": "key-to-rotate"}));
        then.status(200)
            .json_body(json!({"public_key": "pub-1", "private_key": "priv-1"}));
    });

    let client = client_for(&server)?;
    let pair = client
        .rotate_service_key_pair(&CancellationToken::new(), "key-to-rotate")
        .await?;

    mock.assert();
    assert_eq!(pair.public_key, "pub-1");
    assert_eq!(pair.private_key.as_deref(), Some("priv-1"));
    Ok(())
}

#[tokio::test]
async fn workspaces_list_and_create() -> Result<()> {
    let server = MockServer::start_async().await;
    let list = server.mock(|when, then| {
        when.method(GET).path("/workspace").query_param("limit", "10");
        then.status(200).json_body(json!({
            "resultsLength": 1,
            "results": [{
                "id": "ws-1",
                "name": "gms",
                "path": "gms",
                "children": [{"id": "ws-2", "name": "ops", "parentId": "ws-1", "path": "gms/ops"}]
            }]
        }));
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/workspace")
            .json_body(json!({"name": "billing"}));
        then.status(201);
    });

    let client = client_for(&server)?;
    let cancel = CancellationToken::new();
    let workspaces = client
        .list_workspaces(&cancel, &ListParams::default())
        .await?;
    client.create_workspace(&cancel, "billing").await?;

    list.assert();
    create.assert();
    assert_eq!(workspaces.results[0].children[0].parent_id, "ws-1");
    Ok(())
}

#[tokio::test]
async fn not_found_with_plain_text_is_a_status_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/access-key/missing");
        then.status(404).body("404 page not found");
    });

    let client = client_for(&server)?;
    let error = client
        .get_access_key(&CancellationToken::new(), "missing")
        .await
        .err();

    let status = error.as_ref().and_then(ApiError::status_error);
    assert_eq!(status.map(|status| status.status), Some(404));
    assert_eq!(
        status.map(|status| status.body.as_str()),
        Some("404 page not found")
    );
    assert!(!matches!(error, Some(ApiError::Decode { .. })));
    Ok(())
}

#[tokio::test]
async fn structured_error_body_is_decoded() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/workspace");
        then.status(409)
            .json_body(json!({"message": "workspace exists", "code": "WS_DUP"}));
    });

    let client = client_for(&server)?;
    let error = client
        .create_workspace(&CancellationToken::new(), "gms")
        .await
        .err();

    let status = error.as_ref().and_then(ApiError::status_error);
    assert_eq!(status.map(|status| status.message()), Some("workspace exists"));
    assert_eq!(status.and_then(|status| status.code()), Some("WS_DUP"));
    let rendered = error.map(|err| format!("{:#}", anyhow::Error::from(err)));
    assert_eq!(
        rendered.as_deref(),
        Some("create workspace 'gms': api error (status 409, code WS_DUP): workspace exists")
    );
    Ok(())
}

#[tokio::test]
async fn server_errors_are_retried_exactly_three_times() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/event");
        then.status(503).body("unavailable");
    });

    let client = client_for(&server)?;
    let error = client
        .list_events(&CancellationToken::new(), &ListParams::default())
        .await
        .err();

    mock.assert_calls(4);
    assert_eq!(error.as_ref().and_then(ApiError::status), Some(503));
    assert!(error.is_some_and(|err| err.is_retryable()));
    Ok(())
}

/// Serves `503` for the first `failures` requests and an empty event page afterwards.
async fn recovering_server(failures: usize) -> Result<(String, Arc<AtomicUsize>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => request.extend_from_slice(&chunk[..read]),
                }
            }
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            let (status, body) = if attempt < failures {
                ("503 Service Unavailable", "unavailable")
            } else {
                ("200 OK", r#"{"resultsLength":0,"results":[]}"#)
            };
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    Ok((base_url, hits))
}

#[tokio::test]
async fn server_errors_recover_on_the_last_attempt() -> Result<()> {
    let (base_url, hits) = recovering_server(3).await?;
    let client = Client::builder(base_url)
        .access_key(ACCESS_KEY)
        .retry_policy(fast_retries())
        .timeout(Duration::from_secs(10))
        .build()?;

    let events = client
        .list_events(&CancellationToken::new(), &ListParams::default())
        .await?;

    assert!(events.results.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 4);
    Ok(())
}

#[tokio::test]
async fn client_errors_are_not_retried() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(DELETE).path("/access-key/key-1");
        then.status(403).json_body(json!({"message": "forbidden"}));
    });

    let client = client_for(&server)?;
    let error = client
        .delete_access_key(&CancellationToken::new(), "key-1")
        .await
        .err();

    mock.assert_calls(1);
    assert_eq!(error.as_ref().and_then(ApiError::status), Some(403));
    Ok(())
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/event/broken");
        then.status(200).body("not json");
    });

    let client = client_for(&server)?;
    let error = client
        .get_event_by_name(&CancellationToken::new(), "broken")
        .await
        .err();

    assert!(matches!(
        error,
        Some(ApiError::Decode {
            operation: "get event",
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn cancelled_token_fails_at_the_rate_limiter() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/workspace");
        then.status(200).json_body(json!({"resultsLength": 0, "results": []}));
    });

    let client = Client::builder(server.base_url())
        .rate_limit(10.0, 20)
        .build()?;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let error = client
        .list_workspaces(&cancel, &ListParams::default())
        .await
        .err();

    mock.assert_calls(0);
    assert!(matches!(
        error.as_ref().and_then(ApiError::request_error),
        Some(RequestError::RateLimitExceeded { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn cancellation_interrupts_in_flight_requests() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/event/slow");
        then.status(200)
            .delay(Duration::from_secs(5))
            .json_body(json!({"name": "slow"}));
    });

    let client = client_for(&server)?;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let error = client.get_event_by_name(&cancel, "slow").await.err();
    assert!(matches!(
        error.as_ref().and_then(ApiError::request_error),
        Some(RequestError::Cancelled)
    ));
    Ok(())
}

#[tokio::test]
async fn overall_timeout_bounds_the_exchange() -> Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/workspace");
        then.status(200)
            .delay(Duration::from_secs(5))
            .json_body(json!({"resultsLength": 0, "results": []}));
    });

    let client = Client::builder(server.base_url())
        .timeout(Duration::from_millis(100))
        .build()?;
    let error = client
        .list_workspaces(&CancellationToken::new(), &ListParams::default())
        .await
        .err();

    assert!(matches!(
        error.as_ref().and_then(ApiError::request_error),
        Some(RequestError::Timeout { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn access_key_changes_apply_to_later_calls() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/access-key/key-1")
            .header("x-access-key", "rotated-key");
        then.status(204);
    });

    let client = client_for(&server)?;
    client.set_access_key("rotated-key");
    client
        .delete_access_key(&CancellationToken::new(), "key-1")
        .await?;

    mock.assert();
    Ok(())
}
