mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use common::auth_header;

#[tokio::test]
async fn block_list_and_unblock() {
    let pool = common::setup_test_db().await;
    let server = TestServer::new(common::create_test_app(pool.clone())).unwrap();
    let (_, alice_token) = common::create_test_user(&pool, "alice").await;
    let (bob_id, _) = common::create_test_user(&pool, "bob").await;

    let (h, v) = auth_header(&alice_token);
    server
        .post(&format!("/api/blocks/{}", bob_id))
        .add_header(h, v)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // Blocking again is a no-op.
    let (h, v) = auth_header(&alice_token);
    server
        .post(&format!("/api/blocks/{}", bob_id))
        .add_header(h, v)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let (h, v) = auth_header(&alice_token);
    let blocked: Vec<Value> = server.get("/api/blocks").add_header(h, v).await.json();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0]["id"], bob_id.as_str());
    assert_eq!(blocked[0]["username"], "bob");

    let (h, v) = auth_header(&alice_token);
    server
        .post("/api/messages")
        .add_header(h, v)
        .json(&json!({ "recipientId": bob_id, "content": "hi" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let (h, v) = auth_header(&alice_token);
    server
        .delete(&format!("/api/blocks/{}", bob_id))
        .add_header(h, v)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let (h, v) = auth_header(&alice_token);
    server
        .delete(&format!("/api/blocks/{}", bob_id))
        .add_header(h, v)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let (h, v) = auth_header(&alice_token);
    server
        .post("/api/messages")
        .add_header(h, v)
        .json(&json!({ "recipientId": bob_id, "content": "hi again" }))
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn cannot_block_self_or_unknown() {
    let pool = common::setup_test_db().await;
    let server = TestServer::new(common::create_test_app(pool.clone())).unwrap();
    let (alice_id, alice_token) = common::create_test_user(&pool, "alice").await;

    let (h, v) = auth_header(&alice_token);
    server
        .post(&format!("/api/blocks/{}", alice_id))
        .add_header(h, v)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let (h, v) = auth_header(&alice_token);
    server
        .post("/api/blocks/ghost")
        .add_header(h, v)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gate_reads_current_state_each_time() {
    let pool = common::setup_test_db().await;
    let (alice_id, _) = common::create_test_user(&pool, "alice").await;
    let (bob_id, _) = common::create_test_user(&pool, "bob").await;

    use alumni_dm_server::messaging::blocking;

    assert!(blocking::can_send(&pool, &alice_id, &bob_id).await.unwrap());

    common::block(&pool, &bob_id, &alice_id).await;
    assert!(!blocking::can_send(&pool, &alice_id, &bob_id).await.unwrap());

    blocking::unblock(&pool, &bob_id, &alice_id).await.unwrap();
    assert!(blocking::can_send(&pool, &alice_id, &bob_id).await.unwrap());

    common::set_accepts_messages(&pool, &bob_id, false).await;
    assert!(!blocking::can_send(&pool, &alice_id, &bob_id).await.unwrap());

    assert!(blocking::can_send(&pool, &alice_id, "ghost").await.is_err());
}
