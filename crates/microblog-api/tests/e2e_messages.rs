mod common;

use common::{TestServer, json_body};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn unread_notification(server: &TestServer, token: &str) -> Option<Value> {
    let notes = json_body(server.get(token, "/notifications?since=0").await).await;
    notes
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["name"] == "unread_message_count")
        .map(|n| n["data"].clone())
}

#[tokio::test]
async fn opening_a_conversation_clears_unread() {
    let server = TestServer::new().await;
    let a = server.signup("a").await;
    let b = server.signup("b").await;

    for body in ["one", "two", "three"] {
        let res = server.post(&a, "/messages/b", json!({ "body": body })).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let b_id = server.state.db.get_user_by_username("b").unwrap().unwrap().id;
    assert_eq!(server.state.db.unread_count(b_id).unwrap(), 3);
    assert_eq!(unread_notification(&server, &b).await, Some(json!(3)));

    let res = server.get(&b, "/messages/a").await;
    assert_eq!(res.status(), StatusCode::OK);
    let conversation = json_body(res).await;
    let messages = conversation["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["body"], "one");
    assert!(messages.iter().all(|m| m["is_read"] == true));

    assert_eq!(server.state.db.unread_count(b_id).unwrap(), 0);
    assert_eq!(unread_notification(&server, &b).await, Some(json!(0)));
}

#[tokio::test]
async fn conversation_is_the_same_from_both_sides() {
    let server = TestServer::new().await;
    let a = server.signup("a").await;
    let b = server.signup("b").await;

    server.post(&a, "/messages/b", json!({ "body": "ping" })).await;
    server.post(&b, "/messages/a", json!({ "body": "pong" })).await;

    let ids = |v: &Value| -> Vec<i64> {
        v["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_i64().unwrap())
            .collect()
    };

    let from_a = json_body(server.get(&a, "/messages/b").await).await;
    let from_b = json_body(server.get(&b, "/messages/a").await).await;
    assert_eq!(ids(&from_a), ids(&from_b));
    assert_eq!(from_a["messages"][0]["body"], "ping");
}

#[tokio::test]
async fn messaging_yourself_is_refused() {
    let server = TestServer::new().await;
    let a = server.signup("a").await;

    let res = server.post(&a, "/messages/a", json!({ "body": "hi me" })).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.get(&a, "/messages/a").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn messaging_unknown_user_is_not_found() {
    let server = TestServer::new().await;
    let a = server.signup("a").await;

    let res = server.post(&a, "/messages/ghost", json!({ "body": "anyone?" })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_list_shows_latest_per_sender() {
    let server = TestServer::new().await;
    let me = server.signup("me").await;
    let b = server.signup("b").await;
    let c = server.signup("c").await;

    server.post(&b, "/messages/me", json!({ "body": "b first" })).await;
    server.post(&c, "/messages/me", json!({ "body": "c only" })).await;
    server.post(&b, "/messages/me", json!({ "body": "b latest" })).await;

    let chats = json_body(server.get(&me, "/messages").await).await;
    let bodies: Vec<&str> = chats
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["b latest", "c only"]);
}

#[tokio::test]
async fn notifications_poll_since_last_seen_timestamp() {
    let server = TestServer::new().await;
    let a = server.signup("a").await;
    let b = server.signup("b").await;

    server.post(&a, "/messages/b", json!({ "body": "hi" })).await;

    let notes = json_body(server.get(&b, "/notifications").await).await;
    let notes = notes.as_array().unwrap();
    assert_eq!(notes.len(), 1);
    let last = notes[0]["timestamp"].as_f64().unwrap();

    let newer = json_body(server.get(&b, &format!("/notifications?since={last}")).await).await;
    assert!(newer.as_array().unwrap().is_empty());
}
