use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

mod common;
use common::*;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(env: &TestEnvironment) -> Socket {
    let (socket, _) = connect_async(env.ws_url.as_str())
        .await
        .expect("Failed to connect socket");
    socket
}

/// Next JSON text frame, skipping control frames
async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("Timed out waiting for socket frame")
            .expect("Socket closed")
            .expect("Socket error");

        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("Frame is not JSON");
        }
    }
}

async fn send(socket: &mut Socket, value: Value) {
    socket
        .send(Message::Text(value.to_string()))
        .await
        .expect("Failed to send frame");
}

#[tokio::test]
async fn test_snapshot_on_connect() {
    let env = TestEnvironment::new().await;
    env.create_product("Claw Hammer", "tools", 50.0).await;

    let mut socket = connect(&env).await;
    let event = next_event(&mut socket).await;

    assert_eq!(event["event"], "updateProducts");
    assert_eq!(event["data"].as_array().unwrap().len(), 1);
    assert_eq!(event["data"][0]["name"], "Claw Hammer");
}

#[tokio::test]
async fn test_new_product_broadcasts_to_every_listener() {
    let env = TestEnvironment::new().await;

    let mut first = connect(&env).await;
    let mut second = connect(&env).await;
    next_event(&mut first).await;
    next_event(&mut second).await;

    send(
        &mut first,
        json!({
            "event": "newProduct",
            "data": { "name": "Level", "category": "tools", "price": 15.0 }
        }),
    )
    .await;

    for socket in [&mut first, &mut second] {
        let event = next_event(socket).await;
        assert_eq!(event["event"], "updateProducts");
        assert_eq!(event["data"][0]["name"], "Level");
    }
}

#[tokio::test]
async fn test_delete_product_over_socket() {
    let env = TestEnvironment::new().await;
    let product = env.create_product("Claw Hammer", "tools", 50.0).await;

    let mut socket = connect(&env).await;
    next_event(&mut socket).await;

    send(
        &mut socket,
        json!({ "event": "deleteProduct", "data": product.id }),
    )
    .await;

    let event = next_event(&mut socket).await;
    assert_eq!(event["event"], "updateProducts");
    assert!(event["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_http_mutation_reaches_socket() {
    let env = TestEnvironment::new().await;

    let mut socket = connect(&env).await;
    next_event(&mut socket).await;

    env.create_product("Drill", "power tools", 120.0).await;

    let event = next_event(&mut socket).await;
    assert_eq!(event["event"], "updateProducts");
    assert_eq!(event["data"][0]["name"], "Drill");
}

#[tokio::test]
async fn test_errors_go_to_sender_only() {
    let env = TestEnvironment::new().await;

    let mut sender = connect(&env).await;
    let mut bystander = connect(&env).await;
    next_event(&mut sender).await;
    next_event(&mut bystander).await;

    send(&mut sender, json!({ "event": "shout", "data": 1 })).await;
    let event = next_event(&mut sender).await;
    assert_eq!(event["event"], "error");
    assert!(event["data"]["message"].is_string());

    send(
        &mut sender,
        json!({ "event": "deleteProduct", "data": uuid::Uuid::new_v4().to_string() }),
    )
    .await;
    let event = next_event(&mut sender).await;
    assert_eq!(event["event"], "error");
    assert!(event["data"]["message"]
        .as_str()
        .unwrap()
        .contains("Product not found"));

    send(
        &mut sender,
        json!({ "event": "newProduct", "data": { "name": "", "category": "tools", "price": 1.0 } }),
    )
    .await;
    let event = next_event(&mut sender).await;
    assert_eq!(event["event"], "error");

    // The connection survives and still receives broadcasts
    env.create_product("Clamp", "tools", 8.0).await;
    assert_eq!(next_event(&mut sender).await["event"], "updateProducts");

    // The bystander saw nothing but the broadcast
    assert_eq!(next_event(&mut bystander).await["event"], "updateProducts");
}

#[tokio::test]
async fn test_disconnect_unregisters_listener() {
    let env = TestEnvironment::new().await;

    let mut socket = connect(&env).await;
    next_event(&mut socket).await;
    assert_eq!(env.listeners.len(), 1);

    socket.close(None).await.unwrap();

    for _ in 0..50 {
        if env.listeners.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(env.listeners.is_empty());
}

#[tokio::test]
async fn test_closing_listeners_sends_close_frame() {
    let env = TestEnvironment::new().await;

    let mut socket = connect(&env).await;
    next_event(&mut socket).await;

    assert_eq!(env.listeners.close_all(), 1);

    let frame = loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("Timed out waiting for close frame")
            .expect("Socket ended without a close frame")
            .expect("Socket error");
        if !matches!(frame, Message::Ping(_) | Message::Pong(_)) {
            break frame;
        }
    };

    match frame {
        Message::Close(Some(close)) => {
            assert_eq!(close.code, CloseCode::Away);
        }
        other => panic!("expected close frame, got {:?}", other),
    }
    assert!(env.listeners.is_empty());
}
