//! Live product updates over WebSocket
//!
//! Each connection gets a full product snapshot on connect. `newProduct` and
//! `deleteProduct` frames mutate the catalog; the product service then pushes
//! the new snapshot to every listener. Failures are reported to the sender
//! only and never close the connection.

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::app::AppState;
use crate::models::{ClientEvent, ServerEvent, ServiceError};
use crate::services::{ListenerId, ListenerRegistry, ListenerSender, ProductService};

/// Endpoint: GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let listener_id = subscribe(&state.product_service, &state.listeners, tx).await;

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode socket event");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
        }

        // The registry dropped our queue, so the server is going away
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: close_code::AWAY,
                reason: "Server shutting down".into(),
            })))
            .await;
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(&recv_state, listener_id, &text).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.listeners.unregister(listener_id);
}

/// Queue the current snapshot for a new listener, then register it.
///
/// A mutation broadcast between the first read and registration would be
/// missed, so the catalog is read once more and re-sent if it changed.
pub async fn subscribe(
    products: &ProductService,
    listeners: &ListenerRegistry,
    tx: ListenerSender,
) -> ListenerId {
    let initial = products.list_all().await;
    let event = match &initial {
        Ok(snapshot) => ServerEvent::UpdateProducts(snapshot.clone()),
        Err(e) => {
            warn!(error = %e, "Failed to load initial product snapshot");
            ServerEvent::Error {
                message: "Failed to load products".to_string(),
            }
        }
    };
    // The receiving half is still owned by the caller
    let _ = tx.send(event);

    let listener_id = listeners.register(tx);

    if let Ok(latest) = products.list_all().await {
        if initial.as_ref().map_or(true, |snapshot| *snapshot != latest) {
            debug!(listener_id, "Catalog changed while subscribing");
            listeners.send_to(listener_id, ServerEvent::UpdateProducts(latest));
        }
    }

    listener_id
}

/// Apply one client frame. Errors go back to `listener_id` alone.
#[instrument(name = "socket_message", skip(state, text), fields(listener_id = listener_id))]
pub async fn handle_client_message(state: &AppState, listener_id: ListenerId, text: &str) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "Rejected malformed socket frame");
            reply_error(state, listener_id, format!("Invalid message: {}", e));
            return;
        }
    };

    let result = match event {
        ClientEvent::NewProduct(request) => state
            .tracer
            .trace_product_operation(
                "socket_create",
                None,
                state.product_service.create_product(request),
            )
            .await
            .map(|_| ()),
        ClientEvent::DeleteProduct(id) => {
            state
                .tracer
                .trace_product_operation(
                    "socket_delete",
                    Some(id.as_str()),
                    state.product_service.delete_product(&id),
                )
                .await
        }
    };

    match result {
        Ok(()) => {}
        Err(ServiceError::Repository { source }) => {
            warn!(error = %source, "Socket mutation failed in the store");
            reply_error(state, listener_id, "Internal server error".to_string());
        }
        Err(e) => reply_error(state, listener_id, e.to_string()),
    }
}

fn reply_error(state: &AppState, listener_id: ListenerId, message: String) {
    if !state
        .listeners
        .send_to(listener_id, ServerEvent::Error { message })
    {
        debug!(listener_id, "Listener gone before error reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityStatus, CreateProductRequest, Product, RepositoryError};
    use crate::repositories::ProductRepository;
    use async_trait::async_trait;
    use mockall::mock;
    use rust_decimal_macros::dec;
    use serde_json::Map;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    mock! {
        TestProductRepository {}

        #[async_trait]
        impl ProductRepository for TestProductRepository {
            async fn find_all(&self) -> Result<Vec<Product>, RepositoryError>;
            async fn find_by_id(&self, id: &str) -> Result<Option<Product>, RepositoryError>;
            async fn create(&self, product: Product) -> Result<Product, RepositoryError>;
            async fn update(&self, product: Product) -> Result<Product, RepositoryError>;
            async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;
        }
    }

    fn sample_product() -> Product {
        Product::new(CreateProductRequest {
            name: "Spirit Level".to_string(),
            description: None,
            category: "tools".to_string(),
            availability: AvailabilityStatus::Available,
            price: dec!(15),
            stock: 4,
            attributes: Map::new(),
        })
    }

    #[tokio::test]
    async fn test_subscribe_sends_single_snapshot_when_catalog_is_stable() {
        let product = sample_product();
        let mut repo = MockTestProductRepository::new();
        repo.expect_find_all()
            .times(2)
            .returning(move || Ok(vec![product.clone()]));

        let service = ProductService::new(Arc::new(repo));
        let listeners = ListenerRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let id = subscribe(&service, &listeners, tx).await;

        assert_eq!(listeners.len(), 1);
        assert!(listeners.send_to(id, ServerEvent::UpdateProducts(Vec::new())));
        assert!(matches!(rx.recv().await, Some(ServerEvent::UpdateProducts(p)) if p.len() == 1));
        assert!(matches!(rx.recv().await, Some(ServerEvent::UpdateProducts(p)) if p.is_empty()));
    }

    #[tokio::test]
    async fn test_subscribe_resends_when_catalog_changes_during_registration() {
        let product = sample_product();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut repo = MockTestProductRepository::new();
        let counter = calls.clone();
        repo.expect_find_all().returning(move || {
            // The first read predates a concurrent create
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Vec::new())
            } else {
                Ok(vec![product.clone()])
            }
        });

        let service = ProductService::new(Arc::new(repo));
        let listeners = ListenerRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        subscribe(&service, &listeners, tx).await;

        assert!(matches!(rx.recv().await, Some(ServerEvent::UpdateProducts(p)) if p.is_empty()));
        match rx.recv().await {
            Some(ServerEvent::UpdateProducts(products)) => {
                assert_eq!(products.len(), 1);
                assert_eq!(products[0].name, "Spirit Level");
            }
            other => panic!("expected a fresh snapshot, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_subscribe_reports_store_failure_to_listener() {
        let mut repo = MockTestProductRepository::new();
        repo.expect_find_all()
            .returning(|| Err(RepositoryError::ConnectionFailed));

        let service = ProductService::new(Arc::new(repo));
        let listeners = ListenerRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        subscribe(&service, &listeners, tx).await;

        assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));
        assert_eq!(listeners.len(), 1);
        assert!(rx.try_recv().is_err());
    }
}
