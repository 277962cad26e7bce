//! In-process stand-in for the Tiny ERP form API
//!
//! Records every form POST and answers with a configurable JSON reply, or
//! with a configurable HTTP failure.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One form POST received by the mock.
#[derive(Debug, Clone)]
pub struct RecordedForm {
    /// Endpoint name without the `.php` suffix (e.g. `pedido.incluir`)
    pub endpoint: String,
    pub fields: Vec<(String, String)>,
}

#[allow(dead_code)]
impl RecordedForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(key, _)| key.as_str()).collect()
    }
}

#[derive(Clone)]
enum Reply {
    Json(Value),
    Failure(StatusCode, String),
}

#[derive(Clone)]
struct MockState {
    received: Arc<Mutex<Vec<RecordedForm>>>,
    reply: Arc<Mutex<Reply>>,
}

pub struct MockErp {
    pub base_url: String,
    state: MockState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

async fn receive_form(
    State(state): State<MockState>,
    Path(file): Path<String>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let endpoint = file.trim_end_matches(".php").to_string();
    state
        .received
        .lock()
        .unwrap()
        .push(RecordedForm { endpoint, fields });
    match state.reply.lock().unwrap().clone() {
        Reply::Json(body) => Json(body).into_response(),
        Reply::Failure(status, body) => (status, body).into_response(),
    }
}

#[allow(dead_code)]
impl MockErp {
    pub async fn spawn() -> Self {
        let state = MockState {
            received: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(Reply::Json(json!({
                "retorno": {"status_processamento": 3, "status": "OK"}
            })))),
        };

        let app = Router::new()
            .route("/api2/{file}", post(receive_form))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock ERP");
        let port = listener
            .local_addr()
            .expect("Failed to get mock ERP address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock ERP failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/api2", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Sets the JSON body returned to every following request.
    pub fn reply_with(&self, reply: Value) {
        *self.state.reply.lock().unwrap() = Reply::Json(reply);
    }

    /// Answers every following request with `status` and a plain-text body.
    pub fn fail_with(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).expect("Invalid mock status code");
        *self.state.reply.lock().unwrap() = Reply::Failure(status, body.to_string());
    }

    pub fn received(&self) -> Vec<RecordedForm> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn last_received(&self) -> RecordedForm {
        self.received()
            .pop()
            .expect("Mock ERP did not receive any request")
    }
}

impl Drop for MockErp {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
