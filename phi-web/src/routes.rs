//! HTTP routes and the WebSocket decision-trace stream.
//!
//! | Route               | Method | Body / result                              |
//! |---------------------|--------|--------------------------------------------|
//! | `/deidentify`       | POST   | `{text}` → masked text and entity report   |
//! | `/deidentify/batch` | POST   | `{texts}` → one result per text            |
//! | `/labels`           | GET    | label → tag vocabulary                     |
//! | `/coverage`         | GET    | HIPAA Safe Harbor coverage                 |
//! | `/ws`               | GET    | streams `PipelineEvent`s per text message  |
//!
//! A failed request answers with `masked_text = "[PROCESSING FAILED]"` and
//! the error kind only. Request text never appears in responses or logs.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use phi_core::aggregate::RecognizerFailure;
use phi_core::label::tag_vocabulary;
use phi_core::offset::char_range;
use phi_core::{DeidError, Deidentified, Deidentifier, EntityLabel, PipelineEvent};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const PROCESSING_FAILED: &str = "[PROCESSING FAILED]";

/// Shared application state
pub struct AppState {
    pipeline: Deidentifier,
    timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: Deidentifier, timeout: Duration) -> Self {
        Self { pipeline, timeout }
    }
}

#[derive(Deserialize)]
struct DeidentifyRequest {
    text: String,
}

#[derive(Deserialize)]
struct BatchRequest {
    texts: Vec<String>,
}

/// Entity as reported to HTTP clients, with byte and char offsets.
#[derive(Debug, Serialize, Deserialize)]
struct EntityView {
    label: EntityLabel,
    tag: String,
    start: usize,
    end: usize,
    char_start: usize,
    char_end: usize,
    score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DeidentifyResponse {
    masked_text: String,
    entities: Vec<EntityView>,
    failures: Vec<RecognizerFailure>,
    processing_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DeidentifyResponse {
    fn from_result(text: &str, result: Deidentified) -> Self {
        let entities = result
            .entities
            .iter()
            .map(|e| {
                let chars = char_range(text, e.range());
                EntityView {
                    label: e.label,
                    tag: e.label.mask_tag().to_string(),
                    start: e.start,
                    end: e.end,
                    char_start: chars.start,
                    char_end: chars.end,
                    score: e.score,
                }
            })
            .collect();
        Self {
            masked_text: result.masked_text,
            entities,
            failures: result.failures,
            processing_ms: result.processing_ms,
            error: None,
        }
    }

    fn failed(kind: &str) -> Self {
        Self {
            masked_text: PROCESSING_FAILED.to_string(),
            entities: vec![],
            failures: vec![],
            processing_ms: 0,
            error: Some(kind.to_string()),
        }
    }
}

fn outcome(
    text: &str,
    result: Result<Deidentified, DeidError>,
) -> (StatusCode, DeidentifyResponse) {
    match result {
        Ok(result) => (StatusCode::OK, DeidentifyResponse::from_result(text, result)),
        Err(err) => {
            warn!(kind = err.kind(), "deidentification failed");
            let status = match &err {
                DeidError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, DeidentifyResponse::failed(err.kind()))
        }
    }
}

fn failure_response(status: StatusCode, kind: &str) -> Response {
    (status, Json(DeidentifyResponse::failed(kind))).into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/deidentify", post(deidentify_handler))
        .route("/deidentify/batch", post(batch_handler))
        .route("/labels", get(labels_handler))
        .route("/coverage", get(coverage_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Single text, synchronous result
async fn deidentify_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeidentifyRequest>,
) -> Response {
    let worker = Arc::clone(&state);
    let task = tokio::task::spawn_blocking(move || {
        let result = worker.pipeline.deidentify(&req.text);
        outcome(&req.text, result)
    });

    match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok((status, body))) => (status, Json(body)).into_response(),
        Ok(Err(_)) => {
            warn!("deidentification task panicked");
            failure_response(StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
        Err(_) => {
            warn!(
                timeout_ms = state.timeout.as_millis() as u64,
                "deidentification timed out"
            );
            failure_response(StatusCode::GATEWAY_TIMEOUT, "timeout")
        }
    }
}

/// Many texts, processed in parallel; one entry per text in request order
async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Response {
    let worker = Arc::clone(&state);
    let task = tokio::task::spawn_blocking(move || {
        let results = worker.pipeline.deidentify_batch(&req.texts);
        req.texts
            .iter()
            .zip(results)
            .map(|(text, result)| outcome(text, result).1)
            .collect::<Vec<_>>()
    });

    match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok(body)) => Json(body).into_response(),
        Ok(Err(_)) => failure_response(StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        Err(_) => failure_response(StatusCode::GATEWAY_TIMEOUT, "timeout"),
    }
}

async fn labels_handler() -> impl IntoResponse {
    Json(tag_vocabulary())
}

async fn coverage_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.pipeline.coverage())
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Each text message is de-identified and its decision trace streamed back,
/// one JSON event per message, ending with `Done` or `Error`.
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("websocket connected");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(raw) => {
                // JSON {text} or the bare text
                let text = match serde_json::from_str::<DeidentifyRequest>(&raw) {
                    Ok(req) => req.text,
                    Err(_) => raw.to_string(),
                };
                info!(bytes = text.len(), "deidentifying via websocket");
                if stream_trace(&mut socket, &state, text).await.is_err() {
                    return;
                }
            }
            Message::Close(_) => {
                info!("websocket disconnected");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}

/// Runs the pipeline on the blocking pool and forwards each event as soon as
/// it is emitted. The request timeout bounds the whole trace; a failure ends
/// it with an `Error` event carrying only the kind.
async fn stream_trace(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    text: String,
) -> Result<(), axum::Error> {
    let (tx, rx) = std::sync::mpsc::channel::<PipelineEvent>();
    let (forward, mut events) = tokio::sync::mpsc::unbounded_channel();

    let worker = Arc::clone(state);
    tokio::task::spawn_blocking(move || worker.pipeline.deidentify_streaming(&text, tx));
    // ends once the pipeline drops its sender or the socket side goes away
    tokio::task::spawn_blocking(move || {
        for event in rx {
            if forward.send(event).is_err() {
                break;
            }
        }
    });

    let deadline = tokio::time::Instant::now() + state.timeout;
    loop {
        let event = match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                warn!("deidentification task panicked");
                return send_event(socket, &failure_event("internal")).await;
            }
            Err(_) => {
                warn!(
                    timeout_ms = state.timeout.as_millis() as u64,
                    "deidentification timed out"
                );
                return send_event(socket, &failure_event("timeout")).await;
            }
        };
        match event {
            PipelineEvent::Error { kind, .. } => {
                warn!(kind = kind.as_str(), "deidentification failed");
                return send_event(socket, &failure_event(&kind)).await;
            }
            PipelineEvent::Done { .. } => return send_event(socket, &event).await,
            _ => send_event(socket, &event).await?,
        }
    }
}

fn failure_event(kind: &str) -> PipelineEvent {
    PipelineEvent::Error {
        kind: kind.to_string(),
        message: PROCESSING_FAILED.to_string(),
    }
}

async fn send_event(socket: &mut WebSocket, event: &PipelineEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use futures::{SinkExt, StreamExt};
    use phi_core::model::FailingModel;
    use phi_core::{DeidConfig, EntityModel, NativeEntity, RecognizerError};
    use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
    use tower::ServiceExt;

    const SENTENCE: &str = "Patient John Doe's MRN is MRN-98453 and SSN is 123-45-6789.";

    fn app_with(pipeline: Deidentifier) -> Router {
        router(Arc::new(AppState::new(pipeline, Duration::from_secs(10))))
    }

    fn app() -> Router {
        app_with(Deidentifier::new(DeidConfig::default()).unwrap())
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn deidentify_request(text: &str) -> Request<Body> {
        post_json("/deidentify", serde_json::json!({ "text": text }))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    /// Entity model that outlives any short request timeout.
    struct SlowModel;

    impl EntityModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        fn detect(&self, _text: &str) -> Result<Vec<NativeEntity>, RecognizerError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(vec![])
        }
    }

    fn slow_app() -> Router {
        let pipeline = Deidentifier::new(DeidConfig::default())
            .unwrap()
            .with_model(Arc::new(SlowModel));
        router(Arc::new(AppState::new(pipeline, Duration::from_millis(50))))
    }

    /// Serves `app` on a local port and returns the trace for one message.
    async fn ws_trace(app: Router, message: &str) -> Vec<serde_json::Value> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        ws.send(WsMessage::Text(message.to_string())).await.unwrap();

        let mut events = Vec::new();
        while let Some(msg) = ws.next().await {
            let WsMessage::Text(json) = msg.unwrap() else {
                continue;
            };
            let event: serde_json::Value = serde_json::from_str(&json).unwrap();
            let last = matches!(event["type"].as_str(), Some("Done" | "Error"));
            events.push(event);
            if last {
                break;
            }
        }
        events
    }

    #[tokio::test]
    async fn test_deidentify_endpoint() {
        let (status, body) = call(app(), deidentify_request(SENTENCE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["masked_text"], "Patient <PERSON>'s MRN is <MRN> and SSN is <SSN>.");
        assert_eq!(body["entities"][0]["tag"], "<PERSON>");
        assert_eq!(body["entities"][0]["label"], "PERSON");
        assert_eq!(body["entities"][1]["start"], 26);
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_char_offsets_for_multibyte_text() {
        let (_, body) = call(app(), deidentify_request("Zoë 12345")).await;
        let zip = &body["entities"][0];
        assert_eq!(zip["label"], "US_ZIP");
        assert_eq!((zip["start"].as_u64(), zip["end"].as_u64()), (Some(5), Some(10)));
        assert_eq!((zip["char_start"].as_u64(), zip["char_end"].as_u64()), (Some(4), Some(9)));
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        let (status, body) = call(app(), deidentify_request("")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["masked_text"], PROCESSING_FAILED);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_model_failure_does_not_leak_text() {
        let pipeline = Deidentifier::new(DeidConfig::default())
            .unwrap()
            .with_model(Arc::new(FailingModel::new("ner", RecognizerError::Timeout)));
        let (status, body) = call(app_with(pipeline), deidentify_request(SENTENCE)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["masked_text"], PROCESSING_FAILED);
        assert_eq!(body["error"], "external_recognizer");
        assert!(!body.to_string().contains("John"));
    }

    #[tokio::test]
    async fn test_batch_endpoint() {
        let (status, body) = call(
            app(),
            post_json("/deidentify/batch", serde_json::json!({ "texts": ["SSN 123-45-6789", ""] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["masked_text"], "SSN <SSN>");
        assert_eq!(body[1]["masked_text"], PROCESSING_FAILED);
        assert_eq!(body[1]["error"], "invalid_input");
    }

    #[tokio::test]
    async fn test_labels_and_coverage() {
        let (_, labels) = call(app(), get_request("/labels")).await;
        assert_eq!(labels.as_array().unwrap().len(), EntityLabel::COUNT);

        let (_, coverage) = call(app(), get_request("/coverage")).await;
        assert_eq!(coverage.as_array().unwrap().len(), 18);
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (status, body) = call(slow_app(), deidentify_request(SENTENCE)).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["masked_text"], PROCESSING_FAILED);
        assert_eq!(body["error"], "timeout");
    }

    #[tokio::test]
    async fn test_websocket_streams_trace() {
        let events = ws_trace(app(), &serde_json::json!({ "text": SENTENCE }).to_string()).await;
        assert_eq!(events[0]["type"], "CandidatesCollected");
        let accepted = events.iter().filter(|e| e["type"] == "SpanAccepted").count();
        assert_eq!(accepted, 3);

        let done = events.last().unwrap();
        assert_eq!(done["type"], "Done");
        assert_eq!(
            done["data"]["result"]["masked_text"],
            "Patient <PERSON>'s MRN is <MRN> and SSN is <SSN>."
        );
    }

    #[tokio::test]
    async fn test_websocket_failures_expose_kind_only() {
        let events = ws_trace(app(), "").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "Error");
        assert_eq!(events[0]["data"]["kind"], "invalid_input");
        assert_eq!(events[0]["data"]["message"], PROCESSING_FAILED);

        let events = ws_trace(slow_app(), SENTENCE).await;
        let last = events.last().unwrap();
        assert_eq!(last["type"], "Error");
        assert_eq!(last["data"]["kind"], "timeout");
        assert!(!serde_json::to_string(&events).unwrap().contains("John"));
    }
}
