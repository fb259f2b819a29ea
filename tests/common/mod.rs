//! In-process stand-in for the MyEldom REST and WebSocket endpoints.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Form, State,
    },
    http::{
        header::{CONNECTION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderName, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use myeldom_bridge::config::{Config, Credentials};
use serde_json::Value;
use tokio::{net::TcpListener, sync::broadcast, time::Instant};

pub const SESSION_COOKIE: &str = "session=abc123";

/// What the mock pushes to every connected telemetry socket.
#[derive(Debug, Clone)]
pub enum ServerFrame {
    Text(String),
    /// Drop the TCP connection without a close handshake.
    Drop,
}

#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub logins: Vec<HashMap<String, String>>,
    pub login_content_types: Vec<Option<String>>,
    /// `Connection` header of every login request.
    pub login_connections: Vec<Option<String>>,
    /// `(path, body)` of every control POST.
    pub commands: Vec<(String, Value)>,
    /// Cookie header of every WebSocket handshake.
    pub ws_cookies: Vec<Option<String>>,
    /// First text frame of every WebSocket session.
    pub subscriptions: Vec<String>,
}

#[derive(Clone)]
struct MockState {
    recorded: Arc<Mutex<Recorded>>,
    login_status: StatusCode,
    control_status: StatusCode,
    frames: broadcast::Sender<ServerFrame>,
}

pub struct MockEldom {
    pub base_url: String,
    pub ws_url: String,
    recorded: Arc<Mutex<Recorded>>,
    frames: broadcast::Sender<ServerFrame>,
}

impl MockEldom {
    pub async fn start() -> Self {
        Self::with_statuses(StatusCode::FOUND, StatusCode::OK).await
    }

    pub async fn with_statuses(login_status: StatusCode, control_status: StatusCode) -> Self {
        let (frames, _) = broadcast::channel(64);
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = MockState {
            recorded: recorded.clone(),
            login_status,
            control_status,
            frames: frames.clone(),
        };

        let app = Router::new()
            .route("/api/Account/Login", post(login))
            .route("/api/flatboiler/setTemperature", post(control))
            .route("/api/flatboiler/setState", post(control))
            .route("/ws", get(telemetry))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}/ws"),
            recorded,
            frames,
        }
    }

    pub fn config(&self, device_ids: &[&str]) -> Config {
        Config {
            credentials: Credentials {
                email: "owner@example.com".into(),
                password: "pa ss&word".into(),
            },
            device_ids: device_ids.iter().map(|s| s.to_string()).collect(),
            base_url: self.base_url.clone(),
            ws_url: self.ws_url.clone(),
            reconnect_delay_secs: 0,
            http_timeout_secs: 5,
            server_host: "127.0.0.1".into(),
            server_port: 0,
        }
    }

    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    pub fn send(&self, frame: ServerFrame) {
        let _ = self.frames.send(frame);
    }

    pub fn send_json(&self, value: Value) {
        self.send(ServerFrame::Text(value.to_string()));
    }

    pub async fn wait_for_subscriptions(&self, n: usize) {
        eventually(&format!("{n} telemetry subscription(s)"), || {
            self.recorded.lock().unwrap().subscriptions.len() >= n
        })
        .await;
    }
}

/// Poll `check` until it holds, failing the test after five seconds.
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn login(
    State(state): State<MockState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.logins.push(form);
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        recorded.login_content_types.push(header(CONTENT_TYPE));
        recorded.login_connections.push(header(CONNECTION));
    }

    if state.login_status.is_redirection() {
        (
            state.login_status,
            [
                (LOCATION, "/".to_owned()),
                (SET_COOKIE, format!("{SESSION_COOKIE}; Path=/")),
            ],
        )
            .into_response()
    } else {
        state.login_status.into_response()
    }
}

async fn control(State(state): State<MockState>, uri: Uri, Json(body): Json<Value>) -> StatusCode {
    state
        .recorded
        .lock()
        .unwrap()
        .commands
        .push((uri.path().to_owned(), body));
    state.control_status
}

async fn telemetry(
    State(state): State<MockState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let cookie = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state.recorded.lock().unwrap().ws_cookies.push(cookie);
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: MockState) {
    // Listen before recording the subscription so nothing sent after
    // `wait_for_subscriptions` can be missed.
    let mut frames = state.frames.subscribe();

    match socket.recv().await {
        Some(Ok(Message::Text(text))) => {
            state
                .recorded
                .lock()
                .unwrap()
                .subscriptions
                .push(text.as_str().to_owned());
        }
        _ => return,
    }

    while let Ok(frame) = frames.recv().await {
        match frame {
            ServerFrame::Text(text) => {
                if socket.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
            ServerFrame::Drop => return,
        }
    }
}
