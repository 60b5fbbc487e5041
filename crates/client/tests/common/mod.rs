//! Fake seating server for HTTP integration tests.
//!
//! Serves the three `/seating/api/*` endpoints on a loopback port and
//! records what the client sent so tests can assert on headers, query
//! strings and form bodies.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;

/// One request as seen by the fake server.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub path: String,
    pub event_id: i64,
    pub revision: Option<i64>,
    pub csrf: Option<String>,
    pub cookie: Option<String>,
    /// The `json` form field of a submit.
    pub submitted: Option<String>,
}

/// How the fake server answers.
#[derive(Debug, Clone, Copy, Default)]
pub enum Behaviour {
    /// Normal answers; submit returns an empty body.
    #[default]
    Ok,
    /// Submit returns a freshly published revision.
    Publish,
    /// Every endpoint answers 500.
    Fail,
    /// Every endpoint answers 200 with a body that is not JSON.
    Garbage,
}

#[derive(Clone)]
struct FakeState {
    behaviour: Behaviour,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct FakeServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[derive(Deserialize)]
struct SeatsQuery {
    revision: Option<i64>,
}

#[derive(Deserialize)]
struct SubmitForm {
    json: String,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn record(state: &FakeState, path: &str, event_id: i64, headers: &HeaderMap) -> usize {
    let mut requests = state.requests.lock().unwrap();
    requests.push(Recorded {
        path: path.to_string(),
        event_id,
        csrf: header(headers, "x-csrftoken"),
        cookie: header(headers, "cookie"),
        ..Recorded::default()
    });
    requests.len() - 1
}

fn failure(behaviour: Behaviour) -> Option<(StatusCode, String)> {
    match behaviour {
        Behaviour::Fail => Some((StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string())),
        Behaviour::Garbage => Some((StatusCode::OK, "<html>not json</html>".to_string())),
        _ => None,
    }
}

async fn seats(
    State(state): State<FakeState>,
    Path(event_id): Path<i64>,
    Query(query): Query<SeatsQuery>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let index = record(&state, "seats", event_id, &headers);
    state.requests.lock().unwrap()[index].revision = query.revision;
    if let Some(fail) = failure(state.behaviour) {
        return fail;
    }

    let body = json!({
        "seated": [
            {"seat_id": 1, "user_id": 100, "nickname": "ada", "avatar": "https://a/100.png"},
            {"seat_id": 2, "user_id": 200, "nickname": "bob", "avatar": "https://a/200.png"}
        ],
        "unseated": [
            {"user_id": 300, "nickname": "cy", "avatar": "https://a/300.png"}
        ]
    });
    (StatusCode::OK, body.to_string())
}

async fn revisions(
    State(state): State<FakeState>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    record(&state, "revisions", event_id, &headers);
    if let Some(fail) = failure(state.behaviour) {
        return fail;
    }

    let body = json!({
        "revisions": [
            {"number": 1, "name": "Draft"},
            {"number": 3, "name": "Final"},
            {"number": 2, "name": "Second"}
        ]
    });
    (StatusCode::OK, body.to_string())
}

async fn submit(
    State(state): State<FakeState>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Form(form): Form<SubmitForm>,
) -> (StatusCode, String) {
    let index = record(&state, "submit", event_id, &headers);
    state.requests.lock().unwrap()[index].submitted = Some(form.json);

    match state.behaviour {
        Behaviour::Publish => (
            StatusCode::OK,
            json!({"revision": {"number": 4, "name": "Published"}}).to_string(),
        ),
        Behaviour::Ok => (StatusCode::OK, String::new()),
        other => failure(other).unwrap_or((StatusCode::OK, String::new())),
    }
}

/// Start a fake server on an ephemeral loopback port.
pub async fn spawn_fake_server(behaviour: Behaviour) -> FakeServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = FakeState {
        behaviour,
        requests: Arc::clone(&requests),
    };

    let app = Router::new()
        .route("/seating/api/seats/{event_id}", get(seats))
        .route("/seating/api/revisions/{event_id}", get(revisions))
        .route("/seating/api/submit/{event_id}", post(submit))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake server");
    });

    FakeServer { addr, requests }
}
