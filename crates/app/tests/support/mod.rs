//! In-process fake of the booking and posts services.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use apiprobe_application::{ExecuteRequest, RetryPolicy, RunSuite};
use apiprobe_domain::SuiteSettings;
use apiprobe_infrastructure::{ReqwestHttpClient, SystemClock, TestRunner};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const VALID_AUTHORIZATION: &str = "Basic YWRtaW46cGFzc3dvcmQxMjM=";
pub const SEEDED_BOOKING_ID: u64 = 10;

const REQUIRED_FIELDS: [&str; 5] = ["firstname", "lastname", "totalprice", "depositpaid", "bookingdates"];

/// Behaviour switches for the fake.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeOptions {
    /// Answer creation without a `bookingid`.
    pub omit_booking_id: bool,
    /// From the third read of a booking on, report different `additionalneeds`.
    pub unstable_reads: bool,
    /// Store updates with `additionalneeds` reformatted, echoing the sent record.
    pub rewrite_updates: bool,
}

#[derive(Debug)]
struct FakeState {
    options: FakeOptions,
    bookings: Mutex<HashMap<u64, Value>>,
    next_id: AtomicU64,
    reads: Mutex<HashMap<u64, u32>>,
    requests: Mutex<Vec<String>>,
}

impl FakeState {
    fn record(&self, line: String) {
        self.requests.lock().unwrap().push(line);
    }
}

pub struct FakeServices {
    pub base_url: String,
    state: Arc<FakeState>,
    handle: JoinHandle<()>,
}

impl FakeServices {
    pub async fn start() -> Self {
        Self::start_with(FakeOptions::default()).await
    }

    pub async fn start_with(options: FakeOptions) -> Self {
        let mut bookings = HashMap::new();
        bookings.insert(
            SEEDED_BOOKING_ID,
            json!({
                "firstname": "Sally",
                "lastname": "Brown",
                "totalprice": 111,
                "depositpaid": true,
                "bookingdates": { "checkin": "2013-02-23", "checkout": "2014-10-23" },
                "additionalneeds": "Breakfast"
            }),
        );
        let state = Arc::new(FakeState {
            options,
            bookings: Mutex::new(bookings),
            next_id: AtomicU64::new(100),
            reads: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/booking", axum::routing::post(create_booking))
            .route("/booking/{id}", get(read_booking).put(update_booking))
            .route("/posts", get(list_posts))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Settings pointing both services at this fake.
    pub fn settings(&self) -> SuiteSettings {
        let mut settings = SuiteSettings {
            booking_base_url: self.base_url.clone(),
            posts_base_url: self.base_url.clone(),
            timeout_ms: 5_000,
            ..Default::default()
        };
        settings.retry.backoff_ms = 1;
        settings
    }

    /// Requests received so far, as "METHOD /path".
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn booking(&self, id: u64) -> Option<Value> {
        self.state.bookings.lock().unwrap().get(&id).cloned()
    }
}

impl Drop for FakeServices {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Builds the suite runner the binary uses.
pub fn runner(settings: &SuiteSettings) -> RunSuite<ReqwestHttpClient, TestRunner> {
    let client = Arc::new(ReqwestHttpClient::new(Duration::from_millis(settings.timeout_ms)).unwrap());
    let executor = ExecuteRequest::new(client).with_retry(RetryPolicy::from(&settings.retry));
    RunSuite::new(executor, Arc::new(TestRunner::new()), Arc::new(SystemClock::new()))
}

/// A port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (status, body).into_response()
}

fn json_utf8(status: StatusCode, body: &Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body.to_string(),
    )
        .into_response()
}

fn is_complete(record: &Value) -> bool {
    REQUIRED_FIELDS.iter().all(|field| record.get(field).is_some())
}

async fn create_booking(State(state): State<Arc<FakeState>>, body: String) -> Response {
    state.record("POST /booking".to_string());
    let Ok(record) = serde_json::from_str::<Value>(&body) else {
        return text(StatusCode::BAD_REQUEST, "Bad Request");
    };
    if !is_complete(&record) {
        return text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    state.bookings.lock().unwrap().insert(id, record.clone());

    if state.options.omit_booking_id {
        json_utf8(StatusCode::OK, &json!({ "booking": record }))
    } else {
        json_utf8(StatusCode::OK, &json!({ "bookingid": id, "booking": record }))
    }
}

async fn read_booking(State(state): State<Arc<FakeState>>, Path(id): Path<u64>) -> Response {
    state.record(format!("GET /booking/{id}"));
    let reads = {
        let mut reads = state.reads.lock().unwrap();
        let count = reads.entry(id).or_insert(0);
        *count += 1;
        *count
    };
    let Some(mut record) = state.bookings.lock().unwrap().get(&id).cloned() else {
        return text(StatusCode::NOT_FOUND, "Not Found");
    };
    if state.options.unstable_reads && reads >= 3 {
        record["additionalneeds"] = json!("Late checkout");
    }
    json_utf8(StatusCode::OK, &record)
}

async fn update_booking(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.record(format!("PUT /booking/{id}"));
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(VALID_AUTHORIZATION);
    if !authorized {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    }

    let record = match serde_json::from_str::<Value>(&body) {
        Ok(record) if is_complete(&record) => record,
        _ => return text(StatusCode::BAD_REQUEST, "Bad Request"),
    };

    let mut bookings = state.bookings.lock().unwrap();
    match bookings.get_mut(&id) {
        Some(stored) => {
            *stored = record.clone();
            if state.options.rewrite_updates {
                let needs = record["additionalneeds"].as_str().unwrap_or_default();
                stored["additionalneeds"] = json!(needs.replace(',', ", "));
            }
            json_utf8(StatusCode::OK, &record)
        }
        None => text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    }
}

async fn list_posts(State(state): State<Arc<FakeState>>) -> Response {
    state.record("GET /posts".to_string());
    let posts: Vec<Value> = (1..=3)
        .map(|id| {
            json!({
                "userId": 1,
                "id": id,
                "title": format!("post {id}"),
                "body": "lorem ipsum"
            })
        })
        .collect();
    json_utf8(StatusCode::OK, &Value::Array(posts))
}
