//! Loopback HTTP stand-ins for the query collaborator, the count endpoint, and the object store.

mod error;

pub use error::{Error, Result};

use std::{
	collections::HashMap,
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{
	Json, Router,
	body::Bytes,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde_json::Value;
use tokio::{net::TcpListener, task::JoinHandle};
use uuid::Uuid;

pub const QUERY_PAGE_ROUTE: &str = "query_page";
pub const COUNT_ROUTE: &str = "count";
pub const COUNT_QUERY_ROUTE: &str = "count_query";

/// Canned object-store response.
#[derive(Clone, Debug)]
pub struct StubObject {
	pub status: u16,
	pub body: Vec<u8>,
	pub delay: Duration,
}
impl StubObject {
	pub fn json(value: &Value) -> Self {
		Self { status: 200, body: value.to_string().into_bytes(), delay: Duration::ZERO }
	}

	pub fn raw(body: &[u8]) -> Self {
		Self { status: 200, body: body.to_vec(), delay: Duration::ZERO }
	}

	pub fn status(status: u16) -> Self {
		Self { status, body: Vec::new(), delay: Duration::ZERO }
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;

		self
	}
}

#[derive(Default)]
struct StubData {
	objects: HashMap<String, StubObject>,
	object_hits: HashMap<String, usize>,
	page: Vec<Value>,
	records: HashMap<String, Value>,
	count: Option<u64>,
	query_error: Option<String>,
	bodies: HashMap<&'static str, Vec<Value>>,
}

#[derive(Clone, Default)]
struct StubState {
	data: Arc<Mutex<StubData>>,
}
impl StubState {
	fn with<T>(&self, f: impl FnOnce(&mut StubData) -> T) -> T {
		let mut data = self.data.lock().unwrap_or_else(|err| err.into_inner());

		f(&mut data)
	}
}

/// A running stub server; it shuts down when dropped.
pub struct StubServer {
	addr: SocketAddr,
	state: StubState,
	handle: JoinHandle<()>,
}
impl StubServer {
	pub async fn start() -> Result<Self> {
		let state = StubState::default();
		let app = Router::new()
			.route("/objects/{key}", get(object))
			.route("/v1/request/query-clickhouse", post(query_page))
			.route("/v1/request/count/query", post(count_query))
			.route("/v1/request/{request_id}", get(record))
			.route("/request/count", post(count))
			.with_state(state.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let handle = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, app).await {
				tracing::error!(error = %err, "Stub server stopped.");
			}
		});

		Ok(Self { addr, state, handle })
	}

	pub fn base_url(&self) -> String {
		format!("http://{}", self.addr)
	}

	/// Signed-looking link served by this stub for `key`.
	pub fn signed_url(&self, key: &str) -> String {
		format!("{}/objects/{key}?X-Amz-Signature=stub", self.base_url())
	}

	pub fn put_object(&self, key: &str, object: StubObject) {
		self.state.with(|data| data.objects.insert(key.to_string(), object));
	}

	pub fn object_hits(&self, key: &str) -> usize {
		self.state.with(|data| data.object_hits.get(key).copied().unwrap_or(0))
	}

	pub fn total_object_hits(&self) -> usize {
		self.state.with(|data| data.object_hits.values().sum())
	}

	pub fn set_page(&self, records: Vec<Value>) {
		self.state.with(|data| data.page = records);
	}

	/// Registers a record for `GET /v1/request/{request_id}`.
	pub fn put_record(&self, record: Value) -> Result<()> {
		let request_id = record
			.get("request_id")
			.and_then(Value::as_str)
			.ok_or_else(|| Error::Message("Stub record must carry a request_id.".to_string()))?
			.to_string();

		self.state.with(|data| data.records.insert(request_id, record));

		Ok(())
	}

	pub fn set_count(&self, count: Option<u64>) {
		self.state.with(|data| data.count = count);
	}

	/// Makes every query and count endpoint answer with an error envelope.
	pub fn fail_queries(&self, message: &str) {
		self.state.with(|data| data.query_error = Some(message.to_string()));
	}

	/// JSON bodies received on a route, oldest first.
	pub fn bodies(&self, route: &str) -> Vec<Value> {
		self.state.with(|data| data.bodies.get(route).cloned().unwrap_or_default())
	}
}
impl Drop for StubServer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

pub fn request_id() -> String {
	Uuid::new_v4().to_string()
}

async fn object(State(state): State<StubState>, Path(key): Path<String>) -> Response {
	let object = state.with(|data| {
		*data.object_hits.entry(key.clone()).or_insert(0) += 1;

		data.objects.get(&key).cloned()
	});
	let Some(object) = object else {
		return StatusCode::NOT_FOUND.into_response();
	};

	if !object.delay.is_zero() {
		tokio::time::sleep(object.delay).await;
	}

	let status = StatusCode::from_u16(object.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	(status, Bytes::from(object.body)).into_response()
}

async fn query_page(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
	let reply = state.with(|data| {
		data.bodies.entry(QUERY_PAGE_ROUTE).or_default().push(body);

		match &data.query_error {
			Some(message) => serde_json::json!({ "data": null, "error": message }),
			None => serde_json::json!({ "data": data.page, "error": null }),
		}
	});

	Json(reply)
}

async fn record(State(state): State<StubState>, Path(request_id): Path<String>) -> Json<Value> {
	let reply = state.with(|data| {
		if let Some(message) = &data.query_error {
			return serde_json::json!({ "data": null, "error": message });
		}

		match data.records.get(&request_id) {
			Some(record) => serde_json::json!({ "data": record, "error": null }),
			None => serde_json::json!({ "data": null, "error": "Request not found." }),
		}
	});

	Json(reply)
}

async fn count(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
	Json(count_reply(&state, COUNT_ROUTE, body))
}

async fn count_query(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
	Json(count_reply(&state, COUNT_QUERY_ROUTE, body))
}

fn count_reply(state: &StubState, route: &'static str, body: Value) -> Value {
	state.with(|data| {
		data.bodies.entry(route).or_default().push(body);

		match &data.query_error {
			Some(message) => serde_json::json!({ "data": null, "error": message }),
			None => serde_json::json!({ "data": data.count, "error": null }),
		}
	})
}
