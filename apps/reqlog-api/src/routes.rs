use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use reqlog_domain::RequestRecord;
use reqlog_service::{
	CacheStats, CountRequest, Error, PageRequest, PageResponse, RangeCountRequest,
};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CountResponse {
	pub count: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
	pub cleared: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::InvalidRequest { .. } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			Error::InvalidDateValue { path, .. } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_date_value", message, Some(vec![
					path,
				])),
			Error::MetadataFetch { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "metadata_fetch_failed", message, None),
			Error::Provider { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", message, None),
			Error::Cancelled =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "cancelled", message, None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(
				error_code = %self.error_code,
				message = %self.message,
				"Request failed."
			);
		}

		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/requests/query", post(query_page))
		.route("/v1/requests/count", post(count))
		.route("/v1/requests/count/range", post(count_in_range))
		.route("/v1/requests/{request_id}", get(get_request))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/cache", get(cache_stats))
		.route("/v1/admin/cache/clear", post(clear_cache))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn query_page(
	State(state): State<AppState>,
	Json(payload): Json<PageRequest>,
) -> Result<Json<PageResponse>, ApiError> {
	let response = state.service.query_page(payload).await?;

	Ok(Json(response))
}

async fn get_request(
	State(state): State<AppState>,
	Path(request_id): Path<String>,
) -> Result<Json<RequestRecord>, ApiError> {
	let record = state.service.get_request(&request_id).await?;

	Ok(Json(record))
}

async fn count(
	State(state): State<AppState>,
	Json(payload): Json<CountRequest>,
) -> Result<Json<CountResponse>, ApiError> {
	let count = state.service.count(payload).await?;

	Ok(Json(CountResponse { count }))
}

async fn count_in_range(
	State(state): State<AppState>,
	Json(payload): Json<RangeCountRequest>,
) -> Result<Json<CountResponse>, ApiError> {
	let count = state.service.count_in_range(payload).await?;

	Ok(Json(CountResponse { count }))
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
	Json(state.service.cache_stats())
}

async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
	let cleared = state.service.clear_cache();

	tracing::info!(cleared, "Payload cache cleared by admin.");

	Json(ClearCacheResponse { cleared })
}
