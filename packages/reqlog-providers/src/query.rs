//! Client for the analytics query collaborator and the count endpoint.

use reqwest::Client;

use reqlog_config::Query;
use reqlog_domain::{
	RequestRecord,
	query::{CountBody, CountQueryBody, QueryPageBody},
};

use crate::{Error, Result};

pub const QUERY_PAGE_PATH: &str = "/v1/request/query-clickhouse";
pub const RECORD_PATH: &str = "/v1/request";
pub const COUNT_QUERY_PATH: &str = "/v1/request/count/query";
pub const COUNT_PATH: &str = "/request/count";

/// Fetches one ordered page of record metadata.
pub async fn query_page(
	client: &Client,
	cfg: &Query,
	body: &QueryPageBody,
) -> Result<Vec<RequestRecord>> {
	let res = client
		.post(format!("{}{QUERY_PAGE_PATH}", cfg.api_base))
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(body)
		.send()
		.await?;

	Ok(crate::read_envelope(res).await?.unwrap_or_default())
}

/// Fetches metadata for a single record.
pub async fn fetch_record(client: &Client, cfg: &Query, request_id: &str) -> Result<RequestRecord> {
	let mut url = reqwest::Url::parse(&format!("{}{RECORD_PATH}", cfg.api_base)).map_err(|err| {
		Error::InvalidConfig { message: format!("query.api_base is not a valid URL: {err}") }
	})?;

	url.path_segments_mut()
		.map_err(|()| Error::InvalidConfig {
			message: "query.api_base cannot carry a path.".to_string(),
		})?
		.push(request_id);

	let res = client
		.get(url)
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.send()
		.await?;

	crate::read_envelope(res).await?.ok_or_else(|| Error::InvalidResponse {
		message: format!("Record {request_id} response is missing data."),
	})
}

/// `POST /request/count` with an already-normalized filter.
pub async fn count(client: &Client, cfg: &Query, body: &CountBody) -> Result<Option<u64>> {
	let res = client
		.post(format!("{}{COUNT_PATH}", cfg.count_base()))
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(body)
		.send()
		.await?;

	crate::read_envelope(res).await
}

/// Count through the collaborator's own count query endpoint.
pub async fn count_query(
	client: &Client,
	cfg: &Query,
	body: &CountQueryBody,
) -> Result<Option<u64>> {
	let res = client
		.post(format!("{}{COUNT_QUERY_PATH}", cfg.api_base))
		.headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
		.json(body)
		.send()
		.await?;

	crate::read_envelope(res).await
}
