//! Bodies exchanged with the query collaborator and the count endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::FilterNode;

pub const REQUEST_TABLE: &str = "request_response_rmt";
pub const CREATED_AT_COLUMN: &str = "request_created_at";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryPageBody {
	pub filter: FilterNode,
	pub offset: u64,
	pub limit: u32,
	/// Sort leaf; its grammar belongs to the store.
	pub sort: Value,
	#[serde(rename = "isCached")]
	pub is_cached: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountBody {
	pub filter: FilterNode,
	#[serde(rename = "isCached")]
	pub is_cached: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountQueryBody {
	pub filter: FilterNode,
}

/// `{data, error}` result envelope used by every collaborator endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
	#[serde(default)]
	pub data: Option<T>,
	#[serde(default)]
	pub error: Option<String>,
}
impl<T> Envelope<T> {
	pub fn ok(data: T) -> Self {
		Self { data: Some(data), error: None }
	}

	pub fn err(message: impl Into<String>) -> Self {
		Self { data: None, error: Some(message.into()) }
	}

	/// An `error` wins over `data`; a missing `data` is reported as `Ok(None)`.
	pub fn into_result(self) -> Result<Option<T>, String> {
		match self.error {
			Some(message) => Err(message),
			None => Ok(self.data),
		}
	}
}

/// `and` tree bounding `request_created_at` on both sides.
pub fn created_at_range(start: &str, end: &str) -> FilterNode {
	FilterNode::and(
		FilterNode::leaf(REQUEST_TABLE, CREATED_AT_COLUMN, "gte", Value::String(start.to_string())),
		FilterNode::leaf(REQUEST_TABLE, CREATED_AT_COLUMN, "lte", Value::String(end.to_string())),
	)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn page_body_uses_camel_case_cache_flag() {
		let body = QueryPageBody {
			filter: FilterNode::all(),
			offset: 50,
			limit: 25,
			sort: json!({ "created_at": "desc" }),
			is_cached: true,
		};

		assert_eq!(
			serde_json::to_value(&body).expect("serialize failed"),
			json!({
				"filter": "all",
				"offset": 50,
				"limit": 25,
				"sort": { "created_at": "desc" },
				"isCached": true,
			})
		);
	}

	#[test]
	fn envelope_error_wins() {
		let envelope: Envelope<u64> =
			serde_json::from_value(json!({ "data": 3, "error": "boom" })).expect("parse failed");

		assert_eq!(envelope.into_result(), Err("boom".to_string()));

		let envelope: Envelope<u64> =
			serde_json::from_value(json!({ "data": null, "error": null })).expect("parse failed");

		assert_eq!(envelope.into_result(), Ok(None));
	}

	#[test]
	fn range_filter_shape() {
		let filter = created_at_range("2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z");

		assert_eq!(
			serde_json::to_value(&filter).expect("serialize failed"),
			json!({
				"left": { "request_response_rmt": { "request_created_at": { "gte": "2024-01-01T00:00:00Z" } } },
				"operator": "and",
				"right": { "request_response_rmt": { "request_created_at": { "lte": "2024-01-31T23:59:59Z" } } },
			})
		);
	}
}
