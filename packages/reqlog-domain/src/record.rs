use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::assets::{self, AssetTable};

/// One logged transaction as returned by the query collaborator.
///
/// Only the fields this layer reads are typed; everything else rides along in `extra` so a record
/// that is never enriched serializes back exactly as it arrived. A typed slot that arrived as an
/// explicit `null` is remembered and written back as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordWire", into = "RecordWire")]
pub struct RequestRecord {
	pub request_id: String,
	pub signed_body_url: Option<String>,
	pub asset_urls: Option<AssetTable>,
	pub request_body: Option<Value>,
	pub response_body: Option<Value>,
	pub extra: Map<String, Value>,
	nulls: NullSlots,
}
impl RequestRecord {
	pub fn new(request_id: impl Into<String>) -> Self {
		Self {
			request_id: request_id.into(),
			signed_body_url: None,
			asset_urls: None,
			request_body: None,
			response_body: None,
			extra: Map::new(),
			nulls: NullSlots::default(),
		}
	}

	pub fn has_payload(&self) -> bool {
		self.request_body.is_some() || self.response_body.is_some()
	}

	/// Copy of this record with both payload slots filled from `payload`.
	pub fn with_payload(mut self, payload: &ResolvedPayload) -> Self {
		self.request_body = Some(payload.request.clone());
		self.response_body = Some(payload.response.clone());

		self
	}
}
impl From<RecordWire> for RequestRecord {
	fn from(wire: RecordWire) -> Self {
		let nulls = NullSlots {
			signed_body_url: matches!(wire.signed_body_url, Some(None)),
			asset_urls: matches!(wire.asset_urls, Some(None)),
			request_body: matches!(wire.request_body, Some(None)),
			response_body: matches!(wire.response_body, Some(None)),
		};

		Self {
			request_id: wire.request_id,
			signed_body_url: wire.signed_body_url.flatten(),
			asset_urls: wire.asset_urls.flatten(),
			request_body: wire.request_body.flatten(),
			response_body: wire.response_body.flatten(),
			extra: wire.extra,
			nulls,
		}
	}
}

/// Typed slots that arrived as an explicit `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct NullSlots {
	signed_body_url: bool,
	asset_urls: bool,
	request_body: bool,
	response_body: bool,
}

/// Wire shape of [`RequestRecord`]: the outer `Option` is key presence, the inner one is `null`.
#[derive(Serialize, Deserialize)]
struct RecordWire {
	request_id: String,
	#[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
	signed_body_url: Option<Option<String>>,
	#[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
	asset_urls: Option<Option<AssetTable>>,
	#[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
	request_body: Option<Option<Value>>,
	#[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
	response_body: Option<Option<Value>>,
	#[serde(flatten)]
	extra: Map<String, Value>,
}
impl From<RequestRecord> for RecordWire {
	fn from(record: RequestRecord) -> Self {
		let nulls = record.nulls;

		Self {
			request_id: record.request_id,
			signed_body_url: slot(record.signed_body_url, nulls.signed_body_url),
			asset_urls: slot(record.asset_urls, nulls.asset_urls),
			request_body: slot(record.request_body, nulls.request_body),
			response_body: slot(record.response_body, nulls.response_body),
			extra: record.extra,
		}
	}
}

fn slot<T>(value: Option<T>, was_null: bool) -> Option<Option<T>> {
	match value {
		Some(value) => Some(Some(value)),
		None if was_null => Some(None),
		None => None,
	}
}

// Only called when the key is present, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}

/// The request/response content pair stored behind a record's signed link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPayload {
	#[serde(default)]
	pub request: Value,
	#[serde(default)]
	pub response: Value,
}
impl ResolvedPayload {
	/// Decodes the raw object-store body.
	pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
		serde_json::from_slice(bytes)
	}

	/// Resolves asset placeholders on both sides.
	pub fn with_assets(self, table: Option<&AssetTable>) -> Self {
		if table.map(AssetTable::is_empty).unwrap_or(true) {
			return self;
		}

		Self {
			request: assets::substitute(&self.request, table),
			response: assets::substitute(&self.response, table),
		}
	}
}
