use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub query: Query,
	pub object_store: ObjectStore,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub paging: Paging,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Connection settings for the analytics query collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct Query {
	pub api_base: String,
	/// Optional. Sent as a bearer token when present.
	pub api_key: Option<String>,
	/// Optional. Base URL serving `/request/count`; falls back to `api_base`.
	pub count_api_base: Option<String>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl Query {
	pub fn count_base(&self) -> &str {
		self.count_api_base.as_deref().unwrap_or(&self.api_base)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStore {
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	/// Entry count above which the payload cache is cleared in full.
	#[serde(default = "default_cache_max_entries")]
	pub max_entries: usize,
}
impl Default for Cache {
	fn default() -> Self {
		Self { max_entries: default_cache_max_entries() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
	#[serde(default = "default_max_page_size")]
	pub max_page_size: u32,
}
impl Default for Paging {
	fn default() -> Self {
		Self { max_page_size: default_max_page_size() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_cache_max_entries() -> usize {
	10_000
}

fn default_max_page_size() -> u32 {
	1_000
}
