pub mod object_store;
pub mod query;

mod error;

pub use error::{Error, Result};

use std::time::Duration as StdDuration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use reqlog_domain::query::Envelope;

pub fn auth_headers(
	api_key: Option<&str>,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Pooled client; clone it freely, clones share connections.
pub fn build_client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(StdDuration::from_millis(timeout_ms)).build()?)
}

/// Reads a `{data, error}` envelope, failing on HTTP errors and on `error`.
pub(crate) async fn read_envelope<T>(res: reqwest::Response) -> Result<Option<T>>
where
	T: DeserializeOwned,
{
	let envelope: Envelope<T> = res.error_for_status()?.json().await?;

	envelope.into_result().map_err(|message| Error::Remote { message })
}

#[cfg(test)]
mod tests {
	use reqwest::header::AUTHORIZATION;
	use serde_json::{Map, Value};

	use super::*;

	#[test]
	fn omits_authorization_without_key() {
		let headers = auth_headers(None, &Map::new()).expect("Failed to build headers.");

		assert!(headers.get(AUTHORIZATION).is_none());
	}

	#[test]
	fn rejects_non_string_default_headers() {
		let mut defaults = Map::new();

		defaults.insert("x-retries".to_string(), Value::from(3));

		assert!(matches!(auth_headers(None, &defaults), Err(Error::InvalidConfig { .. })));
	}
}
