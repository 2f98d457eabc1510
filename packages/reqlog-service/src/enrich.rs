//! Lazy payload resolution for a single record.
//!
//! Nothing here returns an error. A record that comes back without payload slots means the
//! payload was unavailable, and the reason has already been logged.

use std::sync::Arc;

use reqlog_domain::{RequestRecord, ResolvedPayload};

use crate::{ObjectStore, PayloadCache};

/// Fills the record's payload slots from the cache or, on a miss, from its signed link.
pub async fn enrich_record(
	cache: &PayloadCache,
	objects: &dyn ObjectStore,
	record: RequestRecord,
) -> RequestRecord {
	if let Some(payload) = cache.get(&record.request_id) {
		tracing::debug!(request_id = %record.request_id, "Payload cache hit.");

		return record.with_payload(&payload);
	}

	let Some(signed_url) = record.signed_body_url.as_deref() else {
		return record;
	};
	let res = match objects.fetch(signed_url).await {
		Ok(res) => res,
		Err(err) => {
			tracing::warn!(
				error = %err,
				request_id = %record.request_id,
				"Payload fetch failed."
			);

			return record;
		},
	};

	if !res.is_success() {
		tracing::warn!(
			status = res.status.as_u16(),
			request_id = %record.request_id,
			"Payload fetch returned a non-success status."
		);

		return record;
	}

	let payload = match ResolvedPayload::from_slice(&res.body) {
		Ok(payload) => payload,
		Err(err) => {
			tracing::warn!(
				error = %err,
				request_id = %record.request_id,
				"Payload body could not be parsed."
			);

			return record;
		},
	};
	let payload = Arc::new(payload.with_assets(record.asset_urls.as_ref()));

	cache.put(&record.request_id, payload.clone());

	record.with_payload(&payload)
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use serde_json::json;

	use reqlog_providers::object_store::ObjectResponse;

	use super::*;
	use crate::BoxFuture;

	struct FixedStore {
		response: fn() -> reqlog_providers::Result<ObjectResponse>,
		calls: AtomicUsize,
	}
	impl FixedStore {
		fn new(response: fn() -> reqlog_providers::Result<ObjectResponse>) -> Self {
			Self { response, calls: AtomicUsize::new(0) }
		}
	}

	impl ObjectStore for FixedStore {
		fn fetch<'a>(
			&'a self,
			_: &'a str,
		) -> BoxFuture<'a, reqlog_providers::Result<ObjectResponse>> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let response = (self.response)();

			Box::pin(async move { response })
		}
	}

	fn linked(id: &str) -> RequestRecord {
		let mut record = RequestRecord::new(id);

		record.signed_body_url = Some(format!("https://bucket/{id}"));

		record
	}

	#[tokio::test]
	async fn resolves_substitutes_and_caches() {
		let cache = PayloadCache::new(10);
		let store = FixedStore::new(|| {
			Ok(ObjectResponse::ok(
				json!({ "request": { "image": "<<img>>" }, "response": "done" }).to_string(),
			))
		});
		let mut record = linked("r-1");

		record.asset_urls = Some([("img".to_string(), "https://cdn/img".to_string())].into());

		let enriched = enrich_record(&cache, &store, record).await;

		assert_eq!(enriched.request_body, Some(json!({ "image": "https://cdn/img" })));
		assert_eq!(enriched.response_body, Some(json!("done")));
		assert_eq!(cache.len(), 1);

		let again = enrich_record(&cache, &store, linked("r-1")).await;

		assert_eq!(again.request_body, enriched.request_body);
		assert_eq!(store.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn record_without_link_is_untouched() {
		let cache = PayloadCache::new(10);
		let store = FixedStore::new(|| Ok(ObjectResponse::ok("{}")));
		let record = RequestRecord::new("bare");

		assert_eq!(enrich_record(&cache, &store, record.clone()).await, record);
		assert_eq!(store.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn non_success_status_degrades() {
		let cache = PayloadCache::new(10);
		let store = FixedStore::new(|| Ok(ObjectResponse::with_status(404)));
		let record = linked("missing");

		assert_eq!(enrich_record(&cache, &store, record.clone()).await, record);
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn transport_error_degrades() {
		let cache = PayloadCache::new(10);
		let store = FixedStore::new(|| {
			Err(reqlog_providers::Error::InvalidResponse { message: "reset".to_string() })
		});
		let record = linked("flaky");

		assert_eq!(enrich_record(&cache, &store, record.clone()).await, record);
	}

	#[tokio::test]
	async fn unparsable_body_degrades_and_is_not_cached() {
		let cache = PayloadCache::new(10);
		let store = FixedStore::new(|| Ok(ObjectResponse::ok("<html>expired</html>")));
		let record = linked("garbled");

		assert_eq!(enrich_record(&cache, &store, record.clone()).await, record);
		assert!(cache.is_empty());
	}
}
