//! Concurrent enrichment of a fetched page, reassembled in page order.

use std::collections::HashMap;

use tokio::{runtime::Handle, sync::watch, task::JoinSet};

use reqlog_domain::RequestRecord;

use crate::{Error, RequestLogService, Result, enrich};

impl RequestLogService {
	/// Enriches every record concurrently and returns them in their original order.
	///
	/// Per-record failures leave that record bare. If no runtime is available to spawn onto, the
	/// page is returned unenriched.
	pub async fn merge_page(&self, records: Vec<RequestRecord>) -> Vec<RequestRecord> {
		let enriched = self.enrich_all(&records, None).await.unwrap_or_default();

		overlay(records, enriched)
	}

	/// Like [`Self::merge_page`], but aborts every in-flight fetch once `cancel` reads `true`.
	pub async fn merge_page_with_cancel(
		&self,
		records: Vec<RequestRecord>,
		cancel: watch::Receiver<bool>,
	) -> Result<Vec<RequestRecord>> {
		let enriched = self.enrich_all(&records, Some(cancel)).await.ok_or(Error::Cancelled)?;

		Ok(overlay(records, enriched))
	}

	/// `None` means the batch was cancelled.
	async fn enrich_all(
		&self,
		records: &[RequestRecord],
		mut cancel: Option<watch::Receiver<bool>>,
	) -> Option<HashMap<String, RequestRecord>> {
		let mut enriched = HashMap::with_capacity(records.len());

		if records.is_empty() {
			return Some(enriched);
		}
		if let Err(err) = Handle::try_current() {
			tracing::error!(
				error = %err,
				records = records.len(),
				"Page enrichment could not start."
			);

			return Some(enriched);
		}

		let mut tasks = JoinSet::new();

		for record in records {
			let cache = self.cache.clone();
			let objects = self.providers.objects.clone();
			let record = record.clone();

			tasks.spawn(
				async move { enrich::enrich_record(&cache, objects.as_ref(), record).await },
			);
		}

		loop {
			tokio::select! {
				joined = tasks.join_next() => match joined {
					Some(Ok(record)) => {
						enriched.insert(record.request_id.clone(), record);
					},
					Some(Err(err)) => tracing::error!(error = %err, "Enrichment task failed."),
					None => break,
				},
				_ = cancelled(cancel.as_mut()) => {
					tasks.abort_all();

					tracing::info!(pending = tasks.len(), "Page enrichment cancelled.");

					return None;
				},
			}
		}

		Some(enriched)
	}
}

/// Resolves once the signal reads `true`; never resolves without a live sender.
async fn cancelled(signal: Option<&mut watch::Receiver<bool>>) {
	let Some(signal) = signal else {
		return std::future::pending().await;
	};
	let closed = signal.wait_for(|cancelled| *cancelled).await.is_err();

	if closed {
		std::future::pending::<()>().await;
	}
}

/// Copies payload slots from `enriched` onto the page, keeping every other field of the original.
fn overlay(
	records: Vec<RequestRecord>,
	enriched: HashMap<String, RequestRecord>,
) -> Vec<RequestRecord> {
	records
		.into_iter()
		.map(|mut record| {
			if let Some(done) = enriched.get(&record.request_id).filter(|done| done.has_payload()) {
				record.request_body = done.request_body.clone();
				record.response_body = done.response_body.clone();
			}

			record
		})
		.collect()
}
