use reqlog_domain::RequestRecord;

use crate::{Error, RequestLogService, Result, enrich};

impl RequestLogService {
	/// Fetches one record's metadata and resolves its payload through the shared cache.
	///
	/// Only a failed metadata fetch is an error; payload problems leave the slots empty.
	pub async fn get_request(&self, request_id: &str) -> Result<RequestRecord> {
		let request_id = request_id.trim();

		if request_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "request_id must be non-empty.".to_string(),
			});
		}

		let record = self
			.providers
			.query
			.fetch_record(request_id)
			.await
			.map_err(|err| Error::MetadataFetch { message: err.to_string() })?;

		Ok(enrich::enrich_record(&self.cache, self.providers.objects.as_ref(), record).await)
	}
}
