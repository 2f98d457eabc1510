use std::sync::Arc;

use reqlog_service::{PayloadCache, RequestLogService};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RequestLogService>,
}
impl AppState {
	/// Owns the one payload cache shared by every request path for the life of the process.
	pub fn new(config: reqlog_config::Config) -> color_eyre::Result<Self> {
		let cache = Arc::new(PayloadCache::new(config.cache.max_entries));
		let service = RequestLogService::new(config, cache)?;

		Ok(Self { service: Arc::new(service) })
	}
}
