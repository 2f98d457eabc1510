//! Request-log data access: page queries, lazy payload enrichment, and the shared payload cache.

pub mod cache;
pub mod enrich;
pub mod merge;
pub mod page;
pub mod single;

mod error;

pub use cache::{CacheStats, PayloadCache};
pub use error::{Error, Result};
pub use page::{CountRequest, PageRequest, PageResponse, RangeCountRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::Client;
use tokio::sync::watch;

use reqlog_config::{Config, Query};
use reqlog_domain::{
	RequestRecord,
	query::{CountBody, CountQueryBody, QueryPageBody},
};
use reqlog_providers::{
	object_store::{self, ObjectResponse},
	query,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The analytics query collaborator and its count endpoint.
pub trait QueryProvider
where
	Self: Send + Sync,
{
	fn query_page<'a>(
		&'a self,
		body: &'a QueryPageBody,
	) -> BoxFuture<'a, reqlog_providers::Result<Vec<RequestRecord>>>;

	fn fetch_record<'a>(
		&'a self,
		request_id: &'a str,
	) -> BoxFuture<'a, reqlog_providers::Result<RequestRecord>>;

	fn count<'a>(
		&'a self,
		body: &'a CountBody,
	) -> BoxFuture<'a, reqlog_providers::Result<Option<u64>>>;

	fn count_query<'a>(
		&'a self,
		body: &'a CountQueryBody,
	) -> BoxFuture<'a, reqlog_providers::Result<Option<u64>>>;
}

pub trait ObjectStore
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		signed_url: &'a str,
	) -> BoxFuture<'a, reqlog_providers::Result<ObjectResponse>>;
}

#[derive(Clone)]
pub struct Providers {
	pub query: Arc<dyn QueryProvider>,
	pub objects: Arc<dyn ObjectStore>,
}
impl Providers {
	pub fn new(query: Arc<dyn QueryProvider>, objects: Arc<dyn ObjectStore>) -> Self {
		Self { query, objects }
	}

	/// HTTP-backed providers with one pooled client per collaborator.
	pub fn http(cfg: &Config) -> Result<Self> {
		let provider = Arc::new(HttpProviders::new(cfg)?);

		Ok(Self { query: provider.clone(), objects: provider })
	}
}

pub struct HttpProviders {
	query_client: Client,
	object_client: Client,
	cfg: Query,
}
impl HttpProviders {
	pub fn new(cfg: &Config) -> Result<Self> {
		let query_client = reqlog_providers::build_client(cfg.query.timeout_ms)?;
		let object_client = reqlog_providers::build_client(cfg.object_store.timeout_ms)?;

		Ok(Self { query_client, object_client, cfg: cfg.query.clone() })
	}
}

impl QueryProvider for HttpProviders {
	fn query_page<'a>(
		&'a self,
		body: &'a QueryPageBody,
	) -> BoxFuture<'a, reqlog_providers::Result<Vec<RequestRecord>>> {
		Box::pin(query::query_page(&self.query_client, &self.cfg, body))
	}

	fn fetch_record<'a>(
		&'a self,
		request_id: &'a str,
	) -> BoxFuture<'a, reqlog_providers::Result<RequestRecord>> {
		Box::pin(query::fetch_record(&self.query_client, &self.cfg, request_id))
	}

	fn count<'a>(
		&'a self,
		body: &'a CountBody,
	) -> BoxFuture<'a, reqlog_providers::Result<Option<u64>>> {
		Box::pin(query::count(&self.query_client, &self.cfg, body))
	}

	fn count_query<'a>(
		&'a self,
		body: &'a CountQueryBody,
	) -> BoxFuture<'a, reqlog_providers::Result<Option<u64>>> {
		Box::pin(query::count_query(&self.query_client, &self.cfg, body))
	}
}

impl ObjectStore for HttpProviders {
	fn fetch<'a>(
		&'a self,
		signed_url: &'a str,
	) -> BoxFuture<'a, reqlog_providers::Result<ObjectResponse>> {
		Box::pin(object_store::fetch_object(&self.object_client, signed_url))
	}
}

pub struct RequestLogService {
	pub cfg: Config,
	pub cache: Arc<PayloadCache>,
	pub providers: Providers,
	shutdown: watch::Sender<bool>,
}
impl RequestLogService {
	pub fn new(cfg: Config, cache: Arc<PayloadCache>) -> Result<Self> {
		let providers = Providers::http(&cfg)?;

		Ok(Self::with_providers(cfg, cache, providers))
	}

	pub fn with_providers(cfg: Config, cache: Arc<PayloadCache>, providers: Providers) -> Self {
		let (shutdown, _) = watch::channel(false);

		Self { cfg, cache, providers, shutdown }
	}

	/// Cancels every in-flight page enrichment and every one started afterwards.
	pub fn shutdown(&self) {
		if !self.shutdown.send_replace(true) {
			tracing::info!("Request log service shutting down.");
		}
	}

	/// Resolves once [`Self::shutdown`] has been called.
	pub fn stopped(&self) -> impl Future<Output = ()> + Send + use<> {
		let mut signal = self.shutdown.subscribe();

		async move {
			let _ = signal.wait_for(|stopped| *stopped).await;
		}
	}

	fn shutdown_signal(&self) -> watch::Receiver<bool> {
		self.shutdown.subscribe()
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats()
	}

	/// Drops every cached payload and returns the number of entries removed.
	pub fn clear_cache(&self) -> usize {
		self.cache.clear()
	}
}
