//! Paginated queries and counts against the analytics store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use reqlog_domain::{
	FilterNode, RequestRecord, date,
	query::{self, CountBody, CountQueryBody, QueryPageBody},
};

use crate::{Error, RequestLogService, Result};

#[derive(Clone, Debug, Deserialize)]
pub struct PageRequest {
	#[serde(default = "FilterNode::all")]
	pub filter: FilterNode,
	/// 1-based.
	#[serde(default = "default_page")]
	pub page: u32,
	pub page_size: u32,
	#[serde(default = "default_sort")]
	pub sort: Value,
	#[serde(default)]
	pub is_cached: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PageResponse {
	pub requests: Vec<RequestRecord>,
	/// `None` when the count endpoint failed; the page itself is still valid.
	pub count: Option<u64>,
	/// Rows that carry a resolved payload.
	pub enriched: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CountRequest {
	#[serde(default = "FilterNode::all")]
	pub filter: FilterNode,
	#[serde(default)]
	pub is_cached: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RangeCountRequest {
	pub start: String,
	pub end: String,
}

impl RequestLogService {
	/// Fetches one page of metadata, enriches it, and counts the full result set alongside.
	///
	/// The page query receives the filter as given. Only the count receives the normalized tree,
	/// so a filter that fails normalization still yields a page with an unknown count.
	pub async fn query_page(&self, req: PageRequest) -> Result<PageResponse> {
		let offset = self.page_offset(&req)?;
		let count_body = match req.filter.normalize() {
			Ok(filter) => Some(CountBody { filter, is_cached: req.is_cached }),
			Err(err) => {
				tracing::warn!(error = %err, "Skipping request count for unnormalizable filter.");

				None
			},
		};
		let page_body = QueryPageBody {
			filter: req.filter,
			offset,
			limit: req.page_size,
			sort: req.sort,
			is_cached: req.is_cached,
		};
		let (page, count) = tokio::join!(
			self.providers.query.query_page(&page_body),
			self.count_or_none(count_body.as_ref()),
		);
		let records = page.map_err(|err| Error::MetadataFetch { message: err.to_string() })?;
		let requests = self.merge_page_with_cancel(records, self.shutdown_signal()).await?;
		let enriched = requests.iter().filter(|record| record.has_payload()).count();

		Ok(PageResponse { requests, count, enriched })
	}

	/// Counts records matching `filter`, normalizing its dates first.
	pub async fn count(&self, req: CountRequest) -> Result<Option<u64>> {
		let body = CountBody { filter: req.filter.normalize()?, is_cached: req.is_cached };

		Ok(self.providers.query.count(&body).await?)
	}

	/// Counts records created within `[start, end]`, both bounds inclusive.
	///
	/// Bounds must parse as dates and are sent to the count endpoint as given.
	pub async fn count_in_range(&self, req: RangeCountRequest) -> Result<Option<u64>> {
		let (start, end) = (req.start.trim(), req.end.trim());
		let filter = query::created_at_range(start, end);

		filter.normalize()?;

		if let (Some(start), Some(end)) = (date::parse_date_str(start), date::parse_date_str(end))
			&& start > end
		{
			return Err(Error::InvalidRequest {
				message: "start must not be later than end.".to_string(),
			});
		}

		Ok(self.providers.query.count_query(&CountQueryBody { filter }).await?)
	}

	async fn count_or_none(&self, body: Option<&CountBody>) -> Option<u64> {
		match self.providers.query.count(body?).await {
			Ok(count) => count,
			Err(err) => {
				tracing::warn!(error = %err, "Request count failed.");

				None
			},
		}
	}

	fn page_offset(&self, req: &PageRequest) -> Result<u64> {
		if req.page == 0 {
			return Err(Error::InvalidRequest { message: "page must be 1 or greater.".to_string() });
		}
		if req.page_size == 0 || req.page_size > self.cfg.paging.max_page_size {
			return Err(Error::InvalidRequest {
				message: format!(
					"page_size must be between 1 and {}.",
					self.cfg.paging.max_page_size
				),
			});
		}

		Ok(u64::from(req.page - 1) * u64::from(req.page_size))
	}
}

fn default_page() -> u32 {
	1
}

fn default_sort() -> Value {
	serde_json::json!({ "created_at": "desc" })
}
