//! Bounded, process-local cache of resolved payloads keyed by request id.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

use serde::Serialize;

use reqlog_domain::ResolvedPayload;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
	pub entries: usize,
	pub max_entries: usize,
	/// Wholesale clears since startup, including manual ones.
	pub clears: u64,
}

#[derive(Default)]
struct CacheState {
	entries: HashMap<String, Arc<ResolvedPayload>>,
	clears: u64,
}

/// Shared by the page and single-record paths.
///
/// There is no per-entry eviction: once an insert pushes the entry count past `max_entries` the
/// whole map is dropped. Insert and clear run under the same lock.
pub struct PayloadCache {
	max_entries: usize,
	state: Mutex<CacheState>,
}
impl PayloadCache {
	pub fn new(max_entries: usize) -> Self {
		Self { max_entries, state: Mutex::new(CacheState::default()) }
	}

	pub fn max_entries(&self) -> usize {
		self.max_entries
	}

	pub fn get(&self, request_id: &str) -> Option<Arc<ResolvedPayload>> {
		self.lock().entries.get(request_id).cloned()
	}

	pub fn put(&self, request_id: &str, payload: Arc<ResolvedPayload>) {
		let mut state = self.lock();

		state.entries.insert(request_id.to_string(), payload);

		if state.entries.len() > self.max_entries {
			let dropped = state.entries.len();

			state.entries.clear();
			state.clears += 1;

			tracing::info!(dropped, max_entries = self.max_entries, "Payload cache cleared.");
		}
	}

	pub fn len(&self) -> usize {
		self.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the number of entries removed.
	pub fn clear(&self) -> usize {
		let mut state = self.lock();
		let dropped = state.entries.len();

		state.entries.clear();
		state.clears += 1;

		dropped
	}

	pub fn stats(&self) -> CacheStats {
		let state = self.lock();

		CacheStats {
			entries: state.entries.len(),
			max_entries: self.max_entries,
			clears: state.clears,
		}
	}

	fn lock(&self) -> MutexGuard<'_, CacheState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}
