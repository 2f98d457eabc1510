//! Signed-link downloads from the object store.

use reqwest::{Client, StatusCode};

use crate::Result;

/// Raw outcome of a signed-link GET; non-success statuses are data, not errors.
#[derive(Clone, Debug)]
pub struct ObjectResponse {
	pub status: StatusCode,
	pub body: Vec<u8>,
}
impl ObjectResponse {
	pub fn ok(body: impl Into<Vec<u8>>) -> Self {
		Self { status: StatusCode::OK, body: body.into() }
	}

	/// Bodiless response; unknown codes collapse to 500.
	pub fn with_status(status: u16) -> Self {
		let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		Self { status, body: Vec::new() }
	}

	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}
}

pub async fn fetch_object(client: &Client, signed_url: &str) -> Result<ObjectResponse> {
	let res = client.get(signed_url).send().await?;
	let status = res.status();
	let body = if status.is_success() { res.bytes().await?.to_vec() } else { Vec::new() };

	Ok(ObjectResponse { status, body })
}
