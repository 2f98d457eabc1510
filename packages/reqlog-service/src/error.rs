pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("{message}")]
	InvalidDateValue { path: String, message: String },
	#[error("Metadata fetch failed: {message}")]
	MetadataFetch { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Request was cancelled by shutdown.")]
	Cancelled,
}
impl From<reqlog_domain::Error> for Error {
	fn from(err: reqlog_domain::Error) -> Self {
		match err {
			reqlog_domain::Error::InvalidDateValue { ref path, .. } =>
				Self::InvalidDateValue { path: path.clone(), message: err.to_string() },
		}
	}
}
impl From<reqlog_providers::Error> for Error {
	fn from(err: reqlog_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
