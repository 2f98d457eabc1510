pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Invalid date value at {path}: {value}.")]
	InvalidDateValue { path: String, value: String },
}
