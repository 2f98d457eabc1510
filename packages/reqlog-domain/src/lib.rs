pub mod assets;
pub mod date;
pub mod filter;
pub mod query;
pub mod record;
pub mod tree;

mod error;

pub use error::{Error, Result};
pub use filter::FilterNode;
pub use record::{RequestRecord, ResolvedPayload};
