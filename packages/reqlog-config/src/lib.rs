mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Cache, Config, ObjectStore, Paging, Query, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	let binds = [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
	];

	for (label, value) in binds {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	let bases = [
		("query.api_base", Some(cfg.query.api_base.as_str())),
		("query.count_api_base", cfg.query.count_api_base.as_deref()),
	];

	for (label, value) in bases {
		let Some(value) = value else {
			continue;
		};

		if !value.starts_with("http://") && !value.starts_with("https://") {
			return Err(Error::Validation {
				message: format!("{label} must be an http or https URL."),
			});
		}
	}

	if cfg.query.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "query.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.query.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "query.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.object_store.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "object_store.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.max_entries == 0 {
		return Err(Error::Validation {
			message: "cache.max_entries must be greater than zero.".to_string(),
		});
	}
	if cfg.paging.max_page_size == 0 {
		return Err(Error::Validation {
			message: "paging.max_page_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.query.api_base = cfg.query.api_base.trim().trim_end_matches('/').to_string();

	if cfg.query.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.query.api_key = None;
	}

	cfg.query.count_api_base = cfg
		.query
		.count_api_base
		.take()
		.map(|base| base.trim().trim_end_matches('/').to_string())
		.filter(|base| !base.is_empty());
}
