use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use reqlog_config::Config;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.expect("Template config must include the section.");

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("reqlog_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> reqlog_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = reqlog_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_error(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn loads_sample_config_and_normalizes_api_base() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Failed to load.");

	assert_eq!(cfg.query.api_base, "http://127.0.0.1:8585");
	assert_eq!(cfg.query.count_base(), "http://127.0.0.1:8585");
	assert_eq!(cfg.query.api_key.as_deref(), Some("test-key"));
	assert_eq!(cfg.cache.max_entries, 10_000);
	assert_eq!(cfg.paging.max_page_size, 1_000);
}

#[test]
fn cache_and_paging_sections_are_optional() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root.as_table_mut().expect("Template config must be a table.");

	table.remove("cache");
	table.remove("paging");

	let cfg = load_payload(toml::to_string(&root).expect("Failed to render template config."))
		.expect("Failed to load.");

	assert_eq!(cfg.cache.max_entries, 10_000);
	assert_eq!(cfg.paging.max_page_size, 1_000);
}

#[test]
fn blank_api_key_is_dropped() {
	let cfg = load_payload(sample_toml_with("query", "api_key", Value::String("  ".to_string())))
		.expect("Failed to load.");

	assert!(cfg.query.api_key.is_none());
}

#[test]
fn count_api_base_overrides_query_base() {
	let cfg = load_payload(sample_toml_with(
		"query",
		"count_api_base",
		Value::String("http://127.0.0.1:3000/api/".to_string()),
	))
	.expect("Failed to load.");

	assert_eq!(cfg.query.count_base(), "http://127.0.0.1:3000/api");
}

#[test]
fn api_base_must_be_http_url() {
	expect_validation_error(
		sample_toml_with("query", "api_base", Value::String("ftp://example".to_string())),
		"query.api_base must be an http or https URL.",
	);
}

#[test]
fn cache_max_entries_must_be_positive() {
	expect_validation_error(
		sample_toml_with("cache", "max_entries", Value::Integer(0)),
		"cache.max_entries must be greater than zero.",
	);
}

#[test]
fn max_page_size_must_be_positive() {
	expect_validation_error(
		sample_toml_with("paging", "max_page_size", Value::Integer(0)),
		"paging.max_page_size must be greater than zero.",
	);
}

#[test]
fn timeouts_must_be_positive() {
	expect_validation_error(
		sample_toml_with("object_store", "timeout_ms", Value::Integer(0)),
		"object_store.timeout_ms must be greater than zero.",
	);
	expect_validation_error(
		sample_toml_with("query", "timeout_ms", Value::Integer(0)),
		"query.timeout_ms must be greater than zero.",
	);
}

#[test]
fn default_header_values_must_be_strings() {
	let mut headers = toml::map::Map::new();

	headers.insert("x-retries".to_string(), Value::Integer(3));

	expect_validation_error(
		sample_toml_with("query", "default_headers", Value::Table(headers)),
		"query.default_headers values must be strings.",
	);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("reqlog_config_test_missing.toml");
	let err = reqlog_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, reqlog_config::Error::ReadConfig { .. }));
}
