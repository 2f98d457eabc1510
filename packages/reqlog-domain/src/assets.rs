use std::{
	collections::{BTreeMap, HashMap},
	convert::Infallible,
};

use serde_json::Value;

use crate::tree::{self, Step, Visit};

/// Per-record mapping from asset token to its retrievable reference.
pub type AssetTable = BTreeMap<String, String>;

const PLACEHOLDER_OPEN: &str = "<<";
const PLACEHOLDER_CLOSE: &str = ">>";

/// Placeholder string a token appears as inside a payload.
pub fn placeholder(token: &str) -> String {
	if token.starts_with(PLACEHOLDER_OPEN) && token.ends_with(PLACEHOLDER_CLOSE) {
		token.to_string()
	} else {
		format!("{PLACEHOLDER_OPEN}{token}{PLACEHOLDER_CLOSE}")
	}
}

/// Replaces every string leaf equal to a known placeholder with its reference.
///
/// Matching is whole-string identity. Placeholders without a table entry stay as they are.
pub fn substitute(payload: &Value, table: Option<&AssetTable>) -> Value {
	let Some(table) = table.filter(|table| !table.is_empty()) else {
		return payload.clone();
	};
	let lookup: HashMap<String, &str> =
		table.iter().map(|(token, reference)| (placeholder(token), reference.as_str())).collect();
	let Ok(substituted) = tree::rewrite_tree(payload, tree::ROOT_PATH, &mut |visit: Visit<'_>| {
		let replacement = visit
			.value
			.as_str()
			.and_then(|raw| lookup.get(raw))
			.map(|reference| Step::Replace(Value::String((*reference).to_string())));

		Ok::<_, Infallible>(replacement.unwrap_or(Step::Descend))
	});

	substituted
}
