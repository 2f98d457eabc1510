//! Structural rewrite over JSON trees.
//!
//! A tree is made of three node shapes: scalar leaves, lists, and maps. [`rewrite_tree`] walks the
//! tree depth first and asks a rule what to do with every node before descending into it. The rule
//! sees the node's JSON path and, for map entries, the key it sits under. The input is never
//! mutated; a new tree is built.

use serde_json::{Map, Value};

/// Root path used when the caller has no better anchor.
pub const ROOT_PATH: &str = "$";

/// One node handed to a rewrite rule.
#[derive(Clone, Copy, Debug)]
pub struct Visit<'a> {
	pub path: &'a str,
	/// Key of the enclosing map entry, if the node is a map value.
	pub key: Option<&'a str>,
	pub value: &'a Value,
}

/// What a rule decides for a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
	/// Copy scalars verbatim and recurse into containers.
	Descend,
	/// Use this value in place of the node. Its children are not visited.
	Replace(Value),
}

pub fn rewrite_tree<F, E>(value: &Value, path: &str, rule: &mut F) -> Result<Value, E>
where
	F: FnMut(Visit<'_>) -> Result<Step, E>,
{
	rewrite_node(value, path, None, rule)
}

pub fn rewrite_map<F, E>(
	map: &Map<String, Value>,
	path: &str,
	rule: &mut F,
) -> Result<Map<String, Value>, E>
where
	F: FnMut(Visit<'_>) -> Result<Step, E>,
{
	let mut out = Map::with_capacity(map.len());

	for (key, child) in map {
		let child_path = format!("{path}.{key}");

		out.insert(key.clone(), rewrite_node(child, &child_path, Some(key), rule)?);
	}

	Ok(out)
}

fn rewrite_node<F, E>(
	value: &Value,
	path: &str,
	key: Option<&str>,
	rule: &mut F,
) -> Result<Value, E>
where
	F: FnMut(Visit<'_>) -> Result<Step, E>,
{
	if let Step::Replace(replacement) = rule(Visit { path, key, value })? {
		return Ok(replacement);
	}

	match value {
		Value::Object(map) => Ok(Value::Object(rewrite_map(map, path, rule)?)),
		Value::Array(items) => {
			let mut out = Vec::with_capacity(items.len());

			for (index, item) in items.iter().enumerate() {
				let item_path = format!("{path}[{index}]");

				out.push(rewrite_node(item, &item_path, None, rule)?);
			}

			Ok(Value::Array(out))
		},
		scalar => Ok(scalar.clone()),
	}
}

#[cfg(test)]
mod tests {
	use std::convert::Infallible;

	use serde_json::json;

	use super::*;

	#[test]
	fn descend_everywhere_is_a_deep_copy() {
		let input = json!({ "a": [1, { "b": null }], "c": "d" });
		let Ok(output) =
			rewrite_tree(&input, ROOT_PATH, &mut |_: Visit<'_>| Ok::<_, Infallible>(Step::Descend));

		assert_eq!(output, input);
	}

	#[test]
	fn rule_sees_paths_and_keys() {
		let input = json!({ "a": [{ "b": 1 }] });
		let mut seen = Vec::new();
		let Ok(_) = rewrite_tree(&input, ROOT_PATH, &mut |visit: Visit<'_>| {
			seen.push((visit.path.to_string(), visit.key.map(str::to_string)));

			Ok::<_, Infallible>(Step::Descend)
		});

		assert_eq!(
			seen,
			vec![
				("$".to_string(), None),
				("$.a".to_string(), Some("a".to_string())),
				("$.a[0]".to_string(), None),
				("$.a[0].b".to_string(), Some("b".to_string())),
			]
		);
	}

	#[test]
	fn replace_skips_children() {
		let input = json!({ "keep": { "x": 1 }, "drop": { "x": 1 } });
		let mut visited_drop_child = false;
		let Ok(output) = rewrite_tree(&input, ROOT_PATH, &mut |visit: Visit<'_>| {
			if visit.path == "$.drop.x" {
				visited_drop_child = true;
			}
			if visit.key == Some("drop") {
				return Ok::<_, Infallible>(Step::Replace(json!("gone")));
			}

			Ok(Step::Descend)
		});

		assert!(!visited_drop_child);
		assert_eq!(output, json!({ "keep": { "x": 1 }, "drop": "gone" }));
	}

	#[test]
	fn rule_errors_stop_the_walk() {
		let input = json!({ "a": 1, "b": 2 });
		let result = rewrite_tree(&input, ROOT_PATH, &mut |visit: Visit<'_>| {
			if visit.key == Some("a") { Err(visit.path.to_string()) } else { Ok(Step::Descend) }
		});

		assert_eq!(result, Err("$.a".to_string()));
	}
}
