use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
	Error, Result, date,
	tree::{self, Step, Visit},
};

/// Operator keys whose values are timestamps on the wire.
pub const DATE_OPERATORS: [&str; 2] = ["gte", "lte"];

const FILTER_ROOT_PATH: &str = "$.filter";

/// Boolean filter tree sent to the analytics store.
///
/// Leaves keep the store's `{table: {column: {operator: value}}}` shape; this layer only cares
/// about the date operators inside them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
	All(AllFilter),
	Branch(FilterBranch),
	Leaf(FilterLeaf),
}
impl FilterNode {
	pub fn all() -> Self {
		Self::All(AllFilter::All)
	}

	pub fn and(left: Self, right: Self) -> Self {
		Self::Branch(FilterBranch {
			left: Box::new(left),
			operator: BranchOperator::And,
			right: Box::new(right),
		})
	}

	pub fn or(left: Self, right: Self) -> Self {
		Self::Branch(FilterBranch {
			left: Box::new(left),
			operator: BranchOperator::Or,
			right: Box::new(right),
		})
	}

	/// Builds `{table: {column: {operator: value}}}`.
	pub fn leaf(table: &str, column: &str, operator: &str, value: Value) -> Self {
		let mut predicate = Map::new();

		predicate.insert(operator.to_string(), value);

		let mut columns = Map::new();

		columns.insert(column.to_string(), Value::Object(predicate));

		let mut tables = Map::new();

		tables.insert(table.to_string(), Value::Object(columns));

		Self::Leaf(FilterLeaf(tables))
	}

	/// Rewrites every date operator into the store timestamp format.
	///
	/// Returns a new tree. A date that cannot be parsed fails the whole call.
	pub fn normalize(&self) -> Result<Self> {
		normalize_node(self, FILTER_ROOT_PATH)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllFilter {
	#[serde(rename = "all")]
	All,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterBranch {
	pub left: Box<FilterNode>,
	pub operator: BranchOperator,
	pub right: Box<FilterNode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchOperator {
	And,
	Or,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterLeaf(pub Map<String, Value>);

/// Applies the date rewrite to an untyped filter value.
pub fn normalize_value(value: &Value) -> Result<Value> {
	tree::rewrite_tree(value, FILTER_ROOT_PATH, &mut normalize_date_rule)
}

fn normalize_node(node: &FilterNode, path: &str) -> Result<FilterNode> {
	match node {
		FilterNode::All(all) => Ok(FilterNode::All(*all)),
		FilterNode::Branch(branch) => Ok(FilterNode::Branch(FilterBranch {
			left: Box::new(normalize_node(&branch.left, &format!("{path}.left"))?),
			operator: branch.operator,
			right: Box::new(normalize_node(&branch.right, &format!("{path}.right"))?),
		})),
		FilterNode::Leaf(leaf) => {
			let rewritten = tree::rewrite_map(&leaf.0, path, &mut normalize_date_rule)?;

			Ok(FilterNode::Leaf(FilterLeaf(rewritten)))
		},
	}
}

fn normalize_date_rule(visit: Visit<'_>) -> Result<Step> {
	let Some(key) = visit.key else {
		return Ok(Step::Descend);
	};

	if !DATE_OPERATORS.contains(&key) {
		return Ok(Step::Descend);
	}

	date::parse_date_value(visit.value)
		.and_then(date::format_for_store)
		.map(|formatted| Step::Replace(Value::String(formatted)))
		.ok_or_else(|| Error::InvalidDateValue {
			path: visit.path.to_string(),
			value: visit.value.to_string(),
		})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn created_at(operator: &str, value: Value) -> FilterNode {
		FilterNode::leaf("request_response_rmt", "request_created_at", operator, value)
	}

	#[test]
	fn deserializes_all_branch_and_leaf() {
		let raw = json!({
			"left": { "request_response_rmt": { "model": { "equals": "gpt-4" } } },
			"operator": "or",
			"right": "all"
		});
		let node: FilterNode = serde_json::from_value(raw.clone()).expect("parse failed");
		let expected = FilterNode::or(
			FilterNode::leaf("request_response_rmt", "model", "equals", json!("gpt-4")),
			FilterNode::all(),
		);

		assert_eq!(node, expected);
		assert_eq!(serde_json::to_value(&node).expect("serialize failed"), raw);
	}

	#[test]
	fn normalizes_nested_date_leaves() {
		let tree = FilterNode::and(
			created_at("gte", json!("2024-01-15T10:30:45.123Z")),
			FilterNode::or(
				created_at("lte", json!("2024-02-01T00:00:00Z")),
				FilterNode::leaf("request_response_rmt", "status", "equals", json!(200)),
			),
		);
		let expected = FilterNode::and(
			created_at("gte", json!("2024-01-15 10:30:45")),
			FilterNode::or(
				created_at("lte", json!("2024-02-01 00:00:00")),
				FilterNode::leaf("request_response_rmt", "status", "equals", json!(200)),
			),
		);

		assert_eq!(tree.normalize().expect("normalize failed"), expected);
	}

	#[test]
	fn minute_precision_local_times_normalize() {
		let tree = created_at("gte", json!("2024-01-15T10:30"));

		assert_eq!(
			tree.normalize().expect("normalize failed"),
			created_at("gte", json!("2024-01-15 10:30:00"))
		);
	}

	#[test]
	fn normalize_leaves_input_untouched() {
		let tree = created_at("gte", json!("2024-01-15T10:30:45.123Z"));
		let before = tree.clone();
		let _ = tree.normalize().expect("normalize failed");

		assert_eq!(tree, before);
	}

	#[test]
	fn normalize_is_idempotent() {
		let tree = FilterNode::and(
			created_at("gte", json!(1_705_314_645_123_i64)),
			created_at("lte", json!("2024-01-16")),
		);
		let once = tree.normalize().expect("normalize failed");
		let twice = once.normalize().expect("normalize failed");

		assert_eq!(once, twice);
	}

	#[test]
	fn invalid_dates_fail_loudly_with_path() {
		let tree = FilterNode::and(FilterNode::all(), created_at("lte", json!("yesterday")));
		let err = tree.normalize().expect_err("expected invalid date");

		assert_eq!(
			err,
			Error::InvalidDateValue {
				path: "$.filter.right.request_response_rmt.request_created_at.lte".to_string(),
				value: "\"yesterday\"".to_string(),
			}
		);
	}

	#[test]
	fn untyped_values_pass_scalars_through() {
		assert_eq!(normalize_value(&json!("all")).expect("normalize failed"), json!("all"));
		assert_eq!(
			normalize_value(&json!([{ "gte": "2024-01-15" }, 3])).expect("normalize failed"),
			json!([{ "gte": "2024-01-15 00:00:00" }, 3])
		);
	}
}
