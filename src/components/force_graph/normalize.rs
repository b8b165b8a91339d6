//! Conversion of raw graph-database export rows into the internal schema.
//!
//! The export format is a JSON array of relationship rows, each minimally
//! `{"Source": 1, "Target": 2, "RelationshipType": "KNOWS"}`. Normalization
//! dedupes the endpoints into a node set and keeps one link per valid row.
//! Malformed rows are skipped with a warning rather than aborting the load;
//! a non-array top-level value yields an empty graph.

use std::collections::HashSet;

use log::warn;
use serde_json::Value;

use super::types::{GraphData, GraphLink, GraphNode};

/// Node type assigned to endpoints the export does not describe further.
const DEFAULT_NODE_TYPE: &str = "Entity";
/// Relationship label used when a row carries no `RelationshipType`.
const DEFAULT_LINK_TYPE: &str = "RELATED";

/// Canonical string form of a numeric endpoint id.
///
/// Integers render without a decimal point (`1` → `"1"`), matching the id
/// format links are resolved against. Non-numeric values yield `None`.
fn canonical_id(value: &Value) -> Option<String> {
	let Value::Number(num) = value else {
		return None;
	};
	if let Some(i) = num.as_i64() {
		Some(i.to_string())
	} else if let Some(u) = num.as_u64() {
		Some(u.to_string())
	} else {
		num.as_f64().map(|f| f.to_string())
	}
}

/// Normalizes raw export rows into `{nodes, links}`.
///
/// Node iteration order is first-encounter order across the row list, so the
/// same input always produces structurally identical output.
pub fn normalize(raw: &Value) -> GraphData {
	let Some(rows) = raw.as_array() else {
		warn!("relgraph: raw graph data is not an array, rendering empty graph");
		return GraphData::default();
	};

	let mut nodes = Vec::new();
	let mut links = Vec::new();
	let mut seen: HashSet<String> = HashSet::new();

	for (i, row) in rows.iter().enumerate() {
		let source = row.get("Source").and_then(canonical_id);
		let target = row.get("Target").and_then(canonical_id);
		let (Some(source), Some(target)) = (source, target) else {
			warn!("relgraph: skipping record {i}: missing numeric Source or Target");
			continue;
		};

		for id in [&source, &target] {
			if seen.insert(id.clone()) {
				nodes.push(GraphNode {
					id: id.clone(),
					label: format!("Node {id}"),
					node_type: DEFAULT_NODE_TYPE.to_string(),
					size: None,
					color: None,
				});
			}
		}

		let link_type = row
			.get("RelationshipType")
			.and_then(Value::as_str)
			.unwrap_or(DEFAULT_LINK_TYPE)
			.to_string();
		links.push(GraphLink {
			source,
			target,
			link_type,
			weight: None,
		});
	}

	GraphData { nodes, links }
}

/// Parses fetched text as graph data in either supported schema.
///
/// A JSON array is treated as raw export rows and normalized; a JSON object
/// is deserialized as the internal `{nodes, links}` schema directly. Returns
/// `None` (with a logged diagnostic) on parse or shape errors.
pub fn parse_graph(text: &str) -> Option<GraphData> {
	let value: Value = match serde_json::from_str(text) {
		Ok(v) => v,
		Err(e) => {
			warn!("relgraph: failed to parse graph data: {e}");
			return None;
		}
	};

	if value.is_array() {
		return Some(normalize(&value));
	}

	match serde_json::from_value::<GraphData>(value) {
		Ok(data) => Some(data),
		Err(e) => {
			warn!("relgraph: graph data does not match node/link schema: {e}");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn single_row_produces_two_nodes_and_one_link() {
		let raw = json!([{"Source": 1, "Target": 2, "RelationshipType": "KNOWS"}]);
		let data = normalize(&raw);

		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.nodes[0].id, "1");
		assert_eq!(data.nodes[0].label, "Node 1");
		assert_eq!(data.nodes[0].node_type, "Entity");
		assert_eq!(data.nodes[1].id, "2");

		assert_eq!(data.links.len(), 1);
		assert_eq!(data.links[0].source, "1");
		assert_eq!(data.links[0].target, "2");
		assert_eq!(data.links[0].link_type, "KNOWS");
	}

	#[test]
	fn malformed_rows_skipped_not_substituted() {
		let raw = json!([
			{"Source": 1, "Target": 2},
			{"Source": "x", "Target": 2},
		]);
		let data = normalize(&raw);

		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.links.len(), 1);
		assert_eq!(data.links[0].link_type, "RELATED");
	}

	#[test]
	fn missing_endpoint_field_skips_row() {
		let raw = json!([{"Source": 1}, {"Target": 2}, {}]);
		let data = normalize(&raw);

		assert!(data.nodes.is_empty());
		assert!(data.links.is_empty());
	}

	#[test]
	fn non_array_input_yields_empty_graph() {
		let data = normalize(&json!({"Source": 1, "Target": 2}));
		assert!(data.nodes.is_empty());
		assert!(data.links.is_empty());
	}

	#[test]
	fn nodes_deduped_in_first_encounter_order() {
		let raw = json!([
			{"Source": 3, "Target": 1},
			{"Source": 1, "Target": 2},
			{"Source": 2, "Target": 3},
		]);
		let data = normalize(&raw);

		let ids: Vec<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, vec!["3", "1", "2"]);
		assert_eq!(data.links.len(), 3);
	}

	#[test]
	fn every_node_id_unique_and_from_valid_endpoint() {
		let raw = json!([
			{"Source": 1, "Target": 2},
			{"Source": 2, "Target": 3},
			{"Source": 9, "Target": "bad"},
		]);
		let data = normalize(&raw);

		let mut ids: Vec<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
		let unique: HashSet<&str> = ids.iter().copied().collect();
		assert_eq!(unique.len(), ids.len());

		// The row with a non-numeric Target contributes nothing, not even
		// its valid Source endpoint's link.
		ids.sort_unstable();
		assert_eq!(ids, vec!["1", "2", "3"]);
		assert_eq!(data.links.len(), 2);
	}

	#[test]
	fn normalization_is_idempotent() {
		let raw = json!([
			{"Source": 5, "Target": 7, "RelationshipType": "OWNS"},
			{"Source": 7, "Target": 5},
		]);
		let a = normalize(&raw);
		let b = normalize(&raw);

		assert_eq!(a.nodes.len(), b.nodes.len());
		for (x, y) in a.nodes.iter().zip(&b.nodes) {
			assert_eq!(x.id, y.id);
			assert_eq!(x.label, y.label);
		}
		for (x, y) in a.links.iter().zip(&b.links) {
			assert_eq!(x.source, y.source);
			assert_eq!(x.target, y.target);
			assert_eq!(x.link_type, y.link_type);
		}
	}

	#[test]
	fn parse_graph_dispatches_on_shape() {
		let raw = r#"[{"Source": 1, "Target": 2}]"#;
		let data = parse_graph(raw).unwrap();
		assert_eq!(data.nodes.len(), 2);

		let internal = r#"{
			"nodes": [{"id": "a", "label": "A", "type": "Person"}],
			"links": []
		}"#;
		let data = parse_graph(internal).unwrap();
		assert_eq!(data.nodes[0].node_type, "Person");

		assert!(parse_graph("not json").is_none());
		assert!(parse_graph(r#"{"nodes": 3}"#).is_none());
	}
}
