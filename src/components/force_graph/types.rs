//! Graph data structures for input to the force graph component.
//!
//! This is the internal schema: nodes keyed by stable string ids, links
//! referencing those ids. Raw database-export rows are converted into this
//! shape by the normalizer in [`super::normalize`].

use serde::Deserialize;

/// A node in the graph.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphNode {
	/// Unique identifier for this node. Used to reference nodes in links.
	pub id: String,
	/// Display label drawn next to the node.
	pub label: String,
	/// Category tag. Drives node color, has no effect on physics.
	#[serde(rename = "type")]
	pub node_type: String,
	/// Optional radius in world units (default 10).
	pub size: Option<f64>,
	/// Optional CSS color override (e.g., "#ff0000").
	/// If not set, color is derived from a fixed palette keyed by `node_type`.
	pub color: Option<String>,
}

/// A directed edge between two nodes, endpoints given as node ids.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphLink {
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
	/// Relationship label (e.g., "KNOWS").
	#[serde(rename = "type")]
	pub link_type: String,
	/// Optional stroke-width multiplier (default 1.0). Visual only.
	pub weight: Option<f64>,
}

/// Complete graph data: nodes and links.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}
