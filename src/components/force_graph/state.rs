//! Per-view graph state and interaction tracking.
//!
//! Wraps the force [`Simulation`] with the view transform for pan/zoom and
//! drag bookkeeping. Created once per graph load, then mutated each frame by
//! the animation loop; the drag operations implement the pin/reheat protocol
//! the simulation expects around pointer gestures.

use super::simulation::{GraphSetupError, Simulation};
use super::types::GraphData;

/// Fixed palette cycled through by node type, in first-encounter order.
const TYPE_COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Extra world-space slack around a node circle for pointer hit testing.
const HIT_SLACK: f64 = 4.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Core view state: the physics simulation plus interaction tracking.
pub struct GraphState {
	pub sim: Simulation,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	/// Colors assigned to node types, resolved once at load.
	node_colors: Vec<String>,
}

impl GraphState {
	/// Builds view state for one graph load. Fails when the graph itself is
	/// inconsistent (see [`GraphSetupError`]); the caller logs and renders
	/// nothing in that case.
	pub fn new(data: &GraphData, width: f64, height: f64) -> Result<Self, GraphSetupError> {
		let sim = Simulation::new(data, width, height)?;

		// Explicit color > fixed palette keyed by type, types colored in
		// first-encounter order.
		let mut type_order: Vec<&str> = Vec::new();
		let node_colors = sim
			.nodes()
			.iter()
			.map(|node| {
				if let Some(color) = &node.color {
					return color.clone();
				}
				let slot = match type_order.iter().position(|t| *t == node.node_type) {
					Some(i) => i,
					None => {
						type_order.push(&node.node_type);
						type_order.len() - 1
					}
				};
				TYPE_COLORS[slot % TYPE_COLORS.len()].to_string()
			})
			.collect();

		Ok(Self {
			sim,
			transform: ViewTransform {
				x: 0.0,
				y: 0.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			animation_running: true,
			node_colors,
		})
	}

	/// Display color for the node at `idx`.
	pub fn node_color(&self, idx: usize) -> &str {
		&self.node_colors[idx]
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under the given screen position, if any.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		for (i, node) in self.sim.nodes().iter().enumerate() {
			let (dx, dy) = (node.x - gx, node.y - gy);
			if (dx * dx + dy * dy).sqrt() < node.size + HIT_SLACK {
				found = Some(i);
			}
		}
		found
	}

	/// Starts dragging the node at `idx` from screen position `(sx, sy)`:
	/// reheats the simulation and pins the node where it currently sits.
	pub fn begin_drag(&mut self, idx: usize, sx: f64, sy: f64) {
		let node = &self.sim.nodes()[idx];
		self.drag = DragState {
			active: true,
			node_idx: Some(idx),
			start_x: sx,
			start_y: sy,
			node_start_x: node.x,
			node_start_y: node.y,
		};
		let (x, y) = (node.x, node.y);
		self.sim.reheat();
		self.sim.pin(idx, x, y);
	}

	/// Moves the active drag to screen position `(sx, sy)`, re-pinning the
	/// node at the pointer. No-op when no drag is active.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(idx) = self.drag.node_idx.filter(|_| self.drag.active) else {
			return;
		};
		let (dx, dy) = (
			(sx - self.drag.start_x) / self.transform.k,
			(sy - self.drag.start_y) / self.transform.k,
		);
		self.sim
			.pin(idx, self.drag.node_start_x + dx, self.drag.node_start_y + dy);
	}

	/// Ends the active drag: unpins the node and lets the simulation decay
	/// back to settled.
	pub fn end_drag(&mut self) {
		if let Some(idx) = self.drag.node_idx.take() {
			self.sim.unpin(idx);
			self.sim.cool();
		}
		self.drag.active = false;
	}

	/// Advances the simulation one tick if it is not settled.
	pub fn tick(&mut self) {
		self.sim.step();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphLink, GraphNode};

	fn graph() -> GraphData {
		let node = |id: &str, node_type: &str| GraphNode {
			id: id.to_string(),
			label: id.to_string(),
			node_type: node_type.to_string(),
			size: None,
			color: None,
		};
		GraphData {
			nodes: vec![node("1", "Person"), node("2", "Place"), node("3", "Person")],
			links: vec![GraphLink {
				source: "1".to_string(),
				target: "2".to_string(),
				link_type: "AT".to_string(),
				weight: None,
			}],
		}
	}

	#[test]
	fn colors_assigned_per_type_in_encounter_order() {
		let state = GraphState::new(&graph(), 800.0, 600.0).unwrap();
		assert_eq!(state.node_color(0), TYPE_COLORS[0]);
		assert_eq!(state.node_color(1), TYPE_COLORS[1]);
		assert_eq!(state.node_color(2), TYPE_COLORS[0]);
	}

	#[test]
	fn explicit_color_wins_over_palette() {
		let mut data = graph();
		data.nodes[1].color = Some("#123456".to_string());
		let state = GraphState::new(&data, 800.0, 600.0).unwrap();
		assert_eq!(state.node_color(1), "#123456");
	}

	#[test]
	fn drag_cycle_pins_then_releases() {
		let mut state = GraphState::new(&graph(), 800.0, 600.0).unwrap();
		state.begin_drag(0, 10.0, 10.0);
		assert!(state.drag.active);
		assert!(state.sim.nodes()[0].fx.is_some());

		state.drag_to(110.0, 10.0);
		state.tick();
		let pinned_x = state.sim.nodes()[0].x;
		assert!((pinned_x - (state.drag.node_start_x + 100.0)).abs() < 1e-9);

		state.end_drag();
		assert!(!state.drag.active);
		assert!(state.sim.nodes()[0].fx.is_none());
	}

	#[test]
	fn node_hit_test_respects_transform() {
		let mut state = GraphState::new(&graph(), 800.0, 600.0).unwrap();
		let (nx, ny) = (state.sim.nodes()[0].x, state.sim.nodes()[0].y);
		assert_eq!(state.node_at_position(nx, ny), Some(0));

		state.transform.x = 50.0;
		state.transform.y = -20.0;
		assert_eq!(state.node_at_position(nx + 50.0, ny - 20.0), Some(0));
		assert_eq!(state.node_at_position(nx + 500.0, ny), None);
	}
}
