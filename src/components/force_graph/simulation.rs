//! Force-directed layout simulation.
//!
//! Owns the node arena and advances it tick by tick under four superposed
//! forces: link attraction, many-body repulsion (Barnes-Hut approximated),
//! centering, and collision avoidance. Simulation energy is tracked by an
//! `alpha` value that decays toward an `alpha_target` each tick; every force
//! scales its velocity contribution by the current alpha, so the layout cools
//! into a stable arrangement instead of oscillating forever. Interaction
//! reheats the simulation by raising the target.

use std::collections::HashMap;
use std::f64::consts::PI;

use thiserror::Error;

use super::quadtree::QuadTree;
use super::types::GraphData;

/// Minimum alpha; at or below this the simulation stops auto-advancing.
const ALPHA_MIN: f64 = 0.001;
/// Per-tick convergence rate toward `alpha_target`, approximately
/// `1 - 0.001^(1/300)`: a fresh simulation (alpha 1.0, target 0) settles in
/// roughly 300 ticks.
const ALPHA_DECAY: f64 = 0.022_8;
/// Alpha target raised while a node is being dragged.
const ALPHA_REHEAT: f64 = 0.3;
/// Velocity retained across ticks; the rest is damping.
const VELOCITY_DECAY: f64 = 0.6;

/// Target separation for linked nodes, in world units.
const LINK_DISTANCE: f64 = 120.0;
/// Fraction of the separation error corrected per tick (relaxation, not a
/// rigid constraint).
const LINK_STRENGTH: f64 = 0.3;
/// Per-node charge; negative repels.
const CHARGE_STRENGTH: f64 = -300.0;
/// Gap kept between node circles on top of their radii.
const COLLISION_PADDING: f64 = 5.0;
/// Fraction of an overlap corrected per endpoint per tick.
const COLLISION_STRENGTH: f64 = 0.5;
/// Default node radius when the input carries none.
const DEFAULT_NODE_SIZE: f64 = 10.0;
/// Radius of the deterministic initial circle layout.
const INITIAL_RADIUS: f64 = 100.0;

/// Errors that reject an entire graph load at setup time.
///
/// Deliberately stricter than the normalizer: malformed raw rows are skipped
/// with a warning upstream, but a link naming a node that does not exist in
/// an otherwise well-formed graph means the data is inconsistent, and no
/// partial simulation is started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphSetupError {
	/// A link endpoint does not match any node id.
	#[error("link endpoint `{0}` does not resolve to a known node id")]
	UnresolvedEndpoint(String),
	/// Two nodes share the same id.
	#[error("duplicate node id `{0}`")]
	DuplicateNodeId(String),
}

/// A node in the simulation arena: display metadata plus kinematic state.
///
/// Positions and velocities are owned exclusively by the simulation; the
/// render layer reads them live each tick, and the interaction layer writes
/// only the pin fields (through [`Simulation::pin`]).
#[derive(Clone, Debug)]
pub struct SimNode {
	pub id: String,
	pub label: String,
	pub node_type: String,
	/// Circle radius in world units.
	pub size: f64,
	/// Explicit color override from the input, if any.
	pub color: Option<String>,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned position. While set, the node is held exactly here each tick
	/// and accumulates no velocity.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
}

impl SimNode {
	fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A link after endpoint resolution: arena indices instead of id strings.
///
/// Resolution is a one-way step at setup; there is no identifier/reference
/// union to keep in sync afterwards.
#[derive(Clone, Debug)]
pub struct ResolvedLink {
	pub source: usize,
	pub target: usize,
	pub rel_type: String,
	/// Stroke-width multiplier. Visual only, no effect on forces.
	pub weight: f64,
}

/// Force-directed simulation over one graph.
#[derive(Debug)]
pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<ResolvedLink>,
	alpha: f64,
	alpha_target: f64,
	tick: u64,
	center_x: f64,
	center_y: f64,
}

impl Simulation {
	/// Builds a simulation from identifier-based graph data.
	///
	/// Nodes start on a deterministic circle around the viewport center, so
	/// no two nodes share a coordinate. A link whose endpoint is missing from
	/// the node set rejects the whole graph.
	pub fn new(data: &GraphData, width: f64, height: f64) -> Result<Self, GraphSetupError> {
		let (center_x, center_y) = (width / 2.0, height / 2.0);
		let count = data.nodes.len().max(1);

		let mut id_to_idx: HashMap<&str, usize> = HashMap::with_capacity(data.nodes.len());
		let mut nodes = Vec::with_capacity(data.nodes.len());
		for (i, node) in data.nodes.iter().enumerate() {
			if id_to_idx.insert(&node.id, i).is_some() {
				return Err(GraphSetupError::DuplicateNodeId(node.id.clone()));
			}
			let angle = (i as f64) * 2.0 * PI / count as f64;
			nodes.push(SimNode {
				id: node.id.clone(),
				label: node.label.clone(),
				node_type: node.node_type.clone(),
				size: node.size.unwrap_or(DEFAULT_NODE_SIZE),
				color: node.color.clone(),
				x: center_x + INITIAL_RADIUS * angle.cos(),
				y: center_y + INITIAL_RADIUS * angle.sin(),
				vx: 0.0,
				vy: 0.0,
				fx: None,
				fy: None,
			});
		}

		let mut links = Vec::with_capacity(data.links.len());
		for link in &data.links {
			let resolve = |id: &String| {
				id_to_idx
					.get(id.as_str())
					.copied()
					.ok_or_else(|| GraphSetupError::UnresolvedEndpoint(id.clone()))
			};
			links.push(ResolvedLink {
				source: resolve(&link.source)?,
				target: resolve(&link.target)?,
				rel_type: link.link_type.clone(),
				weight: link.weight.unwrap_or(1.0),
			});
		}

		Ok(Self {
			nodes,
			links,
			alpha: 1.0,
			alpha_target: 0.0,
			tick: 0,
			center_x,
			center_y,
		})
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[ResolvedLink] {
		&self.links
	}

	/// Current simulation energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Completed tick count.
	pub fn tick_count(&self) -> u64 {
		self.tick
	}

	/// True once alpha has decayed below the stop threshold with no reheat
	/// pending. A settled simulation no-ops on [`Simulation::step`].
	pub fn is_settled(&self) -> bool {
		self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
	}

	/// Raises the alpha target so the simulation stays live during
	/// interaction. Idempotent while a drag is in progress.
	pub fn reheat(&mut self) {
		self.alpha_target = ALPHA_REHEAT;
	}

	/// Returns the alpha target to zero; the simulation decays back to
	/// settled under normal dynamics.
	pub fn cool(&mut self) {
		self.alpha_target = 0.0;
	}

	/// Pins a node at the given position. Until unpinned it is held exactly
	/// there every tick, regardless of force magnitudes.
	pub fn pin(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.fx = Some(x);
			node.fy = Some(y);
		}
	}

	/// Releases a pinned node back into free dynamics at its pin position.
	pub fn unpin(&mut self, idx: usize) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// Advances the simulation one tick and returns the new tick number, or
	/// `None` if the simulation is settled and nothing moved.
	///
	/// Subscribers are expected to read node state live after each tick; no
	/// copies are pushed.
	pub fn step(&mut self) -> Option<u64> {
		if self.is_settled() || self.nodes.is_empty() {
			return None;
		}

		self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;

		self.apply_link_force();
		self.apply_many_body_force();
		self.apply_collision_force();

		for node in &mut self.nodes {
			match (node.fx, node.fy) {
				(Some(fx), Some(fy)) => {
					node.x = fx;
					node.y = fy;
					node.vx = 0.0;
					node.vy = 0.0;
				}
				_ => {
					node.vx *= VELOCITY_DECAY;
					node.vy *= VELOCITY_DECAY;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
		}

		// Centering acts on positions after integration so pinned nodes are
		// not dragged off their pin: the shift skips them.
		self.apply_center_force();

		self.tick += 1;
		Some(self.tick)
	}

	/// Relaxation step pulling linked endpoints toward [`LINK_DISTANCE`].
	fn apply_link_force(&mut self) {
		for link in &self.links {
			let (s, t) = (link.source, link.target);
			let dx = (self.nodes[t].x + self.nodes[t].vx) - (self.nodes[s].x + self.nodes[s].vx);
			let dy = (self.nodes[t].y + self.nodes[t].vy) - (self.nodes[s].y + self.nodes[s].vy);
			let dist = (dx * dx + dy * dy).sqrt().max(1e-6);
			let correction = (dist - LINK_DISTANCE) / dist * LINK_STRENGTH * self.alpha;
			let (fx, fy) = (dx * correction * 0.5, dy * correction * 0.5);

			self.nodes[s].vx += fx;
			self.nodes[s].vy += fy;
			self.nodes[t].vx -= fx;
			self.nodes[t].vy -= fy;
		}
	}

	/// Mutual inverse-square repulsion, Barnes-Hut approximated.
	fn apply_many_body_force(&mut self) {
		let bodies: Vec<(f64, f64, f64)> = self.nodes.iter().map(|n| (n.x, n.y, 1.0)).collect();
		let tree = QuadTree::build(&bodies);

		for (i, node) in self.nodes.iter_mut().enumerate() {
			let (fx, fy) = tree.force_on(i, node.x, node.y, CHARGE_STRENGTH);
			node.vx += fx * self.alpha;
			node.vy += fy * self.alpha;
		}
	}

	/// Nudges overlapping node circles apart proportional to their overlap.
	/// Iterative: residual overlap after one tick shrinks on the next.
	fn apply_collision_force(&mut self) {
		let n = self.nodes.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let ri = self.nodes[i].size + COLLISION_PADDING;
				let rj = self.nodes[j].size + COLLISION_PADDING;
				let min_dist = ri + rj;

				let mut dx = self.nodes[j].x - self.nodes[i].x;
				let mut dy = self.nodes[j].y - self.nodes[i].y;
				let mut d2 = dx * dx + dy * dy;
				if d2 >= min_dist * min_dist {
					continue;
				}
				if d2 == 0.0 {
					// Coincident centers: separate along a fixed axis.
					dx = 1e-6;
					dy = 0.0;
					d2 = dx * dx;
				}
				let dist = d2.sqrt();
				let overlap = (min_dist - dist) / dist * COLLISION_STRENGTH;
				let (px, py) = (dx * overlap, dy * overlap);

				self.nodes[i].vx -= px;
				self.nodes[i].vy -= py;
				self.nodes[j].vx += px;
				self.nodes[j].vy += py;
			}
		}
	}

	/// Shifts free nodes so their centroid sits on the viewport center.
	fn apply_center_force(&mut self) {
		let free = self.nodes.iter().filter(|n| !n.is_pinned()).count();
		if free == 0 {
			return;
		}
		let (mut sx, mut sy) = (0.0, 0.0);
		for node in self.nodes.iter().filter(|n| !n.is_pinned()) {
			sx += node.x;
			sy += node.y;
		}
		let (shift_x, shift_y) = (sx / free as f64 - self.center_x, sy / free as f64 - self.center_y);
		for node in self.nodes.iter_mut().filter(|n| !n.is_pinned()) {
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}
}
