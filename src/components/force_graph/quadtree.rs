//! Barnes-Hut quadtree for the many-body repulsion force.
//!
//! Exact many-body repulsion is O(n²) per tick. The quadtree groups distant
//! nodes into aggregate cells carrying a center of mass, so a single
//! cell-level interaction stands in for all of its members. With the opening
//! criterion `cell_width / distance < theta` the per-node cost drops to
//! O(log n), keeping one simulation tick near O(n log n) overall.

/// A square region of the plane, given by its center and full width.
#[derive(Clone, Copy, Debug)]
struct Quad {
	cx: f64,
	cy: f64,
	width: f64,
}

impl Quad {
	/// Quadrant index (0 = NW, 1 = NE, 2 = SW, 3 = SE) containing (x, y).
	fn quadrant(&self, x: f64, y: f64) -> usize {
		let east = x >= self.cx;
		let south = y >= self.cy;
		(south as usize) * 2 + east as usize
	}

	fn child(&self, quadrant: usize) -> Quad {
		let w = self.width / 2.0;
		let (dx, dy) = (
			if quadrant % 2 == 0 { -w / 2.0 } else { w / 2.0 },
			if quadrant < 2 { -w / 2.0 } else { w / 2.0 },
		);
		Quad {
			cx: self.cx + dx,
			cy: self.cy + dy,
			width: w,
		}
	}
}

/// A tree cell: either an aggregate over children or a leaf holding one body.
#[derive(Clone, Debug)]
struct Cell {
	quad: Quad,
	/// Center of mass over all bodies below this cell.
	mass_x: f64,
	mass_y: f64,
	mass: f64,
	/// Child cell indices by quadrant; `usize::MAX` marks an empty slot.
	children: [usize; 4],
	/// Body index for leaf cells.
	body: Option<usize>,
}

const NO_CHILD: usize = usize::MAX;

impl Cell {
	fn new(quad: Quad) -> Self {
		Self {
			quad,
			mass_x: 0.0,
			mass_y: 0.0,
			mass: 0.0,
			children: [NO_CHILD; 4],
			body: None,
		}
	}

	fn is_leaf(&self) -> bool {
		self.children == [NO_CHILD; 4]
	}
}

/// Barnes-Hut quadtree over a set of point masses.
pub struct QuadTree {
	cells: Vec<Cell>,
	/// Squared opening threshold; a cell is treated as a single body when
	/// `width² < theta² × distance²`.
	theta2: f64,
	/// Lower clamp on squared distance, preventing singular forces between
	/// near-coincident bodies.
	min_distance2: f64,
}

/// Opening angle. 0.9 trades a little accuracy for speed; forces on a node
/// from a far-away cluster are approximated by the cluster's center of mass.
const THETA: f64 = 0.9;

impl QuadTree {
	/// Builds a tree over `(x, y, mass)` bodies. Bodies with non-finite
	/// coordinates would corrupt the bounds and are assumed absent.
	pub fn build(bodies: &[(f64, f64, f64)]) -> Self {
		let mut tree = Self {
			cells: Vec::with_capacity(bodies.len() * 2),
			theta2: THETA * THETA,
			min_distance2: 1.0,
		};
		if bodies.is_empty() {
			return tree;
		}

		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &(x, y, _) in bodies {
			min_x = min_x.min(x);
			min_y = min_y.min(y);
			max_x = max_x.max(x);
			max_y = max_y.max(y);
		}
		let width = (max_x - min_x).max(max_y - min_y).max(1e-9);
		let root = Quad {
			cx: (min_x + max_x) / 2.0,
			cy: (min_y + max_y) / 2.0,
			// Slightly padded so boundary bodies fall strictly inside.
			width: width * 1.0001,
		};
		tree.cells.push(Cell::new(root));

		for (i, &(x, y, mass)) in bodies.iter().enumerate() {
			tree.insert(0, i, x, y, mass, 0);
		}
		tree
	}

	fn insert(&mut self, cell: usize, body: usize, x: f64, y: f64, mass: f64, depth: usize) {
		// Aggregate center of mass on the way down.
		let total = self.cells[cell].mass + mass;
		self.cells[cell].mass_x =
			(self.cells[cell].mass_x * self.cells[cell].mass + x * mass) / total;
		self.cells[cell].mass_y =
			(self.cells[cell].mass_y * self.cells[cell].mass + y * mass) / total;
		self.cells[cell].mass = total;

		// Depth cap: coincident bodies would otherwise split forever. The
		// cell simply aggregates them; repulsion between them is handled by
		// the caller's minimum-distance clamp.
		if depth > 48 {
			return;
		}

		if self.cells[cell].is_leaf() {
			match self.cells[cell].body {
				None => {
					self.cells[cell].body = Some(body);
					return;
				}
				Some(existing) => {
					// Split: push the resident body down, then fall through
					// to place the new one.
					let (ex, ey) = (self.cells[cell].mass_x, self.cells[cell].mass_y);
					// Resident position is recovered exactly only while the
					// cell holds a single body; at this point mass_x/mass_y
					// already include the new body, so recompute.
					let old_mass = self.cells[cell].mass - mass;
					let (ox, oy) = (
						(ex * self.cells[cell].mass - x * mass) / old_mass,
						(ey * self.cells[cell].mass - y * mass) / old_mass,
					);
					self.cells[cell].body = None;
					self.push_down(cell, existing, ox, oy, old_mass, depth);
				}
			}
		}
		self.push_down(cell, body, x, y, mass, depth);
	}

	fn push_down(&mut self, cell: usize, body: usize, x: f64, y: f64, mass: f64, depth: usize) {
		let quadrant = self.cells[cell].quad.quadrant(x, y);
		let child = self.cells[cell].children[quadrant];
		let child = if child == NO_CHILD {
			let quad = self.cells[cell].quad.child(quadrant);
			self.cells.push(Cell::new(quad));
			let idx = self.cells.len() - 1;
			self.cells[cell].children[quadrant] = idx;
			idx
		} else {
			child
		};
		self.insert(child, body, x, y, mass, depth + 1);
	}

	/// Accumulated inverse-square force on the body at `(x, y)` with index
	/// `body`, excluding self-interaction. `strength` is the per-unit-mass
	/// charge; negative values repel. Returns a velocity delta `(dvx, dvy)`.
	pub fn force_on(&self, body: usize, x: f64, y: f64, strength: f64) -> (f64, f64) {
		if self.cells.is_empty() {
			return (0.0, 0.0);
		}
		let (mut fx, mut fy) = (0.0, 0.0);
		let mut stack = vec![0usize];
		while let Some(idx) = stack.pop() {
			let cell = &self.cells[idx];
			if cell.mass == 0.0 {
				continue;
			}
			let dx = cell.mass_x - x;
			let dy = cell.mass_y - y;
			let d2 = dx * dx + dy * dy;
			let open = cell.quad.width * cell.quad.width >= self.theta2 * d2;

			if cell.is_leaf() || !open {
				if cell.is_leaf() && cell.body == Some(body) {
					continue;
				}
				let d2 = d2.max(self.min_distance2);
				let f = strength * cell.mass / d2;
				let d = d2.sqrt();
				fx += f * dx / d;
				fy += f * dy / d;
			} else {
				for &child in &cell.children {
					if child != NO_CHILD {
						stack.push(child);
					}
				}
			}
		}
		// Positive strength pulls toward mass; callers pass negative
		// strength for repulsion.
		(fx, fy)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn two_bodies_repel_along_their_axis() {
		let bodies = [(0.0, 0.0, 1.0), (10.0, 0.0, 1.0)];
		let tree = QuadTree::build(&bodies);

		let (fx, fy) = tree.force_on(0, 0.0, 0.0, -100.0);
		assert!(fx < 0.0, "left body pushed further left, got fx = {fx}");
		assert!(fy.abs() < 1e-9);

		let (fx, _) = tree.force_on(1, 10.0, 0.0, -100.0);
		assert!(fx > 0.0, "right body pushed further right, got fx = {fx}");
	}

	#[test]
	fn force_magnitude_falls_with_distance() {
		let near = QuadTree::build(&[(0.0, 0.0, 1.0), (10.0, 0.0, 1.0)]);
		let far = QuadTree::build(&[(0.0, 0.0, 1.0), (100.0, 0.0, 1.0)]);

		let (fx_near, _) = near.force_on(0, 0.0, 0.0, -100.0);
		let (fx_far, _) = far.force_on(0, 0.0, 0.0, -100.0);
		assert!(fx_near.abs() > fx_far.abs());
	}

	#[test]
	fn approximation_tracks_exact_summation() {
		// Scattered cluster far from the probe: the aggregate cell force
		// should be close to exhaustive pairwise summation.
		let mut bodies = vec![(0.0, 0.0, 1.0)];
		for i in 0..16 {
			let (i, j) = ((i % 4) as f64, (i / 4) as f64);
			bodies.push((1000.0 + i * 10.0, 500.0 + j * 10.0, 1.0));
		}
		let tree = QuadTree::build(&bodies);
		let (fx, fy) = tree.force_on(0, 0.0, 0.0, -100.0);

		let (mut ex, mut ey) = (0.0, 0.0);
		for &(x, y, m) in &bodies[1..] {
			let (dx, dy) = (x, y);
			let d2: f64 = dx * dx + dy * dy;
			let d = d2.sqrt();
			let f = -100.0 * m / d2;
			ex += f * dx / d;
			ey += f * dy / d;
		}

		assert!((fx - ex).abs() < ex.abs() * 0.1 + 1e-12);
		assert!((fy - ey).abs() < ey.abs() * 0.1 + 1e-12);
	}

	#[test]
	fn coincident_bodies_do_not_overflow() {
		let bodies = [(5.0, 5.0, 1.0), (5.0, 5.0, 1.0), (5.0, 5.0, 1.0)];
		let tree = QuadTree::build(&bodies);
		let (fx, fy) = tree.force_on(0, 5.0, 5.0, -100.0);
		assert!(fx.is_finite() && fy.is_finite());
	}

	#[test]
	fn empty_tree_exerts_no_force() {
		let tree = QuadTree::build(&[]);
		assert_eq!(tree.force_on(0, 1.0, 2.0, -100.0), (0.0, 0.0));
	}
}
