//! Canvas rendering for the force graph.
//!
//! Purely reactive read side of the simulation: each frame reads the current
//! node and link positions out of the live arena and redraws line, circle,
//! and label primitives. No physics and no caching of positions beyond the
//! current tick's values.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::GraphState;

const BACKGROUND_COLOR: &str = "#1a1a2e";
const EDGE_COLOR: &str = "rgba(100, 180, 255, 0.6)";
const LABEL_COLOR: &str = "rgba(255, 255, 255, 0.85)";
const EDGE_BASE_WIDTH: f64 = 1.5;

/// Renders the complete graph to the canvas.
pub fn render(state: &GraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND_COLOR);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	draw_edges(state, ctx);
	draw_nodes(state, ctx);

	ctx.restore();
}

fn draw_edges(state: &GraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	ctx.set_stroke_style_str(EDGE_COLOR);

	for link in state.sim.links() {
		let source = &state.sim.nodes()[link.source];
		let target = &state.sim.nodes()[link.target];
		let (dx, dy) = (target.x - source.x, target.y - source.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		// Link weight scales stroke thickness only; it carries no force.
		ctx.set_line_width(EDGE_BASE_WIDTH * link.weight / k);

		// Trim the line back to the circle rims.
		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(source.x + ux * source.size, source.y + uy * source.size);
		ctx.line_to(target.x - ux * target.size, target.y - uy * target.size);
		ctx.stroke();
	}
}

fn draw_nodes(state: &GraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let label_font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	for (i, node) in state.sim.nodes().iter().enumerate() {
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, node.size, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(state.node_color(i));
		ctx.fill();
	}

	// Labels in a second pass so circles never cover neighboring text.
	ctx.set_fill_style_str(LABEL_COLOR);
	ctx.set_font(&label_font);
	for node in state.sim.nodes() {
		let _ = ctx.fill_text(&node.label, node.x + node.size + 3.0, node.y + 3.0);
	}
}
