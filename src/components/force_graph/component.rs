//! Leptos component wrapping the force-directed graph canvas.
//!
//! The component creates an HTML canvas element and wires up mouse/wheel
//! event handlers for node dragging, panning, and zooming. An animation loop
//! runs via `requestAnimationFrame`, advancing the physics simulation and
//! redrawing each frame. All state lives in a single `GraphState` behind an
//! `Rc<RefCell>`; tick and pointer events interleave on the one browser
//! thread, so a drag's pin update is always visible to the next tick.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::GraphState;
use super::types::GraphData;

/// What the setup effect must do with the animation loop on this run.
///
/// The frame closure is built exactly once per mount. Rebuilding it on a data
/// reload would drop the old closure while a scheduled frame still references
/// its JS shim, and firing that frame throws instead of ticking.
#[derive(Debug, PartialEq, Eq)]
enum LoopAction {
	/// First run: build the frame closure and schedule the first frame.
	Install,
	/// The loop stopped earlier; schedule a frame with the existing closure.
	Kick,
	/// A frame is already pending; the running chain picks up the new state.
	Reuse,
}

fn loop_action(closure_installed: bool, frame_pending: bool) -> LoopAction {
	if !closure_installed {
		LoopAction::Install
	} else if !frame_pending {
		LoopAction::Kick
	} else {
		LoopAction::Reuse
	}
}

/// Renders an interactive force-directed graph on a canvas element.
///
/// Pass graph data via the reactive `data` signal; each change tears the
/// previous simulation down and starts a fresh layout. The component sizes
/// itself to its parent container by default; set `fullscreen = true` to fill
/// the viewport and resize automatically with the window.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<GraphState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	// True while a frame is scheduled; keeps a data reload from starting a
	// second rAF chain over the same state.
	let frame_pending: Rc<Cell<bool>> = Rc::new(Cell::new(false));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	let frame_pending_init = frame_pending.clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		// A fatal setup error (unresolvable link, duplicate id) leaves the
		// view empty rather than starting a partial simulation.
		*state_init.borrow_mut() = match GraphState::new(&data.get(), w, h) {
			Ok(s) => Some(s),
			Err(e) => {
				warn!("relgraph: rejecting graph: {e}");
				None
			}
		};

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let action = loop_action(animate_init.borrow().is_some(), frame_pending_init.get());
		if action == LoopAction::Install {
			let ctx: CanvasRenderingContext2d = canvas
				.get_context("2d")
				.unwrap()
				.unwrap()
				.dyn_into()
				.unwrap();

			let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
			let frame_pending_anim = frame_pending_init.clone();
			*animate_init.borrow_mut() = Some(Closure::new(move || {
				frame_pending_anim.set(false);
				let mut keep_going = false;
				if let Some(ref mut s) = *state_anim.borrow_mut() {
					if s.animation_running {
						s.tick();
						render::render(s, &ctx);
						keep_going = true;
					}
				}
				if keep_going {
					if let Some(ref cb) = *animate_inner.borrow() {
						frame_pending_anim.set(true);
						let _ = web_sys::window()
							.unwrap()
							.request_animation_frame(cb.as_ref().unchecked_ref());
					}
				}
			}));
		}
		if action != LoopAction::Reuse {
			if let Some(ref cb) = *animate_init.borrow() {
				frame_pending_init.set(true);
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}
	});

	// Stop the tick loop on unmount; no further frames are scheduled once
	// animation_running drops.
	let state_cleanup = send_wrapper::SendWrapper::new(state.clone());
	on_cleanup(move || {
		if let Some(ref mut s) = *state_cleanup.borrow_mut() {
			s.animation_running = false;
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.begin_drag(idx, x, y);
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.drag.active {
				s.drag_to(x, y);
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.end_drag();
			s.pan.active = false;
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.end_drag();
			s.pan.active = false;
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_run_installs_the_frame_closure() {
		assert_eq!(loop_action(false, false), LoopAction::Install);
	}

	#[test]
	fn reload_with_frame_pending_keeps_the_running_chain() {
		// A data reload arriving mid-animation must not rebuild the frame
		// closure or schedule a second chain; the pending frame already ticks
		// the replaced state.
		assert_eq!(loop_action(true, true), LoopAction::Reuse);
	}

	#[test]
	fn reload_after_loop_stopped_reschedules_without_reinstalling() {
		assert_eq!(loop_action(true, false), LoopAction::Kick);
	}
}
