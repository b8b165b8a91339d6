//! relgraph: Interactive force-directed visualization for knowledge graphs.
//!
//! This crate renders a knowledge graph (nodes and typed relationships) as a
//! physics-based layout on an HTML canvas. Graph data is fetched from a URL
//! and accepted in either of two schemas: raw graph-database export rows
//! (normalized on load) or the internal `{nodes, links}` form.

use std::cell::Cell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

pub mod components;

pub use components::force_graph::{
	ForceGraphCanvas, GraphData, GraphLink, GraphNode, GraphSetupError, Simulation, normalize,
	parse_graph,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("relgraph: logging initialized");
}

/// Fetches and parses graph data from `url`.
///
/// Transport failures, non-success statuses, and unreadable bodies each
/// surface as a single logged diagnostic and `None`; the caller keeps its
/// prior (or empty) state.
async fn fetch_graph_data(url: &str) -> Option<GraphData> {
	let window = web_sys::window()?;
	let response = match JsFuture::from(window.fetch_with_str(url)).await {
		Ok(r) => r,
		Err(e) => {
			warn!("relgraph: fetch of {url} failed: {e:?}");
			return None;
		}
	};
	let Ok(response) = response.dyn_into::<Response>() else {
		warn!("relgraph: fetch of {url} did not yield a Response");
		return None;
	};
	if !response.ok() {
		warn!("relgraph: fetch of {url} returned status {}", response.status());
		return None;
	}
	let text = match response.text().map(JsFuture::from) {
		Ok(fut) => fut.await.ok().and_then(|t| t.as_string()),
		Err(_) => None,
	};
	let Some(text) = text else {
		warn!("relgraph: failed to read response body from {url}");
		return None;
	};

	let data = parse_graph(&text)?;
	info!(
		"relgraph: loaded {} nodes, {} links from {url}",
		data.nodes.len(),
		data.links.len()
	);
	Some(data)
}

/// Fetches graph data whenever `data_url` changes and feeds it to the canvas.
///
/// Each load captures a generation token; a stale in-flight response for a
/// previous URL is discarded instead of overwriting a newer load.
#[component]
pub fn GraphView(#[prop(into)] data_url: Signal<String>) -> impl IntoView {
	let (data, set_data) = signal(GraphData::default());
	let generation: Rc<Cell<u64>> = Rc::new(Cell::new(0));

	Effect::new(move |_| {
		let url = data_url.get();
		let generation = generation.clone();
		let token = generation.get() + 1;
		generation.set(token);

		spawn_local(async move {
			let fetched = fetch_graph_data(&url).await;
			if generation.get() != token {
				info!("relgraph: discarding stale load of {url}");
				return;
			}
			if let Some(fetched) = fetched {
				set_data.set(fetched);
			}
		});
	});

	view! { <ForceGraphCanvas data=data fullscreen=true /> }
}

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Knowledge Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<GraphView data_url="/data/graph.json".to_string() />
			<div class="graph-overlay">
				<h1>"Knowledge Graph"</h1>
				<p class="subtitle">"Drag nodes to reposition. Scroll to zoom. Drag background to pan."</p>
			</div>
		</div>
	}
}
