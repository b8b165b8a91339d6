//! Force-directed graph visualization component.
//!
//! Renders an interactive force-directed graph on an HTML canvas with:
//! - Physics-based node positioning via an alpha-cooled force simulation
//!   (link attraction, Barnes-Hut repulsion, centering, collision avoidance)
//! - Drag-to-pin node interaction, plus pan and zoom
//! - A normalizer converting graph-database export rows into node/link data
//!
//! # Example
//!
//! ```ignore
//! use relgraph::{ForceGraphCanvas, GraphData, GraphNode, GraphLink};
//!
//! let data = GraphData {
//!     nodes: vec![
//!         GraphNode { id: "1".into(), label: "Alice".into(), .. },
//!         GraphNode { id: "2".into(), label: "Bob".into(), .. },
//!     ],
//!     links: vec![
//!         GraphLink { source: "1".into(), target: "2".into(), .. },
//!     ],
//! };
//!
//! view! { <ForceGraphCanvas data=data.into() fullscreen=true /> }
//! ```

mod component;
pub mod normalize;
mod quadtree;
mod render;
pub mod simulation;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use normalize::{normalize, parse_graph};
pub use simulation::{GraphSetupError, Simulation};
pub use types::{GraphData, GraphLink, GraphNode};
