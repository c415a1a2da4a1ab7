//! Network diagram component.
//!
//! ```ignore
//! let selected = RwSignal::new(Vec::new());
//! view! {
//!     <NetworkCanvas selected_nodes=selected add_edges=true>
//!         <NetworkNode node_id="1" label="Start" />
//!         <NetworkNode node_id="2" label="End" />
//!         <NetworkEdge edge_id="1-2" from="1" to="2" arrows="to" />
//!     </NetworkCanvas>
//! }
//! ```
//!
//! The canvas keeps the node and edge collections, runs the force-directed
//! engine and reports interaction back through the selection bindings, the
//! child callbacks and [`EventActions`].

mod adapter;
mod background;
mod bridge;
mod children;
mod command;
mod component;
mod dataset;
mod engine;
mod events;
mod handle;
mod options;
mod render;
mod state;
mod types;

pub use adapter::EdgeValidator;
pub use bridge::Selection;
pub use children::{NetworkEdge, NetworkNode};
pub use command::{CommandOutput, ExecuteError, NetworkCommand};
pub use component::NetworkCanvas;
pub use events::{DrawAction, EventAction, EventActions, EventKind, NetworkEvent};
pub use handle::NetworkHandle;
pub use options::{FocusOptions, NetworkOptions};
pub use types::{
	ChildDescriptor, EdgeDescriptor, EdgeRecord, NetworkData, NodeDescriptor, NodeRecord,
	Position, PositionHandler, SelectHandler, Shape,
};
