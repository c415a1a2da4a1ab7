//! Declarative nodes and edges, placed inside `<NetworkCanvas>`.

use leptos::callback::UnsyncCallback;
use leptos::prelude::*;
use log::warn;

use super::component::NetworkContext;
use super::types::{ChildDescriptor, EdgeDescriptor, NodeDescriptor, Position, SelectHandler};

/// A node of the enclosing network.
///
/// `label`, `color` and `image` follow their signals after registration;
/// the rest is read once. After the user drags the node, its new
/// coordinates are written to `position`.
#[component]
pub fn NetworkNode(
	/// Unique among the network's nodes.
	#[prop(into)]
	node_id: String,
	/// Text under the node.
	#[prop(optional, into)]
	label: MaybeProp<String>,
	/// CSS color; unset or empty falls back to the palette.
	#[prop(optional, into)]
	color: MaybeProp<String>,
	/// Image URL; draws the node as that image.
	#[prop(optional, into)]
	image: MaybeProp<String>,
	/// Initial x.
	#[prop(optional)]
	x: Option<f64>,
	/// Initial y.
	#[prop(optional)]
	y: Option<f64>,
	/// Weight, which scales the node.
	#[prop(optional)]
	value: Option<f64>,
	/// Called with the id and event when the engine selects this node.
	#[prop(optional, into)]
	on_select: Option<SelectHandler>,
	/// Receives the position after a drag.
	#[prop(optional)]
	position: Option<RwSignal<Option<Position>>>,
) -> impl IntoView {
	let Some(network) = use_context::<NetworkContext>() else {
		warn!("network: <NetworkNode {node_id}> outside of <NetworkCanvas>");
		return;
	};

	let descriptor = NodeDescriptor {
		id: node_id.clone(),
		label: label.get_untracked(),
		color: color.get_untracked(),
		x,
		y,
		value,
		image: image.get_untracked(),
		on_select,
		on_position: position.map(|position| {
			UnsyncCallback::new(move |p: Position| position.set(Some(p)))
		}),
	};
	let registered = network
		.handle()
		.is_some_and(|handle| handle.register_child(ChildDescriptor::Node(descriptor)));

	let id = node_id.clone();
	Effect::new(move |prev: Option<()>| {
		let label = label.get();
		if prev.is_none() {
			return;
		}
		if let Some(handle) = network.handle() {
			handle.update_node_label(&id, label.as_deref());
		}
	});

	let id = node_id.clone();
	Effect::new(move |prev: Option<()>| {
		let color = color.get();
		if prev.is_none() {
			return;
		}
		if let Some(handle) = network.handle() {
			handle.update_node_color(&id, color.as_deref());
		}
	});

	let id = node_id.clone();
	Effect::new(move |prev: Option<()>| {
		let image = image.get();
		if prev.is_none() {
			return;
		}
		if let Some(handle) = network.handle() {
			handle.update_node_image(&id, image.as_deref());
		}
	});

	// A rejected duplicate must not take the first child's record with it.
	on_cleanup(move || {
		if let Some(handle) = network.handle().filter(|_| registered) {
			handle.unregister_child(&ChildDescriptor::Node(NodeDescriptor::new(node_id)));
		}
	});
}

/// An edge of the enclosing network. `arrows` follows its signal, e.g.
/// `"to"` or `"to,from"`.
#[component]
pub fn NetworkEdge(
	/// Unique among the network's edges.
	#[prop(into)]
	edge_id: String,
	/// Start node id.
	#[prop(into)]
	from: String,
	/// End node id.
	#[prop(into)]
	to: String,
	/// Arrow placement.
	#[prop(optional, into)]
	arrows: MaybeProp<String>,
	/// CSS color.
	#[prop(optional, into)]
	color: Option<String>,
	/// Weight, which widens the edge.
	#[prop(optional)]
	value: Option<f64>,
) -> impl IntoView {
	let Some(network) = use_context::<NetworkContext>() else {
		warn!("network: <NetworkEdge {edge_id}> outside of <NetworkCanvas>");
		return;
	};

	let descriptor = EdgeDescriptor {
		arrows: arrows.get_untracked(),
		color,
		value,
		..EdgeDescriptor::new(edge_id.clone(), from, to)
	};
	let registered = network
		.handle()
		.is_some_and(|handle| handle.register_child(ChildDescriptor::Edge(descriptor)));

	let id = edge_id.clone();
	Effect::new(move |prev: Option<()>| {
		let arrows = arrows.get();
		if prev.is_none() {
			return;
		}
		if let Some(handle) = network.handle() {
			handle.update_edge_arrow(&id, arrows.as_deref());
		}
	});

	on_cleanup(move || {
		if let Some(handle) = network.handle().filter(|_| registered) {
			handle.unregister_child(&ChildDescriptor::Edge(EdgeDescriptor::new(edge_id, "", "")));
		}
	});
}
