//! Keeps the node and edge collections in step with the child elements and
//! the update operations.

use leptos::callback::{Callable, UnsyncCallback};
use log::{debug, warn};

use super::dataset::DataSet;
use super::engine::NetworkEngine;
use super::options::NetworkOptions;
use super::types::{
	ChildDescriptor, EdgeRecord, NetworkData, NodeDescriptor, NodeRecord, Position, Shape,
	non_empty,
};

/// Decides whether an edge drawn by the user is kept. Returning `false`
/// drops it.
pub type EdgeValidator = UnsyncCallback<EdgeRecord, bool>;

/// Owner of the node and edge collections.
#[derive(Default)]
pub struct GraphAdapter {
	nodes: DataSet<NodeRecord>,
	edges: DataSet<EdgeRecord>,
	children: Vec<NodeDescriptor>,
	options: NetworkOptions,
	add_edges: bool,
	edge_added: Option<EdgeValidator>,
	drawn_edges: u64,
}

impl GraphAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodes(&self) -> &DataSet<NodeRecord> {
		&self.nodes
	}

	pub fn edges(&self) -> &DataSet<EdgeRecord> {
		&self.edges
	}

	/// Adds a child's record. Returns `false` when the id is already taken;
	/// the first registration wins.
	pub fn register_child(&mut self, child: ChildDescriptor) -> bool {
		match child {
			ChildDescriptor::Node(node) => {
				if self.nodes.contains(&node.id) {
					warn!("network: duplicate node {}, keeping the first", node.id);
					return false;
				}
				self.nodes.add(node.to_record());
				self.children.push(node);
			}
			ChildDescriptor::Edge(edge) => {
				if self.edges.contains(&edge.id) {
					warn!("network: duplicate edge {}, keeping the first", edge.id);
					return false;
				}
				self.edges.add(edge.to_record());
			}
			ChildDescriptor::Other(kind) => {
				debug!("network: child of type {kind} is not supported");
				return false;
			}
		}
		true
	}

	pub fn unregister_child(&mut self, child: &ChildDescriptor) {
		match child {
			ChildDescriptor::Node(node) => {
				self.nodes.remove(&node.id);
				self.children.retain(|c| c.id != node.id);
			}
			ChildDescriptor::Edge(edge) => {
				self.edges.remove(&edge.id);
			}
			ChildDescriptor::Other(kind) => {
				debug!("network: child of type {kind} is not supported");
			}
		}
	}

	/// The registered child node with this id.
	pub fn node_child(&self, id: &str) -> Option<&NodeDescriptor> {
		self.children.iter().find(|c| c.id == id)
	}

	/// Writes engine coordinates back into the child node, if there is one.
	pub fn move_child(&mut self, id: &str, position: Position) -> Option<&NodeDescriptor> {
		let child = self.children.iter_mut().find(|c| c.id == id)?;
		child.x = Some(position.x);
		child.y = Some(position.y);
		Some(child)
	}

	/// An empty or missing color unsets it.
	pub fn update_node_color(&mut self, id: &str, color: Option<&str>) {
		let color = non_empty(color);
		self.update_node(id, |n| n.color = color);
	}

	/// An empty or missing label unsets it.
	pub fn update_node_label(&mut self, id: &str, label: Option<&str>) {
		let label = non_empty(label);
		self.update_node(id, |n| n.label = label);
	}

	/// An empty or missing image unsets it and restores the default shape.
	pub fn update_node_image(&mut self, id: &str, image: Option<&str>) {
		let image = non_empty(image);
		self.update_node(id, |n| {
			n.shape = Some(if image.is_some() {
				Shape::Image
			} else {
				Shape::Ellipse
			});
			n.image = image;
		});
	}

	pub fn update_edge_arrow(&mut self, id: &str, arrows: Option<&str>) {
		let arrows = non_empty(arrows);
		debug!("network: edge {id} arrows -> {arrows:?}");
		if !self.edges.update(id, |e| e.arrows = arrows) {
			warn!("network: no edge {id} to update");
		}
	}

	fn update_node(&mut self, id: &str, f: impl FnOnce(&mut NodeRecord)) {
		if !self.nodes.update(id, f) {
			warn!("network: no node {id} to update");
		}
	}

	/// Replaces both collections with bulk data.
	pub fn set_data(&mut self, data: NetworkData) {
		debug!(
			"network: loading {} nodes, {} edges",
			data.nodes.len(),
			data.edges.len()
		);
		self.nodes.replace(data.nodes);
		self.edges.replace(data.edges);
	}

	pub fn options(&self) -> &NetworkOptions {
		&self.options
	}

	/// Stores the options and hands them to the engine unchanged.
	pub fn set_options(&mut self, options: NetworkOptions, engine: Option<&mut dyn NetworkEngine>) {
		if let Some(engine) = engine {
			engine.set_options(&options);
		}
		self.options = options;
	}

	pub fn add_edges(&self) -> bool {
		self.add_edges
	}

	pub fn set_add_edges(&mut self, enabled: bool) {
		self.add_edges = enabled;
	}

	pub fn set_edge_validator(&mut self, validator: Option<EdgeValidator>) {
		self.edge_added = validator;
	}

	/// Puts the engine in add-edge mode when the flag is set, otherwise leaves
	/// edit mode.
	pub fn apply_edit_mode(&self, engine: &mut dyn NetworkEngine) {
		if self.add_edges {
			engine.add_edge_mode();
		} else {
			engine.disable_edit_mode();
		}
	}

	/// The record for an edge drawn in add-edge mode, under a fresh
	/// `drawn-N` id. Nothing is stored yet.
	pub fn propose_drawn_edge(&mut self, from: String, to: String) -> EdgeRecord {
		self.drawn_edges += 1;
		let mut id = format!("drawn-{}", self.drawn_edges);
		while self.edges.contains(&id) {
			self.drawn_edges += 1;
			id = format!("drawn-{}", self.drawn_edges);
		}
		EdgeRecord {
			id,
			from,
			to,
			..Default::default()
		}
	}

	pub fn edge_validator(&self) -> Option<EdgeValidator> {
		self.edge_added.clone()
	}

	/// Stores a drawn edge unless it was vetoed. The engine drops out of
	/// add-edge mode after every gesture, so the mode is reapplied afterwards.
	pub fn commit_drawn_edge(
		&mut self,
		edge: EdgeRecord,
		accepted: bool,
		engine: &mut dyn NetworkEngine,
	) -> bool {
		if accepted {
			debug!("network: adding drawn edge {} -> {}", edge.from, edge.to);
			self.edges.add(edge);
		} else {
			debug!("network: drawn edge {} -> {} rejected", edge.from, edge.to);
		}
		self.apply_edit_mode(engine);
		accepted
	}
}

/// Asks the validator, if any, whether to keep a drawn edge.
pub fn accepts_edge(validator: Option<&EdgeValidator>, edge: &EdgeRecord) -> bool {
	validator.is_none_or(|validate| validate.run(edge.clone()))
}
