//! Node and edge data as seen by the network: the descriptors built by child
//! components and the simplified records stored in the collections.

use leptos::callback::UnsyncCallback;
use serde::{Deserialize, Serialize};

use super::dataset::Keyed;
use super::events::NetworkEvent;

/// A point in graph (world) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	#[allow(missing_docs)]
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// How a node is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
	/// Filled circle sized by `value`.
	#[default]
	Ellipse,
	/// The node's `image`.
	Image,
}

/// Simplified node as stored in the node collection.
///
/// Every optional attribute is omitted when absent, so the serialized form
/// only carries what the child actually set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	/// Unique key.
	pub id: String,
	/// Text drawn under the node.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	/// CSS color; a palette color when unset.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	/// Initial x in graph coordinates.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x: Option<f64>,
	/// Initial y in graph coordinates.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub y: Option<f64>,
	/// Weight; larger nodes are drawn bigger.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<f64>,
	/// Set to `Image` whenever `image` is.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub shape: Option<Shape>,
	/// Image URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
}

impl NodeRecord {
	/// Shape used for drawing, falling back to the default when unset.
	pub fn shape(&self) -> Shape {
		self.shape.unwrap_or_default()
	}
}

impl Keyed for NodeRecord {
	fn key(&self) -> &str {
		&self.id
	}
}

/// Simplified edge as stored in the edge collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
	/// Unique key.
	pub id: String,
	/// Start node id.
	pub from: String,
	/// End node id.
	pub to: String,
	/// Arrow placement, e.g. `"to"`, `"from"`, `"to, from"` or `"middle"`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub arrows: Option<String>,
	/// Weight; heavier edges are drawn wider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<f64>,
	/// CSS color.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
}

impl EdgeRecord {
	/// Whether `arrows` names `end`, e.g. `"to"`.
	pub fn has_arrow(&self, end: &str) -> bool {
		self.arrows
			.as_deref()
			.is_some_and(|a| a.split(',').any(|part| part.trim() == end))
	}
}

impl Keyed for EdgeRecord {
	fn key(&self) -> &str {
		&self.id
	}
}

/// Bulk graph data, an alternative to composing child elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct NetworkData {
	#[serde(default)]
	pub nodes: Vec<NodeRecord>,
	#[serde(default)]
	pub edges: Vec<EdgeRecord>,
}

/// Handler invoked when the engine selects this node: `(id, raw event)`.
pub type SelectHandler = UnsyncCallback<(String, NetworkEvent)>;

/// Receives the coordinates reported for this node after a drag.
pub type PositionHandler = UnsyncCallback<Position>;

/// A node as declared by a child element. Attributes mean what they mean
/// on [`NodeRecord`].
#[derive(Clone, Default)]
#[allow(missing_docs)]
pub struct NodeDescriptor {
	pub id: String,
	pub label: Option<String>,
	pub color: Option<String>,
	pub x: Option<f64>,
	pub y: Option<f64>,
	pub value: Option<f64>,
	pub image: Option<String>,
	pub on_select: Option<SelectHandler>,
	pub on_position: Option<PositionHandler>,
}

impl NodeDescriptor {
	/// A node with only an id.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	/// Builds the record inserted into the node collection.
	pub fn to_record(&self) -> NodeRecord {
		let mut record = NodeRecord {
			id: self.id.clone(),
			label: non_empty(self.label.as_deref()),
			color: non_empty(self.color.as_deref()),
			x: self.x,
			y: self.y,
			value: self.value,
			..Default::default()
		};
		if let Some(image) = non_empty(self.image.as_deref()) {
			record.shape = Some(Shape::Image);
			record.image = Some(image);
		}
		record
	}
}

impl std::fmt::Debug for NodeDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NodeDescriptor")
			.field("id", &self.id)
			.field("label", &self.label)
			.field("x", &self.x)
			.field("y", &self.y)
			.finish_non_exhaustive()
	}
}

/// An edge as declared by a child element. Attributes mean what they mean
/// on [`EdgeRecord`].
#[derive(Clone, Debug, Default, PartialEq)]
#[allow(missing_docs)]
pub struct EdgeDescriptor {
	pub id: String,
	pub from: String,
	pub to: String,
	pub arrows: Option<String>,
	pub value: Option<f64>,
	pub color: Option<String>,
}

impl EdgeDescriptor {
	/// An edge with only its id and endpoints.
	pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			from: from.into(),
			to: to.into(),
			..Default::default()
		}
	}

	/// Builds the record inserted into the edge collection.
	pub fn to_record(&self) -> EdgeRecord {
		EdgeRecord {
			id: self.id.clone(),
			from: self.from.clone(),
			to: self.to.clone(),
			arrows: non_empty(self.arrows.as_deref()),
			// A zero edge weight counts as unset; node weights keep it.
			value: self.value.filter(|value| *value != 0.0),
			color: non_empty(self.color.as_deref()),
		}
	}
}

/// A child element composed into the network, tagged by kind.
#[derive(Clone, Debug)]
pub enum ChildDescriptor {
	/// A `<NetworkNode>`.
	Node(NodeDescriptor),
	/// A `<NetworkEdge>`.
	Edge(EdgeDescriptor),
	/// Any other child; carries its type tag for diagnostics.
	Other(String),
}

impl ChildDescriptor {
	/// `"node"`, `"edge"` or the foreign type tag.
	pub fn kind(&self) -> &str {
		match self {
			ChildDescriptor::Node(_) => "node",
			ChildDescriptor::Edge(_) => "edge",
			ChildDescriptor::Other(kind) => kind,
		}
	}

	/// Id of a node or edge child.
	pub fn id(&self) -> Option<&str> {
		match self {
			ChildDescriptor::Node(n) => Some(&n.id),
			ChildDescriptor::Edge(e) => Some(&e.id),
			ChildDescriptor::Other(_) => None,
		}
	}
}

/// Empty strings mean "unset".
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
	value.filter(|v| !v.is_empty()).map(str::to_owned)
}
