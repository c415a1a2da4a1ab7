//! Force-directed engine: simulation, view transform and pointer gestures.
//!
//! Nothing in here touches the DOM, drawing lives in `render`.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::dataset::DataSet;
use super::engine::{DrawHook, DrawSlot, NetworkEngine};
use super::events::NetworkEvent;
use super::options::{EngineOptions, FocusOptions, NetworkOptions};
use super::types::{EdgeRecord, NodeRecord, Position};

pub const NODE_RADIUS: f64 = 10.0;
pub const HIT_RADIUS: f64 = 12.0;
/// Edge hit distance in screen pixels.
const EDGE_HIT: f64 = 6.0;
/// Pointer travel in screen pixels before a press turns into a drag.
const DRAG_THRESHOLD: f64 = 3.0;
const PROGRESS_INTERVAL: u32 = 50;
/// Largest per-tick node displacement still considered at rest.
const SETTLED: f32 = 0.05;
const FOCUS_SECONDS: f64 = 0.6;
const MIN_SCALE: f64 = 0.1;
const MAX_SCALE: f64 = 10.0;

fn simulation_parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Drawing radius of a node, grown by its weight.
pub fn node_radius(record: &NodeRecord) -> f64 {
	record
		.value
		.map_or(NODE_RADIUS, |v| (NODE_RADIUS + v.max(0.0)).min(NODE_RADIUS * 3.0))
}

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub record: NodeRecord,
	/// Insertion order, picks the fallback color.
	pub slot: usize,
}

/// An edge as laid out: its record and the simulation indices of its ends.
#[derive(Clone, Debug)]
pub struct LaidOutEdge {
	pub record: EdgeRecord,
	pub from: DefaultNodeIdx,
	pub to: DefaultNodeIdx,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl ViewTransform {
	fn lerp(self, to: ViewTransform, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Rubber band drawn while adding an edge. `x`/`y` is the cursor in graph space.
#[derive(Clone, Debug)]
pub struct PendingEdge {
	pub from: String,
	pub x: f64,
	pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
	#[default]
	Disabled,
	AddEdge,
}

#[derive(Clone, Copy, Debug, Default)]
struct Stabilization {
	active: bool,
	iterations: u32,
}

#[derive(Clone, Copy, Debug)]
struct FocusAnimation {
	from: ViewTransform,
	to: ViewTransform,
	t: f64,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub pending_edge: Option<PendingEdge>,
	pub edit_mode: EditMode,
	pub selected_nodes: Vec<String>,
	pub selected_edges: Vec<String>,
	pub width: f64,
	pub height: f64,
	ids: HashMap<String, DefaultNodeIdx>,
	edges: Vec<LaidOutEdge>,
	options: EngineOptions,
	stabilization: Stabilization,
	focus: Option<FocusAnimation>,
	press: Option<(f64, f64)>,
	hooks: HashMap<DrawSlot, DrawHook>,
	events: Vec<NetworkEvent>,
	synced: Option<(u64, u64)>,
	needs_redraw: bool,
	drawn_once: bool,
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: ForceGraph::new(simulation_parameters()),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			pending_edge: None,
			edit_mode: EditMode::Disabled,
			selected_nodes: Vec::new(),
			selected_edges: Vec::new(),
			width,
			height,
			ids: HashMap::new(),
			edges: Vec::new(),
			options: EngineOptions::default(),
			stabilization: Stabilization::default(),
			focus: None,
			press: None,
			hooks: HashMap::new(),
			events: Vec::new(),
			synced: None,
			needs_redraw: true,
			drawn_once: false,
		}
	}

	/// Rebuilds the simulation if either collection changed since the last
	/// call. Nodes already in the simulation keep their place.
	pub fn sync(&mut self, nodes: &DataSet<NodeRecord>, edges: &DataSet<EdgeRecord>) {
		let revisions = (nodes.revision(), edges.revision());
		if self.synced == Some(revisions) {
			return;
		}
		self.synced = Some(revisions);

		let mut previous = HashMap::new();
		self.graph.visit_nodes(|node| {
			previous.insert(
				node.data.user_data.record.id.clone(),
				(node.x(), node.y(), node.data.is_anchor),
			);
		});

		let mut graph = ForceGraph::new(simulation_parameters());
		let mut ids = HashMap::new();
		let count = nodes.len().max(1);
		for (i, record) in nodes.iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / count as f64;
			let (x, y, is_anchor) = match previous.get(&record.id) {
				Some(&known) => known,
				None => (
					record.x.unwrap_or(100.0 * angle.cos()) as f32,
					record.y.unwrap_or(100.0 * angle.sin()) as f32,
					false,
				),
			};
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor,
				user_data: NodeInfo {
					record: record.clone(),
					slot: i,
				},
			});
			ids.insert(record.id.clone(), idx);
		}

		let mut laid_out = Vec::with_capacity(edges.len());
		for record in edges.iter() {
			let (Some(&from), Some(&to)) = (ids.get(&record.from), ids.get(&record.to)) else {
				debug!(
					"network: edge {} waits for {} -> {}",
					record.id, record.from, record.to
				);
				continue;
			};
			// loops exert no force
			if from != to {
				graph.add_edge(from, to, EdgeData::default());
			}
			laid_out.push(LaidOutEdge {
				record: record.clone(),
				from,
				to,
			});
		}

		self.graph = graph;
		self.ids = ids;
		self.edges = laid_out;
		self.selected_nodes.retain(|id| self.ids.contains_key(id));
		let edges = &self.edges;
		self.selected_edges
			.retain(|id| edges.iter().any(|e| &e.record.id == id));
		if self.drag.node.as_ref().is_some_and(|id| !self.ids.contains_key(id)) {
			self.drag = DragState::default();
		}
		if self
			.pending_edge
			.as_ref()
			.is_some_and(|p| !self.ids.contains_key(&p.from))
		{
			self.pending_edge = None;
		}
		self.needs_redraw = true;
		self.start_stabilizing();
	}

	pub fn edges(&self) -> &[LaidOutEdge] {
		&self.edges
	}

	pub fn hook(&self, slot: DrawSlot) -> Option<&DrawHook> {
		self.hooks.get(&slot)
	}

	pub fn is_stabilizing(&self) -> bool {
		self.stabilization.active
	}

	/// Takes the events raised since the last call.
	pub fn drain_events(&mut self) -> Vec<NetworkEvent> {
		std::mem::take(&mut self.events)
	}

	fn emit(&mut self, event: NetworkEvent) {
		self.events.push(event);
	}

	pub fn node_positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut positions = HashMap::with_capacity(self.ids.len());
		self.graph.visit_nodes(|node| {
			positions.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		positions
	}

	fn position_of(&self, id: &str) -> Option<(f64, f64)> {
		let idx = *self.ids.get(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some((node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node under a screen point.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			let radius = node_radius(&node.data.user_data.record).max(HIT_RADIUS);
			if (dx * dx + dy * dy).sqrt() < radius {
				found = Some(node.data.user_data.record.id.clone());
			}
		});
		found
	}

	/// Closest edge within hit distance of a screen point.
	pub fn edge_at(&self, sx: f64, sy: f64) -> Option<String> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let positions = self.node_positions();
		let limit = EDGE_HIT / self.transform.k;
		let mut best: Option<(f64, &str)> = None;
		for edge in &self.edges {
			if edge.from == edge.to {
				continue;
			}
			let (Some(&(x1, y1)), Some(&(x2, y2))) =
				(positions.get(&edge.from), positions.get(&edge.to))
			else {
				continue;
			};
			let d = segment_distance(gx, gy, x1, y1, x2, y2);
			if d < limit && best.is_none_or(|(b, _)| d < b) {
				best = Some((d, &edge.record.id));
			}
		}
		best.map(|(_, id)| id.to_string())
	}

	fn connected_edges(&self, id: &str) -> Vec<String> {
		let Some(&idx) = self.ids.get(id) else {
			return Vec::new();
		};
		self.edges
			.iter()
			.filter(|e| e.from == idx || e.to == idx)
			.map(|e| e.record.id.clone())
			.collect()
	}

	fn start_stabilizing(&mut self) {
		if !self.options.physics || self.stabilization.active {
			return;
		}
		self.stabilization = Stabilization {
			active: true,
			iterations: 0,
		};
		self.emit(NetworkEvent::StartStabilizing);
	}

	/// Advances physics and any running focus animation by `dt` seconds.
	pub fn tick(&mut self, dt: f32) {
		if let Some(mut anim) = self.focus.take() {
			anim.t = (anim.t + dt as f64 / FOCUS_SECONDS).min(1.0);
			self.transform = anim.from.lerp(anim.to, ease_out_cubic(anim.t));
			if anim.t < 1.0 {
				self.focus = Some(anim);
			}
			self.needs_redraw = true;
		}

		if !self.stabilization.active {
			return;
		}
		if !self.options.physics {
			self.stabilization.active = false;
			return;
		}

		let mut before = HashMap::with_capacity(self.ids.len());
		self.graph.visit_nodes(|node| {
			before.insert(node.index(), (node.x(), node.y()));
		});
		self.graph.update(dt);
		let mut max_step: f32 = 0.0;
		self.graph.visit_nodes(|node| {
			if let Some(&(x, y)) = before.get(&node.index()) {
				let (dx, dy) = (node.x() - x, node.y() - y);
				max_step = max_step.max((dx * dx + dy * dy).sqrt());
			}
		});
		self.needs_redraw = true;

		self.stabilization.iterations += 1;
		let iterations = self.stabilization.iterations;
		let total = self.options.stabilization_iterations.max(1);
		if iterations % PROGRESS_INTERVAL == 0 && iterations < total {
			self.emit(NetworkEvent::StabilizationProgress { iterations, total });
		}
		if iterations == total {
			self.emit(NetworkEvent::StabilizationIterationsDone);
		}
		let settled = max_step < SETTLED && !self.drag.active;
		if settled || iterations >= total {
			self.stabilization.active = false;
			self.emit(NetworkEvent::Stabilized { iterations });
		}
	}

	/// Called once per animation frame before drawing. Returns whether the
	/// frame needs to be drawn.
	pub fn begin_frame(&mut self) -> bool {
		if !self.drawn_once {
			self.drawn_once = true;
			self.emit(NetworkEvent::InitRedraw);
		}
		let draw = self.needs_redraw
			|| self.is_stabilizing()
			|| self.focus.is_some()
			|| self.drag.active;
		self.needs_redraw = false;
		draw
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		let (old_width, old_height) = (self.width, self.height);
		self.width = width;
		self.height = height;
		self.transform.x += (width - old_width) / 2.0;
		self.transform.y += (height - old_height) / 2.0;
		self.needs_redraw = true;
		self.emit(NetworkEvent::Resize {
			width,
			height,
			old_width,
			old_height,
		});
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.press = Some((sx, sy));
		let hit = self.node_at(sx, sy);

		if self.edit_mode == EditMode::AddEdge {
			if let Some(from) = hit {
				let (x, y) = self.screen_to_graph(sx, sy);
				self.pending_edge = Some(PendingEdge { from, x, y });
			}
			return;
		}

		match hit {
			Some(id) if self.options.drag_nodes => {
				let Some((nx, ny)) = self.position_of(&id) else {
					return;
				};
				self.drag = DragState {
					active: false,
					node: Some(id),
					start_x: sx,
					start_y: sy,
					node_start_x: nx as f32,
					node_start_y: ny as f32,
				};
			}
			Some(_) => {}
			None if self.options.drag_view => {
				self.pan = PanState {
					active: true,
					moved: false,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
			}
			None => {}
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.pending_edge.is_some() {
			let (x, y) = self.screen_to_graph(sx, sy);
			if let Some(pending) = self.pending_edge.as_mut() {
				pending.x = x;
				pending.y = y;
			}
			self.needs_redraw = true;
			return;
		}

		let moved = self
			.press
			.is_some_and(|(px, py)| ((sx - px).powi(2) + (sy - py).powi(2)).sqrt() > DRAG_THRESHOLD);

		if let Some(id) = self.drag.node.clone() {
			if moved && !self.drag.active {
				self.drag.active = true;
				self.start_stabilizing();
			}
			if !self.drag.active {
				return;
			}
			let Some(&idx) = self.ids.get(&id) else {
				return;
			};
			let (dx, dy) = (
				(sx - self.drag.start_x) / self.transform.k,
				(sy - self.drag.start_y) / self.transform.k,
			);
			let (nx, ny) = (
				self.drag.node_start_x + dx as f32,
				self.drag.node_start_y + dy as f32,
			);
			self.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.x = nx;
					node.data.y = ny;
					node.data.is_anchor = true;
				}
			});
			self.needs_redraw = true;
		} else if self.pan.active {
			self.pan.moved |= moved;
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			self.needs_redraw = true;
		}
	}

	pub fn pointer_up(&mut self, sx: f64, sy: f64) {
		let pressed = self.press.take().is_some();

		if let Some(pending) = self.pending_edge.take() {
			if let Some(to) = self.node_at(sx, sy) {
				self.emit(NetworkEvent::AddEdgeRequested {
					from: pending.from,
					to,
				});
				// add-edge mode ends with every drawn edge
				self.edit_mode = EditMode::Disabled;
			}
			self.needs_redraw = true;
			return;
		}

		let drag = std::mem::take(&mut self.drag);
		let pan = std::mem::take(&mut self.pan);
		if drag.active {
			self.emit(NetworkEvent::DragEnd {
				nodes: drag.node.into_iter().collect(),
			});
			self.start_stabilizing();
		} else if pan.active && pan.moved {
			self.emit(NetworkEvent::DragEnd { nodes: Vec::new() });
		} else if pressed {
			self.click(sx, sy);
		}
	}

	pub fn pointer_leave(&mut self) {
		self.press = None;
		self.pending_edge = None;
		let drag = std::mem::take(&mut self.drag);
		self.pan = PanState::default();
		if drag.active {
			self.emit(NetworkEvent::DragEnd {
				nodes: drag.node.into_iter().collect(),
			});
		}
		self.needs_redraw = true;
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if !self.options.zoom_view {
			return;
		}
		self.focus = None;
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_SCALE, MAX_SCALE);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.needs_redraw = true;
	}

	fn click(&mut self, sx: f64, sy: f64) {
		self.needs_redraw = true;
		if let Some(id) = self.node_at(sx, sy) {
			if self.selected_nodes.is_empty() && !self.selected_edges.is_empty() {
				let previous_edges = std::mem::take(&mut self.selected_edges);
				self.emit(NetworkEvent::DeselectEdge { previous_edges });
			}
			let edges = self.connected_edges(&id);
			self.selected_nodes = vec![id.clone()];
			self.selected_edges = edges.clone();
			self.emit(NetworkEvent::SelectNode {
				nodes: vec![id],
				edges,
			});
		} else if let Some(edge) = self.edge_at(sx, sy) {
			if !self.selected_nodes.is_empty() {
				let previous_nodes = std::mem::take(&mut self.selected_nodes);
				self.emit(NetworkEvent::DeselectNode { previous_nodes });
			}
			self.selected_edges = vec![edge.clone()];
			self.emit(NetworkEvent::SelectEdge { edges: vec![edge] });
		} else if !self.selected_nodes.is_empty() {
			let previous_nodes = std::mem::take(&mut self.selected_nodes);
			self.selected_edges.clear();
			self.emit(NetworkEvent::DeselectNode { previous_nodes });
		} else if !self.selected_edges.is_empty() {
			let previous_edges = std::mem::take(&mut self.selected_edges);
			self.emit(NetworkEvent::DeselectEdge { previous_edges });
		}
	}
}

impl NetworkEngine for ForceGraphState {
	fn focus(&mut self, id: &str, options: FocusOptions) -> bool {
		let Some((x, y)) = self.position_of(id) else {
			return false;
		};
		let k = options.scale.clamp(MIN_SCALE, MAX_SCALE);
		let target = ViewTransform {
			x: self.width / 2.0 - x * k,
			y: self.height / 2.0 - y * k,
			k,
		};
		if options.animated {
			self.focus = Some(FocusAnimation {
				from: self.transform,
				to: target,
				t: 0.0,
			});
		} else {
			self.focus = None;
			self.transform = target;
		}
		self.needs_redraw = true;
		true
	}

	fn fit(&mut self) {
		let mut bounds: Option<(f64, f64, f64, f64)> = None;
		self.graph.visit_nodes(|node| {
			let r = node_radius(&node.data.user_data.record);
			let (x, y) = (node.x() as f64, node.y() as f64);
			let (x0, y0, x1, y1) = bounds.unwrap_or((x - r, y - r, x + r, y + r));
			bounds = Some((x0.min(x - r), y0.min(y - r), x1.max(x + r), y1.max(y + r)));
		});
		let Some((x0, y0, x1, y1)) = bounds else {
			return;
		};
		let k = (self.width / (x1 - x0).max(1.0))
			.min(self.height / (y1 - y0).max(1.0))
			.clamp(MIN_SCALE, 1.0);
		self.focus = None;
		self.transform = ViewTransform {
			x: self.width / 2.0 - (x0 + x1) / 2.0 * k,
			y: self.height / 2.0 - (y0 + y1) / 2.0 * k,
			k,
		};
		self.needs_redraw = true;
	}

	fn unselect_all(&mut self) {
		self.selected_nodes.clear();
		self.selected_edges.clear();
		self.needs_redraw = true;
	}

	fn select_nodes(&mut self, ids: &[String]) {
		self.selected_nodes = ids
			.iter()
			.filter(|id| self.ids.contains_key(*id))
			.cloned()
			.collect();
		let mut edges = Vec::new();
		for id in &self.selected_nodes {
			for edge in self.connected_edges(id) {
				if !edges.contains(&edge) {
					edges.push(edge);
				}
			}
		}
		self.selected_edges = edges;
		self.needs_redraw = true;
	}

	fn selected_nodes(&self) -> Vec<String> {
		self.selected_nodes.clone()
	}

	fn set_options(&mut self, options: &NetworkOptions) {
		self.options = EngineOptions::from(options);
		if self.options.physics {
			self.start_stabilizing();
		} else {
			self.stabilization.active = false;
		}
		self.needs_redraw = true;
		self.emit(NetworkEvent::ConfigChange(options.as_value().clone()));
	}

	fn positions(&self, ids: &[String]) -> HashMap<String, Position> {
		let mut out = HashMap::new();
		self.graph.visit_nodes(|node| {
			let id = &node.data.user_data.record.id;
			if ids.is_empty() || ids.contains(id) {
				out.insert(id.clone(), Position::new(node.x() as f64, node.y() as f64));
			}
		});
		out
	}

	fn scale(&self) -> f64 {
		self.transform.k
	}

	fn redraw(&mut self) {
		self.needs_redraw = true;
	}

	fn stabilize(&mut self, iterations: Option<u32>) {
		if let Some(iterations) = iterations {
			self.options.stabilization_iterations = iterations;
		}
		self.stabilization.active = false;
		self.start_stabilizing();
	}

	fn add_edge_mode(&mut self) {
		self.edit_mode = EditMode::AddEdge;
		self.drag = DragState::default();
		self.pan = PanState::default();
	}

	fn disable_edit_mode(&mut self) {
		self.edit_mode = EditMode::Disabled;
		self.pending_edge = None;
		self.needs_redraw = true;
	}

	fn set_draw_hook(&mut self, slot: DrawSlot, hook: Option<DrawHook>) {
		match hook {
			Some(hook) => {
				self.hooks.insert(slot, hook);
			}
			None => {
				self.hooks.remove(&slot);
			}
		}
		self.needs_redraw = true;
	}
}

fn segment_distance(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
	let (dx, dy) = (x2 - x1, y2 - y1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 > 0.0 {
		(((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0)
	} else {
		0.0
	};
	let (cx, cy) = (x1 + t * dx, y1 + t * dy);
	((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	const W: f64 = 800.0;
	const H: f64 = 600.0;

	fn node(id: &str, x: f64, y: f64) -> NodeRecord {
		NodeRecord {
			id: id.into(),
			x: Some(x),
			y: Some(y),
			..Default::default()
		}
	}

	fn edge(id: &str, from: &str, to: &str) -> EdgeRecord {
		EdgeRecord {
			id: id.into(),
			from: from.into(),
			to: to.into(),
			..Default::default()
		}
	}

	/// Two nodes 200 apart on the x axis, joined by one edge.
	fn engine() -> ForceGraphState {
		let mut nodes = DataSet::new();
		nodes.add(node("a", -100.0, 0.0));
		nodes.add(node("b", 100.0, 0.0));
		let mut edges = DataSet::new();
		edges.add(edge("ab", "a", "b"));
		let mut state = ForceGraphState::new(W, H);
		state.sync(&nodes, &edges);
		state.drain_events();
		state
	}

	/// Screen coordinates of a graph point under the initial transform.
	fn screen(x: f64, y: f64) -> (f64, f64) {
		(x + W / 2.0, y + H / 2.0)
	}

	fn click(state: &mut ForceGraphState, (sx, sy): (f64, f64)) {
		state.pointer_down(sx, sy);
		state.pointer_up(sx, sy);
	}

	#[test]
	fn sync_places_nodes_and_skips_dangling_edges() {
		let mut nodes = DataSet::new();
		nodes.add(node("a", 5.0, 0.0));
		nodes.add(NodeRecord {
			id: "free".into(),
			..Default::default()
		});
		let mut edges = DataSet::new();
		edges.add(edge("ok", "a", "free"));
		edges.add(edge("dangling", "a", "missing"));

		let mut state = ForceGraphState::new(W, H);
		state.sync(&nodes, &edges);

		assert_eq!(state.positions(&["a".into()])["a"], Position::new(5.0, 0.0));
		assert_eq!(state.positions(&[]).len(), 2);
		assert_eq!(state.edges().len(), 1);
		assert_eq!(state.drain_events(), vec![NetworkEvent::StartStabilizing]);
	}

	#[test]
	fn resync_keeps_existing_positions() {
		let mut state = engine();
		let mut nodes = DataSet::new();
		nodes.add(node("a", 999.0, 999.0));
		nodes.add(node("b", 100.0, 0.0));
		state.sync(&nodes, &DataSet::new());
		assert_eq!(state.positions(&["a".into()])["a"], Position::new(-100.0, 0.0));
	}

	#[test]
	fn clicking_a_node_selects_it_with_its_edges() {
		let mut state = engine();
		click(&mut state, screen(-100.0, 0.0));
		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::SelectNode {
				nodes: vec!["a".into()],
				edges: vec!["ab".into()]
			}]
		);

		click(&mut state, screen(0.0, 200.0));
		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::DeselectNode {
				previous_nodes: vec!["a".into()]
			}]
		);
		assert!(state.selected_edges.is_empty());
	}

	#[test]
	fn clicking_an_edge_selects_it() {
		let mut state = engine();
		click(&mut state, screen(0.0, 2.0));
		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::SelectEdge {
				edges: vec!["ab".into()]
			}]
		);
		click(&mut state, screen(0.0, 200.0));
		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::DeselectEdge {
				previous_edges: vec!["ab".into()]
			}]
		);
	}

	#[test]
	fn dragging_a_node_moves_it_and_reports_drag_end() {
		let mut state = engine();
		state.set_options(&NetworkOptions::new(json!({ "physics": false })));
		state.drain_events();

		let (sx, sy) = screen(-100.0, 0.0);
		state.pointer_down(sx, sy);
		state.pointer_move(sx + 50.0, sy + 20.0);
		state.pointer_up(sx + 50.0, sy + 20.0);

		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::DragEnd {
				nodes: vec!["a".into()]
			}]
		);
		assert_eq!(
			state.positions(&["a".into()])["a"],
			Position::new(-50.0, 20.0)
		);
	}

	#[test]
	fn panning_reports_an_empty_drag_end() {
		let mut state = engine();
		let (sx, sy) = screen(0.0, 200.0);
		state.pointer_down(sx, sy);
		state.pointer_move(sx + 30.0, sy);
		state.pointer_up(sx + 30.0, sy);
		assert_eq!(state.transform.x, W / 2.0 + 30.0);
		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::DragEnd { nodes: vec![] }]
		);
	}

	#[test]
	fn add_edge_gesture_requests_an_edge_and_leaves_the_mode() {
		let mut state = engine();
		state.add_edge_mode();
		let (ax, ay) = screen(-100.0, 0.0);
		let (bx, by) = screen(100.0, 0.0);
		state.pointer_down(ax, ay);
		state.pointer_move(bx, by);
		assert!(state.pending_edge.is_some());
		state.pointer_up(bx, by);

		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::AddEdgeRequested {
				from: "a".into(),
				to: "b".into()
			}]
		);
		assert_eq!(state.edit_mode, EditMode::Disabled);
	}

	#[test]
	fn add_edge_released_on_background_keeps_the_mode() {
		let mut state = engine();
		state.add_edge_mode();
		let (ax, ay) = screen(-100.0, 0.0);
		state.pointer_down(ax, ay);
		state.pointer_up(ax, ay + 200.0);
		assert!(state.drain_events().is_empty());
		assert_eq!(state.edit_mode, EditMode::AddEdge);
	}

	#[test]
	fn stabilization_reports_progress_and_completion() {
		let mut state = engine();
		state.set_options(&NetworkOptions::new(json!({
			"physics": { "stabilization": { "iterations": 100 } }
		})));
		state.stabilize(None);
		for _ in 0..200 {
			state.tick(0.016);
		}
		let events = state.drain_events();
		assert!(matches!(events[0], NetworkEvent::ConfigChange(_)));
		assert!(events.contains(&NetworkEvent::StartStabilizing));
		assert!(matches!(events.last(), Some(NetworkEvent::Stabilized { .. })));
		assert!(!state.is_stabilizing());
	}

	#[test]
	fn immediate_focus_centers_the_node() {
		let mut state = engine();
		assert!(state.focus("b", FocusOptions::immediate()));
		assert_eq!(
			state.transform,
			ViewTransform {
				x: W / 2.0 - 100.0,
				y: H / 2.0,
				k: 1.0
			}
		);
		assert!(!state.focus("zzz", FocusOptions::immediate()));
	}

	#[test]
	fn animated_focus_arrives_after_its_duration() {
		let mut state = engine();
		state.set_options(&NetworkOptions::new(json!({ "physics": false })));
		state.focus("a", FocusOptions::animated());
		for _ in 0..60 {
			state.tick(0.016);
		}
		assert!((state.transform.x - (W / 2.0 + 100.0)).abs() < 1e-9);
	}

	#[test]
	fn first_frame_raises_init_redraw_once() {
		let mut state = engine();
		assert!(state.begin_frame());
		state.begin_frame();
		let inits = state
			.drain_events()
			.into_iter()
			.filter(|e| *e == NetworkEvent::InitRedraw)
			.count();
		assert_eq!(inits, 1);
	}

	#[test]
	fn resize_reports_old_and_new_size() {
		let mut state = engine();
		state.resize(1000.0, 600.0);
		assert_eq!(
			state.drain_events(),
			vec![NetworkEvent::Resize {
				width: 1000.0,
				height: 600.0,
				old_width: W,
				old_height: H
			}]
		);
		assert_eq!(state.transform.x, 500.0);
	}

	#[test]
	fn segment_distance_clamps_to_endpoints() {
		assert_eq!(segment_distance(0.0, 1.0, -1.0, 0.0, 1.0, 0.0), 1.0);
		assert_eq!(segment_distance(4.0, 0.0, 0.0, 0.0, 1.0, 0.0), 3.0);
	}
}
