//! Shared, owned state of one mounted network.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use serde_json::Value;
use web_sys::CanvasRenderingContext2d;

use super::adapter::{EdgeValidator, GraphAdapter, accepts_edge};
use super::bridge::{EventBridge, Selection};
use super::command::{CommandOutput, ExecuteError, NetworkCommand, execute_named};
use super::engine::{DrawHook, DrawSlot, NetworkEngine};
use super::events::{EventActions, Notifications};
use super::options::{FocusOptions, NetworkOptions};
use super::render::{self, ImageCache};
use super::state::ForceGraphState;
use super::types::{ChildDescriptor, EdgeRecord, NetworkData, NodeRecord, Position};

/// Seconds simulated per animation frame.
const FRAME_DT: f32 = 0.016;

/// Two-way bindings for the selection.
#[derive(Clone, Copy, Default)]
struct SelectionBindings {
	nodes: Option<RwSignal<Vec<String>>>,
	edges: Option<RwSignal<Vec<String>>>,
}

#[derive(Default)]
struct Network {
	adapter: GraphAdapter,
	bridge: EventBridge,
	engine: Option<ForceGraphState>,
	background: Option<DrawHook>,
	background_generation: u64,
	bindings: SelectionBindings,
}

/// Handle to a network component.
///
/// Cheap to clone. Pass one to `<NetworkCanvas handle=...>` to drive the
/// network from outside, e.g. to focus a node or run an engine command.
///
/// User callbacks, the edge validator included, never run while the network
/// is borrowed, so they may call back into the handle. Drawing callbacks are
/// the exception: they run inside the frame and must not.
#[derive(Clone, Default)]
pub struct NetworkHandle {
	inner: Rc<RefCell<Network>>,
}

impl NetworkHandle {
	/// A handle to a network that is not mounted yet.
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn configure(
		&self,
		actions: EventActions,
		edge_added: Option<EdgeValidator>,
		selected_nodes: Option<RwSignal<Vec<String>>>,
		selected_edges: Option<RwSignal<Vec<String>>>,
	) {
		let mut inner = self.inner.borrow_mut();
		inner.bridge = EventBridge::new(actions);
		inner.adapter.set_edge_validator(edge_added);
		inner.bindings = SelectionBindings {
			nodes: selected_nodes,
			edges: selected_edges,
		};
	}

	/// Whether a canvas has taken the handle.
	pub fn is_mounted(&self) -> bool {
		self.inner.borrow().engine.is_some()
	}

	/// Hands the engine its initial configuration and takes ownership of it.
	pub(crate) fn mount(&self, mut engine: ForceGraphState) {
		let initial_selection = {
			let mut inner = self.inner.borrow_mut();
			if inner.engine.is_some() {
				warn!("network: already mounted");
				return;
			}
			let Network {
				adapter,
				bridge,
				background,
				bindings,
				..
			} = &mut *inner;
			engine.set_options(adapter.options());
			bridge.attach(&mut engine);
			if let Some(hook) = background.clone() {
				engine.set_draw_hook(DrawSlot::Background, Some(hook));
			}
			adapter.apply_edit_mode(&mut engine);
			engine.sync(adapter.nodes(), adapter.edges());
			let initial = bindings.nodes.and_then(|s| s.try_get_untracked());
			inner.engine = Some(engine);
			initial
		};
		debug!("network: mounted");
		if let Some(ids) = initial_selection.filter(|ids| !ids.is_empty()) {
			self.select_nodes(ids);
		}
	}

	/// Runs `f` against the engine, if mounted. Events it raises are
	/// dispatched on the next frame.
	pub(crate) fn with_engine<R>(&self, f: impl FnOnce(&mut ForceGraphState) -> R) -> Option<R> {
		self.inner.borrow_mut().engine.as_mut().map(f)
	}

	/// Advances the simulation, draws a frame and dispatches pending events.
	pub(crate) fn frame(&self, ctx: &CanvasRenderingContext2d, images: &mut ImageCache) {
		self.sync_engine();
		let mounted = self.with_engine(|engine| {
			engine.tick(FRAME_DT);
			if engine.begin_frame() && render::render(engine, ctx, images) {
				engine.redraw();
			}
		});
		if mounted.is_some() {
			self.pump_events();
		}
	}

	/// Brings the engine up to date with the node and edge collections.
	pub(crate) fn sync_engine(&self) {
		let mut inner = self.inner.borrow_mut();
		let Network { adapter, engine, .. } = &mut *inner;
		if let Some(engine) = engine.as_mut() {
			engine.sync(adapter.nodes(), adapter.edges());
		}
	}

	pub(crate) fn resize(&self, width: f64, height: f64) {
		self.with_engine(|engine| engine.resize(width, height));
	}

	/// Dispatches every event the engine raised, commits drawn edges, then
	/// fires the queued callbacks and refreshes the selection bindings.
	pub fn pump_events(&self) {
		let (notifications, drawn, validator) = {
			let mut inner = self.inner.borrow_mut();
			let Network {
				adapter,
				bridge,
				engine,
				..
			} = &mut *inner;
			let Some(engine) = engine.as_mut() else {
				return;
			};
			let mut out = Notifications::default();
			for event in engine.drain_events() {
				bridge.dispatch(event, adapter, &mut *engine, &mut out);
			}
			let drawn: Vec<EdgeRecord> = bridge
				.take_drawn_edges()
				.into_iter()
				.map(|(from, to)| adapter.propose_drawn_edge(from, to))
				.collect();
			(out, drawn, adapter.edge_validator())
		};

		for edge in drawn {
			let accepted = accepts_edge(validator.as_ref(), &edge);
			let mut inner = self.inner.borrow_mut();
			let Network { adapter, engine, .. } = &mut *inner;
			if let Some(engine) = engine.as_mut() {
				adapter.commit_drawn_edge(edge, accepted, engine);
			}
		}

		let (selection, bindings) = {
			let inner = self.inner.borrow();
			(inner.bridge.selection().clone(), inner.bindings)
		};
		publish(bindings.nodes, selection.nodes);
		publish(bindings.edges, selection.edges);
		notifications.fire();
	}

	/// Adds a declared node or edge. Returns `false` if a child with the
	/// same id is already registered; that one is kept.
	pub fn register_child(&self, child: ChildDescriptor) -> bool {
		debug!("network: register {} {:?}", child.kind(), child.id());
		self.inner.borrow_mut().adapter.register_child(child)
	}

	/// Removes a declared node or edge by id.
	pub fn unregister_child(&self, child: &ChildDescriptor) {
		debug!("network: unregister {} {:?}", child.kind(), child.id());
		self.inner.borrow_mut().adapter.unregister_child(child);
	}

	/// Replaces all nodes and edges.
	pub fn set_data(&self, data: NetworkData) {
		self.inner.borrow_mut().adapter.set_data(data);
	}

	/// Snapshot of all nodes.
	pub fn nodes(&self) -> Vec<NodeRecord> {
		self.inner.borrow().adapter.nodes().iter().cloned().collect()
	}

	/// Snapshot of all edges.
	pub fn edges(&self) -> Vec<EdgeRecord> {
		self.inner.borrow().adapter.edges().iter().cloned().collect()
	}

	/// Turns interactive edge drawing on or off.
	pub fn set_add_edges(&self, enabled: bool) {
		let mut inner = self.inner.borrow_mut();
		let Network { adapter, engine, .. } = &mut *inner;
		adapter.set_add_edges(enabled);
		if let Some(engine) = engine.as_mut() {
			adapter.apply_edit_mode(engine);
		}
	}

	/// Stores new options and passes them to the engine unchanged.
	pub fn set_options(&self, options: impl Into<NetworkOptions>) {
		let mut inner = self.inner.borrow_mut();
		let Network { adapter, engine, .. } = &mut *inner;
		match engine.as_mut() {
			Some(engine) => {
				adapter.set_options(options.into(), Some(&mut *engine));
				adapter.apply_edit_mode(engine);
			}
			None => adapter.set_options(options.into(), None),
		}
	}

	/// Starts a background change and returns its generation. A load
	/// finishing after a newer change is discarded.
	pub(crate) fn begin_background(&self) -> u64 {
		let mut inner = self.inner.borrow_mut();
		inner.background_generation += 1;
		inner.background_generation
	}

	/// Installs a loaded background if no newer change has started since.
	pub(crate) fn install_background(&self, generation: u64, hook: DrawHook) -> bool {
		if self.inner.borrow().background_generation != generation {
			debug!("network: dropping stale background {generation}");
			return false;
		}
		self.set_background(Some(hook));
		true
	}

	/// Removes the background and cancels pending loads.
	pub(crate) fn clear_background(&self) {
		self.begin_background();
		self.set_background(None);
	}

	fn set_background(&self, hook: Option<DrawHook>) {
		let mut inner = self.inner.borrow_mut();
		inner.background = hook.clone();
		if let Some(engine) = inner.engine.as_mut() {
			engine.set_draw_hook(DrawSlot::Background, hook);
		}
	}

	/// Sets a node's color. `None` or an empty string unsets it.
	pub fn update_node_color(&self, id: &str, color: Option<&str>) {
		self.inner.borrow_mut().adapter.update_node_color(id, color);
	}

	/// Sets or unsets a node's label.
	pub fn update_node_label(&self, id: &str, label: Option<&str>) {
		self.inner.borrow_mut().adapter.update_node_label(id, label);
	}

	/// Sets or unsets a node's image. An image switches the node to the
	/// image shape.
	pub fn update_node_image(&self, id: &str, image: Option<&str>) {
		self.inner.borrow_mut().adapter.update_node_image(id, image);
	}

	/// Sets an edge's arrows, e.g. `Some("to,from")`.
	pub fn update_edge_arrow(&self, id: &str, arrows: Option<&str>) {
		self.inner.borrow_mut().adapter.update_edge_arrow(id, arrows);
	}

	/// Moves the view onto a node, animated.
	pub fn move_to(&self, id: &str) -> bool {
		self.focus_with(id, FocusOptions::animated())
	}

	/// Centers the view on a node at once.
	pub fn focus(&self, id: &str) -> bool {
		self.focus_with(id, FocusOptions::immediate())
	}

	/// Moves the view onto a node with explicit scale and animation.
	pub fn focus_with(&self, id: &str, options: FocusOptions) -> bool {
		let focused = self.with_engine(|engine| engine.focus(id, options));
		if focused != Some(true) {
			debug!("network: cannot focus {id}");
		}
		focused.unwrap_or(false)
	}

	/// Clears the node and edge selection.
	pub fn unselect_all(&self) {
		self.with_engine(|engine| engine.unselect_all());
		self.sync_selection(Vec::new(), true);
	}

	/// Selects the given nodes in the engine.
	pub fn select_nodes(&self, ids: Vec<String>) {
		self.with_engine(|engine| engine.select_nodes(&ids));
		self.sync_selection(ids, false);
	}

	/// Applies a selection pushed in through the binding, unless the engine
	/// already shows it.
	pub(crate) fn select_from_binding(&self, ids: Vec<String>) {
		let current = self.with_engine(|engine| engine.selected_nodes());
		if current.is_some_and(|current| current != ids) {
			self.select_nodes(ids);
		}
	}

	fn sync_selection(&self, nodes: Vec<String>, clear_edges: bool) {
		let bindings = {
			let mut inner = self.inner.borrow_mut();
			inner.bridge.set_nodes(nodes.clone());
			if clear_edges {
				inner.bridge.set_edges(Vec::new());
			}
			inner.bindings
		};
		publish(bindings.nodes, nodes);
		if clear_edges {
			publish(bindings.edges, Vec::new());
		}
	}

	/// The selection as last reported by the engine.
	pub fn selection(&self) -> Selection {
		self.inner.borrow().bridge.selection().clone()
	}

	/// Currently selected node ids.
	pub fn selected_nodes(&self) -> Vec<String> {
		self.inner.borrow().bridge.selection().nodes.clone()
	}

	/// Currently selected edge ids.
	pub fn selected_edges(&self) -> Vec<String> {
		self.inner.borrow().bridge.selection().edges.clone()
	}

	/// Runs a command on the mounted engine.
	pub fn execute(&self, command: NetworkCommand) -> Result<CommandOutput, ExecuteError> {
		let output = {
			let mut inner = self.inner.borrow_mut();
			let Network { adapter, engine, .. } = &mut *inner;
			let engine = engine.as_mut().ok_or(ExecuteError::NotMounted)?;
			if let NetworkCommand::SetOptions(value) = &command {
				adapter.set_options(NetworkOptions::new(value.clone()), None);
			}
			command.execute(engine)?
		};
		self.pump_events();
		Ok(output)
	}

	/// Runs an engine method by name, e.g. `execute_named("fit", &[])`.
	pub fn execute_named(&self, name: &str, args: &[Value]) -> Result<CommandOutput, ExecuteError> {
		let output = {
			let mut inner = self.inner.borrow_mut();
			let engine = inner.engine.as_mut().ok_or(ExecuteError::NotMounted)?;
			execute_named(engine, name, args)?
		};
		self.pump_events();
		Ok(output)
	}

	/// Current engine coordinates of one node.
	pub fn position(&self, id: &str) -> Option<Position> {
		self.with_engine(|engine| engine.positions(&[id.to_string()]).remove(id))
			.flatten()
	}
}

fn publish(binding: Option<RwSignal<Vec<String>>>, ids: Vec<String>) {
	let Some(signal) = binding else {
		return;
	};
	if signal.try_get_untracked().is_some_and(|current| current != ids) {
		signal.set(ids);
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use leptos::callback::UnsyncCallback;
	use serde_json::json;

	use super::super::events::NetworkEvent;
	use super::super::state::EditMode;
	use super::super::types::{EdgeDescriptor, NodeDescriptor};
	use super::*;

	const W: f64 = 800.0;
	const H: f64 = 600.0;

	fn node(id: &str, x: f64, y: f64) -> ChildDescriptor {
		ChildDescriptor::Node(NodeDescriptor {
			x: Some(x),
			y: Some(y),
			..NodeDescriptor::new(id)
		})
	}

	fn mounted() -> NetworkHandle {
		let handle = NetworkHandle::new();
		handle.set_options(json!({ "physics": false }));
		handle.register_child(node("a", -100.0, 0.0));
		handle.register_child(node("b", 100.0, 0.0));
		handle.register_child(ChildDescriptor::Edge(EdgeDescriptor::new("ab", "a", "b")));
		handle.mount(ForceGraphState::new(W, H));
		handle.pump_events();
		handle
	}

	fn click(handle: &NetworkHandle, x: f64, y: f64) {
		handle.with_engine(|engine| {
			engine.pointer_down(x + W / 2.0, y + H / 2.0);
			engine.pointer_up(x + W / 2.0, y + H / 2.0);
		});
		handle.pump_events();
	}

	#[test]
	fn commands_before_mount_fail() {
		let handle = NetworkHandle::new();
		assert_eq!(handle.execute(NetworkCommand::Fit), Err(ExecuteError::NotMounted));
		assert_eq!(
			handle.execute_named("fit", &[]),
			Err(ExecuteError::NotMounted)
		);
		assert!(!handle.move_to("a"));
	}

	#[test]
	fn move_to_focuses_known_nodes_only() {
		let handle = mounted();
		assert!(handle.move_to("a"));
		assert!(!handle.move_to("nope"));
	}

	#[test]
	fn focus_centers_immediately() {
		let handle = mounted();
		assert!(handle.focus("b"));
		assert_eq!(
			handle.with_engine(|engine| engine.transform.x),
			Some(W / 2.0 - 100.0)
		);
	}

	#[test]
	fn unselect_all_clears_the_selection() {
		let handle = mounted();
		handle.select_nodes(vec!["a".into()]);
		assert_eq!(handle.selected_nodes(), vec!["a".to_string()]);
		handle.unselect_all();
		assert!(handle.selected_nodes().is_empty());
		assert!(handle.selected_edges().is_empty());
		assert_eq!(
			handle.execute(NetworkCommand::GetSelectedNodes),
			Ok(CommandOutput::Ids(vec![]))
		);
	}

	#[test]
	fn clicking_a_child_selects_it_and_notifies() {
		let selected = Rc::new(RefCell::new(Vec::new()));
		let sink = selected.clone();
		let handle = NetworkHandle::new();
		handle.set_options(json!({ "physics": false }));
		handle.register_child(ChildDescriptor::Node(NodeDescriptor {
			x: Some(0.0),
			y: Some(0.0),
			on_select: Some(UnsyncCallback::new(move |(id, _): (String, NetworkEvent)| {
				sink.borrow_mut().push(id)
			})),
			..NodeDescriptor::new("solo")
		}));
		handle.mount(ForceGraphState::new(W, H));

		click(&handle, 0.0, 0.0);
		assert_eq!(handle.selection().nodes, vec!["solo".to_string()]);
		assert_eq!(*selected.borrow(), vec!["solo".to_string()]);

		click(&handle, 0.0, 200.0);
		assert!(handle.selection().nodes.is_empty());
	}

	#[test]
	fn callbacks_may_reenter_the_handle() {
		let handle = NetworkHandle::new();
		let reentrant = handle.clone();
		handle.set_options(json!({ "physics": false }));
		handle.register_child(ChildDescriptor::Node(NodeDescriptor {
			x: Some(0.0),
			y: Some(0.0),
			on_select: Some(UnsyncCallback::new(move |(id, _): (String, NetworkEvent)| {
				reentrant.update_node_color(&id, Some("red"));
			})),
			..NodeDescriptor::new("n")
		}));
		handle.mount(ForceGraphState::new(W, H));
		click(&handle, 0.0, 0.0);
		assert_eq!(handle.nodes()[0].color.as_deref(), Some("red"));
	}

	#[test]
	fn clearing_a_color_unsets_it() {
		let handle = mounted();
		handle.update_node_color("a", Some("#123456"));
		handle.update_node_color("a", None);
		assert_eq!(handle.nodes()[0].color, None);
	}

	fn draw_edge(handle: &NetworkHandle, from_x: f64, to_x: f64) {
		handle.with_engine(|engine| {
			engine.pointer_down(W / 2.0 + from_x, H / 2.0);
			engine.pointer_up(W / 2.0 + to_x, H / 2.0);
		});
		handle.pump_events();
	}

	#[test]
	fn edge_validator_may_read_the_handle() {
		let handle = mounted();
		let reader = handle.clone();
		let no_duplicates = UnsyncCallback::new(move |edge: EdgeRecord| {
			!reader
				.edges()
				.iter()
				.any(|e| e.from == edge.from && e.to == edge.to)
		});
		handle.configure(EventActions::default(), Some(no_duplicates), None, None);
		handle.set_add_edges(true);

		draw_edge(&handle, -100.0, 100.0);
		assert_eq!(handle.edges().len(), 1);

		draw_edge(&handle, 100.0, -100.0);
		let edges = handle.edges();
		assert_eq!(edges.len(), 2);
		assert_eq!((edges[1].from.as_str(), edges[1].to.as_str()), ("b", "a"));
		assert_eq!(
			handle.with_engine(|engine| engine.edit_mode),
			Some(EditMode::AddEdge)
		);
	}

	#[test]
	fn options_change_reapplies_add_edge_mode() {
		let handle = mounted();
		handle.set_add_edges(true);
		handle.with_engine(|engine| engine.disable_edit_mode());
		handle.set_options(json!({ "physics": false }));
		assert_eq!(
			handle.with_engine(|engine| engine.edit_mode),
			Some(EditMode::AddEdge)
		);

		handle.set_add_edges(false);
		handle.with_engine(|engine| engine.add_edge_mode());
		handle.set_options(json!({ "physics": false }));
		assert_eq!(
			handle.with_engine(|engine| engine.edit_mode),
			Some(EditMode::Disabled)
		);
	}

	fn has_background(handle: &NetworkHandle) -> bool {
		handle
			.with_engine(|engine| engine.hook(DrawSlot::Background).is_some())
			.unwrap_or(false)
	}

	#[test]
	fn only_the_latest_background_load_is_installed() {
		let handle = mounted();
		let hook: DrawHook = Rc::new(|_: &CanvasRenderingContext2d| {});

		let older = handle.begin_background();
		let newer = handle.begin_background();
		assert!(!handle.install_background(older, hook.clone()));
		assert!(!has_background(&handle));
		assert!(handle.install_background(newer, hook.clone()));
		assert!(has_background(&handle));

		let pending = handle.begin_background();
		handle.clear_background();
		assert!(!handle.install_background(pending, hook));
		assert!(!has_background(&handle));
	}

	#[test]
	fn drawn_edge_is_committed_and_mode_restored() {
		let handle = mounted();
		handle.set_add_edges(true);
		handle.with_engine(|engine| {
			engine.pointer_down(W / 2.0 - 100.0, H / 2.0);
			engine.pointer_up(W / 2.0 + 100.0, H / 2.0);
		});
		handle.pump_events();

		let edges = handle.edges();
		assert_eq!(edges.len(), 2);
		assert_eq!((edges[1].from.as_str(), edges[1].to.as_str()), ("a", "b"));
		assert_eq!(
			handle.with_engine(|engine| engine.edit_mode),
			Some(EditMode::AddEdge)
		);
	}

	#[test]
	fn set_options_reaches_a_mounted_engine() {
		let handle = mounted();
		handle.set_options(json!({ "interaction": { "zoomView": false } }));
		handle.with_engine(|engine| engine.wheel(W / 2.0, H / 2.0, -1.0));
		assert_eq!(
			handle.execute(NetworkCommand::GetScale),
			Ok(CommandOutput::Scale(1.0))
		);
	}

	#[test]
	fn drag_end_writes_position_back() {
		let handle = mounted();
		handle.with_engine(|engine| {
			engine.pointer_down(W / 2.0 - 100.0, H / 2.0);
			engine.pointer_move(W / 2.0 - 100.0, H / 2.0 + 40.0);
			engine.pointer_up(W / 2.0 - 100.0, H / 2.0 + 40.0);
		});
		handle.pump_events();
		assert_eq!(handle.position("a"), Some(Position::new(-100.0, 40.0)));
	}

	#[test]
	fn unregistered_nodes_leave_the_engine() {
		let handle = mounted();
		handle.unregister_child(&ChildDescriptor::Node(NodeDescriptor::new("b")));
		handle.sync_engine();
		assert_eq!(handle.position("b"), None);
		assert_eq!(handle.position("a"), Some(Position::new(-100.0, 0.0)));
		assert_eq!(
			handle.with_engine(|engine| engine.edges().len()),
			Some(0)
		);
	}
}
