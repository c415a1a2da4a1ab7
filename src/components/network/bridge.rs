//! Turns engine events into selection state, child updates and forwarded
//! callbacks.

use std::rc::Rc;

use leptos::callback::Callable;
use log::debug;
use web_sys::CanvasRenderingContext2d;

use super::adapter::GraphAdapter;
use super::engine::{DrawHook, DrawSlot, NetworkEngine};
use super::events::{EventActions, EventKind, NetworkEvent, Notifications};

/// Ids currently selected in the engine, as last reported by it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
	/// Selected node ids.
	pub nodes: Vec<String>,
	/// Selected edge ids.
	pub edges: Vec<String>,
}

#[derive(Default)]
pub struct EventBridge {
	actions: EventActions,
	selection: Selection,
	drawn: Vec<(String, String)>,
}

impl EventBridge {
	pub fn new(actions: EventActions) -> Self {
		Self {
			actions,
			..Self::default()
		}
	}

	/// Edges the user drew since the last call, as `(from, to)`. They still
	/// need validating and committing.
	pub fn take_drawn_edges(&mut self) -> Vec<(String, String)> {
		std::mem::take(&mut self.drawn)
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Records a node selection made without an engine event.
	pub fn set_nodes(&mut self, nodes: Vec<String>) {
		self.selection.nodes = nodes;
	}

	pub fn set_edges(&mut self, edges: Vec<String>) {
		self.selection.edges = edges;
	}

	/// Installs the drawing callbacks as engine draw hooks so they run inside
	/// the frame.
	pub fn attach(&self, engine: &mut dyn NetworkEngine) {
		for (kind, slot) in [
			(EventKind::BeforeDrawing, DrawSlot::BeforeDrawing),
			(EventKind::AfterDrawing, DrawSlot::AfterDrawing),
		] {
			let hook = self.actions.get_draw(kind).cloned().map(|action| {
				Rc::new(move |ctx: &CanvasRenderingContext2d| action.run(ctx.clone())) as DrawHook
			});
			engine.set_draw_hook(slot, hook);
		}
	}

	/// Applies one engine event. Callbacks for the parent and the children are
	/// queued on `out` instead of being called directly.
	pub fn dispatch(
		&mut self,
		event: NetworkEvent,
		adapter: &mut GraphAdapter,
		engine: &mut dyn NetworkEngine,
		out: &mut Notifications,
	) {
		match &event {
			NetworkEvent::SelectNode { nodes, .. } => {
				let Some(selected) = nodes.first().cloned() else {
					return;
				};
				self.selection.nodes = vec![selected.clone()];
				if let Some(handler) = adapter
					.node_child(&selected)
					.and_then(|child| child.on_select.clone())
				{
					out.push(handler, (selected, event.clone()));
				}
			}
			NetworkEvent::DeselectNode { .. } => self.selection.nodes.clear(),
			NetworkEvent::SelectEdge { edges } => self.selection.edges = edges.clone(),
			NetworkEvent::DeselectEdge { .. } => self.selection.edges.clear(),
			NetworkEvent::DragEnd { nodes } => {
				if nodes.is_empty() {
					return;
				}
				for (id, position) in engine.positions(nodes) {
					let handler = adapter
						.move_child(&id, position)
						.and_then(|child| child.on_position.clone());
					if let Some(handler) = handler {
						out.push(handler, position);
					}
				}
			}
			NetworkEvent::AddEdgeRequested { from, to } => {
				self.drawn.push((from.clone(), to.clone()));
			}
			_ => self.forward(event, out),
		}
	}

	fn forward(&self, event: NetworkEvent, out: &mut Notifications) {
		let Some(kind) = event.kind() else {
			return;
		};
		if let Some(action) = self.actions.get(kind) {
			debug!("network: forwarding {}", kind.name());
			out.push(action.clone(), event);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use leptos::callback::UnsyncCallback;

	use super::super::engine::mock::MockEngine;
	use super::super::types::{ChildDescriptor, NodeDescriptor, Position};
	use super::*;

	type Log = Rc<RefCell<Vec<String>>>;

	fn child(id: &str, log: &Log) -> ChildDescriptor {
		let (select_log, move_log) = (log.clone(), log.clone());
		let id_owned = id.to_string();
		ChildDescriptor::Node(NodeDescriptor {
			on_select: Some(UnsyncCallback::new(move |(id, _): (String, NetworkEvent)| {
				select_log.borrow_mut().push(format!("select {id}"));
			})),
			on_position: Some(UnsyncCallback::new(move |p: Position| {
				move_log
					.borrow_mut()
					.push(format!("move {id_owned} {} {}", p.x, p.y));
			})),
			..NodeDescriptor::new(id)
		})
	}

	fn dispatch(
		bridge: &mut EventBridge,
		adapter: &mut GraphAdapter,
		engine: &mut MockEngine,
		event: NetworkEvent,
	) {
		let mut out = Notifications::default();
		bridge.dispatch(event, adapter, engine, &mut out);
		out.fire();
	}

	#[test]
	fn select_node_without_matching_child_only_updates_selection() {
		let log = Log::default();
		let mut adapter = GraphAdapter::new();
		adapter.register_child(child("1", &log));
		let (mut bridge, mut engine) = (EventBridge::default(), MockEngine::default());

		dispatch(
			&mut bridge,
			&mut adapter,
			&mut engine,
			NetworkEvent::SelectNode {
				nodes: vec!["5".into()],
				edges: vec![],
			},
		);
		assert_eq!(bridge.selection().nodes, vec!["5".to_string()]);
		assert!(log.borrow().is_empty());
	}

	#[test]
	fn select_node_keeps_first_id_and_notifies_child() {
		let log = Log::default();
		let mut adapter = GraphAdapter::new();
		adapter.register_child(child("2", &log));
		let (mut bridge, mut engine) = (EventBridge::default(), MockEngine::default());

		dispatch(
			&mut bridge,
			&mut adapter,
			&mut engine,
			NetworkEvent::SelectNode {
				nodes: vec!["2".into(), "3".into()],
				edges: vec!["e".into()],
			},
		);
		assert_eq!(bridge.selection().nodes, vec!["2".to_string()]);
		assert_eq!(*log.borrow(), vec!["select 2".to_string()]);

		dispatch(
			&mut bridge,
			&mut adapter,
			&mut engine,
			NetworkEvent::DeselectNode {
				previous_nodes: vec!["2".into()],
			},
		);
		assert!(bridge.selection().nodes.is_empty());
	}

	#[test]
	fn edge_selection_is_overwritten_not_merged() {
		let mut adapter = GraphAdapter::new();
		let (mut bridge, mut engine) = (EventBridge::default(), MockEngine::default());
		for edges in [vec!["a", "b"], vec!["c"]] {
			dispatch(
				&mut bridge,
				&mut adapter,
				&mut engine,
				NetworkEvent::SelectEdge {
					edges: edges.into_iter().map(String::from).collect(),
				},
			);
		}
		assert_eq!(bridge.selection().edges, vec!["c".to_string()]);

		dispatch(
			&mut bridge,
			&mut adapter,
			&mut engine,
			NetworkEvent::DeselectEdge {
				previous_edges: vec!["c".into()],
			},
		);
		assert!(bridge.selection().edges.is_empty());
	}

	#[test]
	fn drag_end_moves_only_matching_child() {
		let log = Log::default();
		let mut adapter = GraphAdapter::new();
		adapter.register_child(child("7", &log));
		adapter.register_child(child("8", &log));
		let mut bridge = EventBridge::default();
		let mut engine = MockEngine::default();
		engine.positions.insert("7".into(), Position::new(10.0, 20.0));
		engine.positions.insert("8".into(), Position::new(-1.0, -1.0));

		dispatch(
			&mut bridge,
			&mut adapter,
			&mut engine,
			NetworkEvent::DragEnd {
				nodes: vec!["7".into()],
			},
		);

		let moved = adapter.node_child("7").unwrap();
		assert_eq!((moved.x, moved.y), (Some(10.0), Some(20.0)));
		let untouched = adapter.node_child("8").unwrap();
		assert_eq!((untouched.x, untouched.y), (None, None));
		assert_eq!(*log.borrow(), vec!["move 7 10 20".to_string()]);
	}

	#[test]
	fn forwarded_events_reach_their_action_unchanged() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		let actions = EventActions::new().on(EventKind::StabilizationProgress, move |e| {
			sink.borrow_mut().push(e)
		});
		let mut bridge = EventBridge::new(actions);
		let mut adapter = GraphAdapter::new();
		let mut engine = MockEngine::default();

		let progress = NetworkEvent::StabilizationProgress {
			iterations: 50,
			total: 1000,
		};
		dispatch(&mut bridge, &mut adapter, &mut engine, progress.clone());
		// no action registered: silently dropped
		dispatch(&mut bridge, &mut adapter, &mut engine, NetworkEvent::InitRedraw);

		assert_eq!(*seen.borrow(), vec![progress]);
	}

	#[test]
	fn callbacks_wait_for_fire() {
		let log = Log::default();
		let mut adapter = GraphAdapter::new();
		adapter.register_child(child("1", &log));
		let (mut bridge, mut engine) = (EventBridge::default(), MockEngine::default());

		let mut out = Notifications::default();
		bridge.dispatch(
			NetworkEvent::SelectNode {
				nodes: vec!["1".into()],
				edges: vec![],
			},
			&mut adapter,
			&mut engine,
			&mut out,
		);
		assert!(log.borrow().is_empty());
		assert!(!out.is_empty());
		out.fire();
		assert_eq!(log.borrow().len(), 1);
	}

	#[test]
	fn add_edge_requests_are_held_until_taken() {
		let mut adapter = GraphAdapter::new();
		adapter.set_add_edges(true);
		let (mut bridge, mut engine) = (EventBridge::default(), MockEngine::default());
		for (from, to) in [("a", "b"), ("b", "c")] {
			dispatch(
				&mut bridge,
				&mut adapter,
				&mut engine,
				NetworkEvent::AddEdgeRequested {
					from: from.into(),
					to: to.into(),
				},
			);
		}
		assert!(adapter.edges().is_empty());
		assert_eq!(
			bridge.take_drawn_edges(),
			vec![
				("a".to_string(), "b".to_string()),
				("b".to_string(), "c".to_string())
			]
		);
		assert!(bridge.take_drawn_edges().is_empty());
	}

	#[test]
	fn attach_installs_only_supplied_draw_actions() {
		let actions = EventActions::new().on_draw(EventKind::AfterDrawing, |_| {});
		let bridge = EventBridge::new(actions);
		let mut engine = MockEngine::default();
		bridge.attach(&mut engine);
		assert!(engine.hooks.contains_key(&DrawSlot::AfterDrawing));
		assert!(!engine.hooks.contains_key(&DrawSlot::BeforeDrawing));
	}
}
