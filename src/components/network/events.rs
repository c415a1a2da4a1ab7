//! Events raised by the engine and the callbacks they are forwarded to.

use leptos::callback::{Callable, UnsyncCallback};
use serde_json::Value;
use web_sys::CanvasRenderingContext2d;

/// Something the engine reports back to the component.
#[derive(Clone, Debug, PartialEq)]
pub enum NetworkEvent {
	/// A node was clicked.
	SelectNode {
		/// The clicked node first.
		nodes: Vec<String>,
		/// Edges selected along with it.
		edges: Vec<String>,
	},
	/// A click cleared the node selection.
	DeselectNode {
		/// Nodes selected before the click.
		previous_nodes: Vec<String>,
	},
	/// An edge was clicked.
	SelectEdge {
		/// The selected edges.
		edges: Vec<String>,
	},
	/// A click cleared the edge selection.
	DeselectEdge {
		/// Edges selected before the click.
		previous_edges: Vec<String>,
	},
	/// A drag gesture ended.
	DragEnd {
		/// Dragged nodes. Empty when the view was panned.
		nodes: Vec<String>,
	},
	/// The user drew an edge in add-edge mode. Not committed yet.
	AddEdgeRequested {
		/// Start node.
		from: String,
		/// End node.
		to: String,
	},
	/// Layout started moving nodes.
	StartStabilizing,
	/// Periodic layout progress.
	StabilizationProgress {
		/// Ticks run so far.
		iterations: u32,
		/// Tick limit.
		total: u32,
	},
	/// The tick limit was reached.
	StabilizationIterationsDone,
	/// The layout came to rest.
	Stabilized {
		/// Ticks it took.
		iterations: u32,
	},
	/// The canvas changed size.
	Resize {
		/// New width.
		width: f64,
		/// New height.
		height: f64,
		/// Width before.
		old_width: f64,
		/// Height before.
		old_height: f64,
	},
	/// The first frame was drawn.
	InitRedraw,
	/// Options were applied; carries them.
	ConfigChange(Value),
}

impl NetworkEvent {
	/// The forwarded event kind, if this event is forwarded at all.
	pub fn kind(&self) -> Option<EventKind> {
		Some(match self {
			NetworkEvent::StartStabilizing => EventKind::StartStabilizing,
			NetworkEvent::StabilizationProgress { .. } => EventKind::StabilizationProgress,
			NetworkEvent::StabilizationIterationsDone => EventKind::StabilizationIterationsDone,
			NetworkEvent::Stabilized { .. } => EventKind::Stabilized,
			NetworkEvent::Resize { .. } => EventKind::Resize,
			NetworkEvent::InitRedraw => EventKind::InitRedraw,
			NetworkEvent::ConfigChange(_) => EventKind::ConfigChange,
			_ => return None,
		})
	}
}

/// Engine events that are passed straight through to an optional callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// `startStabilizing`
	StartStabilizing,
	/// `stabilizationProgress`
	StabilizationProgress,
	/// `stabilizationIterationsDone`
	StabilizationIterationsDone,
	/// `stabilized`
	Stabilized,
	/// `resize`
	Resize,
	/// `initRedraw`
	InitRedraw,
	/// `beforeDrawing`, called with the canvas context.
	BeforeDrawing,
	/// `afterDrawing`, called with the canvas context.
	AfterDrawing,
	/// `configChange`
	ConfigChange,
}

impl EventKind {
	/// Every forwarded kind.
	pub const ALL: [EventKind; 9] = [
		EventKind::StartStabilizing,
		EventKind::StabilizationProgress,
		EventKind::StabilizationIterationsDone,
		EventKind::Stabilized,
		EventKind::Resize,
		EventKind::InitRedraw,
		EventKind::BeforeDrawing,
		EventKind::AfterDrawing,
		EventKind::ConfigChange,
	];

	/// Name the engine uses for this event.
	pub fn name(self) -> &'static str {
		match self {
			EventKind::StartStabilizing => "startStabilizing",
			EventKind::StabilizationProgress => "stabilizationProgress",
			EventKind::StabilizationIterationsDone => "stabilizationIterationsDone",
			EventKind::Stabilized => "stabilized",
			EventKind::Resize => "resize",
			EventKind::InitRedraw => "initRedraw",
			EventKind::BeforeDrawing => "beforeDrawing",
			EventKind::AfterDrawing => "afterDrawing",
			EventKind::ConfigChange => "configChange",
		}
	}
}

/// Callback for a forwarded event.
pub type EventAction = UnsyncCallback<NetworkEvent>;

/// Callback for a drawing event; receives the context already transformed
/// into graph coordinates.
pub type DrawAction = UnsyncCallback<CanvasRenderingContext2d>;

/// Optional callbacks for every forwarded engine event.
#[derive(Clone, Default)]
#[allow(missing_docs)]
pub struct EventActions {
	pub start_stabilizing: Option<EventAction>,
	pub stabilization_progress: Option<EventAction>,
	pub stabilization_iterations_done: Option<EventAction>,
	pub stabilized: Option<EventAction>,
	pub resize: Option<EventAction>,
	pub init_redraw: Option<EventAction>,
	pub before_drawing: Option<DrawAction>,
	pub after_drawing: Option<DrawAction>,
	pub config_change: Option<EventAction>,
}

impl EventActions {
	/// No callbacks.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `action` for `kind`. Drawing kinds are ignored here, use
	/// [`EventActions::on_draw`] for them.
	pub fn on(mut self, kind: EventKind, action: impl Fn(NetworkEvent) + 'static) -> Self {
		let action = Some(UnsyncCallback::new(action));
		match kind {
			EventKind::StartStabilizing => self.start_stabilizing = action,
			EventKind::StabilizationProgress => self.stabilization_progress = action,
			EventKind::StabilizationIterationsDone => self.stabilization_iterations_done = action,
			EventKind::Stabilized => self.stabilized = action,
			EventKind::Resize => self.resize = action,
			EventKind::InitRedraw => self.init_redraw = action,
			EventKind::ConfigChange => self.config_change = action,
			EventKind::BeforeDrawing | EventKind::AfterDrawing => {
				log::warn!("network: {} needs a drawing callback", kind.name());
			}
		}
		self
	}

	/// Registers a drawing callback for `BeforeDrawing` or `AfterDrawing`.
	pub fn on_draw(
		mut self,
		kind: EventKind,
		action: impl Fn(CanvasRenderingContext2d) + 'static,
	) -> Self {
		let action = Some(UnsyncCallback::new(action));
		match kind {
			EventKind::BeforeDrawing => self.before_drawing = action,
			EventKind::AfterDrawing => self.after_drawing = action,
			_ => log::warn!("network: {} is not a drawing event", kind.name()),
		}
		self
	}

	/// The callback for a non-drawing kind.
	pub fn get(&self, kind: EventKind) -> Option<&EventAction> {
		match kind {
			EventKind::StartStabilizing => self.start_stabilizing.as_ref(),
			EventKind::StabilizationProgress => self.stabilization_progress.as_ref(),
			EventKind::StabilizationIterationsDone => self.stabilization_iterations_done.as_ref(),
			EventKind::Stabilized => self.stabilized.as_ref(),
			EventKind::Resize => self.resize.as_ref(),
			EventKind::InitRedraw => self.init_redraw.as_ref(),
			EventKind::ConfigChange => self.config_change.as_ref(),
			EventKind::BeforeDrawing | EventKind::AfterDrawing => None,
		}
	}

	/// The callback for a drawing kind.
	pub fn get_draw(&self, kind: EventKind) -> Option<&DrawAction> {
		match kind {
			EventKind::BeforeDrawing => self.before_drawing.as_ref(),
			EventKind::AfterDrawing => self.after_drawing.as_ref(),
			_ => None,
		}
	}
}

/// Callbacks queued while the network is borrowed, fired once it is released.
#[derive(Default)]
#[must_use]
pub struct Notifications(Vec<Box<dyn FnOnce()>>);

impl Notifications {
	pub fn push<T: 'static>(&mut self, callback: UnsyncCallback<T>, payload: T) {
		self.0.push(Box::new(move || callback.run(payload)));
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn fire(self) {
		for callback in self.0 {
			callback();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;

	#[test]
	fn only_plain_lifecycle_events_have_a_kind() {
		assert_eq!(NetworkEvent::InitRedraw.kind(), Some(EventKind::InitRedraw));
		assert_eq!(
			NetworkEvent::Stabilized { iterations: 3 }.kind(),
			Some(EventKind::Stabilized)
		);
		assert_eq!(NetworkEvent::DragEnd { nodes: vec![] }.kind(), None);
		assert_eq!(
			NetworkEvent::SelectEdge { edges: vec![] }.kind(),
			None
		);
	}

	#[test]
	fn actions_are_found_by_kind() {
		let actions = EventActions::new().on(EventKind::Resize, |_| {});
		assert!(actions.get(EventKind::Resize).is_some());
		assert!(actions.get(EventKind::Stabilized).is_none());
		assert!(actions.get(EventKind::BeforeDrawing).is_none());
	}

	#[test]
	fn notifications_run_in_order_when_fired() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		let cb = UnsyncCallback::new(move |n: u32| sink.borrow_mut().push(n));

		let mut queue = Notifications::default();
		queue.push(cb.clone(), 1);
		queue.push(cb, 2);
		assert!(seen.borrow().is_empty());
		queue.fire();
		assert_eq!(*seen.borrow(), vec![1, 2]);
	}
}
