//! The seam between the component and the engine that lays out and draws
//! the graph.

use std::collections::HashMap;
use std::rc::Rc;

use web_sys::CanvasRenderingContext2d;

use super::options::{FocusOptions, NetworkOptions};
use super::types::Position;

/// Paints into the frame. The context is already transformed to graph space.
pub type DrawHook = Rc<dyn Fn(&CanvasRenderingContext2d)>;

/// Where in the frame a [`DrawHook`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawSlot {
	/// Under everything, reserved for the background image.
	Background,
	/// After the background, before edges and nodes.
	BeforeDrawing,
	/// On top of the graph.
	AfterDrawing,
}

/// Operations the component needs from a graph engine.
pub trait NetworkEngine {
	/// Centers the view on a node. Returns `false` if the node is unknown.
	fn focus(&mut self, id: &str, options: FocusOptions) -> bool;
	fn fit(&mut self);
	fn unselect_all(&mut self);
	fn select_nodes(&mut self, ids: &[String]);
	fn selected_nodes(&self) -> Vec<String>;
	fn set_options(&mut self, options: &NetworkOptions);
	/// Positions of the given nodes; all nodes when `ids` is empty.
	fn positions(&self, ids: &[String]) -> HashMap<String, Position>;
	fn scale(&self) -> f64;
	fn redraw(&mut self);
	fn stabilize(&mut self, iterations: Option<u32>);
	fn add_edge_mode(&mut self);
	fn disable_edit_mode(&mut self);
	fn set_draw_hook(&mut self, slot: DrawSlot, hook: Option<DrawHook>);
}

#[cfg(test)]
pub(crate) mod mock {
	use super::*;

	/// Engine double that records what it was asked to do.
	#[derive(Default)]
	pub struct MockEngine {
		pub calls: Vec<String>,
		pub add_edge_mode: bool,
		pub positions: HashMap<String, Position>,
		pub selected: Vec<String>,
		pub options: Option<NetworkOptions>,
		pub hooks: HashMap<DrawSlot, DrawHook>,
		pub known: Vec<String>,
	}

	impl MockEngine {
		pub fn with_nodes(ids: &[&str]) -> Self {
			Self {
				known: ids.iter().map(|s| s.to_string()).collect(),
				..Default::default()
			}
		}
	}

	impl NetworkEngine for MockEngine {
		fn focus(&mut self, id: &str, options: FocusOptions) -> bool {
			self.calls
				.push(format!("focus {id} {} {}", options.scale, options.animated));
			self.known.iter().any(|k| k == id)
		}

		fn fit(&mut self) {
			self.calls.push("fit".into());
		}

		fn unselect_all(&mut self) {
			self.calls.push("unselect_all".into());
			self.selected.clear();
		}

		fn select_nodes(&mut self, ids: &[String]) {
			self.calls.push(format!("select_nodes {}", ids.join(",")));
			self.selected = ids.to_vec();
		}

		fn selected_nodes(&self) -> Vec<String> {
			self.selected.clone()
		}

		fn set_options(&mut self, options: &NetworkOptions) {
			self.calls.push("set_options".into());
			self.options = Some(options.clone());
		}

		fn positions(&self, ids: &[String]) -> HashMap<String, Position> {
			self.positions
				.iter()
				.filter(|(id, _)| ids.is_empty() || ids.contains(id))
				.map(|(id, p)| (id.clone(), *p))
				.collect()
		}

		fn scale(&self) -> f64 {
			1.0
		}

		fn redraw(&mut self) {
			self.calls.push("redraw".into());
		}

		fn stabilize(&mut self, iterations: Option<u32>) {
			self.calls.push(format!("stabilize {iterations:?}"));
		}

		fn add_edge_mode(&mut self) {
			self.calls.push("add_edge_mode".into());
			self.add_edge_mode = true;
		}

		fn disable_edit_mode(&mut self) {
			self.calls.push("disable_edit_mode".into());
			self.add_edge_mode = false;
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
		}
	}
}
