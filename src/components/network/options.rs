//! Engine configuration.
//!
//! Options are an opaque JSON object handed to the engine as-is. The engine
//! reads the few keys it understands into [`EngineOptions`]; everything else
//! is carried along untouched and reported back through `configChange`.

use log::debug;
use serde_json::{Map, Value};

/// Opaque engine configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkOptions(Value);

impl NetworkOptions {
	/// Wraps user options. `manipulation.addEdge` is owned by the network and
	/// is removed if present.
	pub fn new(mut value: Value) -> Self {
		let removed = value
			.get_mut("manipulation")
			.and_then(Value::as_object_mut)
			.and_then(|m| m.remove("addEdge"));
		if removed.is_some() {
			debug!("network: ignoring user supplied manipulation.addEdge");
		}
		Self(value)
	}

	/// The options as handed to the engine.
	pub fn as_value(&self) -> &Value {
		&self.0
	}

	fn lookup(&self, path: &[&str]) -> Option<&Value> {
		path.iter().try_fold(&self.0, |v, key| v.get(*key))
	}

	fn bool_at(&self, path: &[&str]) -> Option<bool> {
		self.lookup(path).and_then(Value::as_bool)
	}
}

impl From<Value> for NetworkOptions {
	fn from(value: Value) -> Self {
		Self::new(value)
	}
}

impl From<Map<String, Value>> for NetworkOptions {
	fn from(map: Map<String, Value>) -> Self {
		Self::new(Value::Object(map))
	}
}

/// Keys of [`NetworkOptions`] the force engine acts on.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
	pub physics: bool,
	pub stabilization_iterations: u32,
	pub drag_nodes: bool,
	pub drag_view: bool,
	pub zoom_view: bool,
}

impl Default for EngineOptions {
	fn default() -> Self {
		Self {
			physics: true,
			stabilization_iterations: 1000,
			drag_nodes: true,
			drag_view: true,
			zoom_view: true,
		}
	}
}

impl From<&NetworkOptions> for EngineOptions {
	fn from(options: &NetworkOptions) -> Self {
		let defaults = Self::default();
		let physics = match options.lookup(&["physics"]) {
			Some(Value::Bool(enabled)) => *enabled,
			_ => options
				.bool_at(&["physics", "enabled"])
				.unwrap_or(defaults.physics),
		};
		Self {
			physics,
			stabilization_iterations: options
				.lookup(&["physics", "stabilization", "iterations"])
				.and_then(Value::as_u64)
				.map(|n| n.min(u32::MAX as u64) as u32)
				.unwrap_or(defaults.stabilization_iterations),
			drag_nodes: options
				.bool_at(&["interaction", "dragNodes"])
				.unwrap_or(defaults.drag_nodes),
			drag_view: options
				.bool_at(&["interaction", "dragView"])
				.unwrap_or(defaults.drag_view),
			zoom_view: options
				.bool_at(&["interaction", "zoomView"])
				.unwrap_or(defaults.zoom_view),
		}
	}
}

/// Parameters of a focus move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusOptions {
	/// Zoom level at the end of the move.
	pub scale: f64,
	/// Ease into place instead of jumping.
	pub animated: bool,
}

impl FocusOptions {
	/// Eased move at scale 1.
	pub fn animated() -> Self {
		Self {
			scale: 1.0,
			animated: true,
		}
	}

	/// Jump at scale 1.
	pub fn immediate() -> Self {
		Self {
			scale: 1.0,
			animated: false,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn add_edge_handler_is_stripped() {
		let options = NetworkOptions::new(json!({
			"manipulation": { "addEdge": true, "enabled": false },
			"physics": false
		}));
		assert_eq!(
			options.as_value(),
			&json!({ "manipulation": { "enabled": false }, "physics": false })
		);
	}

	#[test]
	fn engine_options_read_known_keys() {
		let options = NetworkOptions::new(json!({
			"physics": { "stabilization": { "iterations": 250 } },
			"interaction": { "dragView": false }
		}));
		let engine = EngineOptions::from(&options);
		assert!(engine.physics);
		assert_eq!(engine.stabilization_iterations, 250);
		assert!(!engine.drag_view);
		assert!(engine.drag_nodes);

		let off = EngineOptions::from(&NetworkOptions::new(json!({ "physics": false })));
		assert!(!off.physics);
	}

	#[test]
	fn non_object_options_fall_back_to_defaults() {
		let engine = EngineOptions::from(&NetworkOptions::new(Value::Null));
		assert_eq!(engine, EngineOptions::default());
	}
}
