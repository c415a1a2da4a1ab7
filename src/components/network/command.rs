//! Closed set of engine operations callable from outside the component.

use std::collections::HashMap;

use log::error;
use serde_json::Value;
use thiserror::Error;

use super::engine::NetworkEngine;
use super::options::{FocusOptions, NetworkOptions};
use super::types::Position;

/// An engine operation.
#[derive(Clone, Debug, PartialEq)]
pub enum NetworkCommand {
	/// Center the view on a node.
	Focus {
		/// Node to focus.
		id: String,
		/// Zoom level to end at.
		scale: f64,
		/// Ease into place instead of jumping.
		animated: bool,
	},
	/// Zoom so that every node is visible.
	Fit,
	/// Restart the layout.
	Stabilize {
		/// Tick limit; the configured one when `None`.
		iterations: Option<u32>,
	},
	/// Draw a frame.
	Redraw,
	/// Clear the node and edge selection.
	UnselectAll,
	/// Select these nodes.
	SelectNodes(Vec<String>),
	/// Ids of the selected nodes.
	GetSelectedNodes,
	/// Node positions. Empty means all nodes.
	GetPositions(Vec<String>),
	/// Current zoom level.
	GetScale,
	/// Let the user draw one edge.
	AddEdgeMode,
	/// Leave add-edge mode.
	DisableEditMode,
	/// Apply new options, passed through unchanged.
	SetOptions(Value),
}

/// What a command hands back.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutput {
	/// Nothing to report.
	Done,
	/// Selected node ids.
	Ids(Vec<String>),
	/// Node positions by id.
	Positions(HashMap<String, Position>),
	/// Current zoom level.
	Scale(f64),
}

/// Why a command could not run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecuteError {
	/// No engine method by that name.
	#[error("could not find function {0}")]
	UnknownCommand(String),

	/// Arguments missing or of the wrong type.
	#[error("invalid arguments for {command}: {reason}")]
	InvalidArguments {
		/// Method name.
		command: &'static str,
		/// What was expected.
		reason: String,
	},

	/// The node to focus does not exist.
	#[error("no node with id {0}")]
	UnknownNode(String),

	/// The canvas has not taken the handle yet.
	#[error("network is not mounted yet")]
	NotMounted,
}

impl NetworkCommand {
	/// Builds a command from an engine method name and JSON arguments, e.g.
	/// `("focus", ["3", { "scale": 2 }])`.
	pub fn from_call(name: &str, args: &[Value]) -> Result<Self, ExecuteError> {
		let command = match name {
			"focus" => {
				let id = id_arg(args.first()).ok_or_else(|| invalid("focus", "expected a node id"))?;
				let opts = args.get(1);
				NetworkCommand::Focus {
					id,
					scale: opts
						.and_then(|o| o.get("scale"))
						.and_then(Value::as_f64)
						.unwrap_or(1.0),
					animated: opts
						.and_then(|o| o.get("animation"))
						.is_some_and(|a| a.as_bool().unwrap_or(!a.is_null())),
				}
			}
			"fit" => NetworkCommand::Fit,
			"stabilize" => NetworkCommand::Stabilize {
				iterations: args
					.first()
					.and_then(Value::as_u64)
					.map(|n| n.min(u32::MAX as u64) as u32),
			},
			"redraw" => NetworkCommand::Redraw,
			"unselectAll" => NetworkCommand::UnselectAll,
			"selectNodes" => NetworkCommand::SelectNodes(
				id_list(args.first()).ok_or_else(|| invalid("selectNodes", "expected a list of ids"))?,
			),
			"getSelectedNodes" => NetworkCommand::GetSelectedNodes,
			"getPositions" => NetworkCommand::GetPositions(match args.first() {
				None | Some(Value::Null) => Vec::new(),
				Some(Value::Array(_)) => id_list(args.first())
					.ok_or_else(|| invalid("getPositions", "expected ids"))?,
				single => vec![id_arg(single).ok_or_else(|| invalid("getPositions", "expected ids"))?],
			}),
			"getScale" => NetworkCommand::GetScale,
			"addEdgeMode" => NetworkCommand::AddEdgeMode,
			"disableEditMode" => NetworkCommand::DisableEditMode,
			"setOptions" => NetworkCommand::SetOptions(args.first().cloned().unwrap_or(Value::Null)),
			other => return Err(ExecuteError::UnknownCommand(other.to_string())),
		};
		Ok(command)
	}

	/// Runs the command against `engine`.
	pub fn execute(self, engine: &mut dyn NetworkEngine) -> Result<CommandOutput, ExecuteError> {
		let output = match self {
			NetworkCommand::Focus {
				id,
				scale,
				animated,
			} => {
				if !engine.focus(&id, FocusOptions { scale, animated }) {
					return Err(ExecuteError::UnknownNode(id));
				}
				CommandOutput::Done
			}
			NetworkCommand::Fit => {
				engine.fit();
				CommandOutput::Done
			}
			NetworkCommand::Stabilize { iterations } => {
				engine.stabilize(iterations);
				CommandOutput::Done
			}
			NetworkCommand::Redraw => {
				engine.redraw();
				CommandOutput::Done
			}
			NetworkCommand::UnselectAll => {
				engine.unselect_all();
				CommandOutput::Done
			}
			NetworkCommand::SelectNodes(ids) => {
				engine.select_nodes(&ids);
				CommandOutput::Done
			}
			NetworkCommand::GetSelectedNodes => CommandOutput::Ids(engine.selected_nodes()),
			NetworkCommand::GetPositions(ids) => CommandOutput::Positions(engine.positions(&ids)),
			NetworkCommand::GetScale => CommandOutput::Scale(engine.scale()),
			NetworkCommand::AddEdgeMode => {
				engine.add_edge_mode();
				CommandOutput::Done
			}
			NetworkCommand::DisableEditMode => {
				engine.disable_edit_mode();
				CommandOutput::Done
			}
			NetworkCommand::SetOptions(value) => {
				engine.set_options(&NetworkOptions::new(value));
				CommandOutput::Done
			}
		};
		Ok(output)
	}
}

/// Parses and runs a named call, logging failures.
pub fn execute_named(
	engine: &mut dyn NetworkEngine,
	name: &str,
	args: &[Value],
) -> Result<CommandOutput, ExecuteError> {
	NetworkCommand::from_call(name, args)
		.and_then(|command| command.execute(engine))
		.inspect_err(|e| error!("network: {e}"))
}

fn invalid(command: &'static str, reason: &str) -> ExecuteError {
	ExecuteError::InvalidArguments {
		command,
		reason: reason.to_string(),
	}
}

/// Ids may be given as strings or numbers.
fn id_arg(value: Option<&Value>) -> Option<String> {
	match value? {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn id_list(value: Option<&Value>) -> Option<Vec<String>> {
	value?
		.as_array()?
		.iter()
		.map(|v| id_arg(Some(v)))
		.collect()
}
