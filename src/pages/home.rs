use leptos::prelude::*;
use log::info;
use serde_json::json;

use crate::components::network::{
	EdgeRecord, EventActions, EventKind, NetworkCanvas, NetworkEdge, NetworkEvent, NetworkHandle,
	NetworkNode, Position,
};

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Random tree edges over `n` nodes.
fn sample_edges(n: usize) -> Vec<(String, String)> {
	(1..n)
		.map(|i| {
			let parent = (rand_simple(i) * (i as f64)) as usize;
			(parent.to_string(), i.to_string())
		})
		.collect()
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let network = StoredValue::new_local(NetworkHandle::new());
	let selected = RwSignal::new(Vec::<String>::new());
	let add_edges = RwSignal::new(false);
	let root_position = RwSignal::new(None::<Position>);
	let root_color = RwSignal::new("#d62728".to_string());

	let actions = EventActions::new().on(EventKind::Stabilized, |event| {
		if let NetworkEvent::Stabilized { iterations } = event {
			info!("layout settled after {iterations} iterations");
		}
	});
	let options = json!({
		"physics": { "stabilization": { "iterations": 600 } },
		"interaction": { "dragNodes": true },
	});
	// Self-loops are not allowed.
	let edge_added = |edge: EdgeRecord| edge.from != edge.to;

	let focus_root = move |_| {
		network.with_value(|network| network.move_to("0"));
	};
	let fit = move |_| {
		network.with_value(|network| {
			let _ = network.execute_named("fit", &[]);
		});
	};

	let nodes = (0..30)
		.map(|i| {
			let id = i.to_string();
			if i == 0 {
				view! {
					<NetworkNode
						node_id=id
						label="root"
						color=root_color
						x=0.0
						y=0.0
						value=10.0
						position=root_position
						on_select=move |_: (String, NetworkEvent)| {
							root_color.update(|c| {
								*c = if *c == "#d62728" { "#2ca02c".into() } else { "#d62728".into() };
							})
						}
					/>
				}
				.into_any()
			} else {
				let label = (i < 10).then(|| format!("Node {i}"));
				view! { <NetworkNode node_id=id label=label /> }.into_any()
			}
		})
		.collect_view();
	let edges = sample_edges(30)
		.into_iter()
		.map(|(from, to)| {
			let id = format!("{from}-{to}");
			view! { <NetworkEdge edge_id=id from=from to=to arrows="to" /> }
		})
		.collect_view();

	// The canvas holds the non-Send handle, so only the overlay sits inside
	// the error boundary.
	view! {
		<div class="fullscreen-graph">
			<NetworkCanvas
				handle=network.get_value()
				options=options
				actions=actions
				selected_nodes=selected
				add_edges=add_edges
				edge_added=edge_added
				fullscreen=true
			>
				{nodes}
				{edges}
			</NetworkCanvas>
			<ErrorBoundary fallback=|errors| {
				view! {
					<h1>"Uh oh! Something went wrong!"</h1>

					<p>"Errors: "</p>
					<ul>
						{move || {
							errors
								.get()
								.into_iter()
								.map(|(_, e)| view! { <li>{e.to_string()}</li> })
								.collect_view()
						}}
					</ul>
				}
			}>
				<div class="graph-overlay">
					<h1>"Network"</h1>
					<p class="subtitle">
						"Click to select. Drag nodes to reposition. Scroll to zoom."
					</p>
					<p>"Selected: " {move || selected.get().join(", ")}</p>
					<p>
						"Root at: "
						{move || {
							root_position
								.get()
								.map(|p| format!("({:.0}, {:.0})", p.x, p.y))
								.unwrap_or_else(|| "(0, 0)".into())
						}}
					</p>
					<button on:click=move |_| add_edges.update(|on| *on = !*on)>
						{move || if add_edges.get() { "Stop adding edges" } else { "Add edges" }}
					</button>
					<button on:click=focus_root>"Focus root"</button>
					<button on:click=fit>"Fit"</button>
				</div>
			</ErrorBoundary>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_send_sync<T: Send + Sync>(_: &T) {}

	#[test]
	fn overlay_captures_are_thread_safe() {
		let owner = Owner::new();
		owner.with(|| {
			let network = StoredValue::new_local(NetworkHandle::new());
			let fit = move || network.with_value(|network| network.is_mounted());
			assert_send_sync(&network);
			assert_send_sync(&fit);
			assert!(!fit());
		});
	}

	#[test]
	fn sample_edges_form_a_tree() {
		let edges = sample_edges(30);
		assert_eq!(edges.len(), 29);
		for (parent, child) in &edges {
			let (parent, child): (usize, usize) = (parent.parse().unwrap(), child.parse().unwrap());
			assert!(parent < child);
		}
	}
}
