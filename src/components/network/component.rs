use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::adapter::EdgeValidator;
use super::background::{self, OffsetSource};
use super::engine::NetworkEngine;
use super::events::EventActions;
use super::handle::NetworkHandle;
use super::render::ImageCache;
use super::state::ForceGraphState;
use super::types::NetworkData;

/// Gives child elements access to the enclosing network.
#[derive(Clone, Copy)]
pub(crate) struct NetworkContext(StoredValue<NetworkHandle, LocalStorage>);

impl NetworkContext {
	fn new(handle: NetworkHandle) -> Self {
		Self(StoredValue::new_local(handle))
	}

	/// `None` once the network is gone.
	pub(crate) fn handle(&self) -> Option<NetworkHandle> {
		self.0.try_get_value()
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// Pointer position relative to the canvas.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Interactive network diagram drawn on a canvas.
///
/// Nodes and edges come from `data` and from `<NetworkNode>` / `<NetworkEdge>`
/// children. `options` is handed to the engine unchanged.
#[component]
pub fn NetworkCanvas(
	/// Bulk nodes and edges; replaces both collections when it changes.
	#[prop(optional, into)]
	data: MaybeProp<NetworkData>,
	/// Engine options as JSON.
	#[prop(optional, into)]
	options: MaybeProp<Value>,
	/// Image URL drawn under the graph.
	#[prop(optional, into)]
	background_image: MaybeProp<String>,
	/// Graph x of the image's left edge; centered when unset.
	#[prop(optional, into)]
	background_offset_x: MaybeProp<f64>,
	/// Graph y of the image's top edge; centered when unset.
	#[prop(optional, into)]
	background_offset_y: MaybeProp<f64>,
	/// While true, the user can draw edges between nodes.
	#[prop(optional, into)]
	add_edges: MaybeProp<bool>,
	/// Vetoes drawn edges by returning `false`.
	#[prop(optional, into)]
	edge_added: Option<EdgeValidator>,
	/// Two-way binding for the selected node ids.
	#[prop(optional)]
	selected_nodes: Option<RwSignal<Vec<String>>>,
	/// Receives the selected edge ids.
	#[prop(optional)]
	selected_edges: Option<RwSignal<Vec<String>>>,
	/// Callbacks for forwarded engine events.
	#[prop(optional)]
	actions: EventActions,
	/// Drives the network from outside.
	#[prop(optional)]
	handle: Option<NetworkHandle>,
	/// Fill the window and follow its size.
	#[prop(default = false)]
	fullscreen: bool,
	/// Canvas width; the parent's when unset.
	#[prop(default = None)]
	width: Option<f64>,
	/// Canvas height; the parent's when unset.
	#[prop(default = None)]
	height: Option<f64>,
	/// `<NetworkNode>` and `<NetworkEdge>` elements.
	#[prop(optional)]
	children: Option<Children>,
) -> impl IntoView {
	let network = handle.unwrap_or_default();
	network.configure(actions, edge_added, selected_nodes, selected_edges);
	provide_context(NetworkContext::new(network.clone()));

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (network_init, animate_init, resize_cb_init) =
		(network.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if network_init.is_mounted() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx = match canvas.get_context("2d") {
			Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>(),
			_ => {
				error!("network: canvas has no 2d context");
				return;
			}
		};
		let Ok(ctx) = ctx else {
			error!("network: unexpected canvas context type");
			return;
		};
		network_init.mount(ForceGraphState::new(w, h));

		if fullscreen {
			let (network_resize, canvas_resize) = (network_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				network_resize.resize(nw, nh);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (network_anim, animate_inner) = (network_init.clone(), animate_init.clone());
		let images = RefCell::new(ImageCache::default());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			network_anim.frame(&ctx, &mut images.borrow_mut());
			if let Some(ref cb) = *animate_inner.borrow() {
				if let Some(window) = web_sys::window() {
					let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let network_data = network.clone();
	Effect::new(move |_| {
		if let Some(data) = data.get() {
			network_data.set_data(data);
		}
	});

	// Changing options also re-applies the add-edge mode.
	let network_options = network.clone();
	Effect::new(move |_| {
		if let Some(options) = options.get() {
			network_options.set_options(options);
		}
	});

	let network_edges = network.clone();
	Effect::new(move |_| {
		network_edges.set_add_edges(add_edges.get().unwrap_or(false));
	});

	let network_background = network.clone();
	Effect::new(move |_| {
		let Some(src) = background_image.get().filter(|src| !src.is_empty()) else {
			network_background.clear_background();
			return;
		};
		let generation = network_background.begin_background();
		let offsets: OffsetSource = Rc::new(move || {
			(
				background_offset_x.try_get_untracked().flatten(),
				background_offset_y.try_get_untracked().flatten(),
			)
		});
		let network = network_background.clone();
		background::load(&src, offsets, move |hook| {
			network.install_background(generation, hook);
		});
	});

	// Offsets are read at draw time; a change only needs a new frame.
	let network_offsets = network.clone();
	Effect::new(move |_| {
		background_offset_x.track();
		background_offset_y.track();
		network_offsets.with_engine(|engine| engine.redraw());
	});

	if let Some(selected) = selected_nodes {
		let network_selected = network.clone();
		Effect::new(move |_| {
			network_selected.select_from_binding(selected.get());
		});
	}

	let network_md = network.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			network_md.with_engine(|engine| engine.pointer_down(x, y));
		}
	};

	let network_mm = network.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			network_mm.with_engine(|engine| engine.pointer_move(x, y));
		}
	};

	let network_mu = network.clone();
	let on_mouseup = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			network_mu.with_engine(|engine| engine.pointer_up(x, y));
			network_mu.pump_events();
		}
	};

	let network_ml = network.clone();
	let on_mouseleave = move |_: MouseEvent| {
		network_ml.with_engine(|engine| engine.pointer_leave());
	};

	let network_wh = network.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			network_wh.with_engine(|engine| engine.wheel(x, y, ev.delta_y()));
		}
	};

	view! {
		<div class="network-canvas">
			<canvas
				node_ref=canvas_ref
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div style="display: none;">{children.map(|children| children())}</div>
		</div>
	}
}
