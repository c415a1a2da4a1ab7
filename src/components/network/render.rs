use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::engine::DrawSlot;
use super::state::{ForceGraphState, LaidOutEdge, node_radius};
use super::types::Shape;

const BACKGROUND: &str = "#1a1a2e";
const EDGE_COLOR: &str = "rgba(100, 180, 255, 0.6)";
const SELECTED: &str = "#ffffff";
const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Node images by url, loaded on first use.
#[derive(Default)]
pub struct ImageCache {
	images: HashMap<String, HtmlImageElement>,
}

impl ImageCache {
	/// The image for `src` if it has finished loading.
	fn ready(&mut self, src: &str) -> Option<&HtmlImageElement> {
		if !self.images.contains_key(src) {
			let image = HtmlImageElement::new().ok()?;
			image.set_src(src);
			self.images.insert(src.to_string(), image);
		}
		self.images
			.get(src)
			.filter(|image| image.complete() && image.natural_width() > 0)
	}
}

/// Draws one frame. Returns `true` while some node image is still loading,
/// so the caller keeps redrawing.
pub fn render(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	images: &mut ImageCache,
) -> bool {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	for slot in [DrawSlot::Background, DrawSlot::BeforeDrawing] {
		if let Some(hook) = state.hook(slot) {
			hook(ctx);
		}
	}
	let positions = state.node_positions();
	draw_edges(state, &positions, ctx);
	draw_pending_edge(state, &positions, ctx);
	let loading = draw_nodes(state, ctx, images);
	if let Some(hook) = state.hook(DrawSlot::AfterDrawing) {
		hook(ctx);
	}

	ctx.restore();
	loading
}

fn draw_edges(
	state: &ForceGraphState,
	positions: &HashMap<DefaultNodeIdx, (f64, f64)>,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.transform.k;
	let arrow_size = 8.0 / k;
	let radii = node_radii(state);

	for edge in state.edges() {
		let (Some(&(x1, y1)), Some(&(x2, y2))) =
			(positions.get(&edge.from), positions.get(&edge.to))
		else {
			continue;
		};
		let selected = state.selected_edges.contains(&edge.record.id);
		let color = if selected {
			SELECTED
		} else {
			edge.record.color.as_deref().unwrap_or(EDGE_COLOR)
		};
		let weight = edge.record.value.map_or(1.0, |v| (1.0 + v.max(0.0)).sqrt());
		ctx.set_stroke_style_str(color);
		ctx.set_fill_style_str(color);
		ctx.set_line_width(1.5 * weight * if selected { 2.0 } else { 1.0 } / k);

		let r_from = radii.get(&edge.from).copied().unwrap_or(0.0);
		if edge.from == edge.to {
			draw_loop(ctx, x1, y1, r_from);
			continue;
		}
		let r_to = radii.get(&edge.to).copied().unwrap_or(0.0);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);

		let head = if edge.record.has_arrow("to") { arrow_size } else { 0.0 };
		let tail = if edge.record.has_arrow("from") { arrow_size } else { 0.0 };
		ctx.begin_path();
		ctx.move_to(x1 + ux * (r_from + tail), y1 + uy * (r_from + tail));
		ctx.line_to(x2 - ux * (r_to + head), y2 - uy * (r_to + head));
		ctx.stroke();

		draw_arrows(ctx, edge, (x1, y1, r_from), (x2, y2, r_to), (ux, uy), arrow_size);
	}
}

fn draw_arrows(
	ctx: &CanvasRenderingContext2d,
	edge: &LaidOutEdge,
	(x1, y1, r_from): (f64, f64, f64),
	(x2, y2, r_to): (f64, f64, f64),
	(ux, uy): (f64, f64),
	size: f64,
) {
	if edge.record.has_arrow("to") {
		draw_arrow(ctx, x2 - ux * r_to, y2 - uy * r_to, ux, uy, size);
	}
	if edge.record.has_arrow("middle") {
		let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
		draw_arrow(ctx, mx + ux * size / 2.0, my + uy * size / 2.0, ux, uy, size);
	}
	if edge.record.has_arrow("from") {
		draw_arrow(ctx, x1 + ux * r_from, y1 + uy * r_from, -ux, -uy, size);
	}
}

/// Filled triangle with its tip at `(tip_x, tip_y)` pointing along `(ux, uy)`.
fn draw_arrow(ctx: &CanvasRenderingContext2d, tip_x: f64, tip_y: f64, ux: f64, uy: f64, size: f64) {
	let (back_x, back_y) = (tip_x - ux * size, tip_y - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_loop(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64) {
	let r = radius * 0.8;
	ctx.begin_path();
	let _ = ctx.arc(x + radius * 0.7, y - radius * 0.7, r, 0.0, 2.0 * PI);
	ctx.stroke();
}

/// Dashed rubber band from the source node to the cursor in add-edge mode.
fn draw_pending_edge(
	state: &ForceGraphState,
	positions: &HashMap<DefaultNodeIdx, (f64, f64)>,
	ctx: &CanvasRenderingContext2d,
) {
	let Some(pending) = &state.pending_edge else {
		return;
	};
	let Some((x1, y1)) = source_position(state, positions, &pending.from) else {
		return;
	};
	let k = state.transform.k;
	ctx.set_stroke_style_str(SELECTED);
	ctx.set_line_width(1.5 / k);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(8.0 / k),
		&JsValue::from_f64(4.0 / k),
	));
	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(pending.x, pending.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn source_position(
	state: &ForceGraphState,
	positions: &HashMap<DefaultNodeIdx, (f64, f64)>,
	id: &str,
) -> Option<(f64, f64)> {
	let mut found = None;
	state.graph.visit_nodes(|node| {
		if node.data.user_data.record.id == id {
			found = positions.get(&node.index()).copied();
		}
	});
	found
}

fn node_radii(state: &ForceGraphState) -> HashMap<DefaultNodeIdx, f64> {
	let mut radii = HashMap::new();
	state.graph.visit_nodes(|node| {
		radii.insert(node.index(), node_radius(&node.data.user_data.record));
	});
	radii
}

fn draw_nodes(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	images: &mut ImageCache,
) -> bool {
	let k = state.transform.k;
	let mut loading = false;

	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let record = &info.record;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let radius = node_radius(record);

		let image = match (record.shape(), record.image.as_deref()) {
			(Shape::Image, Some(src)) => {
				let ready = images.ready(src);
				loading |= ready.is_none();
				ready
			}
			_ => None,
		};
		match image {
			Some(image) => {
				let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
					image,
					x - radius,
					y - radius,
					radius * 2.0,
					radius * 2.0,
				);
			}
			None => {
				ctx.begin_path();
				let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
				let fill = record
					.color
					.as_deref()
					.unwrap_or(COLORS[info.slot % COLORS.len()]);
				ctx.set_fill_style_str(fill);
				ctx.fill();
			}
		}

		if state.selected_nodes.contains(&record.id) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(SELECTED);
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		if let Some(label) = &record.label {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
			let _ = ctx.fill_text(label, x + radius + 3.0, y + 3.0);
		}
	});

	loading
}
