//! Optional image painted under the graph.

use std::rc::Rc;

use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::engine::DrawHook;

/// Where the image's top-left corner goes in graph space. A missing offset
/// centers the image on the origin along that axis.
pub fn background_offset(
	offset_x: Option<f64>,
	offset_y: Option<f64>,
	width: f64,
	height: f64,
) -> (f64, f64) {
	(
		offset_x.unwrap_or(width / -2.0),
		offset_y.unwrap_or(height / -2.0),
	)
}

/// Reads the current offsets at draw time.
pub type OffsetSource = Rc<dyn Fn() -> (Option<f64>, Option<f64>)>;

fn paint_hook(image: HtmlImageElement, offsets: OffsetSource) -> DrawHook {
	Rc::new(move |ctx: &CanvasRenderingContext2d| {
		let (ox, oy) = offsets();
		let (x, y) = background_offset(
			ox,
			oy,
			image.natural_width() as f64,
			image.natural_height() as f64,
		);
		let _ = ctx.draw_image_with_html_image_element(&image, x, y);
	})
}

/// Starts loading `src`. Once loaded, `install` receives the hook that paints
/// it. A failed load is ignored.
pub fn load(src: &str, offsets: OffsetSource, install: impl FnOnce(DrawHook) + 'static) {
	let Ok(image) = HtmlImageElement::new() else {
		return;
	};
	let loaded = image.clone();
	let onload = Closure::once_into_js(move || {
		debug!("network: background image loaded");
		install(paint_hook(loaded, offsets));
	});
	image.set_onload(Some(onload.unchecked_ref()));
	image.set_src(src);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_offsets_center_the_image() {
		assert_eq!(background_offset(None, None, 200.0, 100.0), (-100.0, -50.0));
	}

	#[test]
	fn explicit_offsets_win_including_zero() {
		assert_eq!(background_offset(Some(0.0), Some(15.0), 200.0, 100.0), (0.0, 15.0));
		assert_eq!(background_offset(None, Some(0.0), 200.0, 100.0), (-100.0, 0.0));
	}
}
