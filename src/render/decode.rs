//! Turning icon bytes into RGBA pixels.

use super::editor::target_size;
use crate::models::{KeySize, Pair};
use image::RgbaImage;

/// Rasterizes SVG data into the requested box, scaled uniformly and
/// centred.
pub fn rasterize_svg(data: &[u8], requested: Pair, key: KeySize) -> Result<RgbaImage, String> {
    let tree = resvg::usvg::Tree::from_data(data, &resvg::usvg::Options::default())
        .map_err(|err| err.to_string())?;

    let svg_size = tree.size();
    let (svg_w, svg_h) = (svg_size.width(), svg_size.height());
    let (width, height) = target_size(
        requested,
        (svg_w.round() as u32, svg_h.round() as u32),
        key,
    );

    let scale = (width as f32 / svg_w).min(height as f32 / svg_h);
    let tx = (svg_w.mul_add(-scale, width as f32)) / 2.0;
    let ty = (svg_h.mul_add(-scale, height as f32)) / 2.0;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| format!("cannot allocate {width}x{height} pixmap"))?;
    let transform = resvg::tiny_skia::Transform::from_row(scale, 0.0, 0.0, scale, tx, ty);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    RgbaImage::from_raw(width, height, data).ok_or_else(|| "pixel buffer size mismatch".to_string())
}

/// Decodes PNG, JPEG, GIF or WebP data.
pub fn decode_raster(data: &[u8]) -> Result<RgbaImage, String> {
    image::load_from_memory(data)
        .map(|img| img.to_rgba8())
        .map_err(|err| err.to_string())
}
