//! Pixel operations applied to an icon layer, in the order the compositor
//! calls them: tint or fit, padding, background, border, offset,
//! brightness, then centring on the key.

use crate::constants::MAX_ICON_DIMENSION;
use crate::models::{KeySize, Pair, RgbColor, SizeMode};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Resolves the requested icon box against the source dimensions.
///
/// A zero side follows the source aspect ratio; `0 0` is the full key.
#[must_use]
pub fn target_size(requested: Pair, source: (u32, u32), key: KeySize) -> (u32, u32) {
    let (sw, sh) = (source.0.max(1) as f64, source.1.max(1) as f64);
    let side = |value: i32| value.max(0).unsigned_abs().min(MAX_ICON_DIMENSION);
    let (w, h) = (side(requested.x), side(requested.y));
    match (w, h) {
        (0, 0) => (key.width, key.height),
        (0, h) => (scaled(h, sw / sh), h),
        (w, 0) => (w, scaled(w, sh / sw)),
        (w, h) => (w, h),
    }
}

fn scaled(length: u32, ratio: f64) -> u32 {
    ((length as f64) * ratio)
        .round()
        .clamp(1.0, f64::from(MAX_ICON_DIMENSION)) as u32
}

/// Paints every non-transparent pixel with `color`, keeping its alpha.
pub fn tint(image: &mut RgbaImage, color: RgbColor) {
    for pixel in image.pixels_mut() {
        if pixel[3] > 0 {
            *pixel = color.to_rgba(pixel[3]);
        }
    }
}

/// Fits a raster image into a `width` x `height` box.
#[must_use]
pub fn fit(image: &RgbaImage, mode: SizeMode, width: u32, height: u32) -> RgbaImage {
    let (width, height) = (width.max(1), height.max(1));
    let (sw, sh) = image.dimensions();
    if (sw, sh) == (width, height) {
        return image.clone();
    }
    let scale_x = width as f64 / sw.max(1) as f64;
    let scale_y = height as f64 / sh.max(1) as f64;

    match mode {
        SizeMode::Stretch => imageops::resize(image, width, height, FilterType::Lanczos3),
        SizeMode::Cover => {
            let scale = scale_x.max(scale_y);
            let rw = ((sw as f64 * scale).ceil() as u32).max(width);
            let rh = ((sh as f64 * scale).ceil() as u32).max(height);
            let resized = imageops::resize(image, rw, rh, FilterType::Lanczos3);
            imageops::crop_imm(&resized, (rw - width) / 2, (rh - height) / 2, width, height)
                .to_image()
        }
        SizeMode::Contain => {
            let scale = scale_x.min(scale_y);
            let rw = ((sw as f64 * scale).round() as u32).clamp(1, width);
            let rh = ((sh as f64 * scale).round() as u32).clamp(1, height);
            let resized = imageops::resize(image, rw, rh, FilterType::Lanczos3);
            let mut canvas = RgbaImage::new(width, height);
            imageops::overlay(
                &mut canvas,
                &resized,
                i64::from((width - rw) / 2),
                i64::from((height - rh) / 2),
            );
            canvas
        }
    }
}

/// Adds a transparent border of `padding` pixels on every side, at most
/// [`MAX_ICON_DIMENSION`].
#[must_use]
pub fn pad(image: RgbaImage, padding: u32) -> RgbaImage {
    let padding = padding.min(MAX_ICON_DIMENSION);
    if padding == 0 {
        return image;
    }
    let grow = padding * 2;
    let mut canvas = RgbaImage::new(
        image.width().saturating_add(grow),
        image.height().saturating_add(grow),
    );
    imageops::replace(&mut canvas, &image, i64::from(padding), i64::from(padding));
    canvas
}

/// Fills `color` behind the image.
#[must_use]
pub fn fill_background(image: RgbaImage, color: Option<RgbColor>) -> RgbaImage {
    let Some(color) = color else {
        return image;
    };
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), color.to_rgba(255));
    imageops::overlay(&mut canvas, &image, 0, 0);
    canvas
}

/// Whether the centre of pixel `(x, y)` lies in the rectangle
/// `[x0, x1) x [y0, y1)` with corners rounded by `radius`.
fn in_rounded_rect(x: u32, y: u32, (x0, y0, x1, y1): (u32, u32, u32, u32), radius: u32) -> bool {
    if x < x0 || y < y0 || x >= x1 || y >= y1 {
        return false;
    }
    let radius = radius.min((x1 - x0) / 2).min((y1 - y0) / 2) as f64;
    if radius <= 0.0 {
        return true;
    }
    let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
    let cx = px.clamp(x0 as f64 + radius, x1 as f64 - radius);
    let cy = py.clamp(y0 as f64 + radius, y1 as f64 - radius);
    (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius
}

/// Rounds the corners and draws a border of `width` around the image.
///
/// The border grows the image by `width` on every side. The corner radius
/// clips the image even without a border; the image itself is clipped to
/// the inner radius `radius - width`.
#[must_use]
pub fn apply_border(image: RgbaImage, width: u32, radius: u32, color: RgbColor) -> RgbaImage {
    let width = width.min(MAX_ICON_DIMENSION);
    if width == 0 && radius == 0 {
        return image;
    }
    let padded = pad(image, width);
    let (w, h) = padded.dimensions();
    let outer = (0, 0, w, h);
    let inner = (width, width, w.saturating_sub(width), h.saturating_sub(width));
    let inner_radius = radius.saturating_sub(width);
    let stroke = color.to_rgba(255);

    RgbaImage::from_fn(w, h, |x, y| {
        if !in_rounded_rect(x, y, outer, radius) {
            Rgba([0, 0, 0, 0])
        } else if width > 0 && !in_rounded_rect(x, y, inner, inner_radius) {
            stroke
        } else {
            *padded.get_pixel(x, y)
        }
    })
}

/// Moves the image by `offset`: the canvas grows by the offset and the
/// image is placed at the far side of it. Each component is clamped to
/// [`MAX_ICON_DIMENSION`].
#[must_use]
pub fn shift(image: RgbaImage, offset: Pair) -> RgbaImage {
    if offset == Pair::default() {
        return image;
    }
    let limit = MAX_ICON_DIMENSION as i32;
    let (dx, dy) = (offset.x.clamp(-limit, limit), offset.y.clamp(-limit, limit));
    let mut canvas = RgbaImage::new(
        image.width().saturating_add(dx.unsigned_abs()),
        image.height().saturating_add(dy.unsigned_abs()),
    );
    imageops::replace(
        &mut canvas,
        &image,
        i64::from(dx.max(0)),
        i64::from(dy.max(0)),
    );
    canvas
}

/// Scales the color channels to `percent`. Values outside `1..=100` leave
/// the image untouched.
pub fn adjust_brightness(image: &mut RgbaImage, percent: Option<u8>) {
    let Some(percent @ 1..=99) = percent else {
        return;
    };
    for pixel in image.pixels_mut() {
        let dimmed = RgbColor::new(pixel[0], pixel[1], pixel[2]).dim(percent);
        *pixel = dimmed.to_rgba(pixel[3]);
    }
}

/// Places the image centred on a transparent key canvas, cropping what
/// overflows.
#[must_use]
pub fn center_on(image: &RgbaImage, key: KeySize) -> RgbaImage {
    let mut canvas = RgbaImage::new(key.width, key.height);
    let x = (i64::from(key.width) - i64::from(image.width())) / 2;
    let y = (i64::from(key.height) - i64::from(image.height())) / 2;
    imageops::overlay(&mut canvas, image, x, y);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn test_target_size_aspect() {
        let key = KeySize::new(96, 96);
        assert_eq!(target_size(Pair::new(100, 0), (200, 100), key), (100, 50));
        assert_eq!(target_size(Pair::new(0, 30), (200, 100), key), (60, 30));
        assert_eq!(target_size(Pair::new(0, 0), (200, 100), key), (96, 96));
        assert_eq!(target_size(Pair::new(40, 20), (200, 100), key), (40, 20));
    }

    #[test]
    fn test_tint_keeps_alpha() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 128]));
        image.put_pixel(1, 0, CLEAR);
        tint(&mut image, RgbColor::new(10, 20, 30));
        assert_eq!(*image.get_pixel(0, 0), Rgba([10, 20, 30, 128]));
        assert_eq!(*image.get_pixel(1, 0), CLEAR);
    }

    #[test]
    fn test_fit_modes() {
        let wide = RgbaImage::from_pixel(40, 20, RED);

        let cover = fit(&wide, SizeMode::Cover, 10, 10);
        assert_eq!(cover.dimensions(), (10, 10));
        assert_eq!(cover.get_pixel(0, 0)[3], 255);

        let contain = fit(&wide, SizeMode::Contain, 10, 10);
        assert_eq!(contain.dimensions(), (10, 10));
        // letterboxed top and bottom
        assert_eq!(*contain.get_pixel(5, 0), CLEAR);
        assert_eq!(contain.get_pixel(5, 5)[3], 255);

        let stretch = fit(&wide, SizeMode::Stretch, 10, 10);
        assert_eq!(stretch.dimensions(), (10, 10));
        assert_eq!(stretch.get_pixel(5, 0)[3], 255);
    }

    #[test]
    fn test_pad_and_background() {
        let image = pad(RgbaImage::from_pixel(2, 2, RED), 3);
        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(*image.get_pixel(0, 0), CLEAR);
        assert_eq!(*image.get_pixel(3, 3), RED);

        let filled = fill_background(image, Some(RgbColor::new(0, 0, 255)));
        assert_eq!(*filled.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*filled.get_pixel(3, 3), RED);
    }

    #[test]
    fn test_border_and_radius() {
        let image = RgbaImage::from_pixel(10, 10, RED);
        let bordered = apply_border(image.clone(), 2, 0, RgbColor::WHITE);
        assert_eq!(bordered.dimensions(), (14, 14));
        assert_eq!(*bordered.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*bordered.get_pixel(7, 7), RED);

        let rounded = apply_border(image, 0, 5, RgbColor::WHITE);
        assert_eq!(rounded.dimensions(), (10, 10));
        assert_eq!(rounded.get_pixel(0, 0)[3], 0);
        assert_eq!(*rounded.get_pixel(5, 5), RED);
    }

    #[test]
    fn test_shift_grows_canvas() {
        let image = RgbaImage::from_pixel(4, 4, RED);
        let moved = shift(image.clone(), Pair::new(6, -2));
        assert_eq!(moved.dimensions(), (10, 6));
        assert_eq!(*moved.get_pixel(6, 0), RED);
        assert_eq!(*moved.get_pixel(0, 0), CLEAR);
        assert_eq!(shift(image, Pair::default()).dimensions(), (4, 4));
    }

    #[test]
    fn test_oversized_geometry_is_clamped() {
        let max = MAX_ICON_DIMENSION;
        let image = RgbaImage::from_pixel(2, 2, RED);
        assert_eq!(pad(image.clone(), u32::MAX).dimensions(), (2 + 2 * max, 2 + 2 * max));
        assert_eq!(
            shift(image.clone(), Pair::new(i32::MIN, i32::MAX)).dimensions(),
            (2 + max, 2 + max)
        );
        assert_eq!(
            apply_border(image, u32::MAX, 0, RgbColor::WHITE).dimensions(),
            (2 + 2 * max, 2 + 2 * max)
        );

        let key = KeySize::new(96, 96);
        assert_eq!(target_size(Pair::new(i32::MAX, 0), (1, 1), key), (max, max));
        assert_eq!(target_size(Pair::new(0, 10), (10_000, 1), key), (max, 10));
    }

    #[test]
    fn test_brightness_range() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255]));
        adjust_brightness(&mut image, Some(50));
        assert_eq!(*image.get_pixel(0, 0), Rgba([100, 50, 25, 255]));
        for ignored in [None, Some(0), Some(100), Some(150)] {
            adjust_brightness(&mut image, ignored);
        }
        assert_eq!(*image.get_pixel(0, 0), Rgba([100, 50, 25, 255]));
    }

    #[test]
    fn test_center_crops_overflow() {
        let key = KeySize::new(4, 4);
        let centered = center_on(&RgbaImage::from_pixel(2, 2, RED), key);
        assert_eq!(*centered.get_pixel(1, 1), RED);
        assert_eq!(*centered.get_pixel(0, 0), CLEAR);

        let cropped = center_on(&RgbaImage::from_pixel(8, 8, RED), key);
        assert_eq!(cropped.dimensions(), (4, 4));
        assert_eq!(*cropped.get_pixel(0, 0), RED);
    }
}
