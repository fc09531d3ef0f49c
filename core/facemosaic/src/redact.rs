use image::{Rgb, RgbImage};

use crate::face_detector::FaceRect;
use crate::RedactionMode;

/// Outline color (red) and stroke width used in outline mode.
const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const OUTLINE_THICKNESS: u32 = 2;

/// Apply the selected redaction to every detected region.
///
/// `rects` are in detection-scale coordinates and are rescaled by
/// `scale` before touching the frame. Rescaled bounds are clamped to
/// both the frame and the mosaic before any pixel write; integer
/// truncation during downscaling can push a rescaled rectangle past the
/// frame edge, and a clamped write is the correct response, not an
/// out-of-bounds one.
///
/// Mutates `frame` in place. `rects` and `mosaic` are never modified.
pub fn redact_regions(
    frame: &mut RgbImage,
    mosaic: &RgbImage,
    rects: &[FaceRect],
    scale: u32,
    mode: RedactionMode,
) {
    for rect in rects {
        let scaled = rect.scaled_by(scale);
        match mode {
            RedactionMode::Outline => draw_outline(frame, &scaled),
            RedactionMode::Blur => blit_mosaic(frame, mosaic, &scaled),
        }
    }
}

/// Clamp a rescaled rectangle to `width` × `height`, returning half-open
/// pixel bounds `(x0, y0, x1, y1)`. Degenerate results collapse to an
/// empty range.
fn clamped_bounds(rect: &FaceRect, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let x0 = rect.x.min(width);
    let y0 = rect.y.min(height);
    let x1 = rect.x.saturating_add(rect.width).min(width);
    let y1 = rect.y.saturating_add(rect.height).min(height);
    (x0, y0, x1, y1)
}

/// Overwrite the rectangle's pixel block with the corresponding block
/// from the mosaic frame.
fn blit_mosaic(frame: &mut RgbImage, mosaic: &RgbImage, rect: &FaceRect) {
    let width = frame.width().min(mosaic.width());
    let height = frame.height().min(mosaic.height());
    let (x0, y0, x1, y1) = clamped_bounds(rect, width, height);
    for y in y0..y1 {
        for x in x0..x1 {
            frame.put_pixel(x, y, *mosaic.get_pixel(x, y));
        }
    }
}

/// Draw an unfilled rectangle outline, leaving interior pixels intact.
fn draw_outline(frame: &mut RgbImage, rect: &FaceRect) {
    let (x0, y0, x1, y1) = clamped_bounds(rect, frame.width(), frame.height());
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    for y in y0..y1 {
        for x in x0..x1 {
            let on_edge = x < x0 + OUTLINE_THICKNESS
                || x >= x1.saturating_sub(OUTLINE_THICKNESS)
                || y < y0 + OUTLINE_THICKNESS
                || y >= y1.saturating_sub(OUTLINE_THICKNESS);
            if on_edge {
                frame.put_pixel(x, y, OUTLINE_COLOR);
            }
        }
    }
}
