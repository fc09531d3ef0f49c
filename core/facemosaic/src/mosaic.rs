use image::imageops::{self, FilterType};
use image::RgbImage;

/// Produce a mosaic-blurred copy of `frame` with the same dimensions.
///
/// Two chained resampling passes: an averaging downsample to
/// `tiny_width` × `tiny_height` strips fine detail, then a
/// nearest-neighbor upsample back to the frame's size turns each tiny
/// pixel into a visible square block. The blockiness is the point —
/// this is a pixelation effect, not a smooth blur.
///
/// Deterministic for a fixed frame and tiny size.
pub fn mosaic(frame: &RgbImage, tiny_width: u32, tiny_height: u32) -> RgbImage {
    let tiny = imageops::resize(frame, tiny_width, tiny_height, FilterType::Triangle);
    imageops::resize(&tiny, frame.width(), frame.height(), FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_rgb(width: u32, height: u32) -> RgbImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        img
    }

    #[test]
    fn output_matches_input_dimensions() {
        let frame = make_test_rgb(64, 48);
        let blurred = mosaic(&frame, 8, 6);
        assert_eq!(blurred.width(), 64);
        assert_eq!(blurred.height(), 48);
    }

    #[test]
    fn deterministic_across_calls() {
        let frame = make_test_rgb(64, 48);
        let a = mosaic(&frame, 8, 6);
        let b = mosaic(&frame, 8, 6);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn nearest_upsample_produces_uniform_blocks() {
        let frame = make_test_rgb(64, 64);
        let blurred = mosaic(&frame, 4, 4);
        // Each 16x16 block stems from one tiny pixel, so it is uniform.
        for by in 0..4u32 {
            for bx in 0..4u32 {
                let anchor = blurred.get_pixel(bx * 16, by * 16);
                for dy in 0..16 {
                    for dx in 0..16 {
                        assert_eq!(blurred.get_pixel(bx * 16 + dx, by * 16 + dy), anchor);
                    }
                }
            }
        }
    }

    #[test]
    fn uniform_input_stays_uniform() {
        let frame = RgbImage::from_pixel(30, 20, image::Rgb([17, 42, 200]));
        let blurred = mosaic(&frame, 5, 3);
        for p in blurred.pixels() {
            assert_eq!(p, &image::Rgb([17, 42, 200]));
        }
    }
}
