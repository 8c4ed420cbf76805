//! Normalized-to-pixel coordinate mapping and crop rectangle clamping

use crate::error::{Result, SegmentationError};
use crate::types::{NormalizedQuad, PixelRect};

/// Values this close below an integer snap up before flooring.
///
/// Normalized vertices arrive as decimal JSON, so `(0.7 - 0.2) * 1000`
/// evaluates to `499.99999999999994` in binary floating point.
const PIXEL_EPSILON: f64 = 1e-6;

fn floor_px(value: f64) -> i64 {
    (value + PIXEL_EPSILON).floor() as i64
}

/// Convert a normalized bounding quad into a pixel rectangle.
///
/// Only the top-left and bottom-right vertices are used. A negative origin
/// is clamped to zero; a non-positive width or height is rejected with
/// [`SegmentationError::Geometry`].
pub fn to_pixel_rect(quad: &NormalizedQuad, image_width: u32, image_height: u32) -> Result<PixelRect> {
    let top_left = quad.top_left();
    let bottom_right = quad.bottom_right();
    let w = f64::from(image_width);
    let h = f64::from(image_height);

    let x = floor_px(top_left.x * w);
    let y = floor_px(top_left.y * h);
    let width = floor_px((bottom_right.x - top_left.x) * w);
    let height = floor_px((bottom_right.y - top_left.y) * h);

    if width <= 0 || height <= 0 {
        return Err(SegmentationError::geometry(format!(
            "degenerate region {}x{} for image {}x{}",
            width, height, image_width, image_height
        )));
    }

    Ok(PixelRect {
        x: x.clamp(0, i64::from(u32::MAX)) as u32,
        y: y.clamp(0, i64::from(u32::MAX)) as u32,
        width: width.min(i64::from(u32::MAX)) as u32,
        height: height.min(i64::from(u32::MAX)) as u32,
    })
}

/// Fit a rectangle inside an image before cropping.
///
/// The size is raised to at least one pixel and shrunk so the region ends
/// at the image edge. An origin outside the image is a crop error.
pub fn clamp_to_bounds(rect: PixelRect, image_width: u32, image_height: u32) -> Result<PixelRect> {
    if image_width == 0 || image_height == 0 {
        return Err(SegmentationError::crop(format!(
            "source image has no pixels ({}x{})",
            image_width, image_height
        )));
    }
    if rect.x >= image_width || rect.y >= image_height {
        return Err(SegmentationError::crop(format!(
            "region {} starts outside image {}x{}",
            rect, image_width, image_height
        )));
    }

    let width = rect.width.max(1).min(image_width - rect.x);
    let height = rect.height.max(1).min(image_height - rect.y);

    Ok(PixelRect::new(rect.x, rect.y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedPoint;

    fn quad(x1: f64, y1: f64, x2: f64, y2: f64) -> NormalizedQuad {
        NormalizedQuad::from_corners(NormalizedPoint::new(x1, y1), NormalizedPoint::new(x2, y2))
    }

    #[test]
    fn test_maps_normalized_box_to_pixels() {
        let rect = to_pixel_rect(&quad(0.1, 0.2, 0.6, 0.7), 1000, 1000).unwrap();
        assert_eq!(rect, PixelRect::new(100, 200, 500, 500));
    }

    #[test]
    fn test_non_square_image() {
        let rect = to_pixel_rect(&quad(0.25, 0.5, 0.75, 1.0), 640, 480).unwrap();
        assert_eq!(rect, PixelRect::new(160, 240, 320, 240));
    }

    #[test]
    fn test_zero_width_is_rejected() {
        for (w, h) in [(1, 1), (640, 480), (4000, 3000)] {
            let err = to_pixel_rect(&quad(0.5, 0.5, 0.5, 0.9), w, h).unwrap_err();
            assert!(matches!(err, SegmentationError::Geometry(_)));
        }
    }

    #[test]
    fn test_inverted_box_is_rejected() {
        assert!(to_pixel_rect(&quad(0.6, 0.6, 0.2, 0.9), 100, 100).is_err());
        assert!(to_pixel_rect(&quad(0.1, 0.6, 0.5, 0.2), 100, 100).is_err());
    }

    #[test]
    fn test_sub_pixel_box_is_rejected() {
        // 0.001 of a 100 px image floors to zero pixels
        assert!(to_pixel_rect(&quad(0.1, 0.1, 0.101, 0.5), 100, 100).is_err());
    }

    #[test]
    fn test_negative_origin_clamps_to_zero() {
        let rect = to_pixel_rect(&quad(-0.1, -0.05, 0.4, 0.5), 100, 100).unwrap();
        assert_eq!(rect.x, 0);
        assert_eq!(rect.y, 0);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 55);
    }

    #[test]
    fn test_clamp_shrinks_to_image_edge() {
        let rect = clamp_to_bounds(PixelRect::new(80, 90, 50, 50), 100, 100).unwrap();
        assert_eq!(rect, PixelRect::new(80, 90, 20, 10));
    }

    #[test]
    fn test_clamp_raises_size_to_one() {
        let rect = clamp_to_bounds(PixelRect::new(5, 5, 0, 0), 10, 10).unwrap();
        assert_eq!(rect, PixelRect::new(5, 5, 1, 1));
    }

    #[test]
    fn test_clamp_rejects_origin_outside_image() {
        let err = clamp_to_bounds(PixelRect::new(100, 0, 10, 10), 100, 100).unwrap_err();
        assert!(matches!(err, SegmentationError::Crop(_)));
        assert!(clamp_to_bounds(PixelRect::new(0, 0, 10, 10), 0, 10).is_err());
    }
}
