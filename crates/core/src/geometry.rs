//! Axis-aligned boxes and ratio tolerance checks.

use serde::{Deserialize, Serialize};

/// Relative slack applied when comparing two aspect ratios. A detected ratio
/// within `reference / (1 + t) ..= reference * (1 + t)` passes.
pub const DEFAULT_ASPECT_RATIO_TOLERANCE: f64 = 0.20;

/// Float guard for inclusive tolerance boundaries. A detection sitting
/// exactly on the limit (e.g. a 120% stretch against a 20% tolerance) must
/// not fail on representation error.
const RATIO_EPS: f64 = 1e-9;

/// An axis-aligned rectangle in pixel coordinates. Negative origins are
/// allowed (projections can land off-canvas before clamping); width and
/// height are non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Width over height. `None` for degenerate boxes.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width <= 0 || self.height <= 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Clamp to a `width x height` canvas anchored at the origin. Returns
    /// `None` when nothing of the box remains on-canvas.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(width as i32);
        let y1 = (self.y + self.height).min(height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(BoundingBox::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Whether `detected / reference` stays within a relative tolerance band.
///
/// The band is inclusive on both ends: `1/(1+t) ..= (1+t)`. Non-positive
/// inputs never pass.
pub fn ratio_within_tolerance(detected: f64, reference: f64, tolerance: f64) -> bool {
    if detected <= 0.0 || reference <= 0.0 || tolerance < 0.0 {
        return false;
    }
    let ratio = detected / reference;
    let upper = 1.0 + tolerance;
    let lower = 1.0 / upper;
    ratio >= lower - RATIO_EPS && ratio <= upper + RATIO_EPS
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- bounding box ---------------------------------------------------------

    #[test]
    fn aspect_ratio_of_degenerate_box_is_none() {
        assert_eq!(BoundingBox::new(0, 0, 0, 10).aspect_ratio(), None);
        assert_eq!(BoundingBox::new(0, 0, 10, 0).aspect_ratio(), None);
    }

    #[test]
    fn aspect_ratio_is_width_over_height() {
        let b = BoundingBox::new(5, 5, 200, 100);
        assert!((b.aspect_ratio().unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn contains_point_is_half_open() {
        let b = BoundingBox::new(10, 10, 5, 5);
        assert!(b.contains_point(10, 10));
        assert!(b.contains_point(14, 14));
        assert!(!b.contains_point(15, 10));
        assert!(!b.contains_point(10, 15));
        assert!(!b.contains_point(9, 10));
    }

    #[test]
    fn intersects_detects_overlap_and_separation() {
        let a = BoundingBox::new(0, 0, 10, 10);
        assert!(a.intersects(&BoundingBox::new(5, 5, 10, 10)));
        assert!(!a.intersects(&BoundingBox::new(10, 0, 5, 5)));
        assert!(!a.intersects(&BoundingBox::new(0, 20, 5, 5)));
    }

    #[test]
    fn clamp_to_trims_offcanvas_parts() {
        let b = BoundingBox::new(-5, -5, 20, 20);
        let clamped = b.clamp_to(100, 100).unwrap();
        assert_eq!(clamped, BoundingBox::new(0, 0, 15, 15));

        let off = BoundingBox::new(200, 200, 10, 10);
        assert_eq!(off.clamp_to(100, 100), None);
    }

    // -- ratio tolerance ------------------------------------------------------

    #[test]
    fn ratio_exactly_at_band_edge_passes() {
        // 120% of the reference against a 20% tolerance sits on the boundary.
        assert!(ratio_within_tolerance(1.2, 1.0, 0.20));
        assert!(ratio_within_tolerance(1.0 / 1.2, 1.0, 0.20));
    }

    #[test]
    fn ratio_outside_band_fails() {
        assert!(!ratio_within_tolerance(1.5, 1.0, 0.20));
        assert!(!ratio_within_tolerance(0.5, 1.0, 0.20));
    }

    #[test]
    fn identical_ratios_always_pass() {
        assert!(ratio_within_tolerance(1.7778, 1.7778, 0.0));
    }

    #[test]
    fn nonpositive_inputs_never_pass() {
        assert!(!ratio_within_tolerance(0.0, 1.0, 0.2));
        assert!(!ratio_within_tolerance(1.0, 0.0, 0.2));
        assert!(!ratio_within_tolerance(-1.0, 1.0, 0.2));
    }
}
