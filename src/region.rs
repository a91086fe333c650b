//! Resolve the absolute watermark rectangle for an image size.

use serde::Serialize;

use crate::calibration::{CalibrationEntry, CalibrationTable};

/// Absolute watermark region in pixel coordinates.
///
/// Always non-empty and contained in the image it was resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rectangle {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rectangle {
    /// One past the right edge, saturating at `u32::MAX`.
    #[must_use]
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom edge, saturating at `u32::MAX`.
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Whether `(px, py)` lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

/// Scale a normalized fraction to pixels, rounding half away from zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(fraction: f64, extent: u32) -> u32 {
    (fraction * f64::from(extent)).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Project a calibration entry onto an image of the given size.
///
/// Dimensions must be at least 1; the result is clamped to the image bounds
/// and is never empty.
#[must_use]
pub fn project(entry: &CalibrationEntry, width: u32, height: u32) -> Rectangle {
    debug_assert!(width > 0 && height > 0);

    let w = scale(entry.rect.w, width).clamp(1, width);
    let h = scale(entry.rect.h, height).clamp(1, height);
    let x = scale(entry.rect.x, width).min(width - w);
    let y = scale(entry.rect.y, height).min(height - h);

    Rectangle {
        x,
        y,
        width: w,
        height: h,
    }
}

/// Resolve the watermark rectangle for an image of `width x height`.
///
/// Pure function of the table and the input size.
#[must_use]
pub fn resolve(table: &CalibrationTable, width: u32, height: u32) -> Rectangle {
    let entry = table.lookup(width, height);
    let rect = project(entry, width, height);
    tracing::debug!(
        width,
        height,
        reference_width = entry.reference_width,
        reference_height = entry.reference_height,
        x = rect.x,
        y = rect.y,
        w = rect.width,
        h = rect.height,
        "resolved watermark region"
    );
    rect
}
