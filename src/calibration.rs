//! Calibration table mapping Gemini output resolutions to watermark placement.
//!
//! Gemini renders images at a small set of resolution classes and stamps its
//! sparkle logo at a fixed margin from the bottom-right corner: a 48x48 logo
//! 32px from the edges for 1K outputs, 96x96 at 64px for 2K outputs. Each entry
//! stores that placement as fractions of the reference width and height so it
//! can be rescaled to any input size.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Embedded calibration data, measured on reference Gemini samples.
const EMBEDDED_TABLE: &str = include_str!("calibration.json");

/// Ties in aspect ratio closer than this are broken by pixel count.
const ASPECT_EPSILON: f64 = 1e-9;

/// Watermark rectangle as fractions of image width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizedRect {
    /// Left edge as a fraction of image width.
    pub x: f64,
    /// Top edge as a fraction of image height.
    pub y: f64,
    /// Width as a fraction of image width.
    pub w: f64,
    /// Height as a fraction of image height.
    pub h: f64,
}

/// One known generator output resolution and its watermark location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationEntry {
    /// Width of the reference output in pixels.
    pub reference_width: u32,
    /// Height of the reference output in pixels.
    pub reference_height: u32,
    /// Normalized watermark rectangle.
    pub rect: NormalizedRect,
}

impl CalibrationEntry {
    /// Aspect ratio (`width / height`) of the reference resolution.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.reference_width) / f64::from(self.reference_height)
    }

    /// Total pixel count of the reference resolution.
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.reference_width) * u64::from(self.reference_height)
    }

    fn validate(&self, index: usize) -> Result<(), CalibrationError> {
        let invalid = |reason: String| CalibrationError::InvalidEntry { index, reason };

        if self.reference_width == 0 || self.reference_height == 0 {
            return Err(invalid(format!(
                "reference resolution {}x{} has zero area",
                self.reference_width, self.reference_height
            )));
        }

        let r = &self.rect;
        for (name, value) in [("x", r.x), ("y", r.y), ("w", r.w), ("h", r.h)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{name} = {value} is outside [0, 1]")));
            }
        }
        if r.w <= 0.0 || r.h <= 0.0 {
            return Err(invalid("rectangle has zero area".to_string()));
        }
        if r.x + r.w > 1.0 || r.y + r.h > 1.0 {
            return Err(invalid("rectangle extends past the image edge".to_string()));
        }

        Ok(())
    }
}

/// Read-only set of calibration entries, loaded once per engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationTable {
    entries: Vec<CalibrationEntry>,
}

impl CalibrationTable {
    /// Load the calibration table embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] if the embedded data is malformed.
    pub fn load() -> Result<Self, CalibrationError> {
        Self::from_json_str(EMBEDDED_TABLE)
    }

    /// Parse and validate a calibration table from JSON.
    ///
    /// The schema is `{"entries": [{"reference_width", "reference_height",
    /// "rect": {"x", "y", "w", "h"}}]}`.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Parse`] for malformed JSON, and
    /// [`CalibrationError::Empty`] or [`CalibrationError::InvalidEntry`] when
    /// the geometry cannot be used.
    pub fn from_json_str(json: &str) -> Result<Self, CalibrationError> {
        let table: Self = serde_json::from_str(json)?;
        Self::new(table.entries)
    }

    /// Read a calibration table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read, or
    /// [`crate::Error::Calibration`] if its contents are invalid.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?)
    }

    /// Build a table from entries, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::Empty`] for an empty list, or
    /// [`CalibrationError::InvalidEntry`] for the first invalid entry.
    pub fn new(entries: Vec<CalibrationEntry>) -> Result<Self, CalibrationError> {
        if entries.is_empty() {
            return Err(CalibrationError::Empty);
        }
        for (index, entry) in entries.iter().enumerate() {
            entry.validate(index)?;
        }
        Ok(Self { entries })
    }

    /// All entries in table order.
    #[must_use]
    pub fn entries(&self) -> &[CalibrationEntry] {
        &self.entries
    }

    /// Select the entry that best matches an image of the given size.
    ///
    /// Picks the smallest aspect-ratio difference, then the closest reference
    /// pixel count, then the earliest entry. Zero dimensions are treated as 1.
    #[must_use]
    pub fn lookup(&self, width: u32, height: u32) -> &CalibrationEntry {
        let width = width.max(1);
        let height = height.max(1);
        let aspect = f64::from(width) / f64::from(height);
        let pixels = u64::from(width) * u64::from(height);

        let mut best = &self.entries[0];
        let mut best_diff = (best.aspect_ratio() - aspect).abs();
        let mut best_pixels = best.pixel_count().abs_diff(pixels);

        for entry in &self.entries[1..] {
            let diff = (entry.aspect_ratio() - aspect).abs();
            let pixel_diff = entry.pixel_count().abs_diff(pixels);

            let better = if (diff - best_diff).abs() <= ASPECT_EPSILON {
                pixel_diff < best_pixels
            } else {
                diff < best_diff
            };

            if better {
                best = entry;
                best_diff = diff;
                best_pixels = pixel_diff;
            }
        }

        best
    }
}
