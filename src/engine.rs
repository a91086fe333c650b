//! Core watermark removal engine.

use image::RgbaImage;
use serde::Serialize;

use crate::calibration::CalibrationTable;
use crate::error::{Error, Result};
use crate::reconstruct::{self, Quality, ReconstructOptions};
use crate::region::{self, Rectangle};

/// Top-left corner of the watermark, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
}

/// Display summary of the watermark region.
///
/// Assumes a square watermark: `size` is the larger side of the resolved
/// rectangle. Removal always works on the exact [`Rectangle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WatermarkInfo {
    /// Edge length in pixels.
    pub size: u32,
    /// Top-left corner.
    pub position: Position,
}

impl From<Rectangle> for WatermarkInfo {
    fn from(rect: Rectangle) -> Self {
        Self {
            size: rect.width.max(rect.height),
            position: Position {
                x: rect.x,
                y: rect.y,
            },
        }
    }
}

/// Output of [`WatermarkEngine::remove_with_report`].
#[derive(Debug, Clone)]
pub struct Removal {
    /// The cleaned image.
    pub image: RgbaImage,
    /// The region that was reconstructed.
    pub region: Rectangle,
    /// Whether a full border band was available.
    pub quality: Quality,
}

/// Reject images with zero area or a pixel buffer that does not match their size.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] describing the problem.
pub fn validate_image(image: &RgbaImage) -> Result<()> {
    let (width, height) = image.dimensions();
    check_dimensions(width, height)?;

    let expected = u64::from(width) * u64::from(height) * 4;
    if image.as_raw().len() as u64 != expected {
        return Err(Error::InvalidImage {
            width,
            height,
            reason: "pixel buffer length does not match dimensions",
        });
    }
    Ok(())
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidImage {
            width,
            height,
            reason: "zero area",
        });
    }
    Ok(())
}

/// The watermark engine holding the calibration table.
///
/// Create once with [`WatermarkEngine::new()`] and reuse for many images. The
/// engine never mutates after construction, so it can be shared across threads
/// by reference or `Arc`.
#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    table: CalibrationTable,
    options: ReconstructOptions,
}

impl WatermarkEngine {
    /// Create a new engine from the embedded calibration table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Calibration`] if the embedded table is malformed.
    pub fn new() -> Result<Self> {
        Ok(Self::with_table(CalibrationTable::load()?))
    }

    /// Create an engine from an already validated calibration table.
    #[must_use]
    pub fn with_table(table: CalibrationTable) -> Self {
        Self {
            table,
            options: ReconstructOptions::default(),
        }
    }

    /// Replace the reconstruction options.
    #[must_use]
    pub fn with_options(mut self, options: ReconstructOptions) -> Self {
        self.options = options;
        self
    }

    /// The calibration table in use.
    #[must_use]
    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    /// The reconstruction options in use.
    #[must_use]
    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Exact watermark rectangle for an image of `width x height`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if either dimension is zero.
    pub fn region(&self, width: u32, height: u32) -> Result<Rectangle> {
        check_dimensions(width, height)?;
        Ok(region::resolve(&self.table, width, height))
    }

    /// Watermark size and position for display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if either dimension is zero.
    pub fn describe(&self, width: u32, height: u32) -> Result<WatermarkInfo> {
        self.region(width, height).map(WatermarkInfo::from)
    }

    /// Remove the watermark, taking ownership of the image and returning the
    /// cleaned one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] before any pixel work if the image is
    /// malformed.
    pub fn remove(&self, image: RgbaImage) -> Result<RgbaImage> {
        self.remove_with_report(image).map(|removal| removal.image)
    }

    /// Like [`remove`](Self::remove), also reporting the region and quality.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if the image is malformed.
    pub fn remove_with_report(&self, mut image: RgbaImage) -> Result<Removal> {
        validate_image(&image)?;

        let rect = region::resolve(&self.table, image.width(), image.height());
        let quality = reconstruct::reconstruct(&mut image, rect, &self.options);
        if quality == Quality::Degraded {
            tracing::warn!(
                width = image.width(),
                height = image.height(),
                ?rect,
                "border band incomplete, reconstruction quality degraded"
            );
        }

        Ok(Removal {
            image,
            region: rect,
            quality,
        })
    }
}
