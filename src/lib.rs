//! Remove the visible Gemini AI watermark by calibrated region inpainting.
//!
//! Gemini stamps a small sparkle logo at a fixed offset from the bottom-right
//! corner of every generated image. This crate locates that region from the
//! image dimensions alone, using a calibration table of Gemini's output
//! resolutions, and rebuilds the pixels underneath from the surrounding border
//! band with feathered edges.
//!
//! # Quick Start
//!
//! ```no_run
//! use gemini_watermark_inpaint::WatermarkEngine;
//!
//! let engine = WatermarkEngine::new().expect("failed to init engine");
//! let img = image::open("photo.png").unwrap().to_rgba8();
//! let cleaned = engine.remove(img).unwrap();
//! cleaned.save("cleaned.png").unwrap();
//! ```
//!
//! # Describing the region
//!
//! ```no_run
//! use gemini_watermark_inpaint::WatermarkEngine;
//!
//! let engine = WatermarkEngine::new().expect("failed to init engine");
//! let info = engine.describe(1024, 1024).unwrap();
//! println!("{0}x{0} at ({1},{2})", info.size, info.position.x, info.position.y);
//! ```
//!
//! # Batches
//!
//! [`batch::WorkerPool`] runs many images on a bounded thread pool and reports
//! each one's outcome separately, so a single bad image never fails the batch.

#![deny(missing_docs)]

pub mod batch;
pub mod calibration;
mod engine;
pub mod error;
pub mod files;
pub mod reconstruct;
pub mod region;

pub use calibration::{CalibrationEntry, CalibrationTable, NormalizedRect};
pub use engine::{validate_image, Position, Removal, WatermarkEngine, WatermarkInfo};
pub use error::{CalibrationError, Error, Result};
pub use files::{
    default_output_path, is_supported_image, process_directory, process_file, ProcessOptions,
    ProcessResult,
};
pub use reconstruct::{Quality, ReconstructOptions};
pub use region::Rectangle;
