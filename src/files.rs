//! Loading, saving and processing image files.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;

use crate::engine::{WatermarkEngine, WatermarkInfo};
use crate::error::{Error, Result};

/// Default upper bound on input file size: 20 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Options controlling file processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Largest accepted input file, in bytes.
    pub max_file_size: u64,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Where the cleaned image was written, on success.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Watermark region that was reconstructed.
    pub info: Option<WatermarkInfo>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            output: None,
            success: false,
            info: None,
            message,
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png" | "webp"),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"unwatermarked_photo.png"` in the same directory.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("unwatermarked_{stem}.png"))
}

/// Decode an image file into RGBA, enforcing the size limit.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for unknown extensions,
/// [`Error::FileTooLarge`] above `max_file_size`, or an I/O / decode error.
pub fn load_image(path: &Path, max_file_size: u64) -> Result<RgbaImage> {
    if !is_supported_image(path) {
        return Err(Error::UnsupportedFormat(path.display().to_string()));
    }

    let size = std::fs::metadata(path)?.len();
    if size > max_file_size {
        return Err(Error::FileTooLarge {
            size,
            limit: max_file_size,
        });
    }

    Ok(image::open(path)?.to_rgba8())
}

/// Save an image as PNG.
///
/// # Errors
///
/// Returns an error if writing or encoding fails.
pub fn save_png(img: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Process a single image file: load, remove, save as PNG.
///
/// Returns a [`ProcessResult`] indicating success or failure.
#[must_use]
pub fn process_file(
    engine: &WatermarkEngine,
    input: &Path,
    output: &Path,
    opts: &ProcessOptions,
) -> ProcessResult {
    let img = match load_image(input, opts.max_file_size) {
        Ok(img) => img,
        Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
    };

    let removal = match engine.remove_with_report(img) {
        Ok(r) => r,
        Err(e) => return ProcessResult::failed(input, format!("Failed to process: {e}")),
    };

    if let Err(e) = save_png(&removal.image, output) {
        return ProcessResult::failed(input, format!("Failed to save: {e}"));
    }

    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        quality = ?removal.quality,
        "watermark removed"
    );

    ProcessResult {
        path: input.to_path_buf(),
        output: Some(output.to_path_buf()),
        success: true,
        info: Some(removal.region.into()),
        message: format!("Watermark removed ({:?} quality)", removal.quality),
    }
}

/// Process all supported images in a directory, in parallel.
///
/// Outputs are written to `output_dir` as `unwatermarked_<stem>.png`. Returns a
/// [`ProcessResult`] for each image found; a failure on one file does not stop
/// the others.
#[must_use]
pub fn process_directory(
    engine: &WatermarkEngine,
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult> {
    let mut entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            return vec![ProcessResult::failed(
                input_dir,
                format!("Failed to read directory: {e}"),
            )];
        }
    };
    entries.sort();

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        return vec![ProcessResult::failed(
            output_dir,
            format!("Failed to create output directory: {e}"),
        )];
    }

    entries
        .par_iter()
        .map(|input_path| {
            let file_name = default_output_path(input_path)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_default();
            process_file(engine, input_path, &output_dir.join(file_name), opts)
        })
        .collect()
}
