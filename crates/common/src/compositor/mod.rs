//! Floor Compositor
//!
//! Blends a generated texture into the lower part of a room photograph:
//! - Texture resampled to the photo's size (Lanczos3)
//! - Vertical floor mask over the bottom 40% of rows
//! - Per-pixel alpha blend, alpha dropped
//! - PNG written atomically next to its final path

mod mask;

pub use mask::FloorMask;

use crate::errors::{AppError, Result};
use crate::metrics;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A composite persisted to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Decode an image file, sniffing the format from its content
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let decode_error = |message: String| AppError::ImageDecode {
        path: path.display().to_string(),
        message,
    };

    ImageReader::open(path)
        .map_err(|e| decode_error(format!("Failed to open: {}", e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(format!("Failed to read: {}", e)))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))
}

/// Blend `texture` into the floor region of `base`
pub fn composite_images(base: &DynamicImage, texture: &DynamicImage) -> Result<RgbImage> {
    let (width, height) = (base.width(), base.height());
    ensure_nonzero("base", width, height)?;
    ensure_nonzero("texture", texture.width(), texture.height())?;

    let texture = texture
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgb8();
    if texture.dimensions() != (width, height) {
        let (tw, th) = texture.dimensions();
        return Err(AppError::DimensionMismatch {
            role: "resized texture".to_string(),
            width: tw,
            height: th,
        });
    }

    let mask = FloorMask::for_dimensions(width, height)?;
    let mut output = base.to_rgb8();
    blend_rows(&mut output, &texture, &mask);

    debug!(width, height, boundary = mask.boundary(), "Floor texture blended");
    Ok(output)
}

/// Composite the files at `base_path` and `texture_path` into a PNG at `output_path`
#[instrument(skip_all, fields(base = %base_path.display(), texture = %texture_path.display(), output = %output_path.display()))]
pub fn composite(base_path: &Path, texture_path: &Path, output_path: &Path) -> Result<CompositeResult> {
    let start = Instant::now();
    let outcome = composite_inner(base_path, texture_path, output_path);
    metrics::record_composite(start.elapsed().as_secs_f64(), outcome.is_ok());

    match &outcome {
        Ok(result) => info!(
            width = result.width,
            height = result.height,
            "Composite written"
        ),
        Err(e) => warn!(error = %e, "Composite failed"),
    }
    outcome
}

fn composite_inner(base_path: &Path, texture_path: &Path, output_path: &Path) -> Result<CompositeResult> {
    let base = load_image(base_path)?;
    let texture = load_image(texture_path)?;
    let output = composite_images(&base, &texture)?;

    let mut encoded = Vec::new();
    output
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .map_err(|e| AppError::Encode {
            message: e.to_string(),
        })?;
    write_atomic(output_path, &encoded)?;

    Ok(CompositeResult {
        path: output_path.to_path_buf(),
        width: output.width(),
        height: output.height(),
    })
}

fn ensure_nonzero(role: &str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(AppError::DimensionMismatch {
            role: role.to_string(),
            width,
            height,
        });
    }
    Ok(())
}

/// out = base * (1 - m/255) + texture * (m/255), rounded, one weight per row
fn blend_rows(base: &mut RgbImage, texture: &RgbImage, mask: &FloorMask) {
    let stride = base.width() as usize * 3;
    let rows = base
        .chunks_exact_mut(stride)
        .zip(texture.chunks_exact(stride))
        .zip(mask.weights());

    for ((out_row, tex_row), &weight) in rows {
        match weight {
            0 => {}
            255 => out_row.copy_from_slice(tex_row),
            w => {
                let w = u16::from(w);
                for (out, &tex) in out_row.iter_mut().zip(tex_row) {
                    let blended = u16::from(*out) * (255 - w) + u16::from(tex) * w;
                    *out = ((blended + 127) / 255) as u8;
                }
            }
        }
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).ok_or_else(|| {
        AppError::Validation {
            message: format!("Output path has no file name: {}", path.display()),
            field: Some("output_path".to_string()),
        }
    })?;
    tmp_name.push(".partial");
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(e) = std::fs::write(&tmp_path, bytes) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(AppError::io(&tmp_path, e));
    }
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(AppError::io(path, e));
    }
    Ok(())
}
