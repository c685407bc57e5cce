//! Floor mask
//!
//! Blend weights depend only on the row, so the mask is stored as one
//! weight per row and expanded to an image only when asked for.

use crate::errors::{AppError, Result};
use image::GrayImage;

/// Share of the image height treated as floor, as a fraction
const FLOOR_NUMERATOR: u64 = 2;
const FLOOR_DENOMINATOR: u64 = 5;

/// Per-row blend weights: 0 keeps the base photo, 255 shows only the texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorMask {
    width: u32,
    height: u32,
    /// First row of the floor region
    boundary: u32,
    weights: Vec<u8>,
}

impl FloorMask {
    /// Build the mask for an image of the given size
    pub fn for_dimensions(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AppError::DimensionMismatch {
                role: "mask".to_string(),
                width,
                height,
            });
        }

        let floor_rows = (u64::from(height) * FLOOR_NUMERATOR / FLOOR_DENOMINATOR) as u32;
        let boundary = height - floor_rows;
        let weights = (0..height)
            .map(|y| row_weight(y, boundary, floor_rows))
            .collect();

        Ok(Self {
            width,
            height,
            boundary,
            weights,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// First row with a nonzero share of texture (equal to `height` when there is no floor)
    pub fn boundary(&self) -> u32 {
        self.boundary
    }

    /// Weight for row `y`; rows past the bottom edge read as 0
    pub fn row_weight(&self, y: u32) -> u8 {
        self.weights.get(y as usize).copied().unwrap_or(0)
    }

    /// One weight per row, top to bottom
    pub fn weights(&self) -> &[u8] {
        &self.weights
    }

    /// Expand into a single-channel image of the mask's size
    pub fn to_image(&self) -> GrayImage {
        let width = self.width as usize;
        let mut buf = Vec::with_capacity(width * self.height as usize);
        for &weight in &self.weights {
            buf.resize(buf.len() + width, weight);
        }
        // Buffer length is exactly width * height
        GrayImage::from_raw(self.width, self.height, buf)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

/// Linear ramp from 0 at `boundary` to 255 on the last row
fn row_weight(y: u32, boundary: u32, floor_rows: u32) -> u8 {
    if y < boundary || floor_rows == 0 {
        return 0;
    }
    if floor_rows == 1 {
        return 255;
    }
    let offset = u64::from(y - boundary);
    let span = u64::from(floor_rows - 1);
    ((offset * 255 + span / 2) / span).min(255) as u8
}
