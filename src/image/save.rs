//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::{s, Array3, Axis};

use crate::error::{Error, Result};

use super::transform::inverse_transform;
use super::{dim_to_u32, ImageArray, ImageBatch, GRAY_CHANNELS, RGB_CHANNELS};

/// JPEG quality used when the output extension asks for JPEG.
const JPEG_QUALITY: u8 = 95;

/// Tile a batch of equally shaped images into one canvas.
///
/// Image `idx` lands at row `idx / cols`, column `idx % cols`. Cells without
/// an image stay zero.
///
/// # Errors
///
/// Returns an error if the grid is empty or has fewer cells than images.
pub fn compose_grid(images: &ImageBatch, rows: usize, cols: usize) -> Result<ImageArray> {
    let (count, height, width, channels) = images.dim();

    if rows == 0 || cols == 0 {
        return Err(Error::invalid("size", format!("empty {rows}x{cols} grid")));
    }
    if count > rows * cols {
        return Err(Error::invalid(
            "size",
            format!("{count} images do not fit a {rows}x{cols} grid"),
        ));
    }

    let mut canvas = Array3::<f32>::zeros((height * rows, width * cols, channels));

    for (idx, image) in images.axis_iter(Axis(0)).enumerate() {
        let (row, col) = (idx / cols, idx % cols);
        canvas
            .slice_mut(s![
                row * height..(row + 1) * height,
                col * width..(col + 1) * width,
                ..
            ])
            .assign(&image);
    }

    Ok(canvas)
}

/// Map a batch of normalized images from `[-1, 1]` to `[0, 1]`.
#[must_use]
pub fn merge_images(images: &ImageBatch) -> ImageBatch {
    inverse_transform(images)
}

/// Save a batch of normalized images as one grid image.
///
/// The images are mapped to `[0, 1]`, tiled `size.0` rows by `size.1`
/// columns, and written to `path` (format inferred from the extension).
///
/// # Errors
///
/// Returns an error if the grid is too small, the channel count is neither 1
/// nor 3, or the file cannot be written.
pub fn save_images<P: AsRef<Path>>(
    images: &ImageBatch,
    size: (usize, usize),
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let grid = compose_grid(&merge_images(images), size.0, size.1)?;

    let img = array_to_image(&grid)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);
            img.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::info!("Saved {}x{} grid to {}", size.0, size.1, path.display());

    Ok(())
}

/// Convert an HWC array with values in `[0, 1]` to an 8-bit image.
fn array_to_image(array: &ImageArray) -> Result<DynamicImage> {
    let (height, width, channels) = array.dim();
    let (w, h) = (dim_to_u32("width", width)?, dim_to_u32("height", height)?);

    // Standard layout iterates in HWC order
    let raw: Vec<u8> = array.iter().map(|&v| to_u8(v)).collect();

    let img = match channels {
        RGB_CHANNELS => RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
        GRAY_CHANNELS => GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
        _ => None,
    };

    img.ok_or_else(|| Error::ShapeMismatch {
        expected: "1 or 3 channels".to_string(),
        actual: format!("{channels} channels"),
    })
}

/// Scale a value from `[0, 1]` to `[0, 255]` with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
