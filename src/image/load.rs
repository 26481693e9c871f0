//! Image loading utilities.

use std::path::Path;

use image::DynamicImage;
use ndarray::{concatenate, Array3, Axis};
use rand::Rng;

use crate::error::{Error, Result};
use crate::pool::Entry;

use super::transform::{normalize_to_signed_unit, random_crop_pair, resize_to, transform};
use super::{ImageArray, DEFAULT_FINE_SIZE, DEFAULT_LOAD_SIZE, GRAY_CHANNELS, RGB_CHANNELS};

/// Channel layout to decode images into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Three channels.
    #[default]
    Rgb,
    /// One luminance channel.
    Grayscale,
}

impl ColorMode {
    /// Number of channels produced by this mode.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => RGB_CHANNELS,
            Self::Grayscale => GRAY_CHANNELS,
        }
    }
}

/// Configuration for loading paired training images.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Height images are resized to before cropping.
    pub load_size: usize,

    /// Height of the final crops.
    pub fine_size: usize,

    /// Width of an image as a multiple of its height.
    pub width_scale: usize,

    /// Skip random cropping and mirroring, resize straight to the fine size.
    pub is_testing: bool,

    /// Channel layout to decode into.
    pub color: ColorMode,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            load_size: DEFAULT_LOAD_SIZE,
            fine_size: DEFAULT_FINE_SIZE,
            width_scale: 2,
            is_testing: false,
            color: ColorMode::Rgb,
        }
    }
}

impl LoadConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any size is zero or the crop is larger than the
    /// load size.
    pub fn validate(&self) -> Result<()> {
        if self.fine_size == 0 {
            return Err(Error::invalid("fine_size", "must be greater than 0"));
        }

        if self.width_scale == 0 {
            return Err(Error::invalid("width_scale", "must be greater than 0"));
        }

        if self.load_size < self.fine_size {
            return Err(Error::invalid(
                "load_size",
                format!("must be at least fine_size ({})", self.fine_size),
            ));
        }

        Ok(())
    }

    /// Dimensions `(height, width)` images are resized to before cropping.
    #[must_use]
    pub const fn load_dims(&self) -> (usize, usize) {
        (self.load_size, self.load_size * self.width_scale)
    }

    /// Dimensions `(height, width)` of the final images.
    #[must_use]
    pub const fn fine_dims(&self) -> (usize, usize) {
        (self.fine_size, self.fine_size * self.width_scale)
    }
}

/// Load an image from disk into an HWC array of raw `[0, 255]` values.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn decode_image<P: AsRef<Path>>(path: P, color: ColorMode) -> Result<ImageArray> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::trace!("Decoded {} ({}x{})", path.display(), img.width(), img.height());

    image_to_array(&img, color)
}

/// Convert a `DynamicImage` to an HWC array without rescaling.
fn image_to_array(img: &DynamicImage, color: ColorMode) -> Result<ImageArray> {
    let (width, height) = (img.width() as usize, img.height() as usize);

    let raw = match color {
        ColorMode::Rgb => img.to_rgb8().into_raw(),
        ColorMode::Grayscale => img.to_luma8().into_raw(),
    };

    let shape = (height, width, color.channels());
    Array3::from_shape_vec(shape, raw.into_iter().map(f32::from).collect()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{shape:?}"),
            actual: "decoded buffer of a different length".to_string(),
        }
    })
}

/// Load a paired training sample as an [`Entry`] of normalized images.
///
/// For training, both images are resized to [`LoadConfig::load_dims`],
/// cropped at one shared random offset to [`LoadConfig::fine_dims`] and
/// mirrored together with probability one half. For testing they are
/// resized straight to the fine dimensions. Values end up in `[-1, 1]`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or either image cannot
/// be loaded.
pub fn load_train_entry<P, Q, R>(
    path_a: P,
    path_b: Q,
    config: &LoadConfig,
    rng: &mut R,
) -> Result<Entry<ImageArray>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: Rng + ?Sized,
{
    config.validate()?;

    let img_a = decode_image(path_a, config.color)?;
    let img_b = decode_image(path_b, config.color)?;
    let (fine_h, fine_w) = config.fine_dims();

    let (img_a, img_b) = if config.is_testing {
        (
            resize_to(&img_a, fine_h, fine_w)?,
            resize_to(&img_b, fine_h, fine_w)?,
        )
    } else {
        let (load_h, load_w) = config.load_dims();
        let img_a = resize_to(&img_a, load_h, load_w)?;
        let img_b = resize_to(&img_b, load_h, load_w)?;
        random_crop_pair(&img_a, &img_b, fine_h, fine_w, rng)?
    };

    Entry::paired(
        normalize_to_signed_unit(&img_a),
        normalize_to_signed_unit(&img_b),
    )
}

/// Load a paired training sample stacked along the channel axis.
///
/// The A channels come first. See [`load_train_entry`] for the augmentation
/// applied.
///
/// # Errors
///
/// Returns an error if either image cannot be loaded.
pub fn load_train_pair<P, Q, R>(
    path_a: P,
    path_b: Q,
    config: &LoadConfig,
    rng: &mut R,
) -> Result<ImageArray>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: Rng + ?Sized,
{
    let entry = load_train_entry(path_a, path_b, config, rng)?;

    concatenate(Axis(2), &[entry.a().view(), entry.b().view()]).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{:?}", entry.shape()),
            actual: format!("{:?}", entry.b().shape()),
        }
    })
}

/// Load a single test image resized to the fine dimensions and normalized.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded.
pub fn load_test_image<P: AsRef<Path>>(path: P, config: &LoadConfig) -> Result<ImageArray> {
    config.validate()?;

    let img = decode_image(path, config.color)?;
    let (fine_h, fine_w) = config.fine_dims();

    Ok(normalize_to_signed_unit(&resize_to(&img, fine_h, fine_w)?))
}

/// Load an image and apply [`transform`]: an optional centered
/// `image_size` crop resized to `resize_height x resize_width`, then
/// normalization.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded or cropped.
pub fn get_image<P: AsRef<Path>>(
    path: P,
    image_size: usize,
    is_crop: bool,
    resize_height: usize,
    resize_width: usize,
    color: ColorMode,
) -> Result<ImageArray> {
    transform(
        &decode_image(path, color)?,
        image_size,
        is_crop,
        resize_height,
        resize_width,
    )
}
