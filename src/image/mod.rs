//! Image loading, augmentation, and saving utilities.
//!
//! Single images are `Array3<f32>` in HWC order; batches are `Array4<f32>`
//! in NHWC order. Freshly decoded images hold raw `[0, 255]` pixel values,
//! model-facing images hold values normalized to `[-1, 1]`.

mod load;
mod save;
mod transform;

pub use load::{
    decode_image, get_image, load_test_image, load_train_entry, load_train_pair, ColorMode,
    LoadConfig,
};
pub use save::{compose_grid, merge_images, save_images};
pub use transform::{
    center_crop, denormalize_from_signed_unit, flip_horizontal, inverse_transform, norm_img,
    normalize_to_signed_unit, random_crop_pair, resize_to, transform,
};

use ndarray::{Array3, Array4};

use crate::error::{Error, Result};

/// Single image in HWC format (height, width, channels).
pub type ImageArray = Array3<f32>;

/// Batch of images in NHWC format (batch, height, width, channels).
pub type ImageBatch = Array4<f32>;

/// Resolution images are resized to before random cropping.
pub const DEFAULT_LOAD_SIZE: usize = 286;

/// Resolution of the crops fed to the model.
pub const DEFAULT_FINE_SIZE: usize = 256;

/// Height [`transform`] resizes center crops to unless told otherwise.
pub const DEFAULT_RESIZE_HEIGHT: usize = 64;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Number of channels in grayscale images.
pub const GRAY_CHANNELS: usize = 1;

/// Convert an array dimension to the `u32` the image crate works with.
pub(crate) fn dim_to_u32(name: &str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::invalid(name, format!("{value} exceeds u32")))
}
