//! Pure array transforms: resampling, cropping, mirroring, and normalization.

use image::{imageops::FilterType, ImageBuffer, Luma};
use ndarray::{s, Array, Array3, ArrayView2, Axis, Dimension};
use rand::Rng;

use crate::error::{Error, Result};

use super::{dim_to_u32, ImageArray};

/// Resample every channel of an image to exactly `height x width`.
///
/// Uses bilinear filtering. Values keep their range; each plane is mapped to
/// `[0, 1]` for the resampler and mapped back afterwards.
///
/// # Errors
///
/// Returns an error if either source or target dimension is zero or too large.
pub fn resize_to(image: &ImageArray, height: usize, width: usize) -> Result<ImageArray> {
    let (src_h, src_w, channels) = image.dim();
    if height == 0 || width == 0 {
        return Err(Error::invalid("size", format!("cannot resize to {height}x{width}")));
    }
    if src_h == 0 || src_w == 0 {
        return Err(Error::invalid("image", format!("cannot resize empty {src_h}x{src_w} image")));
    }

    if (src_h, src_w) == (height, width) {
        return Ok(image.clone());
    }

    let (dst_w, dst_h) = (dim_to_u32("width", width)?, dim_to_u32("height", height)?);
    let mut resized = Array3::<f32>::zeros((height, width, channels));

    for (channel, mut plane) in resized.axis_iter_mut(Axis(2)).enumerate() {
        let source = image.index_axis(Axis(2), channel);
        let (lo, hi) = value_range(&source);
        let span = hi - lo;

        if span <= f32::EPSILON {
            plane.fill(lo);
            continue;
        }

        let buffer = plane_to_buffer(&source, lo, span)?;
        let scaled = image::imageops::resize(&buffer, dst_w, dst_h, FilterType::Triangle);

        for (pixel, value) in scaled.pixels().zip(plane.iter_mut()) {
            *value = pixel[0].mul_add(span, lo);
        }
    }

    Ok(resized)
}

/// Lift a plane into a single-channel float buffer with values in `[0, 1]`.
fn plane_to_buffer(
    plane: &ArrayView2<'_, f32>,
    lo: f32,
    span: f32,
) -> Result<ImageBuffer<Luma<f32>, Vec<f32>>> {
    let (h, w) = plane.dim();
    let raw: Vec<f32> = plane.iter().map(|&v| (v - lo) / span).collect();

    ImageBuffer::from_raw(dim_to_u32("width", w)?, dim_to_u32("height", h)?, raw).ok_or_else(
        || Error::ShapeMismatch {
            expected: format!("{h}x{w} plane"),
            actual: "buffer of a different length".to_string(),
        },
    )
}

fn value_range(plane: &ArrayView2<'_, f32>) -> (f32, f32) {
    plane
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Crop two images at the same random offset, mirroring both together.
///
/// The offset is uniform over every position where the crop fits. A single
/// draw decides whether both crops are flipped horizontally (probability
/// one half).
///
/// # Errors
///
/// Returns an error if the images differ in shape or are smaller than the crop.
pub fn random_crop_pair<R: Rng + ?Sized>(
    a: &ImageArray,
    b: &ImageArray,
    crop_height: usize,
    crop_width: usize,
    rng: &mut R,
) -> Result<(ImageArray, ImageArray)> {
    if a.shape() != b.shape() {
        return Err(Error::shape(a.shape(), b.shape()));
    }

    let (height, width, _) = a.dim();
    check_crop(height, width, crop_height, crop_width)?;

    let top = rng.random_range(0..=height - crop_height);
    let left = rng.random_range(0..=width - crop_width);
    let window = s![top..top + crop_height, left..left + crop_width, ..];

    let crop_a = a.slice(window).to_owned();
    let crop_b = b.slice(window).to_owned();

    if rng.random::<f64>() > 0.5 {
        Ok((flip_horizontal(&crop_a), flip_horizontal(&crop_b)))
    } else {
        Ok((crop_a, crop_b))
    }
}

/// Mirror an image left to right.
#[must_use]
pub fn flip_horizontal(image: &ImageArray) -> ImageArray {
    image.slice(s![.., ..;-1, ..]).to_owned()
}

/// Cut the centered `crop_height x crop_width` window and resize it.
///
/// Offsets are rounded half to even.
///
/// # Errors
///
/// Returns an error if the crop does not fit or the resize target is empty.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn center_crop(
    image: &ImageArray,
    crop_height: usize,
    crop_width: usize,
    resize_height: usize,
    resize_width: usize,
) -> Result<ImageArray> {
    let (height, width, _) = image.dim();
    check_crop(height, width, crop_height, crop_width)?;

    // Safe: both differences are non-negative and far below 2^52
    let top = ((height - crop_height) as f64 / 2.0).round_ties_even() as usize;
    let left = ((width - crop_width) as f64 / 2.0).round_ties_even() as usize;

    let window = image
        .slice(s![top..top + crop_height, left..left + crop_width, ..])
        .to_owned();

    resize_to(&window, resize_height, resize_width)
}

fn check_crop(height: usize, width: usize, crop_height: usize, crop_width: usize) -> Result<()> {
    if crop_height == 0 || crop_width == 0 {
        return Err(Error::invalid("crop", "crop dimensions must be non-zero"));
    }
    if crop_height > height || crop_width > width {
        return Err(Error::invalid(
            "crop",
            format!("{crop_height}x{crop_width} crop does not fit a {height}x{width} image"),
        ));
    }
    Ok(())
}

/// Map pixel values from `[0, 255]` to `[-1, 1]`.
#[must_use]
pub fn normalize_to_signed_unit<D: Dimension>(image: &Array<f32, D>) -> Array<f32, D> {
    image.mapv(|v| v / 127.5 - 1.0)
}

/// Map values from `[-1, 1]` back to `[0, 255]`.
#[must_use]
pub fn denormalize_from_signed_unit<D: Dimension>(image: &Array<f32, D>) -> Array<f32, D> {
    image.mapv(|v| (v + 1.0) / 2.0 * 255.0)
}

/// Map values from `[-1, 1]` to `[0, 1]`.
#[must_use]
pub fn inverse_transform<D: Dimension>(images: &Array<f32, D>) -> Array<f32, D> {
    images.mapv(|v| (v + 1.0) / 2.0)
}

/// Scale to unit L2 norm, then stretch to `v * 2 - 1`.
///
/// An all-zero input has no direction; it maps to `-1` everywhere.
#[must_use]
pub fn norm_img<D: Dimension>(image: &Array<f32, D>) -> Array<f32, D> {
    let norm = image.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return Array::from_elem(image.raw_dim(), -1.0);
    }
    image.mapv(|v| (v / norm).mul_add(2.0, -1.0))
}

/// Optionally center-crop an `npx x npx` window resized to
/// `resize_height x resize_width`, then normalize to `[-1, 1]`.
///
/// Callers without a preferred height pass
/// [`DEFAULT_RESIZE_HEIGHT`](super::DEFAULT_RESIZE_HEIGHT).
///
/// # Errors
///
/// Returns an error if the crop does not fit the image.
pub fn transform(
    image: &ImageArray,
    npx: usize,
    is_crop: bool,
    resize_height: usize,
    resize_width: usize,
) -> Result<ImageArray> {
    if is_crop {
        let cropped = center_crop(image, npx, npx, resize_height, resize_width)?;
        Ok(normalize_to_signed_unit(&cropped))
    } else {
        Ok(normalize_to_signed_unit(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr3, Array1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::image::DEFAULT_RESIZE_HEIGHT;

    fn ramp(height: usize, width: usize, channels: usize) -> ImageArray {
        Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
            (y * 100 + x * 10 + c) as f32
        })
    }

    #[test]
    fn test_normalize_round_trip() {
        let image = ramp(5, 7, 3).mapv(|v| v.min(255.0));
        let restored = denormalize_from_signed_unit(&normalize_to_signed_unit(&image));

        for (a, b) in image.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn test_normalize_range() {
        let values = Array1::from_vec(vec![0.0, 127.5, 255.0]);
        let normalized = normalize_to_signed_unit(&values);

        assert!((normalized[0] + 1.0).abs() < 1e-6);
        assert!(normalized[1].abs() < 1e-6);
        assert!((normalized[2] - 1.0).abs() < 1e-6);
        assert_eq!(inverse_transform(&normalized).to_vec(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_norm_img() {
        let values = Array1::from_vec(vec![3.0, 4.0]);
        let normed = norm_img(&values);
        assert!((normed[0] - 0.2).abs() < 1e-6);
        assert!((normed[1] - 0.6).abs() < 1e-6);

        let zeros = Array1::<f32>::zeros(3);
        assert_eq!(norm_img(&zeros).to_vec(), vec![-1.0; 3]);
    }

    #[test]
    fn test_flip_horizontal() {
        let image = arr3(&[[[1.0], [2.0], [3.0]], [[4.0], [5.0], [6.0]]]);
        let flipped = flip_horizontal(&image);

        assert_eq!(flipped, arr3(&[[[3.0], [2.0], [1.0]], [[6.0], [5.0], [4.0]]]));
    }

    #[test]
    fn test_random_crop_pair_shares_offset_and_flip() {
        let a = ramp(10, 12, 3);
        let b = a.mapv(|v| v + 1000.0);
        let mut rng = StdRng::seed_from_u64(11);
        let (mut forward, mut mirrored) = (0, 0);

        for _ in 0..20 {
            let (crop_a, crop_b) = random_crop_pair(&a, &b, 4, 6, &mut rng).unwrap();

            assert_eq!(crop_a.dim(), (4, 6, 3));
            assert_eq!(crop_b.dim(), (4, 6, 3));
            assert_eq!(crop_b, crop_a.mapv(|v| v + 1000.0));

            // rows stay contiguous, columns run forward or backward together
            let step_a = crop_a[[0, 1, 0]] - crop_a[[0, 0, 0]];
            let step_b = crop_b[[0, 1, 0]] - crop_b[[0, 0, 0]];
            assert!((step_a.abs() - 10.0).abs() < f32::EPSILON);
            assert_eq!(step_a.signum(), step_b.signum());
            assert!((crop_a[[1, 0, 0]] - crop_a[[0, 0, 0]] - 100.0).abs() < f32::EPSILON);

            if step_a > 0.0 {
                forward += 1;
            } else {
                mirrored += 1;
            }
        }

        assert!(forward > 0, "never kept orientation");
        assert!(mirrored > 0, "never mirrored");
    }

    #[test]
    fn test_random_crop_pair_covers_offsets() {
        let a = ramp(3, 3, 1);
        let mut rng = StdRng::seed_from_u64(0);
        let mut corners = std::collections::HashSet::new();

        for _ in 0..200 {
            let (crop, _) = random_crop_pair(&a, &a, 2, 2, &mut rng).unwrap();
            let top_left = crop.iter().copied().fold(f32::INFINITY, f32::min);
            corners.insert(top_left as i32);
        }

        assert_eq!(corners.len(), 4);
    }

    #[test]
    fn test_random_crop_pair_rejects_bad_input() {
        let mut rng = StdRng::seed_from_u64(0);
        let a = ramp(4, 4, 3);

        assert!(matches!(
            random_crop_pair(&a, &ramp(4, 4, 1), 2, 2, &mut rng),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            random_crop_pair(&a, &a, 5, 2, &mut rng),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_center_crop_window() {
        let image = ramp(6, 8, 1);
        let crop = center_crop(&image, 2, 4, 2, 4).unwrap();

        // offsets (2, 2)
        assert_eq!(crop.dim(), (2, 4, 1));
        assert!((crop[[0, 0, 0]] - 220.0).abs() < f32::EPSILON);
        assert!((crop[[1, 3, 0]] - 350.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_center_crop_rounds_half_to_even() {
        // (5 - 2) / 2 = 1.5 rounds to 2, (4 - 1) / 2 = 1.5 rounds to 2
        let image = ramp(5, 4, 1);
        let crop = center_crop(&image, 2, 1, 2, 1).unwrap();
        assert!((crop[[0, 0, 0]] - 220.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resize_to_exact_dimensions() {
        let image = ramp(10, 20, 3);
        let resized = resize_to(&image, 5, 7).unwrap();

        assert_eq!(resized.dim(), (5, 7, 3));
        // bilinear output stays within the source range [0, 1092]
        assert!(resized.iter().all(|&v| (-1e-3..=1092.001).contains(&v)));
    }

    #[test]
    fn test_resize_preserves_constant_planes() {
        let image = Array3::from_elem((4, 4, 2), 200.0_f32);
        let resized = resize_to(&image, 9, 3).unwrap();

        assert!(resized.iter().all(|&v| (v - 200.0).abs() < 1e-6));
        assert!(resize_to(&image, 0, 3).is_err());
    }

    #[test]
    fn test_transform_default_height() {
        let image = Array3::from_elem((200, 200, 3), 10.0_f32);

        let cropped = transform(&image, 128, true, DEFAULT_RESIZE_HEIGHT, 32).unwrap();

        assert_eq!(cropped.dim(), (64, 32, 3));
    }

    #[test]
    fn test_transform_normalizes() {
        let image = Array3::from_elem((8, 8, 3), 255.0_f32);

        let full = transform(&image, 4, false, 2, 4).unwrap();
        assert_eq!(full.dim(), (8, 8, 3));

        let cropped = transform(&image, 4, true, 2, 2).unwrap();
        assert_eq!(cropped.dim(), (2, 2, 3));
        assert!(cropped.iter().all(|&v| (v - 1.0).abs() < 1e-5));
    }
}
