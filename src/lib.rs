//! # `imagepool`
//!
//! Data utilities for training image-to-image translation GANs.
//!
//! The centerpiece is [`HistoryBuffer`], a bounded history of generated
//! sample pairs. Once full it hands the discriminator a mix of fresh and
//! past samples, which keeps the generator from chasing a moving target.
//! Around it sit the usual helpers: decoding and resizing images, paired
//! random crops, normalization, sample grids, and experiment directories.
//!
//! ## Example
//!
//! ```
//! use imagepool::{Entry, HistoryBuffer};
//! use ndarray::Array3;
//!
//! # fn main() -> imagepool::Result<()> {
//! let mut pool = HistoryBuffer::seeded(50, 0);
//!
//! let fake = Entry::paired(Array3::<f32>::zeros((64, 64, 3)), Array3::zeros((64, 64, 3)))?;
//! let for_discriminator = pool.submit(fake);
//!
//! assert_eq!(for_discriminator.shape(), &[64, 64, 3]);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod paths;
pub mod pool;

pub use error::{Error, Result};
pub use paths::{ensure_directory, Direction, ExperimentPaths};
pub use pool::{Entry, HistoryBuffer};
