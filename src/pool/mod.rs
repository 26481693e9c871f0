//! History buffering of generated samples.
//!
//! The discriminator of an image-to-image GAN is more stable when it does not
//! only see the freshest generator output. [`HistoryBuffer`] keeps a bounded
//! set of past [`Entry`] pairs and, once full, occasionally hands back an
//! older sample in place of the new one.

mod entry;
mod history;

pub use entry::Entry;
pub use history::{HistoryBuffer, DEFAULT_POOL_SIZE};
