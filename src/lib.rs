//! # Downscale
//!
//! Shrinks images before they are uploaded. Any decodable input (JPEG, PNG,
//! GIF, WebP, BMP, TIFF) comes out as a JPEG whose longer side is at most
//! `max_dimension` pixels (1920 by default), re-encoded at a caller-chosen
//! quality (0.8 by default).
//!
//! ```no_run
//! # async fn run() -> Result<(), downscale::DownscaleError> {
//! use downscale::{CompressOptions, SourceImage};
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let source = SourceImage::from_bytes(bytes);
//!
//! let dims = downscale::get_dimensions(&source).await?;
//! let jpeg = downscale::compress(source, CompressOptions::default()).await?;
//! println!("{dims} → {}", jpeg.dimensions);
//! # Ok(())
//! # }
//! ```
//!
//! # Scaling Rule
//!
//! Images that already fit are re-encoded at their natural size; nothing
//! is upscaled. Larger images are scaled so the longer side equals
//! `max_dimension` and the shorter side is
//! `round(shorter * max_dimension / longer)`. A 4000×3000 photo becomes
//! 1920×1440.
//!
//! # Errors
//!
//! Every call ends in a value or exactly one [`DownscaleError`]:
//! [`Decode`](DownscaleError::Decode) when the input cannot be loaded as an
//! image, [`Encode`](DownscaleError::Encode) when the result cannot be
//! written as JPEG. Nothing is retried, logged or replaced by a fallback.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Dimension math, the [`ImageBackend`] codec trait and its `image`-crate implementation |
//! | [`downscaler`] | Async facade: blocking-pool execution, file input, parallel batches |
//! | [`types`] | [`SourceImage`], [`Dimensions`], [`CompressedOutput`] |
//! | [`upload`] | Allowed-extension rule, directory expansion, output naming |
//! | [`config`] | `downscale.toml` loading, merging, and validation |
//! | [`output`] | CLI report formatting (text and JSON) |

pub mod config;
pub mod downscaler;
pub mod imaging;
pub mod output;
pub mod types;
pub mod upload;

pub use downscaler::{Downscaler, compress, get_dimensions, read_source};
pub use imaging::{CompressOptions, DownscaleError, ImageBackend, Quality, RustBackend};
pub use types::{CompressedOutput, Dimensions, SourceImage};

#[cfg(test)]
pub(crate) mod test_helpers;
