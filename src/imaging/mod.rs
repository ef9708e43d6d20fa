//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageDecoder::dimensions`, EXIF orientation applied |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{DownscaleError, ImageBackend};
pub use calculations::{calculate_target_dimensions, needs_downscale};
pub use operations::{compress, get_dimensions, plan_compress};
pub use params::{CompressOptions, Quality, ResizeParams};
pub use rust_backend::{RustBackend, supported_input_extensions};
