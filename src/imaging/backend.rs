//! Raster codec trait and shared error type.
//!
//! The [`ImageBackend`] trait is the decode/resample/encode capability the
//! downscaler depends on but does not own: it can probe an image's natural
//! size and re-encode it as JPEG at an exact target size.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in a recording mock.

use super::params::ResizeParams;
use crate::types::{CompressedOutput, Dimensions, SourceImage};
use thiserror::Error;

/// The two ways a conversion can fail. Neither is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownscaleError {
    /// Input could not be loaded or interpreted as a raster image.
    #[error("Failed to load image: {0}")]
    Decode(String),
    /// Target surface could not be serialized to JPEG.
    #[error("Failed to compress image: {0}")]
    Encode(String),
}

impl DownscaleError {
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode(_))
    }
}

/// Trait for raster codec backends.
///
/// Implementations must hold no per-call state: every call works on its own
/// decoded raster and releases it before returning, so one backend can
/// serve concurrent calls.
pub trait ImageBackend: Send + Sync {
    /// Read the natural size from the image header without a full decode.
    fn identify(&self, source: &SourceImage) -> Result<Dimensions, DownscaleError>;

    /// Decode, resample to exactly `params.target`, and encode as JPEG.
    fn resize(&self, params: &ResizeParams) -> Result<CompressedOutput, DownscaleError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and can be shared across workers.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Result<Dimensions, DownscaleError>>>,
        pub resize_error: Mutex<Option<DownscaleError>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify { len: usize },
        Resize { width: u32, height: u32, quality: u8 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims.into_iter().map(Ok).collect()),
                ..Self::default()
            }
        }

        pub fn failing_identify(err: DownscaleError) -> Self {
            Self {
                identify_results: Mutex::new(vec![Err(err)]),
                ..Self::default()
            }
        }

        pub fn failing_resize(dims: Dimensions, err: DownscaleError) -> Self {
            Self {
                identify_results: Mutex::new(vec![Ok(dims)]),
                resize_error: Mutex::new(Some(err)),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, source: &SourceImage) -> Result<Dimensions, DownscaleError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify { len: source.len() });

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(DownscaleError::Decode("No mock dimensions".to_string())))
        }

        fn resize(&self, params: &ResizeParams) -> Result<CompressedOutput, DownscaleError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                width: params.target.width,
                height: params.target.height,
                quality: params.quality.encoder_quality(),
            });

            if let Some(err) = self.resize_error.lock().unwrap().clone() {
                return Err(err);
            }
            Ok(CompressedOutput {
                bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
                dimensions: params.target,
                original: params.natural,
            })
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions::new(800, 600)]);

        let source = SourceImage::from_bytes(vec![1, 2, 3]);
        let result = backend.identify(&source).unwrap();
        assert_eq!(result, Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify { len: 3 }]);
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();

        let out = backend
            .resize(&ResizeParams {
                source: SourceImage::from_bytes(vec![0u8; 16]),
                natural: Dimensions::new(1600, 1200),
                target: Dimensions::new(800, 600),
                quality: Quality::new(0.9),
            })
            .unwrap();
        assert_eq!(out.dimensions, Dimensions::new(800, 600));
        assert_eq!(out.original, Dimensions::new(1600, 1200));

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 800,
                height: 600,
                quality: 90,
            }
        ));
    }

    #[test]
    fn error_messages_are_human_readable() {
        let err = DownscaleError::Decode("bad magic".into());
        assert_eq!(err.to_string(), "Failed to load image: bad magic");
        assert!(err.is_decode());

        let err = DownscaleError::Encode("zero-area target".into());
        assert_eq!(err.to_string(), "Failed to compress image: zero-area target");
        assert!(err.is_encode());
    }
}
