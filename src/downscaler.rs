//! Async front door to the imaging core.
//!
//! Every call returns a future immediately; the decode/resample/encode work
//! runs on tokio's blocking pool so the async runtime is never stalled.
//! A call is made of independent stages (file read, then conversion) and a
//! failed stage ends the call before the next one starts.
//!
//! Calls share nothing mutable: each works on its own decoded raster, so any
//! number can be in flight at once, completing in no particular order.
//! There is no cancellation and no timeout. Dropping a future discards its
//! result, but a conversion already running on the blocking pool still runs
//! to completion.

use crate::imaging::operations;
use crate::imaging::{CompressOptions, DownscaleError, ImageBackend, RustBackend};
use crate::types::{CompressedOutput, Dimensions, SourceImage};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, warn};

pub type Result<T> = std::result::Result<T, DownscaleError>;

/// Compress with the default [`RustBackend`].
///
/// `CompressOptions::default()` gives the usual upload settings: longest
/// side 1920px, quality 0.8.
pub async fn compress(source: SourceImage, options: CompressOptions) -> Result<CompressedOutput> {
    Downscaler::new().with_options(options).compress(source).await
}

/// Report natural dimensions with the default [`RustBackend`].
pub async fn get_dimensions(source: &SourceImage) -> Result<Dimensions> {
    Downscaler::new().get_dimensions(source).await
}

/// Read a file into a [`SourceImage`].
///
/// A file that cannot be read is reported as a decode failure: the image
/// could not be loaded.
pub async fn read_source(path: &Path) -> Result<SourceImage> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        DownscaleError::Decode(format!("Failed to read file {}: {e}", path.display()))
    })?;
    Ok(SourceImage::from_bytes_with_path(bytes, path))
}

/// Re-raise a panic from a blocking stage; any other join failure means the
/// runtime dropped the task before it produced an image.
fn join_failure(err: JoinError) -> DownscaleError {
    if err.is_panic() {
        std::panic::resume_unwind(err.into_panic());
    }
    DownscaleError::Encode(format!("conversion task did not complete: {err}"))
}

/// Downscaler bound to a raster codec backend and default options.
#[derive(Debug)]
pub struct Downscaler<B = RustBackend> {
    backend: Arc<B>,
    options: CompressOptions,
    threads: Option<usize>,
}

impl<B> Clone for Downscaler<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            options: self.options,
            threads: self.threads,
        }
    }
}

impl Downscaler<RustBackend> {
    pub fn new() -> Self {
        Self::with_backend(RustBackend::new())
    }
}

impl Default for Downscaler<RustBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ImageBackend + 'static> Downscaler<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            options: CompressOptions::default(),
            threads: None,
        }
    }

    /// Options used by [`compress`](Self::compress) and the batch/file helpers.
    pub fn with_options(mut self, options: CompressOptions) -> Self {
        self.options = options;
        self
    }

    /// Worker count for [`compress_batch`](Self::compress_batch).
    /// `None` uses rayon's default (one per core).
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }

    /// Compress using this downscaler's options.
    pub async fn compress(&self, source: SourceImage) -> Result<CompressedOutput> {
        self.compress_with(source, self.options).await
    }

    /// Compress using explicit options.
    pub async fn compress_with(
        &self,
        source: SourceImage,
        options: CompressOptions,
    ) -> Result<CompressedOutput> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || operations::compress(&*backend, &source, &options))
            .await
            .map_err(join_failure)?
    }

    /// Natural dimensions of `source`, read from its header.
    pub async fn get_dimensions(&self, source: &SourceImage) -> Result<Dimensions> {
        let backend = Arc::clone(&self.backend);
        let source = source.clone();
        tokio::task::spawn_blocking(move || operations::get_dimensions(&*backend, &source))
            .await
            .map_err(join_failure)?
    }

    /// Read `path`, then compress it.
    pub async fn compress_file(&self, path: &Path) -> Result<CompressedOutput> {
        let source = read_source(path).await?;
        self.compress(source).await
    }

    /// Read `path`, then report its dimensions.
    pub async fn file_dimensions(&self, path: &Path) -> Result<Dimensions> {
        let source = read_source(path).await?;
        self.get_dimensions(&source).await
    }

    /// Compress many sources in parallel.
    ///
    /// Returns one result per source, in input order. A failed source does
    /// not affect the others.
    pub async fn compress_batch(&self, sources: Vec<SourceImage>) -> Vec<Result<CompressedOutput>> {
        let count = sources.len();
        let backend = Arc::clone(&self.backend);
        let options = self.options;
        let threads = self.threads;

        debug!("Compressing batch of {count} images");
        let joined = tokio::task::spawn_blocking(move || {
            let run = || -> Vec<Result<CompressedOutput>> {
                sources
                    .par_iter()
                    .map(|source| operations::compress(&*backend, source, &options))
                    .collect()
            };

            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(n) = threads {
                builder = builder.num_threads(n);
            }
            match builder.build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    warn!("Falling back to the global rayon pool: {e}");
                    run()
                }
            }
        })
        .await;

        match joined {
            Ok(results) => results,
            Err(e) => {
                let err = join_failure(e);
                (0..count).map(|_| Err(err.clone())).collect()
            }
        }
    }
}
