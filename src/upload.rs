//! Upload candidate selection and output naming.
//!
//! The upload endpoint only accepts a fixed set of image extensions. This
//! module applies the same rule client-side, expands directory inputs into
//! the files they contain, and names the JPEG files written for each input.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Extensions the upload endpoint accepts.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Whether `filename` has an allowed extension.
///
/// The extension is whatever follows the last `.`, compared
/// case-insensitively. Names without a dot are rejected.
pub fn is_allowed_file(filename: &str, allowed: &[impl AsRef<str>]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => allowed
            .iter()
            .any(|a| a.as_ref().eq_ignore_ascii_case(ext)),
        None => false,
    }
}

fn path_is_allowed(path: &Path, allowed: &[impl AsRef<str>]) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| is_allowed_file(name, allowed))
}

/// Expand CLI inputs into the list of files to process.
///
/// Files are taken as given, whatever their extension, so the decoder gets
/// to report on them. Directories are walked recursively and only files
/// with an allowed extension are kept. Entries the walk cannot read
/// (permissions, symlink loops) are logged and skipped. The result is
/// sorted and free of duplicates.
pub fn collect_inputs(inputs: &[PathBuf], allowed: &[impl AsRef<str>]) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();

    for input in inputs {
        if !input.is_dir() {
            files.insert(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(input.as_path());
                    warn!("Skipping {}: {e}", path.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && path_is_allowed(entry.path(), allowed) {
                files.insert(entry.into_path());
            }
        }
    }

    files.into_iter().collect()
}

/// Path of the JPEG written for `source` inside `output_dir`.
///
/// The stem is kept and the extension becomes `.jpg`: `IMG_01.PNG` →
/// `IMG_01.jpg`.
pub fn output_path(source: &Path, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{stem}.jpg"))
}
