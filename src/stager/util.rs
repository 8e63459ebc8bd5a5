use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// SHA-256 of a file's contents, hex-encoded.
///
/// This is the single, canonical implementation; **do not** duplicate
/// this helper in other modules.
pub fn file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Local-time stamp for log file names, e.g. `20260807_153000`.
pub fn timestamp_slug() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Render a field strength the way the directory taxonomy spells it:
/// `3` -> `3T`, `1.5` -> `1.5T`.
pub fn tesla_dir_name(tesla: f64) -> String {
    format!("{tesla}T")
}
