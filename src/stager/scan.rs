use crate::error::StagerError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name-based filter for candidate scan files.
///
/// Mirrors the glob conventions of the study tree: an extension, an
/// optional filename prefix (`wm*.nii`), an optional substring
/// (`*wm*.nii`), and an optional token that some ancestor directory name
/// must contain (`**/*AD/**/*.nii`).
#[derive(Debug, Clone)]
pub struct ScanFilter {
    extension: String,
    name_prefix: Option<String>,
    name_contains: Option<String>,
    dir_contains: Option<String>,
}

impl ScanFilter {
    pub fn nifti() -> Self {
        Self::with_extension("nii")
    }

    pub fn dicom() -> Self {
        Self::with_extension("dcm")
    }

    fn with_extension(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            name_prefix: None,
            name_contains: None,
            dir_contains: None,
        }
    }

    pub fn name_prefix(mut self, prefix: &str) -> Self {
        self.name_prefix = Some(prefix.to_string());
        self
    }

    pub fn name_contains(mut self, token: &str) -> Self {
        self.name_contains = Some(token.to_string());
        self
    }

    pub fn dir_contains(mut self, token: &str) -> Self {
        self.dir_contains = Some(token.to_string());
        self
    }

    fn matches(&self, root: &Path, path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return false;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if let Some(prefix) = &self.name_prefix
            && !name.starts_with(prefix.as_str())
        {
            return false;
        }
        if let Some(token) = &self.name_contains
            && !name.contains(token.as_str())
        {
            return false;
        }

        if let Some(token) = &self.dir_contains {
            let relative = path.strip_prefix(root).unwrap_or(path);
            let mut ancestors = relative.components().collect::<Vec<_>>();
            ancestors.pop(); // the filename itself
            let hit = ancestors.iter().any(|c| {
                c.as_os_str()
                    .to_str()
                    .is_some_and(|s| s.contains(token.as_str()))
            });
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Recursively collect candidate files under `root`, sorted by path for
/// deterministic processing order.
pub fn find_scans(root: &Path, filter: &ScanFilter) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(StagerError::MissingSourceDir(root.display().to_string()).into());
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if filter.matches(root, entry.path()) {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

/// File count under `root`, 0 when the directory does not exist yet.
pub fn count_scans(root: &Path, filter: &ScanFilter) -> usize {
    if !root.is_dir() {
        return 0;
    }
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| filter.matches(root, entry.path()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::{ScanFilter, find_scans};
    use crate::error::StagerError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn filters_by_extension_prefix_and_ancestor_dir() {
        let tmp = tempdir().expect("tempdir");
        let ad_dir = tmp.path().join("batch1_AD/visit1");
        let cn_dir = tmp.path().join("batch1_CN/visit1");
        fs::create_dir_all(&ad_dir).expect("mkdir ad");
        fs::create_dir_all(&cn_dir).expect("mkdir cn");
        fs::write(ad_dir.join("wmscan_a.nii"), b"a").expect("write");
        fs::write(ad_dir.join("scan_b.nii"), b"b").expect("write");
        fs::write(ad_dir.join("wmscan_c.nii.gz"), b"c").expect("write");
        fs::write(cn_dir.join("wmscan_d.nii"), b"d").expect("write");

        let filter = ScanFilter::nifti().name_prefix("wm").dir_contains("AD");
        let found = find_scans(tmp.path(), &filter).expect("scan");
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("batch1_AD/visit1/wmscan_a.nii"));
    }

    #[test]
    fn missing_root_is_a_typed_error() {
        let tmp = tempdir().expect("tempdir");
        let err = find_scans(&tmp.path().join("nope"), &ScanFilter::nifti()).expect_err("missing");
        assert!(err.downcast_ref::<StagerError>().is_some());
    }
}
