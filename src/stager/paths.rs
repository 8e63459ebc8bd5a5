use std::env;
use std::path::{Path, PathBuf};

/// The fixed directory taxonomy of a study tree.
///
/// Every directory can be relocated through an environment variable; the
/// defaults match the layout the preprocessing tooling expects, rooted at
/// the current directory.
#[derive(Debug, Clone)]
pub struct StudyPaths {
    pub study_root: PathBuf,
    /// Raw NIfTI scans awaiting preprocessing (`3T`).
    pub raw_dir: PathBuf,
    /// Raw DICOM series (`DICOM`).
    pub dicom_dir: PathBuf,
    /// Output of earlier preprocessing runs (`preprocessed_old`).
    pub preprocessed_old_dir: PathBuf,
    /// Metadata CSV snapshots (`TempMeta`).
    pub temp_meta_dir: PathBuf,
    /// Preprocessing queue (`TempData`).
    pub temp_data_dir: PathBuf,
    /// DICOM-to-NIfTI conversion queue (`2convert`).
    pub convert_queue_dir: PathBuf,
    /// Converted NIfTI output (`Converted`).
    pub converted_dir: PathBuf,
    pub preprocessed_dir: PathBuf,
    pub final_dir: PathBuf,
    /// Unseparated source volumes for robustness evaluation (`DataOri`).
    pub data_ori_dir: PathBuf,
    pub data_sep_dir: PathBuf,
    pub logs_dir: PathBuf,
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> StudyPaths {
    resolve_paths_with_root(None)
}

/// Resolve the taxonomy, pinning the study root when a CLI override is
/// given; individual directory overrides still win.
pub fn resolve_paths_with_root(root: Option<&Path>) -> StudyPaths {
    let study_root = match root {
        Some(root) => root.to_path_buf(),
        None => env_or_default_path("STAGER_STUDY_ROOT", PathBuf::from(".")),
    };

    let raw_dir = env_or_default_path("STAGER_RAW_DIR", study_root.join("3T"));
    let dicom_dir = env_or_default_path("STAGER_DICOM_DIR", study_root.join("DICOM"));
    let preprocessed_old_dir = env_or_default_path(
        "STAGER_PREPROCESSED_OLD_DIR",
        study_root.join("preprocessed_old"),
    );
    let temp_meta_dir = env_or_default_path("STAGER_TEMP_META_DIR", study_root.join("TempMeta"));
    let temp_data_dir = env_or_default_path("STAGER_TEMP_DATA_DIR", study_root.join("TempData"));
    let convert_queue_dir =
        env_or_default_path("STAGER_CONVERT_QUEUE_DIR", study_root.join("2convert"));
    let converted_dir = env_or_default_path("STAGER_CONVERTED_DIR", study_root.join("Converted"));
    let preprocessed_dir =
        env_or_default_path("STAGER_PREPROCESSED_DIR", study_root.join("preprocessed"));
    let final_dir = env_or_default_path("STAGER_FINAL_DIR", study_root.join("final"));
    let data_ori_dir = env_or_default_path("STAGER_DATA_ORI_DIR", study_root.join("DataOri"));
    let data_sep_dir = env_or_default_path("STAGER_DATA_SEP_DIR", study_root.join("DataSep"));
    let logs_dir = env_or_default_path("STAGER_LOGS_DIR", study_root.join("outputs/logs"));

    StudyPaths {
        study_root,
        raw_dir,
        dicom_dir,
        preprocessed_old_dir,
        temp_meta_dir,
        temp_data_dir,
        convert_queue_dir,
        converted_dir,
        preprocessed_dir,
        final_dir,
        data_ori_dir,
        data_sep_dir,
        logs_dir,
    }
}

impl StudyPaths {
    /// Directories the pipeline writes into; `init` creates these.
    pub fn output_dirs(&self) -> Vec<&Path> {
        vec![
            self.preprocessed_dir.as_path(),
            self.temp_data_dir.as_path(),
            self.convert_queue_dir.as_path(),
            self.converted_dir.as_path(),
            self.final_dir.as_path(),
            self.logs_dir.as_path(),
        ]
    }

    /// Directories that must be populated by hand before the pipeline runs.
    pub fn required_dirs(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("3T", self.raw_dir.as_path()),
            ("DICOM", self.dicom_dir.as_path()),
            ("preprocessed_old", self.preprocessed_old_dir.as_path()),
            ("TempMeta", self.temp_meta_dir.as_path()),
        ]
    }
}
