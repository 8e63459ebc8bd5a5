use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::stager::metadata;
use crate::stager::paths::resolve_paths_with_root;
use crate::stager::scan::{ScanFilter, count_scans};

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub path: Option<PathBuf>,
}

pub fn run(opts: &StatusOptions) -> Result<CommandReport> {
    let paths = resolve_paths_with_root(opts.path.as_deref());
    let mut report = CommandReport::new("status");

    if let Some(path) = &opts.path
        && !path.exists()
    {
        report.issue(format!("study root does not exist: {}", path.display()));
        return Ok(report);
    }

    report.detail(format!("study_root={}", paths.study_root.display()));
    for dir in paths.output_dirs() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    report.detail("output directories ensured".to_string());

    for (label, dir) in paths.required_dirs() {
        if dir.is_dir() {
            report.detail(format!("present {label}={}", dir.display()));
        } else {
            report.issue(format!("missing {label} directory: {}", dir.display()));
        }
    }

    report.count("raw_nifti", count_scans(&paths.raw_dir, &ScanFilter::nifti()));
    report.count("dicom", count_scans(&paths.dicom_dir, &ScanFilter::dicom()));
    report.count(
        "preprocessed_old",
        count_scans(&paths.preprocessed_old_dir, &ScanFilter::nifti()),
    );
    report.count(
        "preprocessed",
        count_scans(&paths.preprocessed_dir, &ScanFilter::nifti()),
    );
    report.count(
        "temp_data",
        count_scans(&paths.temp_data_dir, &ScanFilter::nifti()),
    );
    report.count(
        "convert_queue",
        count_scans(&paths.convert_queue_dir, &ScanFilter::dicom()),
    );
    report.count("final", count_scans(&paths.final_dir, &ScanFilter::nifti()));

    let meta_files = metadata::list_available_metadata(&paths.temp_meta_dir);
    if meta_files.is_empty() {
        report.detail("no metadata csv files found".to_string());
    } else {
        for name in meta_files {
            report.detail(format!("metadata_csv={name}"));
        }
    }

    Ok(report)
}
