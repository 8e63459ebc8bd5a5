use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, require_known_axes, require_metadata};
use crate::stager::config::load_config;
use crate::stager::metadata;
use crate::stager::mover;
use crate::stager::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct MoveToConvertOptions {
    pub seq: String,
    pub cond: String,
    /// Source root holding raw DICOM series.
    pub path: Option<PathBuf>,
    pub tesla: Option<f64>,
    pub divider: Option<String>,
    pub meta: Option<PathBuf>,
}

pub fn run(opts: &MoveToConvertOptions) -> Result<CommandReport> {
    let paths = resolve_paths();
    let cfg = load_config()?;
    let mut report = CommandReport::new("move-to-convert");
    if !require_known_axes(&mut report, &cfg, &opts.seq, Some(opts.cond.as_str())) {
        return Ok(report);
    }

    let dicom_dir = opts.path.clone().unwrap_or_else(|| paths.dicom_dir.clone());
    let divider = opts
        .divider
        .clone()
        .unwrap_or_else(|| cfg.dividers.raw.clone());
    let tesla = opts.tesla.unwrap_or(cfg.default_tesla);
    let meta_csv = opts.meta.clone().unwrap_or_else(|| {
        metadata::balanced_meta_csv(&paths.temp_meta_dir, &opts.seq, &opts.cond)
    });
    if !require_metadata(&mut report, &meta_csv) {
        return Ok(report);
    }

    let records = metadata::read_metadata(&meta_csv)?;
    report.detail(format!("metadata={}", meta_csv.display()));
    report.detail(format!(
        "seq={} cond={} tesla={tesla} divider={divider}",
        opts.seq, opts.cond
    ));
    report.detail(format!(
        "source_root={}",
        dicom_dir.join(&opts.seq).join(&opts.cond).display()
    ));
    report.count("metadata_rows", records.len());

    let outcome = mover::move_to_convert(
        &records,
        &dicom_dir,
        &paths.convert_queue_dir,
        &opts.seq,
        &opts.cond,
        &divider,
    )?;
    report.detail(format!(
        "target_dir={}",
        paths
            .convert_queue_dir
            .join(&opts.seq)
            .join(&opts.cond)
            .display()
    ));
    report.count("scanned", outcome.scanned);
    report.count("copied", outcome.copied);
    report.count("deduped", outcome.deduped);
    report.count("matched_rows", outcome.matched_rows);
    report.count("residual_rows", outcome.residuals.len());

    Ok(report)
}
