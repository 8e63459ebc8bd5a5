use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, require_known_axes, require_metadata};
use crate::stager::config::load_config;
use crate::stager::metadata;
use crate::stager::mover;
use crate::stager::paths::resolve_paths;

#[derive(Debug, Clone)]
pub struct MovePreprocessedOptions {
    pub seq: String,
    pub cond: String,
    /// Source root holding output of earlier preprocessing runs.
    pub path: Option<PathBuf>,
    pub tesla: Option<f64>,
    pub divider: Option<String>,
    pub meta: Option<PathBuf>,
    pub title: Option<String>,
}

pub fn run(opts: &MovePreprocessedOptions) -> Result<CommandReport> {
    let paths = resolve_paths();
    let cfg = load_config()?;
    let mut report = CommandReport::new("move-preprocessed");
    if !require_known_axes(&mut report, &cfg, &opts.seq, Some(opts.cond.as_str())) {
        return Ok(report);
    }

    let source_root = opts
        .path
        .clone()
        .unwrap_or_else(|| paths.preprocessed_old_dir.clone());
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
    report.detail(format!("source_root={}", source_root.display()));
    report.count("metadata_rows", records.len());

    let outcome = mover::move_preprocessed(
        &records,
        &source_root,
        &paths.preprocessed_dir,
        &opts.seq,
        &opts.cond,
        &cfg.preprocessed_prefix,
        &divider,
    )?;
    report.detail(format!(
        "target_dir={}",
        paths.preprocessed_dir.join(&opts.seq).join(&opts.cond).display()
    ));
    report.count("scanned", outcome.scanned);
    report.count("copied", outcome.copied);
    report.count("deduped", outcome.deduped);
    report.count("matched_rows", outcome.matched_rows);
    report.count("residual_rows", outcome.residuals.len());

    if outcome.residuals.is_empty() {
        report.detail("no residual rows; nothing left to preprocess".to_string());
        return Ok(report);
    }

    let title = opts
        .title
        .clone()
        .unwrap_or_else(|| format!("To-Be-Preprocessed_{}w_{}", opts.seq, opts.cond));
    let exported = metadata::export_residuals(&paths.temp_meta_dir, &title, &outcome.residuals)?;
    report.detail(format!("residuals_csv={}", exported.display()));

    Ok(report)
}
