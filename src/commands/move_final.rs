use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, require_known_axes};
use crate::stager::config::load_config;
use crate::stager::mover;
use crate::stager::paths::resolve_paths;

/// Files that do not carry this token in their name are not study data
/// and never leave the processing tree.
const STUDY_TOKEN: &str = "ADNI";

#[derive(Debug, Clone)]
pub struct MoveFinalOptions {
    pub seq: String,
    pub cond: String,
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    /// Substring the filename must contain, e.g. the segmentation prefix.
    pub pattern: Option<String>,
    pub tesla: Option<f64>,
}

pub fn run(opts: &MoveFinalOptions) -> Result<CommandReport> {
    let paths = resolve_paths();
    let cfg = load_config()?;
    let mut report = CommandReport::new("move-final");
    if !require_known_axes(&mut report, &cfg, &opts.seq, Some(opts.cond.as_str())) {
        return Ok(report);
    }

    let source_root = opts
        .source
        .clone()
        .unwrap_or_else(|| paths.study_root.join("processed"));
    let target_root = opts.target.clone().unwrap_or_else(|| paths.final_dir.clone());
    let pattern = opts
        .pattern
        .clone()
        .unwrap_or_else(|| cfg.preprocessed_prefix.clone());
    let tesla = opts.tesla.unwrap_or(cfg.default_tesla);

    report.detail(format!(
        "seq={} cond={} tesla={tesla} pattern={pattern}",
        opts.seq, opts.cond
    ));
    report.detail(format!(
        "source_root={}",
        source_root.join(&opts.seq).join(&opts.cond).display()
    ));
    report.detail(format!(
        "target_dir={}",
        target_root.join(&opts.seq).join(&opts.cond).display()
    ));

    let outcome = mover::move_final(
        &source_root,
        &target_root,
        &opts.seq,
        &opts.cond,
        &pattern,
        STUDY_TOKEN,
    )?;
    report.count("scanned", outcome.scanned);
    report.count("copied", outcome.copied);
    report.count("deduped", outcome.deduped);

    Ok(report)
}
