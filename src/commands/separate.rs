use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, require_known_axes, require_metadata};
use crate::stager::config::load_config;
use crate::stager::metadata;
use crate::stager::mover;
use crate::stager::paths::resolve_paths;
use crate::stager::util::tesla_dir_name;

#[derive(Debug, Clone)]
pub struct SeparateOptions {
    pub seq: String,
    pub meta: PathBuf,
    pub tesla: Option<f64>,
    pub divider: Option<String>,
    pub only_baseline: bool,
}

pub fn run(opts: &SeparateOptions) -> Result<CommandReport> {
    let paths = resolve_paths();
    let cfg = load_config()?;
    let mut report = CommandReport::new("separate");
    if !require_known_axes(&mut report, &cfg, &opts.seq, None) {
        return Ok(report);
    }

    let divider = opts
        .divider
        .clone()
        .unwrap_or_else(|| cfg.dividers.separate.clone());
    let tesla = opts.tesla.unwrap_or(cfg.default_tesla);
    let tesla_dir = tesla_dir_name(tesla);
    if !require_metadata(&mut report, &opts.meta) {
        return Ok(report);
    }

    let mut records = metadata::read_metadata(&opts.meta)?;
    report.detail(format!("metadata={}", opts.meta.display()));
    report.count("metadata_rows", records.len());
    if opts.only_baseline {
        records = metadata::filter_visit(&records, &cfg.baseline_visit);
        report.detail(format!(
            "baseline filter kept {} rows (visit={})",
            records.len(),
            cfg.baseline_visit
        ));
    }
    report.detail(format!("seq={} tesla={tesla} divider={divider}", opts.seq));
    report.detail(format!(
        "source_root={}",
        paths.data_ori_dir.join(&tesla_dir).join(&opts.seq).display()
    ));

    let outcome = mover::separate(
        &records,
        &paths.data_ori_dir,
        &paths.data_sep_dir,
        &opts.seq,
        &tesla_dir,
        &divider,
    )?;
    report.detail(format!(
        "target_dir={}",
        paths.data_sep_dir.join(&opts.seq).display()
    ));
    report.count("scanned", outcome.scanned);
    report.count("copied", outcome.copied);
    report.count("deduped", outcome.deduped);
    report.count("matched_rows", outcome.matched_rows);
    report.count("residual_rows", outcome.residuals.len());

    Ok(report)
}
