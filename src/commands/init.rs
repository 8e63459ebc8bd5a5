use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::stager::paths::resolve_paths_with_root;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub path: Option<PathBuf>,
}

pub fn run(opts: &InitOptions) -> Result<CommandReport> {
    let paths = resolve_paths_with_root(opts.path.as_deref());
    let mut report = CommandReport::new("init");

    report.detail(format!("study_root={}", paths.study_root.display()));
    for dir in paths.output_dirs() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        report.detail(format!("ensured dir={}", dir.display()));
    }

    Ok(report)
}
