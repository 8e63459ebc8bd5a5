pub mod init;
pub mod move_converted;
pub mod move_final;
pub mod move_preprocessed;
pub mod move_to_convert;
pub mod move_to_preprocess;
pub mod run;
pub mod separate;
pub mod status;

use crate::stager::config::StagerConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    pub counts: BTreeMap<String, usize>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn count(&mut self, key: impl Into<String>, value: usize) {
        *self.counts.entry(key.into()).or_insert(0) += value;
    }

    pub fn merge(&mut self, mut other: CommandReport) {
        self.ok &= other.ok;
        self.details.append(&mut other.details);
        self.issues.append(&mut other.issues);
        for (key, value) in other.counts {
            self.count(key, value);
        }
    }
}

/// Axis gate shared by the staging commands: sequence and condition must
/// come from the configured menus.
pub fn require_known_axes(
    report: &mut CommandReport,
    cfg: &StagerConfig,
    seq: &str,
    cond: Option<&str>,
) -> bool {
    let mut ok = true;
    if !cfg.sequences.iter().any(|s| s == seq) {
        report.issue(format!(
            "unknown sequence {seq}: expected one of {}",
            cfg.sequences.join(", ")
        ));
        ok = false;
    }
    if let Some(cond) = cond
        && !cfg.conditions.iter().any(|c| c == cond)
    {
        report.issue(format!(
            "unknown condition {cond}: expected one of {}",
            cfg.conditions.join(", ")
        ));
        ok = false;
    }
    ok
}

/// Metadata presence gate shared by the matching commands: the tracker
/// export must exist before any staging pass can run.
pub fn require_metadata(report: &mut CommandReport, meta_csv: &Path) -> bool {
    if meta_csv.is_file() {
        return true;
    }

    report.issue(format!(
        "metadata file not found: {} (export it from the study tracker or run move-preprocessed first)",
        meta_csv.display()
    ));
    false
}
