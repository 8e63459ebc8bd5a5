use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::commands::{
    CommandReport, move_final, move_preprocessed, move_to_convert, move_to_preprocess,
};
use crate::stager::paths::resolve_paths;
use crate::stager::util::timestamp_slug;
use crate::stager::warn::{self, WarnEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    All,
    MovePreprocessed,
    MoveToPreprocess,
    MoveToConvert,
    MoveFinal,
}

impl RunStep {
    fn selects(self, step: RunStep) -> bool {
        self == RunStep::All || self == step
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub seq: String,
    pub cond: String,
    pub step: RunStep,
    /// Old preprocessed root for the first stage.
    pub old_path: Option<PathBuf>,
    /// Processed source for the final stage.
    pub source_path: Option<PathBuf>,
    /// Final output root.
    pub target_path: Option<PathBuf>,
}

pub fn run(opts: &RunOptions) -> Result<CommandReport> {
    let paths = resolve_paths();
    let mut report = CommandReport::new("run");

    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let log_file = paths.logs_dir.join(format!(
        "pipeline_{}_{}_{}.log",
        opts.seq,
        opts.cond,
        timestamp_slug()
    ));
    report.detail(format!("log_file={}", log_file.display()));

    let mut steps: Vec<(&'static str, Box<dyn Fn() -> Result<CommandReport>>)> = Vec::new();
    if opts.step.selects(RunStep::MovePreprocessed) {
        let step_opts = move_preprocessed::MovePreprocessedOptions {
            seq: opts.seq.clone(),
            cond: opts.cond.clone(),
            path: opts.old_path.clone(),
            tesla: None,
            divider: None,
            meta: None,
            title: None,
        };
        steps.push((
            "move-preprocessed",
            Box::new(move || move_preprocessed::run(&step_opts)),
        ));
    }
    if opts.step.selects(RunStep::MoveToPreprocess) {
        let step_opts = move_to_preprocess::MoveToPreprocessOptions {
            seq: opts.seq.clone(),
            cond: opts.cond.clone(),
            path: None,
            tesla: None,
            divider: None,
            meta: None,
        };
        steps.push((
            "move-to-preprocess",
            Box::new(move || move_to_preprocess::run(&step_opts)),
        ));
    }
    if opts.step.selects(RunStep::MoveToConvert) {
        let step_opts = move_to_convert::MoveToConvertOptions {
            seq: opts.seq.clone(),
            cond: opts.cond.clone(),
            path: None,
            tesla: None,
            divider: None,
            meta: None,
        };
        steps.push((
            "move-to-convert",
            Box::new(move || move_to_convert::run(&step_opts)),
        ));
    }
    if opts.step.selects(RunStep::MoveFinal) {
        let step_opts = move_final::MoveFinalOptions {
            seq: opts.seq.clone(),
            cond: opts.cond.clone(),
            source: opts.source_path.clone(),
            target: opts.target_path.clone(),
            pattern: None,
            tesla: None,
        };
        steps.push(("move-final", Box::new(move || move_final::run(&step_opts))));
    }

    let mut log_lines = vec![format!(
        "pipeline seq={} cond={} steps={}",
        opts.seq,
        opts.cond,
        steps.len()
    )];
    let mut completed = 0usize;
    let mut failed = 0usize;

    // A failed step never blocks the later ones; the pipeline reports the
    // tally at the end.
    for (name, step) in steps {
        match step() {
            Ok(step_report) => {
                log_lines.push(format!("step={name} ok={}", step_report.ok));
                for line in &step_report.details {
                    log_lines.push(format!("  {line}"));
                }
                for line in &step_report.issues {
                    log_lines.push(format!("  issue: {line}"));
                }
                if step_report.ok {
                    completed += 1;
                } else {
                    failed += 1;
                }
                report.merge(step_report);
            }
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "STEP_FAILED",
                    stage: name,
                    seq: &opts.seq,
                    cond: &opts.cond,
                    reason: "step-error",
                    err: &format!("{err:#}"),
                });
                log_lines.push(format!("step={name} ok=false error={err:#}"));
                report.issue(format!("{name} failed: {err:#}"));
                failed += 1;
            }
        }
    }

    report.count("completed_steps", completed);
    report.count("failed_steps", failed);
    log_lines.push(format!("completed={completed} failed={failed}"));

    fs::write(&log_file, format!("{}\n", log_lines.join("\n")))
        .with_context(|| format!("failed to write {}", log_file.display()))?;

    Ok(report)
}
