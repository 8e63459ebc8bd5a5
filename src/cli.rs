use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands::{
    self, CommandReport, init, move_converted, move_final, move_preprocessed, move_to_convert,
    move_to_preprocess, separate, status,
};

#[derive(Debug, Parser)]
#[command(
    name = "stager",
    version,
    about = "Stage ADNI scans between pipeline directories by metadata matching"
)]
struct Cli {
    /// Emit the command report as JSON instead of plain lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StepArg {
    All,
    MovePreprocessed,
    MoveToPreprocess,
    MoveToConvert,
    MoveFinal,
}

impl From<StepArg> for commands::run::RunStep {
    fn from(value: StepArg) -> Self {
        match value {
            StepArg::All => Self::All,
            StepArg::MovePreprocessed => Self::MovePreprocessed,
            StepArg::MoveToPreprocess => Self::MoveToPreprocess,
            StepArg::MoveToConvert => Self::MoveToConvert,
            StepArg::MoveFinal => Self::MoveFinal,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stage already-preprocessed files and export the residual list.
    MovePreprocessed {
        /// MRI sequence (e.g. T1, T2).
        #[arg(long)]
        seq: String,
        /// Diagnostic condition (e.g. AD, CN, MCI).
        #[arg(long)]
        cond: String,
        /// Source root with old preprocessed files.
        #[arg(long)]
        path: Option<PathBuf>,
        /// Tesla field strength.
        #[arg(long)]
        tesla: Option<f64>,
        /// Divider token in scan filenames.
        #[arg(long)]
        divider: Option<String>,
        /// Metadata CSV override.
        #[arg(long)]
        meta: Option<PathBuf>,
        /// Residual export title.
        #[arg(long)]
        title: Option<String>,
    },
    /// Queue raw NIfTI volumes for preprocessing.
    MoveToPreprocess {
        #[arg(long)]
        seq: String,
        #[arg(long)]
        cond: String,
        /// Source root with raw NIfTI volumes.
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        tesla: Option<f64>,
        #[arg(long)]
        divider: Option<String>,
        #[arg(long)]
        meta: Option<PathBuf>,
    },
    /// Queue DICOM series for NIfTI conversion.
    MoveToConvert {
        #[arg(long)]
        seq: String,
        #[arg(long)]
        cond: String,
        /// Source root with raw DICOM series.
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        tesla: Option<f64>,
        #[arg(long)]
        divider: Option<String>,
        #[arg(long)]
        meta: Option<PathBuf>,
    },
    /// Collect converted, segmented volumes into the preprocessed tree.
    MoveConverted {
        #[arg(long)]
        seq: String,
        #[arg(long)]
        cond: String,
        /// Source root with converted NIfTI output.
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        tesla: Option<f64>,
        #[arg(long)]
        divider: Option<String>,
        #[arg(long)]
        meta: Option<PathBuf>,
    },
    /// Move matching files into the final tree by name pattern.
    MoveFinal {
        #[arg(long)]
        seq: String,
        #[arg(long)]
        cond: String,
        #[arg(long)]
        source: Option<PathBuf>,
        #[arg(long)]
        target: Option<PathBuf>,
        /// Substring the filename must contain.
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        tesla: Option<f64>,
    },
    /// Separate matched volumes per subject/series for robustness runs.
    Separate {
        #[arg(long)]
        seq: String,
        /// Metadata CSV to match against.
        #[arg(long)]
        meta: PathBuf,
        #[arg(long)]
        tesla: Option<f64>,
        #[arg(long)]
        divider: Option<String>,
        /// Keep only baseline-visit rows.
        #[arg(long)]
        only_baseline: bool,
    },
    /// Validate the study tree and report per-stage file counts.
    Status {
        /// Study root override.
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Create the output directory taxonomy.
    Init {
        /// Study root override.
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Run the pipeline stages in order for one sequence/condition.
    Run {
        #[arg(long)]
        seq: String,
        #[arg(long)]
        cond: String,
        /// Which step(s) to run.
        #[arg(long, value_enum, default_value = "all")]
        step: StepArg,
        /// Old preprocessed root for the first stage.
        #[arg(long)]
        old_path: Option<PathBuf>,
        /// Processed source for the final stage.
        #[arg(long)]
        source_path: Option<PathBuf>,
        /// Final output root.
        #[arg(long)]
        target_path: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::MovePreprocessed {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
            title,
        } => move_preprocessed::run(&move_preprocessed::MovePreprocessedOptions {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
            title,
        })?,
        Command::MoveToPreprocess {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
        } => move_to_preprocess::run(&move_to_preprocess::MoveToPreprocessOptions {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
        })?,
        Command::MoveToConvert {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
        } => move_to_convert::run(&move_to_convert::MoveToConvertOptions {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
        })?,
        Command::MoveConverted {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
        } => move_converted::run(&move_converted::MoveConvertedOptions {
            seq,
            cond,
            path,
            tesla,
            divider,
            meta,
        })?,
        Command::MoveFinal {
            seq,
            cond,
            source,
            target,
            pattern,
            tesla,
        } => move_final::run(&move_final::MoveFinalOptions {
            seq,
            cond,
            source,
            target,
            pattern,
            tesla,
        })?,
        Command::Separate {
            seq,
            meta,
            tesla,
            divider,
            only_baseline,
        } => separate::run(&separate::SeparateOptions {
            seq,
            meta,
            tesla,
            divider,
            only_baseline,
        })?,
        Command::Status { path } => status::run(&status::StatusOptions { path })?,
        Command::Init { path } => init::run(&init::InitOptions { path })?,
        Command::Run {
            seq,
            cond,
            step,
            old_path,
            source_path,
            target_path,
        } => commands::run::run(&commands::run::RunOptions {
            seq,
            cond,
            step: step.into(),
            old_path,
            source_path,
            target_path,
        })?,
    };

    finish(report, cli.json)
}

fn finish(report: CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for detail in &report.details {
            println!("{detail}");
        }
        for (key, value) in &report.counts {
            println!("{key}={value}");
        }
        for issue in &report.issues {
            eprintln!("issue: {issue}");
        }
    }

    if report.ok {
        Ok(())
    } else {
        anyhow::bail!(
            "{} reported {} issue(s)",
            report.command,
            report.issues.len()
        )
    }
}
