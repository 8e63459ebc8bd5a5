use crate::error::StagerError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Delimiter tokens embedded in scan filenames, per processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagerDividers {
    pub raw: String,
    pub converted: String,
    pub separate: String,
}

impl Default for StagerDividers {
    fn default() -> Self {
        Self {
            raw: "raw_".to_string(),
            converted: "br_".to_string(),
            separate: "Br_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagerConfig {
    pub sequences: Vec<String>,
    pub conditions: Vec<String>,
    pub default_tesla: f64,
    pub dividers: StagerDividers,
    /// Filename prefix marking white-matter segmented output.
    pub preprocessed_prefix: String,
    /// `Visit` value that identifies a baseline acquisition.
    pub baseline_visit: String,
}

impl Default for StagerConfig {
    fn default() -> Self {
        Self {
            sequences: vec!["T1".to_string(), "T2".to_string()],
            conditions: vec!["AD".to_string(), "CN".to_string(), "MCI".to_string()],
            default_tesla: 3.0,
            dividers: StagerDividers::default(),
            preprocessed_prefix: "wm".to_string(),
            baseline_visit: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialStagerConfig {
    sequences: Option<Vec<String>>,
    conditions: Option<Vec<String>>,
    default_tesla: Option<f64>,
    dividers: Option<StagerDividers>,
    preprocessed_prefix: Option<String>,
    baseline_visit: Option<String>,
}

fn env_or_f64(var: &str, fallback: f64) -> f64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<f64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_csv_list(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        Err(_) => fallback.to_vec(),
    }
}

fn validate(cfg: &StagerConfig) -> Result<()> {
    if cfg.sequences.is_empty() {
        return Err(StagerError::InvalidConfig("sequences list cannot be empty".to_string()).into());
    }
    if cfg.conditions.is_empty() {
        return Err(
            StagerError::InvalidConfig("conditions list cannot be empty".to_string()).into(),
        );
    }
    if cfg.default_tesla != 1.5 && cfg.default_tesla != 3.0 {
        return Err(StagerError::InvalidConfig(format!(
            "invalid default tesla {}: use 1.5 or 3",
            cfg.default_tesla
        ))
        .into());
    }
    if cfg.dividers.raw.is_empty()
        || cfg.dividers.converted.is_empty()
        || cfg.dividers.separate.is_empty()
    {
        return Err(StagerError::InvalidConfig("dividers cannot be empty".to_string()).into());
    }
    if cfg.preprocessed_prefix.trim().is_empty() {
        return Err(
            StagerError::InvalidConfig("preprocessed prefix cannot be empty".to_string()).into(),
        );
    }
    if cfg.baseline_visit.trim().is_empty() {
        return Err(
            StagerError::InvalidConfig("baseline visit code cannot be empty".to_string()).into(),
        );
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("STAGER_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".adni-stager").join("stager.toml"))
}

fn merge_file_config(base: &mut StagerConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialStagerConfig = toml::from_str(&raw).map_err(|err| {
        StagerError::InvalidConfig(format!(
            "failed to parse stager config {}: {err}",
            path.display()
        ))
    })?;
    if let Some(sequences) = parsed.sequences {
        base.sequences = sequences;
    }
    if let Some(conditions) = parsed.conditions {
        base.conditions = conditions;
    }
    if let Some(default_tesla) = parsed.default_tesla {
        base.default_tesla = default_tesla;
    }
    if let Some(dividers) = parsed.dividers {
        base.dividers = dividers;
    }
    if let Some(preprocessed_prefix) = parsed.preprocessed_prefix {
        base.preprocessed_prefix = preprocessed_prefix;
    }
    if let Some(baseline_visit) = parsed.baseline_visit {
        base.baseline_visit = baseline_visit;
    }
    Ok(())
}

pub fn load_config() -> Result<StagerConfig> {
    let mut cfg = StagerConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.sequences = env_or_csv_list("STAGER_SEQUENCES", &cfg.sequences);
    cfg.conditions = env_or_csv_list("STAGER_CONDITIONS", &cfg.conditions);
    cfg.default_tesla = env_or_f64("STAGER_DEFAULT_TESLA", cfg.default_tesla);
    cfg.dividers.raw = env_or_string("STAGER_RAW_DIVIDER", &cfg.dividers.raw);
    cfg.dividers.converted = env_or_string("STAGER_CONVERTED_DIVIDER", &cfg.dividers.converted);
    cfg.dividers.separate = env_or_string("STAGER_SEPARATE_DIVIDER", &cfg.dividers.separate);
    cfg.preprocessed_prefix = env_or_string("STAGER_PREPROCESSED_PREFIX", &cfg.preprocessed_prefix);
    cfg.baseline_visit = env_or_string("STAGER_BASELINE_VISIT", &cfg.baseline_visit);

    validate(&cfg)?;
    Ok(cfg)
}
