use crate::error::StagerError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const REQUIRED_COLUMNS: [&str; 11] = [
    "Image Data ID",
    "Subject",
    "Group",
    "Sex",
    "Age",
    "Visit",
    "Modality",
    "Description",
    "Type",
    "Acq Date",
    "Format",
];

/// One row of the study tracker export.
///
/// Every field stays a string: the source spreadsheets are inconsistent
/// about types (ages as floats, visits as codes or numbers) and nothing
/// downstream does arithmetic on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(rename = "Image Data ID")]
    pub image_data_id: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Visit")]
    pub visit: String,
    #[serde(rename = "Modality")]
    pub modality: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Acq Date")]
    pub acq_date: String,
    #[serde(rename = "Format")]
    pub format: String,
}

impl MetaRecord {
    /// Canonical matching key, `{subject}-I{image_data_id}`.
    pub fn combined_key(&self) -> String {
        format!("{}-I{}", self.subject, self.image_data_id)
    }
}

/// Read a metadata CSV, validating that the fixed column schema is present.
/// Extra columns (such as a spreadsheet index column) are ignored.
pub fn read_metadata(path: &Path) -> Result<Vec<MetaRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open metadata csv {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header row of {}", path.display()))?
        .clone();
    let missing = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(StagerError::InvalidMetadata(format!(
            "{} is missing columns: {}",
            path.display(),
            missing.join(", ")
        ))
        .into());
    }

    let mut out = Vec::new();
    for row in reader.deserialize() {
        let record: MetaRecord =
            row.with_context(|| format!("failed to parse metadata row in {}", path.display()))?;
        out.push(record);
    }
    Ok(out)
}

pub fn write_metadata(path: &Path, records: &[MetaRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    // Header written by hand so an empty residual list still round-trips
    // through `read_metadata`.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create metadata csv {}", path.display()))?;
    writer
        .write_record(REQUIRED_COLUMNS)
        .with_context(|| format!("failed to write header row to {}", path.display()))?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("failed to write metadata row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

/// Export residual "to-process" rows as `TempMeta/{title}.csv`.
pub fn export_residuals(temp_meta_dir: &Path, title: &str, records: &[MetaRecord]) -> Result<PathBuf> {
    let path = temp_meta_dir.join(format!("{title}.csv"));
    write_metadata(&path, records)?;
    Ok(path)
}

/// One combined key per row, in row order.
pub fn combined_keys(records: &[MetaRecord]) -> Vec<String> {
    records.iter().map(MetaRecord::combined_key).collect()
}

/// Conventional tracker export location for a sequence/condition pair.
pub fn balanced_meta_csv(temp_meta_dir: &Path, seq: &str, cond: &str) -> PathBuf {
    temp_meta_dir.join(format!("Balanced_Meta_{seq}w_{cond}.csv"))
}

/// Conventional residual export location for a sequence/condition pair.
pub fn to_be_preprocessed_csv(temp_meta_dir: &Path, seq: &str, cond: &str) -> PathBuf {
    temp_meta_dir.join(format!("To-Be-Preprocessed_{seq}w_{cond}.csv"))
}

/// Keep only rows for the given visit code.
pub fn filter_visit(records: &[MetaRecord], visit: &str) -> Vec<MetaRecord> {
    records
        .iter()
        .filter(|r| r.visit == visit)
        .cloned()
        .collect()
}

/// Metadata CSV files available under `TempMeta`, sorted by name.
pub fn list_available_metadata(temp_meta_dir: &Path) -> Vec<String> {
    let Ok(read_dir) = fs::read_dir(temp_meta_dir) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            out.push(name.to_string());
        }
    }
    out.sort();
    out
}
