use crate::stager::filename;
use crate::stager::metadata::{self, MetaRecord};
use crate::stager::scan::{self, ScanFilter};
use crate::stager::util::file_hash;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Counters and residual rows from one staging pass.
#[derive(Debug, Clone, Default)]
pub struct MoveOutcome {
    /// Candidate files found under the source subtree.
    pub scanned: usize,
    pub copied: usize,
    /// Destinations that already held identical content.
    pub deduped: usize,
    /// Metadata rows that matched at least one candidate.
    pub matched_rows: usize,
    /// Metadata rows with no matching candidate, in row order.
    pub residuals: Vec<MetaRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CopyAction {
    Copied,
    Deduped,
}

/// Copy-once: an existing destination with identical content is left
/// alone; differing content is overwritten.
fn copy_scan(from: &Path, to: &Path) -> Result<CopyAction> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if to.exists() && file_hash(from)? == file_hash(to)? {
        return Ok(CopyAction::Deduped);
    }

    fs::copy(from, to)
        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    Ok(CopyAction::Copied)
}

/// The shared matching pass: outer loop over metadata rows, inner scan over
/// candidates; a candidate belongs to a row when its filename-derived key is
/// a substring of the row's combined key. Unparseable names are skipped.
/// `dest_for` computes the destination from (row index, candidate, ids).
fn match_and_copy<F>(
    records: &[MetaRecord],
    files: &[PathBuf],
    divider: &str,
    mut dest_for: F,
) -> Result<MoveOutcome>
where
    F: FnMut(usize, &Path, &filename::ScanIds) -> PathBuf,
{
    let mut out = MoveOutcome {
        scanned: files.len(),
        ..MoveOutcome::default()
    };

    let row_keys = metadata::combined_keys(records);
    for (row_idx, record) in records.iter().enumerate() {
        let row_key = &row_keys[row_idx];
        let mut matched = false;

        for file in files {
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(ids) = filename::parse_scan_name(name, divider) else {
                continue;
            };
            if !row_key.contains(&ids.combined_key()) {
                continue;
            }

            let dest = dest_for(row_idx, file.as_path(), &ids);
            match copy_scan(file, &dest)? {
                CopyAction::Copied => out.copied += 1,
                CopyAction::Deduped => out.deduped += 1,
            }
            matched = true;
        }

        if matched {
            out.matched_rows += 1;
        } else {
            out.residuals.push(record.clone());
        }
    }

    Ok(out)
}

/// Stage already-preprocessed files from an old run into
/// `{preprocessed}/{seq}/{cond}/{row_idx}-{name}`; unmatched rows become
/// the residual "to-be-preprocessed" list.
pub fn move_preprocessed(
    records: &[MetaRecord],
    source_root: &Path,
    preprocessed_dir: &Path,
    seq: &str,
    cond: &str,
    prefix: &str,
    divider: &str,
) -> Result<MoveOutcome> {
    let search_root = source_root.join(seq).join(cond);
    let files = scan::find_scans(&search_root, &ScanFilter::nifti().name_prefix(prefix))?;
    let target_dir = preprocessed_dir.join(seq).join(cond);

    match_and_copy(records, &files, divider, |row_idx, file, _ids| {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        target_dir.join(format!("{row_idx}-{name}"))
    })
}

/// Queue raw NIfTI volumes for preprocessing under
/// `{temp_data}/{seq}/{cond}/{subject}-{series}-{image}/{name}`.
pub fn move_to_preprocess(
    records: &[MetaRecord],
    raw_dir: &Path,
    temp_data_dir: &Path,
    seq: &str,
    cond: &str,
    divider: &str,
) -> Result<MoveOutcome> {
    let search_root = raw_dir.join(seq);
    let files = scan::find_scans(&search_root, &ScanFilter::nifti().dir_contains(cond))?;
    let target_root = temp_data_dir.join(seq).join(cond);

    match_and_copy(records, &files, divider, |_row_idx, file, ids| {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        target_root.join(ids.stage_dir_name()).join(name.as_ref())
    })
}

/// Queue DICOM series for NIfTI conversion under
/// `{2convert}/{seq}/{cond}/{subject}-{series}_{image}/{name}`.
pub fn move_to_convert(
    records: &[MetaRecord],
    dicom_dir: &Path,
    convert_queue_dir: &Path,
    seq: &str,
    cond: &str,
    divider: &str,
) -> Result<MoveOutcome> {
    let search_root = dicom_dir.join(seq).join(cond);
    let files = scan::find_scans(&search_root, &ScanFilter::dicom())?;
    let target_root = convert_queue_dir.join(seq).join(cond);

    match_and_copy(records, &files, divider, |_row_idx, file, ids| {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        target_root.join(ids.convert_dir_name()).join(name.as_ref())
    })
}

/// Collect freshly converted, segmented volumes into
/// `{preprocessed}/{seq}/{cond}/{row_idx}-{name}`.
pub fn move_converted(
    records: &[MetaRecord],
    converted_dir: &Path,
    preprocessed_dir: &Path,
    seq: &str,
    cond: &str,
    prefix: &str,
    divider: &str,
) -> Result<MoveOutcome> {
    let search_root = converted_dir.join(seq).join(cond);
    let files = scan::find_scans(&search_root, &ScanFilter::nifti().name_prefix(prefix))?;
    let target_dir = preprocessed_dir.join(seq).join(cond);

    match_and_copy(records, &files, divider, |row_idx, file, _ids| {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        target_dir.join(format!("{row_idx}-{name}"))
    })
}

/// Pattern move with no metadata matching: every candidate whose name
/// carries the study token goes to `{target}/{seq}/{cond}/{n}-{name}`.
pub fn move_final(
    source_root: &Path,
    target_root: &Path,
    seq: &str,
    cond: &str,
    name_token: &str,
    study_token: &str,
) -> Result<MoveOutcome> {
    let search_root = source_root.join(seq).join(cond);
    let files = scan::find_scans(&search_root, &ScanFilter::nifti().name_contains(name_token))?;
    let target_dir = target_root.join(seq).join(cond);

    let mut out = MoveOutcome {
        scanned: files.len(),
        ..MoveOutcome::default()
    };

    let mut next = 0usize;
    for file in &files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.contains(study_token) {
            continue;
        }
        let dest = target_dir.join(format!("{next}-{name}"));
        match copy_scan(file, &dest)? {
            CopyAction::Copied => out.copied += 1,
            CopyAction::Deduped => out.deduped += 1,
        }
        next += 1;
    }

    Ok(out)
}

/// Separate matched volumes per subject/series under
/// `{data_sep}/{seq}/{subject}-{series}/{name}` for robustness evaluation.
pub fn separate(
    records: &[MetaRecord],
    data_ori_dir: &Path,
    data_sep_dir: &Path,
    seq: &str,
    tesla_dir: &str,
    divider: &str,
) -> Result<MoveOutcome> {
    let search_root = data_ori_dir.join(tesla_dir).join(seq);
    let files = scan::find_scans(&search_root, &ScanFilter::nifti())?;
    let target_root = data_sep_dir.join(seq);

    match_and_copy(records, &files, divider, |_row_idx, file, ids| {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        target_root
            .join(format!("{}-{}", ids.subject, ids.series))
            .join(name.as_ref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stager::metadata::MetaRecord;
    use std::fs;
    use tempfile::tempdir;

    fn record(subject: &str, image: &str) -> MetaRecord {
        MetaRecord {
            image_data_id: image.to_string(),
            subject: subject.to_string(),
            group: "AD".to_string(),
            sex: "F".to_string(),
            age: "79".to_string(),
            visit: "1".to_string(),
            modality: "MRI".to_string(),
            description: "MPRAGE".to_string(),
            kind: "Original".to_string(),
            acq_date: "4/18/2006".to_string(),
            format: "DCM".to_string(),
        }
    }

    fn scan_name(subject: &str, series: &str, image: &str) -> String {
        format!("wmADNI_{subject}_MR_MPRAGE__br_raw_20060418_1_S{series}_I{image}.nii")
    }

    #[test]
    fn copies_exactly_the_key_matched_files_and_collects_residuals() {
        let tmp = tempdir().expect("tempdir");
        let old = tmp.path().join("preprocessed_old");
        let source = old.join("T1/AD");
        fs::create_dir_all(&source).expect("mkdir");
        fs::write(source.join(scan_name("002_S_0295", "13408", "13722")), b"x").expect("write");
        fs::write(source.join(scan_name("941_S_1311", "27051", "42764")), b"y").expect("write");
        fs::write(source.join("notes.txt"), b"z").expect("write");

        let records = vec![record("002_S_0295", "13722"), record("123_S_4567", "99999")];
        let preprocessed = tmp.path().join("preprocessed");
        let outcome = move_preprocessed(
            &records,
            &old,
            &preprocessed,
            "T1",
            "AD",
            "wm",
            "raw_",
        )
        .expect("move");

        assert_eq!(outcome.scanned, 2);
        assert_eq!(outcome.copied, 1);
        assert_eq!(outcome.matched_rows, 1);
        assert_eq!(outcome.residuals.len(), 1);
        assert_eq!(outcome.residuals[0].subject, "123_S_4567");

        let dest = preprocessed
            .join("T1/AD")
            .join(format!("0-{}", scan_name("002_S_0295", "13408", "13722")));
        assert!(dest.is_file());
    }

    #[test]
    fn rerun_dedupes_identical_destinations() {
        let tmp = tempdir().expect("tempdir");
        let old = tmp.path().join("preprocessed_old");
        let source = old.join("T1/AD");
        fs::create_dir_all(&source).expect("mkdir");
        fs::write(source.join(scan_name("002_S_0295", "13408", "13722")), b"x").expect("write");

        let records = vec![record("002_S_0295", "13722")];
        let preprocessed = tmp.path().join("preprocessed");
        let first =
            move_preprocessed(&records, &old, &preprocessed, "T1", "AD", "wm", "raw_").expect("first");
        assert_eq!((first.copied, first.deduped), (1, 0));

        let second =
            move_preprocessed(&records, &old, &preprocessed, "T1", "AD", "wm", "raw_").expect("second");
        assert_eq!((second.copied, second.deduped), (0, 1));
    }

    #[test]
    fn stage_queue_groups_by_subject_series_image() {
        let tmp = tempdir().expect("tempdir");
        let raw = tmp.path().join("3T");
        let source = raw.join("T1/batch_AD/subject1");
        fs::create_dir_all(&source).expect("mkdir");
        let name = "ADNI_002_S_0295_MR_MPRAGE__br_raw_20060418_1_S13408_I13722.nii";
        fs::write(source.join(name), b"x").expect("write");

        let records = vec![record("002_S_0295", "13722")];
        let temp_data = tmp.path().join("TempData");
        let outcome =
            move_to_preprocess(&records, &raw, &temp_data, "T1", "AD", "raw_").expect("move");

        assert_eq!(outcome.copied, 1);
        assert!(
            temp_data
                .join("T1/AD/002_S_0295-13408-13722")
                .join(name)
                .is_file()
        );
    }

    #[test]
    fn substring_containment_can_false_positive_on_key_prefixes() {
        // Known quirk of the matching rule: I137 is matched by a row whose
        // image id extends it (I1372), because containment is substring.
        let tmp = tempdir().expect("tempdir");
        let old = tmp.path().join("preprocessed_old");
        let source = old.join("T1/AD");
        fs::create_dir_all(&source).expect("mkdir");
        fs::write(source.join(scan_name("002_S_0295", "13408", "137")), b"x").expect("write");

        let records = vec![record("002_S_0295", "1372")];
        let preprocessed = tmp.path().join("preprocessed");
        let outcome =
            move_preprocessed(&records, &old, &preprocessed, "T1", "AD", "wm", "raw_").expect("move");
        assert_eq!(outcome.matched_rows, 1);
    }

    #[test]
    fn final_move_numbers_only_study_files() {
        let tmp = tempdir().expect("tempdir");
        let processed = tmp.path().join("processed");
        let source = processed.join("T1/AD");
        fs::create_dir_all(&source).expect("mkdir");
        fs::write(source.join(scan_name("002_S_0295", "13408", "13722")), b"a").expect("write");
        fs::write(source.join("wm_other_scan.nii"), b"b").expect("write");

        let final_dir = tmp.path().join("final");
        let outcome =
            move_final(&processed, &final_dir, "T1", "AD", "wm", "ADNI").expect("move");

        assert_eq!(outcome.scanned, 2);
        assert_eq!(outcome.copied, 1);
        let dest = final_dir
            .join("T1/AD")
            .join(format!("0-{}", scan_name("002_S_0295", "13408", "13722")));
        assert!(dest.is_file());
    }
}
