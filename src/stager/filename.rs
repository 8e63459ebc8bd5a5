/// Identifiers embedded in an ADNI scan filename.
///
/// A typical name looks like
/// `ADNI_002_S_0295_MR_MPRAGE__br_raw_20060418193713091_1_S13408_I13722.nii`
/// (preprocessed output prepends a segmentation prefix such as `wm`). The
/// encoding is a loose convention, not a format: extraction is positional
/// string splitting and any missing token means the name is not parseable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIds {
    pub subject: String,
    pub series: String,
    pub image: String,
}

impl ScanIds {
    /// Key used for metadata matching, `{subject}-I{image}`.
    ///
    /// Matching is substring containment against a row's combined key, not
    /// equality, so a key that is a prefix of another can false-positive.
    pub fn combined_key(&self) -> String {
        format!("{}-I{}", self.subject, self.image)
    }

    /// Per-scan subdirectory name in the preprocessing queue.
    pub fn stage_dir_name(&self) -> String {
        format!("{}-{}-{}", self.subject, self.series, self.image)
    }

    /// Per-scan subdirectory name in the conversion queue.
    pub fn convert_dir_name(&self) -> String {
        format!("{}-{}_{}", self.subject, self.series, self.image)
    }
}

/// Best-effort extraction of scan identifiers from a filename.
///
/// The split sequence is fixed: drop the extension, cut at `_MR`, take the
/// subject after `ADNI_`, skip past `divider`, read the series between `_S`
/// and the next `_I`, and read the image id after the stem's first `_I`.
/// Returns `None` whenever a token is missing; callers treat that as "no
/// match" for the candidate.
pub fn parse_scan_name(file_name: &str, divider: &str) -> Option<ScanIds> {
    let stem = file_name.split(".nii").next().unwrap_or(file_name);
    let stem = stem.split(".dcm").next().unwrap_or(stem);

    let mut at_mr = stem.split("_MR");
    let head = at_mr.next()?;
    let tail = at_mr.next()?;

    let subject = head.split("ADNI_").nth(1)?;
    let past_divider = tail.split(divider).nth(1)?;
    let series_part = past_divider.split("_S").nth(1)?;
    let series = series_part.split("_I").next().unwrap_or(series_part);
    let image = stem.split("_I").nth(1)?;

    if subject.is_empty() || series.is_empty() || image.is_empty() {
        return None;
    }

    Some(ScanIds {
        subject: subject.to_string(),
        series: series.to_string(),
        image: image.to_string(),
    })
}
