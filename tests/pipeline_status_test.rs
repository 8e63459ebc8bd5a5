use std::fs;
use tempfile::tempdir;

const META_HEADER: &str =
    "Image Data ID,Subject,Group,Sex,Age,Visit,Modality,Description,Type,Acq Date,Format";

#[test]
fn status_flags_missing_required_directories() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicates::str::contains("missing 3T directory"));

    // Output directories are still ensured on the way through.
    assert!(root.join("preprocessed").is_dir());
    assert!(root.join("2convert").is_dir());
    assert!(root.join("outputs/logs").is_dir());
}

#[test]
fn status_reports_counts_once_the_tree_is_populated() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    for dir in ["3T/T1/AD", "DICOM/T1/AD", "preprocessed_old/T1/AD", "TempMeta"] {
        fs::create_dir_all(root.join(dir)).expect("mkdir");
    }
    fs::write(root.join("3T/T1/AD/scan.nii"), b"v").expect("write nii");
    fs::write(root.join("DICOM/T1/AD/slice.dcm"), b"d").expect("write dcm");
    fs::write(
        root.join("TempMeta/Balanced_Meta_T1w_AD.csv"),
        format!("{META_HEADER}\n"),
    )
    .expect("write meta");

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("status")
        .assert()
        .success()
        .stdout(predicates::str::contains("raw_nifti=1"))
        .stdout(predicates::str::contains("dicom=1"))
        .stdout(predicates::str::contains("metadata_csv=Balanced_Meta_T1w_AD.csv"));
}

#[test]
fn init_creates_the_output_taxonomy() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .arg("init")
        .arg("--path")
        .arg(root)
        .assert()
        .success();

    for dir in [
        "preprocessed",
        "TempData",
        "2convert",
        "Converted",
        "final",
        "outputs/logs",
    ] {
        assert!(root.join(dir).is_dir(), "missing {dir}");
    }
}

#[test]
fn run_single_step_writes_a_pipeline_log() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();

    let temp_meta = root.join("TempMeta");
    fs::create_dir_all(&temp_meta).expect("mkdir TempMeta");
    fs::write(
        temp_meta.join("Balanced_Meta_T1w_AD.csv"),
        format!(
            "{META_HEADER}\n\
             13722,002_S_0295,AD,M,84,1,MRI,MPRAGE,Original,4/18/2006,DCM\n"
        ),
    )
    .expect("write metadata");

    let old = root.join("preprocessed_old/T1/AD");
    fs::create_dir_all(&old).expect("mkdir old");
    fs::write(
        old.join("wmADNI_002_S_0295_MR_MPRAGE__br_raw_20060418_1_S13408_I13722.nii"),
        b"volume",
    )
    .expect("write scan");

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("run")
        .arg("--seq")
        .arg("T1")
        .arg("--cond")
        .arg("AD")
        .arg("--step")
        .arg("move-preprocessed")
        .assert()
        .success()
        .stdout(predicates::str::contains("completed_steps=1"));

    let logs = fs::read_dir(root.join("outputs/logs"))
        .expect("read logs")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    assert_eq!(logs.len(), 1);
    let log_raw = fs::read_to_string(&logs[0]).expect("read log");
    assert!(log_raw.contains("step=move-preprocessed ok=true"));
    assert!(log_raw.contains("completed=1 failed=0"));
}
