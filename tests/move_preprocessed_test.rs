use std::fs;
use std::path::Path;
use tempfile::tempdir;

const META_HEADER: &str =
    "Image Data ID,Subject,Group,Sex,Age,Visit,Modality,Description,Type,Acq Date,Format";

const MATCHED_SCAN: &str = "wmADNI_002_S_0295_MR_MPRAGE__br_raw_20060418_1_S13408_I13722.nii";

fn write_balanced_meta(root: &Path) {
    let temp_meta = root.join("TempMeta");
    fs::create_dir_all(&temp_meta).expect("mkdir TempMeta");
    fs::write(
        temp_meta.join("Balanced_Meta_T1w_AD.csv"),
        format!(
            "{META_HEADER}\n\
             13722,002_S_0295,AD,M,84,1,MRI,MPRAGE,Original,4/18/2006,DCM\n\
             99999,123_S_4567,AD,F,79,1,MRI,MPRAGE,Original,5/02/2006,DCM\n"
        ),
    )
    .expect("write metadata");
}

#[test]
fn move_preprocessed_copies_matches_and_exports_residuals() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_balanced_meta(root);

    let old = root.join("preprocessed_old/T1/AD/002_S_0295");
    fs::create_dir_all(&old).expect("mkdir old");
    fs::write(old.join(MATCHED_SCAN), b"volume").expect("write scan");
    fs::write(old.join("wm_no_ids_here.nii"), b"noise").expect("write noise");

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("move-preprocessed")
        .arg("--seq")
        .arg("T1")
        .arg("--cond")
        .arg("AD")
        .assert()
        .success();

    let copied = root.join("preprocessed/T1/AD").join(format!("0-{MATCHED_SCAN}"));
    assert!(copied.is_file());
    assert_eq!(fs::read(&copied).expect("read copy"), b"volume");

    let residual = root.join("TempMeta/To-Be-Preprocessed_T1w_AD.csv");
    let raw = fs::read_to_string(&residual).expect("read residuals");
    assert!(raw.contains("123_S_4567"));
    assert!(!raw.contains("002_S_0295"));
}

#[test]
fn move_preprocessed_is_idempotent_across_reruns() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_balanced_meta(root);

    let old = root.join("preprocessed_old/T1/AD");
    fs::create_dir_all(&old).expect("mkdir old");
    fs::write(old.join(MATCHED_SCAN), b"volume").expect("write scan");

    for _ in 0..2 {
        assert_cmd::cargo::cargo_bin_cmd!("stager")
            .current_dir(root)
            .env("STAGER_STUDY_ROOT", root)
            .arg("move-preprocessed")
            .arg("--seq")
            .arg("T1")
            .arg("--cond")
            .arg("AD")
            .assert()
            .success();
    }

    let target_dir = root.join("preprocessed/T1/AD");
    let copies = fs::read_dir(&target_dir)
        .expect("read target")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .count();
    assert_eq!(copies, 1);
}

#[test]
fn unknown_sequence_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_balanced_meta(root);

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("move-preprocessed")
        .arg("--seq")
        .arg("T9")
        .arg("--cond")
        .arg("AD")
        .assert()
        .failure()
        .stderr(predicates::str::contains("unknown sequence T9"));
}

#[test]
fn missing_metadata_is_a_cli_error() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    fs::create_dir_all(root.join("preprocessed_old/T1/AD")).expect("mkdir old");

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("move-preprocessed")
        .arg("--seq")
        .arg("T1")
        .arg("--cond")
        .arg("AD")
        .assert()
        .failure()
        .stderr(predicates::str::contains("metadata file not found"));
}

#[test]
fn missing_source_directory_is_a_cli_error() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();
    write_balanced_meta(root);

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("move-preprocessed")
        .arg("--seq")
        .arg("T1")
        .arg("--cond")
        .arg("AD")
        .assert()
        .failure()
        .stderr(predicates::str::contains("source directory unavailable"));
}
