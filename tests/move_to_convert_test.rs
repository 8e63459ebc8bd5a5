use std::fs;
use tempfile::tempdir;

const META_HEADER: &str =
    "Image Data ID,Subject,Group,Sex,Age,Visit,Modality,Description,Type,Acq Date,Format";

const DICOM_NAME: &str = "ADNI_941_S_1311_MR_MPRAGE__br_raw_20070306_47_S27051_I42764.dcm";

#[test]
fn move_to_convert_groups_dicom_by_subject_and_series() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();

    let temp_meta = root.join("TempMeta");
    fs::create_dir_all(&temp_meta).expect("mkdir TempMeta");
    fs::write(
        temp_meta.join("Balanced_Meta_T1w_AD.csv"),
        format!(
            "{META_HEADER}\n\
             42764,941_S_1311,AD,F,81,1,MRI,MPRAGE,Original,3/06/2007,DCM\n"
        ),
    )
    .expect("write metadata");

    let series_dir = root.join("DICOM/T1/AD/941_S_1311/MPRAGE");
    fs::create_dir_all(&series_dir).expect("mkdir dicom");
    fs::write(series_dir.join(DICOM_NAME), b"dicom").expect("write dicom");
    fs::write(series_dir.join("DICOMDIR.txt"), b"index").expect("write index");

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("move-to-convert")
        .arg("--seq")
        .arg("T1")
        .arg("--cond")
        .arg("AD")
        .assert()
        .success()
        .stdout(predicates::str::contains("copied=1"));

    let queued = root
        .join("2convert/T1/AD/941_S_1311-27051_42764")
        .join(DICOM_NAME);
    assert!(queued.is_file());
}

#[test]
fn unmatched_dicom_is_left_behind() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path();

    let temp_meta = root.join("TempMeta");
    fs::create_dir_all(&temp_meta).expect("mkdir TempMeta");
    fs::write(
        temp_meta.join("Balanced_Meta_T1w_AD.csv"),
        format!(
            "{META_HEADER}\n\
             11111,000_S_0000,AD,M,70,1,MRI,MPRAGE,Original,1/01/2007,DCM\n"
        ),
    )
    .expect("write metadata");

    let series_dir = root.join("DICOM/T1/AD");
    fs::create_dir_all(&series_dir).expect("mkdir dicom");
    fs::write(series_dir.join(DICOM_NAME), b"dicom").expect("write dicom");

    assert_cmd::cargo::cargo_bin_cmd!("stager")
        .current_dir(root)
        .env("STAGER_STUDY_ROOT", root)
        .arg("move-to-convert")
        .arg("--seq")
        .arg("T1")
        .arg("--cond")
        .arg("AD")
        .assert()
        .success()
        .stdout(predicates::str::contains("copied=0"))
        .stdout(predicates::str::contains("residual_rows=1"));

    assert!(!root.join("2convert/T1/AD").exists());
}
