use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::fs;

const MIB: usize = 1_048_576;

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8).collect()
}

#[test]
fn splits_with_explicit_size() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let data = sample_bytes(5 * MIB);
    temp.child("five.bin").write_binary(&data).expect("write input");

    let mut cmd = cargo_bin_cmd!("partsplit");
    cmd.current_dir(temp.path());
    cmd.args(["split", "five.bin", "--size", "2"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("five.bin.part3"))
        .stdout(predicate::str::contains("Split into 3 parts"));

    let sizes: Vec<u64> = (1..=3)
        .map(|i| {
            fs::metadata(temp.child(format!("five.bin.part{i}")).path())
                .expect("part exists")
                .len()
        })
        .collect();
    assert_eq!(sizes, vec![2_097_152, 2_097_152, 1_048_576]);
    temp.child("five.bin.part4")
        .assert(predicate::path::missing());
}

#[test]
fn uses_configured_size_and_creates_default_config() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    temp.child("config.json")
        .write_str(r#"{"seg_size_mb": 1}"#)
        .unwrap();
    temp.child("two.bin")
        .write_binary(&sample_bytes(2 * MIB))
        .unwrap();

    let mut cmd = cargo_bin_cmd!("partsplit");
    cmd.current_dir(temp.path());
    cmd.args(["split", "two.bin"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Split into 2 parts"));
    temp.child("config.json").assert(r#"{"seg_size_mb": 1}"#);
}

#[test]
fn writes_default_config_on_first_run() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    temp.child("small.txt").write_str("hello").unwrap();

    let mut cmd = cargo_bin_cmd!("partsplit");
    cmd.current_dir(temp.path());
    cmd.args(["split", "small.txt"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("smaller than one part"))
        .stdout(predicate::str::contains("Split into 1 parts"));

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.child("config.json").path()).unwrap())
            .unwrap();
    assert_eq!(config["seg_size_mb"], 22);
    temp.child("small.txt.part1").assert("hello");
}

#[test]
fn missing_source_fails() {
    let temp = assert_fs::TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("partsplit");
    cmd.current_dir(temp.path());
    cmd.args(["split", "absent.bin"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("File not found: absent.bin"));
}

#[test]
fn split_then_merge_restores_original() {
    let temp = assert_fs::TempDir::new().expect("temp dir");
    let data = sample_bytes(3 * MIB + 17);
    temp.child("blob.bin").write_binary(&data).unwrap();

    cargo_bin_cmd!("partsplit")
        .current_dir(temp.path())
        .args(["split", "blob.bin", "--size", "1"])
        .assert()
        .success();
    fs::remove_file(temp.child("blob.bin").path()).unwrap();

    cargo_bin_cmd!("partsplit")
        .current_dir(temp.path())
        .args(["merge", "blob.bin.part4"])
        .assert()
        .success();

    let restored = fs::read(temp.child("blob.bin").path()).unwrap();
    assert_eq!(restored, data);
}
