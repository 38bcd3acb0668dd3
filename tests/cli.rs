use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

mod common;

use common::{box_line, file_count, write_file, DatasetBuilder};

fn labelcurate(dataset: &DatasetBuilder) -> Command {
    let mut cmd = Command::cargo_bin("labelcurate").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd.arg("--root").arg(dataset.root());
    cmd
}

/// 12 train and 4 valid files of class 0, plus one class 1 file in each.
fn unbalanced() -> DatasetBuilder {
    DatasetBuilder::new()
        .class_pairs("train", "car", "0", 12)
        .class_pairs("valid", "car", "0", 4)
        .pair("train", "person", &box_line("1"))
        .pair("valid", "person", &box_line("1"))
}

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("labelcurate").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("labelcurate").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("labelcurate 0.1.0\n");
}

// Count

#[test]
fn count_reports_per_split_and_total() {
    let dataset = unbalanced();
    labelcurate(&dataset)
        .arg("count")
        .assert()
        .success()
        .stdout(predicate::str::contains("class 0: 12 annotations in 12 files"))
        .stdout(predicate::str::contains("class 0: 16 annotations in 16 files"))
        .stdout(predicate::str::contains("Total annotations: 18"))
        .stdout(predicate::str::contains("Skipped splits (not found): test"));
}

#[test]
fn count_json_output_is_machine_readable() {
    let dataset = unbalanced();
    let output = labelcurate(&dataset)
        .args(["count", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["totals"]["0"]["files"], 16);
    assert_eq!(json["totals"]["1"]["occurrences"], 2);
}

#[test]
fn count_accepts_val_directory_alias() {
    let dataset = DatasetBuilder::new().class_pairs("val", "x", "3", 2);
    labelcurate(&dataset)
        .args(["--split", "valid", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("class 3: 2 annotations in 2 files"));
}

#[test]
fn missing_root_fails() {
    let mut cmd = Command::cargo_bin("labelcurate").unwrap();
    cmd.args(["--root", "definitely/not/here", "count"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Dataset root not found"));
}

#[test]
fn split_without_labels_dir_fails() {
    let dataset = DatasetBuilder::new().image_only("train", "a");
    labelcurate(&dataset)
        .arg("count")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing labels/ directory"));
}

// Plan and prune

#[test]
fn plan_prints_quotas_without_deleting() {
    let dataset = unbalanced();
    labelcurate(&dataset)
        .args(["plan", "--class", "0", "--target", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep ratio = 6 / 12"))
        .stdout(predicate::str::contains("delete=    6"))
        .stdout(predicate::str::contains("delete=    2"));

    assert_eq!(file_count(&dataset.labels_dir("train")), 13);
}

#[test]
fn plan_with_baseline_uses_it_as_denominator() {
    let dataset = DatasetBuilder::new()
        .class_pairs("train", "a", "0", 2800)
        .class_pairs("valid", "a", "0", 1000);
    labelcurate(&dataset)
        .args(["plan", "--class", "0", "--target", "2800", "--baseline", "12000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(baseline train)"))
        .stdout(predicate::str::contains("keep=  234, delete=  766"));
}

#[test]
fn plan_without_target_fails() {
    let dataset = unbalanced();
    labelcurate(&dataset)
        .args(["plan", "--class", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid prune parameters"));
}

#[test]
fn prune_deletes_pairs_to_quota() {
    let dataset = unbalanced();
    labelcurate(&dataset)
        .args(["prune", "--class", "0", "--target", "6", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 8 stem(s)"))
        .stdout(predicate::str::contains("Errors: 0"));

    assert_eq!(file_count(&dataset.labels_dir("train")), 7);
    assert_eq!(file_count(&dataset.images_dir("train")), 7);
    assert_eq!(file_count(&dataset.labels_dir("valid")), 3);
    assert_eq!(file_count(&dataset.images_dir("valid")), 3);
    assert!(dataset.label_path("train", "person").exists());
}

#[test]
fn prune_dry_run_lists_selection_and_keeps_files() {
    let dataset = unbalanced();
    labelcurate(&dataset)
        .args(["prune", "--class", "0", "--target", "6", "--dry-run", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete 8 stem(s)"))
        .stdout(predicate::str::contains("Selected stems:"))
        .stdout(predicate::str::contains("valid/car_"));

    assert_eq!(file_count(&dataset.labels_dir("train")), 13);
}

#[test]
fn prune_selection_is_reproducible_with_seed() {
    let first = unbalanced();
    let second = unbalanced();
    let args = ["prune", "--class", "0", "--target", "5", "--seed", "3", "--dry-run", "--list"];

    let a = labelcurate(&first).args(args).output().unwrap();
    let b = labelcurate(&second).args(args).output().unwrap();
    let strip = |out: &[u8], root: &std::path::Path| {
        String::from_utf8_lossy(out).replace(&root.display().to_string(), "<root>")
    };
    assert_eq!(
        strip(&a.stdout, first.root()),
        strip(&b.stdout, second.root())
    );
}

#[test]
fn prune_with_unreadable_label_reports_error_and_fails() {
    let dataset = unbalanced().pair("train", "broken", "");
    write_file(&dataset.label_path("train", "broken"), &[0xffu8, 0xfe, 0x00]);

    labelcurate(&dataset)
        .args(["prune", "--class", "0", "--target", "6"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Errors: 1"))
        .stdout(predicate::str::contains("broken.txt"))
        .stderr(predicate::str::contains("1 file failure(s)"));

    assert!(dataset.label_path("train", "broken").exists());
}

#[test]
fn prune_reports_kept_count_per_class() {
    let dataset = unbalanced();
    labelcurate(&dataset)
        .args(["prune", "--class", "0", "--target", "6", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("train class 0: keep 6 (planned 6)"))
        .stdout(predicate::str::contains("valid class 0: keep 2 (planned 2)"));
}

// Remap

#[test]
fn remap_rewrites_class_ids() {
    let dataset = DatasetBuilder::new()
        .pair("train", "a", "0 0.1 0.2 0.3 0.4\n1 0.5 0.5 0.2 0.2\n")
        .pair("train", "b", "7 0.5 0.5 0.2 0.2\n");

    labelcurate(&dataset)
        .args(["remap", "--map", "0=4,1=5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rewrote 1 file(s), 2 line(s) remapped"));

    assert_eq!(
        fs::read_to_string(dataset.label_path("train", "a")).unwrap(),
        "4 0.1 0.2 0.3 0.4\n5 0.5 0.5 0.2 0.2\n"
    );
    assert_eq!(
        fs::read_to_string(dataset.label_path("train", "b")).unwrap(),
        "7 0.5 0.5 0.2 0.2\n"
    );
}

#[test]
fn remap_rejects_malformed_map() {
    let dataset = DatasetBuilder::new().pair("train", "a", &box_line("0"));
    labelcurate(&dataset)
        .args(["remap", "--map", "0-4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid class map"));
}

#[test]
fn remap_reads_map_from_config_file() {
    let dataset = DatasetBuilder::new().pair("train", "a", &box_line("2"));
    let config = dataset.root().join("curate.yaml");
    fs::write(&config, "class_map:\n  2: 9\n").unwrap();

    labelcurate(&dataset)
        .arg("--config")
        .arg(&config)
        .arg("remap")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dataset.label_path("train", "a")).unwrap(),
        box_line("9")
    );
}

// Null labels

#[test]
fn nulls_detection_is_read_only() {
    let dataset = DatasetBuilder::new()
        .pair("train", "empty", "\n  \n")
        .pair("train", "full", &box_line("0"));

    labelcurate(&dataset)
        .arg("nulls")
        .assert()
        .success()
        .stdout(predicate::str::contains("Empty label files found (1)"))
        .stdout(predicate::str::contains("empty.txt"));

    assert!(dataset.label_path("train", "empty").exists());
    assert!(dataset.image_path("train", "empty").exists());
}

#[test]
fn delete_nulls_removes_label_and_image() {
    let dataset = DatasetBuilder::new()
        .pair("train", "empty", "")
        .pair("train", "full", &box_line("0"));

    labelcurate(&dataset)
        .arg("delete-nulls")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 stem(s)"));

    assert!(!dataset.label_path("train", "empty").exists());
    assert!(!dataset.image_path("train", "empty").exists());
    assert!(dataset.label_path("train", "full").exists());
}

#[test]
fn null_commands_fail_on_unreadable_label() {
    let dataset = DatasetBuilder::new()
        .pair("train", "empty", "")
        .pair("train", "broken", "");
    write_file(&dataset.label_path("train", "broken"), &[0xffu8, 0xfe, 0x00]);

    labelcurate(&dataset)
        .arg("nulls")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Empty label files found (1)"))
        .stdout(predicate::str::contains("Errors: 1"));

    labelcurate(&dataset)
        .arg("delete-nulls")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Deleted 1 stem(s)"))
        .stdout(predicate::str::contains("Errors: 1"));

    assert!(!dataset.label_path("train", "empty").exists());
    assert!(dataset.label_path("train", "broken").exists());
    assert!(dataset.image_path("train", "broken").exists());
}

// Negative samples

#[test]
fn add_negatives_copies_images_with_empty_labels() {
    let dataset = DatasetBuilder::new().pair("train", "a", &box_line("0"));
    let pool = tempfile::tempdir().unwrap();
    for name in ["bg1.jpg", "bg2.png", "bg3.jpg", "bg4.jpg", "notes.txt"] {
        fs::write(pool.path().join(name), b"bg").unwrap();
    }

    labelcurate(&dataset)
        .args(["add-negatives", "--into", "train", "--limit", "3", "--from"])
        .arg(pool.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 3 negative sample(s) to train"));

    assert_eq!(file_count(&dataset.images_dir("train")), 4);
    assert_eq!(file_count(&dataset.labels_dir("train")), 4);
    for entry in fs::read_dir(dataset.labels_dir("train")).unwrap() {
        let path = entry.unwrap().path();
        if path.file_stem().is_some_and(|s| s != "a") {
            assert_eq!(fs::read_to_string(&path).unwrap(), "");
        }
    }
}

#[test]
fn add_negatives_with_missing_pool_fails() {
    let dataset = DatasetBuilder::new().pair("train", "a", &box_line("0"));
    labelcurate(&dataset)
        .args(["add-negatives", "--into", "train", "--limit", "3", "--from", "no/such/pool"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid background image pool"));
}

// Integrity check

#[test]
fn check_passes_on_paired_dataset() {
    let dataset = unbalanced();
    labelcurate(&dataset)
        .args(["check", "--strict"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Integrity check passed"));
}

#[test]
fn check_strict_fails_on_orphans() {
    let dataset = DatasetBuilder::new()
        .pair("train", "ok", &box_line("0"))
        .label_only("train", "ghost", &box_line("0"))
        .image_only("train", "stray");

    labelcurate(&dataset)
        .args(["check", "--strict"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("LabelWithoutImage"))
        .stdout(predicate::str::contains("ImageWithoutLabel"))
        .stderr(predicate::str::contains("2 violation(s)"));
}

#[test]
fn check_without_strict_reports_but_succeeds() {
    let dataset = DatasetBuilder::new()
        .pair("train", "ok", &box_line("0"))
        .label_only("train", "ghost", &box_line("0"));

    labelcurate(&dataset)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 error(s)"));

    assert!(dataset.label_path("train", "ghost").exists());
}

#[test]
fn check_fix_removes_orphans() {
    let dataset = DatasetBuilder::new()
        .pair("train", "ok", &box_line("0"))
        .label_only("train", "ghost", &box_line("0"))
        .image_only("train", "stray");

    labelcurate(&dataset)
        .args(["check", "--fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Orphan repair:"))
        .stdout(predicate::str::contains("Deleted 2 stem(s)"));

    assert!(!dataset.label_path("train", "ghost").exists());
    assert!(!dataset.image_path("train", "stray").exists());
    assert!(dataset.label_path("train", "ok").exists());
}
