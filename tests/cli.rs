use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn datasweep() -> Command {
    Command::cargo_bin("datasweep").unwrap()
}

#[test]
fn test_converts_csv_to_excel() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("sales.csv");
    std::fs::write(&input, "region,units,price\nnorth,3,2.5\nsouth,,4\nnorth,3,2.5\n").unwrap();
    let out = dir.path().join("out");

    datasweep()
        .arg(&input)
        .args(["--remove-duplicates", "--fill-missing", "--to", "excel"])
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("File Name: sales.csv"))
        .stdout(predicate::str::contains("Duplicates Removed! (1 rows)"))
        .stdout(predicate::str::contains("Missing Values have been Filled!"))
        .stdout(predicate::str::contains("Converted: sales.xlsx"))
        .stdout(predicate::str::contains("All files processed successfully!"));

    let bytes = std::fs::read(out.join("sales.xlsx")).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_unsupported_file_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.csv");
    let bad = dir.path().join("report.txt");
    std::fs::write(&good, "a,b\n1,2\n").unwrap();
    std::fs::write(&bad, "not a table").unwrap();
    let out = dir.path().join("out");

    datasweep()
        .arg(&bad)
        .arg(&good)
        .args(["--to", "csv"])
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error: Unsupported file type: .txt"))
        .stdout(predicate::str::contains("1 of 2 files could not be processed"));

    let written = std::fs::read_to_string(out.join("good.csv")).unwrap();
    assert_eq!(written, "a,b\n1,2\n");
}

#[test]
fn test_json_report_with_projection() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("data.csv");
    std::fs::write(&input, "name,age,score\nann,30,1.5\nbob,40,2.5\n").unwrap();

    let output = datasweep()
        .arg(&input)
        .args(["--columns", "score,name", "--chart", "--report", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let file = &value["files"][0];
    assert_eq!(file["status"], "ok");
    assert_eq!(file["columns"], serde_json::json!(["name", "score"]));
    assert_eq!(
        file["chart"]["unavailable"],
        "Need at least two numeric columns to chart, found 1"
    );
}

#[test]
fn test_undefined_mean_fails_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.csv");
    std::fs::write(&input, "a,b\n1,\n2,\n").unwrap();

    datasweep()
        .arg(&input)
        .arg("--fill-missing")
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Error: Cannot fill missing values in column 'b'",
        ));

    datasweep()
        .arg(&input)
        .args(["--fill-missing", "--undefined-mean", "leave"])
        .assert()
        .success()
        .stdout(predicate::str::contains("b: no values to average, left missing"));
}

#[test]
fn test_refuses_to_overwrite_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("data.csv");
    std::fs::write(&input, "a\n1\n1\n").unwrap();

    datasweep()
        .arg(&input)
        .args(["--remove-duplicates", "--to", "csv"])
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Refusing to overwrite input file"))
        .stdout(predicate::str::contains("1 of 1 files could not be processed"));

    assert_eq!(std::fs::read_to_string(&input).unwrap(), "a\n1\n1\n");
}

#[test]
fn test_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("data.csv");
    std::fs::write(&good, "a\n1\n").unwrap();

    datasweep()
        .arg(dir.path().join("nope.csv"))
        .arg(&good)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Cannot read"))
        .stdout(predicate::str::contains("File Name: data.csv"))
        .stdout(predicate::str::contains("1 of 2 files could not be processed"));
}

#[test]
fn test_failed_write_does_not_stop_other_exports() {
    let dir = TempDir::new().unwrap();
    let z = dir.path().join("z.csv");
    let y = dir.path().join("y.csv");
    std::fs::write(&z, "a\n1\n").unwrap();
    std::fs::write(&y, "a\n2\n").unwrap();
    let out = dir.path().join("out");
    std::fs::create_dir_all(out.join("z.xlsx")).unwrap();

    datasweep()
        .arg(&z)
        .arg(&y)
        .args(["--to", "excel"])
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Cannot write"))
        .stdout(predicate::str::contains("Converted: y.xlsx"))
        .stdout(predicate::str::contains("1 of 2 files could not be processed"));

    assert!(out.join("y.xlsx").is_file());
}

#[test]
fn test_colliding_export_names_are_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let lower = dir.path().join("data.csv");
    let upper = dir.path().join("data.CSV");
    std::fs::write(&lower, "a\n1\n").unwrap();
    std::fs::write(&upper, "a\n2\n").unwrap();
    let out = dir.path().join("out");

    let output = datasweep()
        .arg(&lower)
        .arg(&upper)
        .args(["--to", "csv", "--report", "json"])
        .arg("--out-dir")
        .arg(&out)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["failed"], 1);
    assert_eq!(value["files"][0]["status"], "ok");
    assert_eq!(value["files"][1]["status"], "error");
    assert!(value["files"][1]["error"]
        .as_str()
        .unwrap()
        .contains("was already written for data.csv"));

    assert_eq!(std::fs::read_to_string(out.join("data.csv")).unwrap(), "a\n1\n");
}

#[test]
fn test_requires_files() {
    datasweep().assert().failure();
}
