//! End-to-end runs of the full protocol, through the library and the binary.

use std::path::PathBuf;
use std::process::Command;

use cluster_fdotp::error::MISMATCH_EXIT_CODE;
use cluster_fdotp::prelude::*;

fn scenario(golden: f64) -> Dataset {
    Dataset::new(vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0, 8.0], golden).unwrap()
}

fn write_dataset(name: &str, dataset: &Dataset) -> PathBuf {
    let path = std::env::temp_dir().join(format!("fdotp-{}-{}.json", name, std::process::id()));
    std::fs::write(&path, dataset.to_json_string().unwrap()).unwrap();
    path
}

#[test]
fn test_two_cores_match_golden() {
    let report = run(&scenario(70.0), &RunConfig::new(2)).unwrap();
    assert_eq!(report.partials, vec![17.0, 53.0]);
    assert_eq!(report.result, 70.0);
    assert_eq!(report.m, 4);
    assert_eq!(report.num_cores, 2);
    assert!(report.metrics.cycles >= 1);
}

#[test]
fn test_two_cores_mismatch() {
    let err = run(&scenario(71.0), &RunConfig::new(2)).unwrap_err();
    match &err {
        FdotpError::ResultMismatch { got, want, report } => {
            assert_eq!(*got, 70.0);
            assert_eq!(*want, 71.0);
            assert_eq!(report.partials, vec![17.0, 53.0]);
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert_eq!(err.exit_code(), MISMATCH_EXIT_CODE);
    assert_eq!(
        format!("Error: {err}"),
        "Error: Result = 70.000000, Golden = 71.000000"
    );
}

#[test]
fn test_every_kernel_matches() {
    let data = Dataset::random(512, 11);
    for variant in cluster_fdotp::math::dot_product::available_variants() {
        let report = run(&data, &RunConfig::new(4).with_kernel(variant.name))
            .unwrap_or_else(|e| panic!("kernel {} failed: {}", variant.name, e));
        assert_eq!(report.kernel, variant.name);
    }
}

#[test]
fn test_large_vector() {
    let m = 8 * 16_384;
    let data = Dataset::random(m, 5);
    let config = RunConfig::new(8).with_scratchpad_bytes(4 * 1024 * 1024);
    let report = run(&data, &config).unwrap();
    assert_eq!(report.partials.len(), 8);
    assert!((report.result - data.golden()).abs() <= GOLDEN_THRESHOLD);
}

#[test]
fn test_dim_one() {
    let data = Dataset::new(vec![1.0, -2.0, 3.0], vec![4.0, 5.0, 6.0], 12.0).unwrap();
    let report = run(&data, &RunConfig::new(3)).unwrap();
    assert_eq!(report.partials, vec![4.0, -10.0, 18.0]);
}

#[test]
fn test_rejected_before_start() {
    let data = Dataset::random(10, 1);
    assert!(matches!(
        run(&data, &RunConfig::new(4)),
        Err(FdotpError::IndivisibleLength { m: 10, num_cores: 4 })
    ));
    assert!(matches!(
        run(&data, &RunConfig::new(2).with_scratchpad_bytes(64)),
        Err(FdotpError::OutOfScratchpad { .. })
    ));
}

#[test]
fn test_binary_success_exit_code() {
    let path = write_dataset("ok", &scenario(70.0));
    let out = Command::new(env!("CARGO_BIN_EXE_fdotp"))
        .arg("--dataset")
        .arg(&path)
        .arg("--no-header")
        .output()
        .unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("----- (4) dp fdotp -----"));
    assert!(stdout.contains("The execution took "));
    assert!(stdout.contains("OP/1000cycle"));
    assert!(!stdout.contains("Error:"));
}

#[test]
fn test_binary_mismatch_exit_code() {
    let path = write_dataset("mismatch", &scenario(71.0));
    let out = Command::new(env!("CARGO_BIN_EXE_fdotp"))
        .arg("--dataset")
        .arg(&path)
        .arg("--no-header")
        .output()
        .unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(out.status.code(), Some(i32::from(MISMATCH_EXIT_CODE)));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Error: Result = 70.000000, Golden = 71.000000"));
}

#[test]
fn test_binary_rejects_indivisible_length() {
    let out = Command::new(env!("CARGO_BIN_EXE_fdotp"))
        .args(["--cores", "3", "--len", "10", "--no-header"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not divisible"));
}

#[test]
fn test_binary_rejects_oversized_length_before_allocating() {
    let out = Command::new(env!("CARGO_BIN_EXE_fdotp"))
        .args(["--len", "2000000000", "--scratchpad-kib", "1", "--no-header"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("scratchpad exhausted"));
}

#[test]
fn test_binary_rejects_overflowing_padding() {
    let out = Command::new(env!("CARGO_BIN_EXE_fdotp"))
        .args(["--padding", &usize::MAX.to_string(), "--no-header"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("overflows"));
}
