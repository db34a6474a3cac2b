//! Verdicts for report files on disk

use std::path::PathBuf;

use synccheck_report::{evaluate_file, evaluate_str, ReportError, ReportKind, DEFAULT_THRESHOLD};
use test_case::test_case;

const KUBE_BENCH_CLEAN: &str = "\
[INFO] 1 Control Plane Security Configuration
[PASS] 1.1.1 Ensure that the API server pod specification file permissions are set
== Remediations master ==
1.1.12 On the etcd server node, get the etcd data directory
== Summary total ==
0 checks FAIL
72 checks PASS
41 checks WARN
0 checks INFO
";

const KUBE_BENCH_FAILING: &str = "\
[FAIL] 1.2.6 Ensure that the --kubelet-certificate-authority argument is set
== Summary total ==
61 checks PASS
3 checks FAIL
49 checks WARN
0 checks INFO
";

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test_case("ok 1 - sync\nok 2 - share\n", true ; "clean log")]
#[test_case("ok 1\nFAIL: [sig-storage] volume expansion\n", false ; "fail marker")]
#[test_case("Ran 12 of 400 Specs\nTest Suite Failed\n", false ; "suite failed banner")]
#[test_case("Failed to pull image, retrying\n", true ; "mixed case wording")]
fn text_reports(log: &str, passed: bool) {
    let verdict = evaluate_str(ReportKind::Text, log).unwrap();
    assert_eq!(verdict.passed, passed, "{}", verdict);
}

#[test_case(KUBE_BENCH_CLEAN, true ; "no failed checks")]
#[test_case(KUBE_BENCH_FAILING, false ; "three failed checks")]
fn summary_reports(report: &str, passed: bool) {
    let verdict = evaluate_str(ReportKind::Summary, report).unwrap();
    assert_eq!(verdict.passed, passed, "{}", verdict);
}

#[test]
fn summary_without_block_is_an_error() {
    let err = evaluate_str(ReportKind::Summary, "[PASS] 1.1.1\n[PASS] 1.1.2\n").unwrap_err();
    assert!(matches!(err, ReportError::MissingSection { .. }));
    assert!(err.to_string().contains("Summary total"), "{}", err);
}

#[test_case("status: passed\n", true ; "passed")]
#[test_case("status: failed\n", false ; "failed")]
#[test_case("status: unknown\nplugin: systemd-logs\n", false ; "anything else")]
fn status_reports(doc: &str, passed: bool) {
    let verdict = evaluate_str(ReportKind::Status, doc).unwrap();
    assert_eq!(verdict.passed, passed, "{}", verdict);
}

#[test]
fn invalid_yaml_is_an_error() {
    let err = evaluate_str(ReportKind::Status, "status: [passed\n").unwrap_err();
    assert!(matches!(err, ReportError::Yaml(_)));
}

#[test_case("100", DEFAULT_THRESHOLD, true ; "perfect score")]
#[test_case("99.9", DEFAULT_THRESHOLD, false ; "just below")]
#[test_case("87.25", 85.0, true ; "custom threshold")]
#[test_case(" 100.0% ", DEFAULT_THRESHOLD, true ; "percent sign and padding")]
fn score_reports(cell: &str, threshold: f64, passed: bool) {
    let html = format!(
        "<html><body><h1>USG report</h1><table><tr><th>Score</th></tr>\
         <tr><td class=\"text-center\">{}</td><td class=\"text-center\">12</td></tr></table></body></html>",
        cell
    );
    let verdict = evaluate_str(ReportKind::Score { threshold }, &html).unwrap();
    assert_eq!(verdict.passed, passed, "{}", verdict);
}

#[test]
fn score_without_cell_is_an_error() {
    let err = evaluate_str(
        ReportKind::Score { threshold: DEFAULT_THRESHOLD },
        "<table><tr><td>100</td></tr></table>",
    )
    .unwrap_err();
    assert!(matches!(err, ReportError::MissingSection { .. }));
}

#[test]
fn files_are_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let log = write(&dir, "e2e.log", "ok 1\nok 2\n");
    let summary = write(&dir, "kube-bench.report", KUBE_BENCH_FAILING);

    assert!(evaluate_file(ReportKind::Text, &log).unwrap().passed);
    let verdict = evaluate_file(ReportKind::Summary, &summary).unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.message, "failed checks: 3");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = evaluate_file(ReportKind::Status, &dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ReportError::Io(_)));
}
