use assert_cmd::Command;
use predicates::str::{contains, diff};

fn expected(file: &str) -> String {
    std::fs::read_to_string(format!("{}/tests/files/{file}", env!("CARGO_MANIFEST_DIR")))
        .unwrap()
        .replace("\r\n", "\n")
}

#[test]
fn writes_listing_and_object() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.arg("tests/files/copy.asm").arg("--out-dir").arg(dir.path());
    cmd.assert().success();

    let obj = std::fs::read_to_string(dir.path().join("copy.obj")).unwrap();
    assert_eq!(obj, expected("copy.obj"));

    let lst = std::fs::read_to_string(dir.path().join("copy.lst")).unwrap();
    assert!(lst.starts_with("LINE\tLOCCTR\tLABEL\tOPCODE\tOPERAND\tOBJ_CODE\n"));
    assert!(lst.contains("\nSYMBOL\tADDRESS\n"));
}

#[test]
fn prints_to_stdout() {
    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.arg("tests/files/copy.asm").arg("--stdout");

    cmd.assert()
        .success()
        .stdout(contains("25\t0006\tCLOOP\t+JSUB\tRDREC\t4B101036"))
        .stdout(contains(expected("copy.obj")));
}

#[test]
fn assembles_sic() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.arg("tests/files/copy_sic.asm").arg("--sic").arg("-o").arg(dir.path());
    cmd.assert().success();

    let obj = std::fs::read_to_string(dir.path().join("copy_sic.obj")).unwrap();
    assert_eq!(obj, expected("copy_sic.obj"));
}

#[test]
fn decimal_start() {
    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.arg("tests/files/copy_sic.asm").arg("--sic").arg("--decimal-start").arg("--stdout");

    // 1000 = 0x3E8
    cmd.assert()
        .success()
        .stdout(contains("HCOPY  0003E800107A"))
        .stdout(contains("E0003E8"));
}

#[test]
fn reports_assembly_errors() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.arg("tests/files/undefined.asm").arg("-o").arg(dir.path());

    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Error: Pass 2, Line 10: undefined symbol 'NOWHERE'"))
        .stderr(contains("help: define this symbol as a label somewhere in the program"));

    // nothing is written on failure
    assert!(!dir.path().join("undefined.obj").exists());
    assert!(!dir.path().join("undefined.lst").exists());
}

#[test]
fn rejects_xe_syntax_in_sic_mode() {
    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.arg("tests/files/copy.asm").arg("--sic").arg("--stdout");

    cmd.assert()
        .failure()
        .stderr(contains("Error: Pass 1, Line 15: 'LDB' is only available in SIC/XE"));
}

#[test]
fn reports_missing_input() {
    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.arg("tests/files/does_not_exist.asm");

    cmd.assert()
        .failure()
        .stderr(contains("Error: tests/files/does_not_exist.asm"));
}

#[test]
fn requires_input() {
    let mut cmd = Command::cargo_bin("sicxe-asm").unwrap();
    cmd.assert()
        .failure()
        .stderr(contains("Usage"))
        .stdout(diff(""));
}
