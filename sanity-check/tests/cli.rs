use std::process::Command;

#[test]
fn runs_on_small_phantom_and_writes_png() {
    let tmp = tempfile::tempdir().unwrap();
    let png = tmp.path().join("bands.png");
    let status = Command::new(env!("CARGO_BIN_EXE_sanity-check"))
        .args(["--rows", "32", "--cols", "24", "--nb-scale", "3", "--channels", "2"])
        .arg("--output")
        .arg(&png)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(png.exists());
}

#[test]
fn unknown_backend_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_sanity-check"))
        .args(["--rows", "16", "--cols", "16", "--backend", "nope"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("UnknownTransform"));
}
