use std::process::Command;

#[test]
fn converts_a_module_end_to_end() {
    let path = std::env::temp_dir().join("vb2js_cli_smoke.bas");
    std::fs::write(&path, "Sub Main()\nx = 1\nEnd Sub\n").expect("write fixture");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("vb2js-cli"))
        .arg(&path)
        .output()
        .expect("spawn vb2js-cli");

    assert!(
        output.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("function Main() {"), "got: {stdout}");
    assert!(stdout.contains("x = 1;"), "got: {stdout}");
}

#[test]
fn missing_input_fails_with_context() {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("vb2js-cli"))
        .arg("definitely-not-here.bas")
        .output()
        .expect("spawn vb2js-cli");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("definitely-not-here.bas"), "got: {stderr}");
}
