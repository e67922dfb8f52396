use std::process::Command;

fn sandblaster() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sandblaster"));
    let _ = command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command
}

#[test]
fn runs_demo_scene() {
    let output = sandblaster()
        .args(["run", "../../assets/demo.toml", "--steps", "5", "--seed", "3"])
        .output()
        .expect("failed to invoke sandblaster run");

    assert!(output.status.success(), "sandblaster run should succeed");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let rows: Vec<&str> = stdout.lines().take(40).collect();
    assert_eq!(rows.len(), 40);
    assert!(rows.iter().all(|row| row.chars().count() == 60));
    assert!(stdout.contains("Wall: "), "census lists the shelf");
}

#[test]
fn compiles_demo_catalog_to_base64() {
    let output = sandblaster()
        .args(["compile", "../../assets/demo.toml"])
        .output()
        .expect("failed to invoke sandblaster compile");

    assert!(output.status.success(), "sandblaster compile should succeed");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let encoded = stdout.trim();
    assert!(!encoded.is_empty());
    assert!(encoded
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')));
}

#[test]
fn rejects_missing_manifest() {
    let output = sandblaster()
        .args(["run", "does-not-exist.toml"])
        .output()
        .expect("failed to invoke sandblaster run");

    assert!(!output.status.success());
}
