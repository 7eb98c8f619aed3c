use std::process::{Command, Output};

fn bastion(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bastion"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("failed to launch bastion binary")
}

#[test]
fn quiet_run_prints_only_the_summary() {
    let output = bastion(&["--seconds", "1", "--tick-ms", "250", "--quiet"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "unfinished after 1.0s: wave 0, score 0, gold 200, lives 20\n"
    );
}

#[test]
fn scripted_placement_spends_gold_before_the_first_tick() {
    let output = bastion(&[
        "--config",
        "../../config/session.toml",
        "--place",
        "crossbow@200,200",
        "--seconds",
        "1",
        "--tick-ms",
        "250",
        "--quiet",
    ]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "unfinished after 1.0s: wave 0, score 0, gold 100, lives 20\n"
    );
}

#[test]
fn missing_configuration_file_fails() {
    let output = bastion(&["--config", "does-not-exist.toml", "--quiet"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist.toml"));
}
