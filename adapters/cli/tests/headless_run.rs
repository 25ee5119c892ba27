use std::{fs, path::PathBuf, process::Command};

fn delve() -> Command {
    Command::new(env!("CARGO_BIN_EXE_delve"))
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("delve-cli-{}-{name}", std::process::id()));
    fs::write(&path, contents).expect("scratch file written");
    path
}

#[test]
fn default_level_prints_final_frame() {
    let output = delve()
        .args(["--ticks", "30", "--seed", "4"])
        .output()
        .expect("delve runs");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.starts_with("tick 30\n"), "unexpected output: {stdout}");
    assert!(stdout.contains("Player#0"));
}

#[test]
fn identical_seeds_print_identical_frames() {
    let run = || {
        delve()
            .args(["--ticks", "120", "--seed", "9", "--hunters", "2", "--print-every", "40"])
            .output()
            .expect("delve runs")
            .stdout
    };

    let first = run();
    assert_eq!(first, run());
    let frames = String::from_utf8(first).expect("utf-8 output");
    assert_eq!(frames.matches("tick ").count(), 3);
}

#[test]
fn custom_glyphs_and_level_are_used() {
    let level = scratch_file("level.txt", "######\n#P..H#\n######\n");
    let glyphs = scratch_file(
        "glyphs.toml",
        r#"
            version = 1

            [tiles]
            wall = "%"
            floor = "_"
            impact = "x"

            [sprites]
            Player = "p"
            Hunter = "h"
            Projectile = "-"
        "#,
    );

    let output = delve()
        .arg("--ticks")
        .arg("0")
        .arg("--level")
        .arg(&level)
        .arg("--glyphs")
        .arg(&glyphs)
        .output()
        .expect("delve runs");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("%%%%%%\n%p__h%\n%%%%%%\n"), "unexpected output: {stdout}");
}

#[test]
fn malformed_level_fails() {
    let level = scratch_file("ragged.txt", "#####\n#P#\n#####\n");

    let output = delve()
        .arg("--level")
        .arg(&level)
        .output()
        .expect("delve runs");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(stderr.contains("invalid level"), "unexpected stderr: {stderr}");
}
