use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    process::{Command, Output},
};

const SCENARIO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/first_heist.toml");

fn heist(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_heist"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch the heist binary")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_owned)
        .collect()
}

fn fingerprint(lines: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    lines.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn bundled_scenario_escapes() {
    let output = heist(&[SCENARIO]);
    assert!(output.status.success(), "{output:?}");
    let lines = stdout_lines(&output);

    for expected in [
        "path hero-0 walk-right: (0, 0)+ (1, 0)+",
        r#"send {"type":"invertClock"}"#,
        r#"send {"type":"used","x":1,"y":0}"#,
        "path hero-1 walk-left: (3, 0)+ (2, 0)- (1, 0)- (0, 0)-",
        r#"send {"type":"stolen","x":1,"y":2}"#,
        r#"send {"type":"stolen","x":3,"y":2}"#,
        r#"send {"type":"phase","phase":2}"#,
        r#"send {"type":"exit","id":0}"#,
        r#"send {"type":"exit","id":1}"#,
        "game won",
    ] {
        assert!(
            lines.iter().any(|line| line == expected),
            "missing `{expected}` in {lines:#?}"
        );
    }
    let summary = lines.last().expect("summary line");
    assert!(summary.starts_with("phase 2 flips 1 paused false ended true"), "{summary}");
}

#[test]
fn replaying_the_scenario_is_deterministic() {
    let first = heist(&["--fingerprint", SCENARIO]);
    let second = heist(&["--fingerprint", SCENARIO]);
    assert!(first.status.success() && second.status.success());

    let first = stdout_lines(&first);
    let second = stdout_lines(&second);
    assert_eq!(fingerprint(&first), fingerprint(&second));
    assert!(first
        .last()
        .is_some_and(|line| line.starts_with("fingerprint ")));
}

#[test]
fn missing_scenarios_fail_with_context() {
    let output = heist(&["does-not-exist.toml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read scenario"), "{stderr}");
}
