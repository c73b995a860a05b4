use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "idlepace-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_estimate_writes_json_table() {
    let exe = env!("CARGO_BIN_EXE_idlepace");
    let output = Command::new(exe)
        .args(["estimate", "--total", "10", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    let rows = rows.as_array().expect("array of rows");
    assert_eq!(rows.len(), 11);
    assert_eq!(rows[10]["unlocked"], 10);
}

#[test]
fn cli_estimate_console_report_to_file() {
    let exe = env!("CARGO_BIN_EXE_idlepace");
    let output_path = temp_path("estimate.txt");
    let status = Command::new(exe)
        .env("NO_COLOR", "1")
        .args(["estimate", "--total", "5", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Achievement Pacing"));
    assert!(content.contains("Total playtime"));
}

#[test]
fn cli_order_is_seeded() {
    let exe = env!("CARGO_BIN_EXE_idlepace");
    let achievements = temp_path("achievements.json");
    std::fs::write(
        &achievements,
        r#"[
            {"id": "1", "name": "First", "rarityPercent": 90.1},
            {"id": "2", "name": "Second", "rare": "45.0"},
            {"id": 3, "name": "Third", "rarityPercent": "12.5"}
        ]"#,
    )
    .expect("write metadata");

    let run = || {
        Command::new(exe)
            .args(["order", "--seed", "1", "--report", "json", "--achievements"])
            .arg(&achievements)
            .output()
            .expect("run cli")
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let order: serde_json::Value = serde_json::from_slice(&first.stdout).expect("json output");
    let ids: Vec<&str> = order
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|entry| entry["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn cli_run_with_missing_config_fails() {
    let exe = env!("CARGO_BIN_EXE_idlepace");
    let output = Command::new(exe)
        .args(["run", "--config"])
        .arg(temp_path("missing-endpoints.json"))
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing-endpoints"));
}
