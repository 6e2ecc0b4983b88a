//! CLI integration tests for sky-watch

#[path = "../../libskyfare/tests/stub/mod.rs"]
mod stub;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use stub::StubServer;
use tempfile::TempDir;

const DEVICE: &str = "device_1760000000000_abc123xyz";

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Temp dir with a config for `api_url` and a known device identifier
fn setup_test_env(api_url: &str) -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("flights.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[api]
base_url = "{}"

[notifications]
enabled = true
"#,
        escape_path_for_toml(&db_path.to_string_lossy()),
        api_url
    );
    fs::write(&config_path, config_content).unwrap();
    fs::write(temp_dir.path().join("device_id"), format!("{}\n", DEVICE)).unwrap();

    let config_path = config_path.to_string_lossy().to_string();
    (temp_dir, config_path)
}

fn sky_watch(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("sky-watch").unwrap();
    cmd.env("SKYFARE_CONFIG", config_path)
        .env_remove("SKYFARE_DB_PATH")
        .env_remove("SKYFARE_API_URL");
    cmd
}

/// Stub with an active watcher above target (w1) and a paused one (w2)
async fn seeded_stub() -> StubServer {
    let stub = StubServer::start().await;
    stub.seed_watcher(DEVICE, stub::watcher("MEX", "CDG", 20000.0, true, Some(21000.0)));
    stub.seed_watcher(DEVICE, stub::watcher("MEX", "LHR", 18000.0, false, Some(17100.0)));
    stub.seed_watcher("device_other", stub::watcher("GDL", "MAD", 1.0, true, None));
    stub
}

#[test]
fn test_help_flag() {
    Command::cargo_bin("sky-watch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("alerts"))
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_device_show_and_reset() {
    let (temp_dir, config_path) = setup_test_env("http://127.0.0.1:9/api");

    sky_watch(&config_path)
        .arg("device")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{}\n", DEVICE)));

    let output = sky_watch(&config_path)
        .args(["device", "--reset"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = String::from_utf8(output.stdout).unwrap().trim().to_string();
    assert!(id.starts_with("device_"));
    assert_ne!(id, DEVICE);

    let stored = fs::read_to_string(temp_dir.path().join("device_id")).unwrap();
    assert_eq!(stored.trim(), id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_text() {
    let stub = seeded_stub().await;
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    let output = sky_watch(&config_path).arg("list").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(
        "w1 ● MEX → CDG  1 dic 2026  target $20,000  last $21,000 ↑ 5.0%  checked "
    ));
    assert!(!lines[0].contains("below target"));
    assert!(lines[1].starts_with("w2 ○ MEX → LHR"));
    assert!(lines[1].contains("↓ 5.0%"));
    assert!(lines[1].ends_with("✓ below target"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_filters_and_json() {
    let stub = seeded_stub().await;
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    let output = sky_watch(&config_path)
        .args(["list", "--paused", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let watchers = json.as_array().unwrap();
    assert_eq!(watchers.len(), 1);
    assert_eq!(watchers[0]["watcher"]["id"], "w2");
    assert_eq!(watchers[0]["below_target"], true);
    assert_eq!(watchers[0]["trend"]["direction"], "down");

    sky_watch(&config_path)
        .args(["list", "--active"])
        .assert()
        .success()
        .stdout(predicate::str::contains("w1 ●"))
        .stdout(predicate::str::contains("w2").not());

    sky_watch(&config_path)
        .args(["list", "--active", "--paused"])
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_spanish_never_checked() {
    let stub = StubServer::start().await;
    stub.seed_watcher(DEVICE, stub::watcher("MEX", "MAD", 15000.0, true, None));
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .args(["list", "--locale", "es"])
        .assert()
        .success()
        .stdout(predicate::str::contains("checked Nunca"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_create_watcher() {
    let stub = StubServer::start().await;
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .args(["create", "mex", "mad", "2026-12-01", "15000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created watcher w1 (MEX → MAD)"));

    let watchers = stub.watchers();
    assert_eq!(watchers.len(), 1);
    assert_eq!(watchers[0]["user_identifier"], DEVICE);
    assert_eq!(watchers[0]["currency"], "MXN");
    assert_eq!(watchers[0]["target_price"], 15000.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_create_rejects_bad_input() {
    let stub = StubServer::start().await;
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .args(["create", "MEXICO", "MAD", "2026-12-01", "15000"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("3-letter airport code"));

    sky_watch(&config_path)
        .args(["create", "MEX", "MAD", "01/12/2026", "15000"])
        .assert()
        .code(3);

    sky_watch(&config_path)
        .args(["create", "MEX", "MAD", "2026-12-01", "0"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("target price must be positive"));

    // Nothing reached the backend
    assert!(stub.requests().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_toggle_pause_resume() {
    let stub = seeded_stub().await;
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .args(["toggle", "w1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Paused watcher w1"));
    assert_eq!(stub.watchers()[0]["is_active"], false);

    sky_watch(&config_path)
        .args(["resume", "w1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resumed watcher w1"));
    assert_eq!(stub.watchers()[0]["is_active"], true);

    sky_watch(&config_path)
        .args(["pause", "w404"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Watcher not found"));

    // Not in this device's list
    sky_watch(&config_path)
        .args(["toggle", "w3"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown watcher: w3"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_watcher() {
    let stub = seeded_stub().await;
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .args(["delete", "w2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted watcher w2"));
    assert_eq!(stub.watchers().len(), 2);

    sky_watch(&config_path)
        .args(["delete", "w2"])
        .assert()
        .code(1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_history() {
    let stub = seeded_stub().await;
    stub.seed_history(
        "w1",
        vec![
            serde_json::json!({ "id": 1, "price": 21000.0, "checked_at": "2026-10-16T09:00:00" }),
            serde_json::json!({ "id": 2, "price": 20500.0, "checked_at": "2026-10-16T15:30:00" }),
        ],
    );
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .args(["history", "w1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("16 oct, 09:00  $21,000"))
        .stdout(predicate::str::contains("16 oct, 15:30  $20,500"));

    // Failures read as an empty history
    sky_watch(&config_path)
        .args(["history", "w9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No price history for watcher w9"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_alerts_and_notify() {
    let stub = StubServer::start().await;
    stub.seed_alert(stub::alert("a1", "w1", "MEX → MAD", 14500.0, false));
    stub.seed_alert(stub::alert("a2", "w1", "MEX → MAD", 14900.0, true));
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .arg("alerts")
        .assert()
        .success()
        .stdout(predicate::str::contains("a1 • MEX → MAD  $16,000 → $14,500"))
        .stdout(predicate::str::contains("a2   MEX → MAD"))
        .stdout(predicate::str::contains("1 unread"));

    sky_watch(&config_path)
        .args(["alerts", "--unread", "--notify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a2").not())
        .stderr(predicate::str::contains("🔔 Price Alert"))
        .stderr(predicate::str::contains("MEX → MAD dropped to $14,500!"))
        .stderr(predicate::str::contains("Sent 1 notification(s)"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_read_alert() {
    let stub = StubServer::start().await;
    stub.seed_alert(stub::alert("a1", "w1", "MEX → MAD", 14500.0, false));
    stub.seed_alert(stub::alert("a2", "w1", "MEX → MAD", 14000.0, false));
    let (_temp_dir, config_path) = setup_test_env(&stub.base_url);

    sky_watch(&config_path)
        .args(["read", "a1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked alert a1 as read (1 unread)"));
    assert_eq!(stub.alerts()[0]["is_read"], true);

    sky_watch(&config_path)
        .args(["read", "a9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Alert not found"));
}

#[test]
fn test_unreachable_backend() {
    let (_temp_dir, config_path) = setup_test_env("http://127.0.0.1:9/api");
    sky_watch(&config_path)
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: "));
}
