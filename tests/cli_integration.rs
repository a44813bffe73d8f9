use memgame_orchestrator::{HalMode, OrchestratorConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const REPLAY_PROMPT: &str = "do you want to play again? (1 for yes, 0 for no.)";
const DISCONNECTED: &str = "Error: simulator has been disconnected.";

fn config_path(file_name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join(file_name)
}

fn write_temp_config(name: &str, body: &str) -> PathBuf {
    let path = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::write(&path, body)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", path.display()));
    path
}

fn run_cli(args: &[&Path], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_memory_game"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("should run memory_game binary");
    // The game may end before reading every answer.
    let _ = child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes());
    child.wait_with_output().expect("memory_game should exit")
}

fn sim_config(extra: &str) -> String {
    format!(
        r#"
[mode]
type = "sim"

[game]
seed = 3
replay_pause_ms = 0

[sim]
autoplay = true
realtime = false
{extra}
"#
    )
}

#[test]
fn shipped_configs_parse_and_validate() {
    let expectations = [
        ("hal_sim.toml", "sim"),
        ("hal_modbus_tcp.toml", "modbus_tcp"),
        ("hal_modbus_rtu.toml", "modbus_rtu"),
    ];
    for (file_name, mode) in expectations {
        let path = config_path(file_name);
        let config = OrchestratorConfig::from_file(path.to_str().unwrap())
            .unwrap_or_else(|err| panic!("{file_name} should load: {err}"));
        assert_eq!(config.mode.mode_type, mode);
    }

    let sim = OrchestratorConfig::from_file(config_path("hal_sim.toml").to_str().unwrap()).unwrap();
    assert_eq!(sim.hal_mode().unwrap(), HalMode::Sim);
    assert_eq!(sim.sim.autoplay_mistake_round, Some(3));
}

#[test]
fn cli_plays_until_player_declines() {
    let path = write_temp_config("cli_decline.toml", &sim_config(""));
    let output = run_cli(&[path.as_path()], "1\n0\n");

    assert!(
        output.status.success(),
        "CLI should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches(REPLAY_PROMPT).count(), 2);
    assert!(!stdout.contains(DISCONNECTED));
}

#[test]
fn cli_reports_disconnect_and_exits_cleanly() {
    let path = write_temp_config(
        "cli_disconnect.toml",
        &sim_config("disconnect_after_polls = 25"),
    );
    let output = run_cli(&[path.as_path()], "1\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(DISCONNECTED));
    assert!(!stdout.contains(REPLAY_PROMPT));
}

#[test]
fn cli_reports_init_failure_and_exits_cleanly() {
    let path = write_temp_config("cli_init_failure.toml", &sim_config("fail_init = true"));
    let output = run_cli(&[path.as_path()], "");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Error starting DAQ board"));
}

#[test]
fn cli_rejects_non_toml_path() {
    let output = run_cli(&[Path::new("game.json")], "");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Expected a .toml config path"));
}

#[test]
fn cli_rejects_invalid_config() {
    let path = write_temp_config(
        "cli_bad_rounds.toml",
        "[mode]\ntype = \"sim\"\n\n[game]\nrounds = 0\n",
    );
    let output = run_cli(&[path.as_path()], "");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("game.rounds"));
}
