//! Smoke tests -- verify the binary runs and key modules load.

use assert_cmd::Command;

#[test]
fn test_cli_help() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "Autonomous DNS failover sentinel",
        ));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("routewarden"));
}

#[test]
fn test_probe_subcommand_prints_sweep() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .arg("probe")
        .assert()
        .success()
        .stdout(predicates::str::contains("US Central (Iowa)"));
}

#[test]
fn test_probe_chaos_flag_exists() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .args(["probe", "--chaos"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Region"));
}

#[test]
fn test_analyze_subcommand_exists() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .args(["analyze", "--help"])
        .assert()
        .success();
}

#[test]
fn test_analyze_runs_local_heuristic_without_credential() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .env_remove("GEMINI_API_KEY")
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicates::str::contains("Routewarden Health Analysis"));
}

#[test]
fn test_drill_completes_failover_cycle() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .env_remove("GEMINI_API_KEY")
        .args(["drill", "--ticks", "3"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Routewarden Chaos Drill"))
        .stdout(predicates::str::contains("Route healthy: false"));
}

#[test]
fn test_serve_subcommand_exists() {
    Command::cargo_bin("routewarden")
        .unwrap()
        .args(["serve", "--help"])
        .assert()
        .success();
}
