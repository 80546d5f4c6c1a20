//! resmon client behavior without a daemon.

use assert_cmd::Command;

#[test]
fn show_without_a_daemon_fails_with_a_hint() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("resmon")
        .unwrap()
        .args(["--profile", "ghost", "show"])
        .env("RESMOND_ADMIN_DIR", dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("is the daemon running"));
}

#[test]
fn profile_option_is_required() {
    Command::cargo_bin("resmon")
        .unwrap()
        .arg("show")
        .assert()
        .failure();
}

#[test]
fn help_lists_the_subcommands() {
    Command::cargo_bin("resmon")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("show"))
        .stdout(predicates::str::contains("start"))
        .stdout(predicates::str::contains("stop"));
}
