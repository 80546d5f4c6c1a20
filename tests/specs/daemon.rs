//! resmond argument handling, config errors, and the control loop.

use assert_cmd::Command;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn write_script(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("ctl.sh");
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn help_prints_usage() {
    Command::cargo_bin("resmond")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Usage: resmond"));
}

#[test]
fn version_prints_the_crate_version() {
    Command::cargo_bin("resmond")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("resmond"));
}

#[test]
fn missing_config_file_argument_fails() {
    Command::cargo_bin("resmond").unwrap().assert().failure();
}

#[test]
fn unknown_option_fails() {
    Command::cargo_bin("resmond")
        .unwrap()
        .arg("--frobnicate")
        .assert()
        .failure()
        .stderr(predicates::str::contains("unknown option"));
}

#[test]
fn unreadable_config_exits_with_an_error() {
    Command::cargo_bin("resmond")
        .unwrap()
        .arg("/nonexistent/resmon.conf")
        .assert()
        .failure()
        .stderr(predicates::str::contains("failed to open"));
}

#[test]
fn invalid_config_reports_file_and_line() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("web.conf");
    let mut file = std::fs::File::create(&conf).unwrap();
    writeln!(file, "[General]").unwrap();
    writeln!(file, "Profile=web").unwrap();
    writeln!(file, "Frobnicate=1").unwrap();

    Command::cargo_bin("resmond")
        .unwrap()
        .arg(&conf)
        .assert()
        .failure()
        .stderr(predicates::str::contains(":3:"))
        .stderr(predicates::str::contains("not a valid key"));
}

#[test]
fn empty_profile_stops_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("web.conf");
    std::fs::write(
        &conf,
        format!(
            "[General]\nProfile=web\nLogFile={}\n",
            dir.path().join("resmon.log").display()
        ),
    )
    .unwrap();

    Command::cargo_bin("resmond")
        .unwrap()
        .arg(&conf)
        .assert()
        .success()
        .stderr(predicates::str::contains("No resource specified"));
}

#[test]
fn daemon_serves_the_cli_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let admin = dir.path().join("admin");
    let script = write_script(dir.path());
    let conf = dir.path().join("web.conf");
    std::fs::write(
        &conf,
        format!(
            "[General]\n\
             Profile=web\n\
             LogFile={log}\n\
             \n\
             [Resource]\n\
             Name=db\n\
             Path={script}\n",
            log = dir.path().join("resmon.log").display(),
            script = script.display(),
        ),
    )
    .unwrap();

    let mut daemon = std::process::Command::new(assert_cmd::cargo::cargo_bin("resmond"))
        .arg(&conf)
        .env("RESMOND_ADMIN_DIR", &admin)
        .spawn()
        .unwrap();

    // Wait for the control socket to come up.
    let socket = admin.join("profile-web.sock");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !socket.exists() {
        assert!(Instant::now() < deadline, "daemon never bound its socket");
        std::thread::sleep(Duration::from_millis(50));
    }

    Command::cargo_bin("resmon")
        .unwrap()
        .args(["--profile", "web", "show"])
        .env("RESMOND_ADMIN_DIR", &admin)
        .assert()
        .success()
        .stdout(predicates::str::contains("Profile name: web"))
        .stdout(predicates::str::contains("[db]"));

    Command::cargo_bin("resmon")
        .unwrap()
        .args(["--profile", "web", "show", "db"])
        .env("RESMOND_ADMIN_DIR", &admin)
        .assert()
        .success()
        .stdout(predicates::str::contains("Resource name: db"));

    daemon.kill().unwrap();
    daemon.wait().unwrap();
}
