use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn feedimage_cmd() -> Command {
    let mut cmd = Command::cargo_bin("feedimage").unwrap();
    cmd.env_remove("FEEDIMAGE_HOST_POLICIES")
        .env_remove("FEEDIMAGE_BOILERPLATE")
        .env_remove("FEEDIMAGE_STAGE_ORDER")
        .env("FEEDIMAGE_LOG_LEVEL", "warn");
    cmd
}

#[test]
fn test_resolve_help_lists_flags() {
    feedimage_cmd()
        .arg("resolve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--default-image"))
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--workers"));
}

#[test]
fn test_clean_title_strips_sport_boilerplate() {
    feedimage_cmd()
        .arg("clean-title")
        .arg("Jones Tigers Win Men's Basketball Game")
        .assert()
        .success()
        .stdout(predicate::str::diff("Jones Tigers Win Game\n"));
}

#[test]
fn test_clean_title_falls_back_when_nothing_left() {
    feedimage_cmd()
        .arg("clean-title")
        .arg("Box Score")
        .env("FEEDIMAGE_FALLBACK_QUERY", "stadium lights")
        .assert()
        .success()
        .stdout(predicate::str::diff("stadium lights\n"));
}

#[test]
fn test_clean_title_uses_configured_phrase_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# noise").unwrap();
    writeln!(file, "Highlights").unwrap();

    feedimage_cmd()
        .arg("clean-title")
        .arg("Highlights: Owls top Bears")
        .env("FEEDIMAGE_BOILERPLATE", file.path())
        .assert()
        .success()
        .stdout(predicate::str::diff("Owls top Bears\n"));
}

#[test]
fn test_hosts_lists_builtin_policies() {
    feedimage_cmd()
        .arg("hosts")
        .assert()
        .success()
        .stdout(predicate::str::contains("sidearmsports.com [suffix] -> browser"))
        .stdout(predicate::str::contains("Default profile: default"));
}

#[test]
fn test_hosts_lookup_unknown_host_uses_default() {
    feedimage_cmd()
        .arg("hosts")
        .arg("--lookup")
        .arg("unknown.example")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown.example -> default"));
}

#[test]
fn test_hosts_lookup_with_policy_document() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "version": 4,
            "profiles": {{
                "default": {{}},
                "spoofed": {{"headers": {{"User-Agent": "Mozilla/5.0 Test"}}, "send_referer": true}}
            }},
            "hosts": [{{"host": "known-host.example", "match": "exact", "profile": "spoofed"}}]
        }}"#
    )
    .unwrap();

    feedimage_cmd()
        .arg("hosts")
        .arg("--lookup")
        .arg("KNOWN-HOST.example")
        .env("FEEDIMAGE_HOST_POLICIES", file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-> spoofed"))
        .stdout(predicate::str::contains("User-Agent: Mozilla/5.0 Test"));

    feedimage_cmd()
        .arg("hosts")
        .arg("--lookup")
        .arg("img.known-host.example")
        .env("FEEDIMAGE_HOST_POLICIES", file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-> default"));
}

#[test]
fn test_invalid_policy_document_fails() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"profiles": {{}}, "hosts": []}}"#).unwrap();

    feedimage_cmd()
        .arg("hosts")
        .env("FEEDIMAGE_HOST_POLICIES", file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid host policy document"));
}

#[test]
fn test_bad_stage_order_is_config_error() {
    feedimage_cmd()
        .arg("clean-title")
        .arg("anything")
        .env("FEEDIMAGE_STAGE_ORDER", "default,default")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_resolve_rejects_invalid_feed_url() {
    feedimage_cmd()
        .arg("resolve")
        .arg("not a url")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid feed URL"));
}

#[test]
fn test_resolve_rejects_zero_workers() {
    feedimage_cmd()
        .arg("resolve")
        .arg("https://feeds.example/rss")
        .arg("--workers")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--workers must be at least 1"));
}
