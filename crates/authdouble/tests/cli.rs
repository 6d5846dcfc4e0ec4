//! CLI regression tests for the `authdouble` binary.
//!
//! These invoke the binary as a subprocess to pin flag names, exit codes and
//! output formats.

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;

const KNOWN_HEADER: &str = r#"Hawk id="c1", ts="1", nonce="42", ext="eyJzY29wZXMiOiBbInJlYWQiXX0=", mac="d5e616e4a89c9b8f3fcedb1e3c7e90aa843a8b9c""#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn authdouble() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("authdouble").expect("authdouble binary not found")
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("failed to run authdouble");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ---------------------------------------------------------------------------
// authdouble header
// ---------------------------------------------------------------------------

#[test]
fn header_with_fixed_fields_is_reproducible() {
    authdouble()
        .args([
            "header",
            "--client-id",
            "c1",
            "--ts",
            "1",
            "--nonce",
            "42",
            "--scope",
            "read",
        ])
        .assert()
        .success()
        .stdout(format!("{}\n", KNOWN_HEADER));
}

#[test]
fn header_with_raw_ext() {
    authdouble()
        .args([
            "header",
            "--client-id",
            "c1",
            "--ts",
            "1",
            "--nonce",
            "42",
            "--ext",
            r#"{"scopes": ["read"]}"#,
        ])
        .assert()
        .success()
        .stdout(format!("{}\n", KNOWN_HEADER));
}

#[test]
fn header_without_scopes_has_no_ext() {
    authdouble()
        .args(["header", "--client-id", "c1", "--ts", "1", "--nonce", "42"])
        .assert()
        .success()
        .stdout(
            "Hawk id=\"c1\", ts=\"1\", nonce=\"42\", mac=\"6d234c161162265ead8a640cc77ebbc06caf5a77\"\n",
        );
}

#[test]
fn header_rejects_non_object_ext() {
    authdouble()
        .args(["header", "--client-id", "c1", "--ext", "[1, 2]"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("must be a JSON object"));
}

#[test]
fn header_scope_and_ext_conflict() {
    authdouble()
        .args(["header", "--client-id", "c1", "--scope", "a", "--ext", "{}"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// authdouble parse
// ---------------------------------------------------------------------------

#[test]
fn parse_reports_fields_and_mac_consistency() {
    let out = stdout_json(authdouble().args(["parse", KNOWN_HEADER]));
    assert_eq!(out["id"], "c1");
    assert_eq!(out["ts"], "1");
    assert_eq!(out["nonce"], "42");
    assert_eq!(out["ext"]["scopes"][0], "read");
    assert_eq!(out["mac_matches"], true);
}

#[test]
fn parse_flags_forged_mac() {
    let out = stdout_json(authdouble().args([
        "parse",
        r#"Hawk id="c1", ts="1", nonce="42", mac="forged""#,
    ]));
    assert_eq!(out["mac_matches"], false);
}

#[test]
fn parse_missing_prefix_exits_one() {
    authdouble()
        .args(["parse", r#"Bearer id="c1""#])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Missing Hawk prefix"));
}

#[test]
fn parse_missing_field_exits_one() {
    authdouble()
        .args(["parse", r#"Hawk id="c1", ts="1", nonce="42""#])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Missing header part mac"));
}

// ---------------------------------------------------------------------------
// authdouble hawk
// ---------------------------------------------------------------------------

#[test]
fn hawk_success_with_pinned_clock() {
    let body = serde_json::json!({ "authorization": KNOWN_HEADER }).to_string();
    let out = stdout_json(authdouble().args([
        "hawk",
        "--body",
        &body,
        "--now",
        "2017-04-25T09:36:57",
    ]));
    assert_eq!(out["status"], 200);
    assert_eq!(out["content_type"], "application/json");
    assert_eq!(out["body"]["status"], "auth-success");
    assert_eq!(out["body"]["clientId"], "c1");
    assert_eq!(out["body"]["scheme"], "hawk");
    assert_eq!(out["body"]["scopes"], serde_json::json!(["read"]));
    assert_eq!(out["body"]["expires"], "2017-04-26T09:36:57");
}

#[test]
fn hawk_missing_authorization_is_401() {
    let out = stdout_json(authdouble().args(["hawk", "--body", "{}"]));
    assert_eq!(out["status"], 401);
    assert_eq!(out["body"]["status"], "auth-failure");
    assert_eq!(out["body"]["message"], "Missing authorization");
}

#[test]
fn hawk_invalid_now_exits_one() {
    authdouble()
        .args(["hawk", "--body", "{}", "--now", "yesterday"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid --now"));
}

// ---------------------------------------------------------------------------
// authdouble userinfo
// ---------------------------------------------------------------------------

#[test]
fn userinfo_known_token() {
    let out = stdout_json(authdouble().args([
        "userinfo",
        "https://auth.mozilla.auth0.com/userinfo?access_token=abc",
    ]));
    assert_eq!(out["status"], 200);
    assert_eq!(out["content_type"], "application/json");
    assert_eq!(out["body"]["name"], "Lydia Moran");
}

#[test]
fn userinfo_bad_token() {
    let out = stdout_json(authdouble().args([
        "userinfo",
        "https://auth.mozilla.auth0.com/userinfo?access_token=badtoken",
    ]));
    assert_eq!(out["status"], 200);
    assert_eq!(out["content_type"], "text/plain");
    assert_eq!(out["body"], "Unauthorized");
}

// ---------------------------------------------------------------------------
// global flags
// ---------------------------------------------------------------------------

#[test]
fn unknown_log_format_exits_one() {
    authdouble()
        .args(["--log-format", "xml", "userinfo", "https://h/userinfo"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("unknown log format"));
}
