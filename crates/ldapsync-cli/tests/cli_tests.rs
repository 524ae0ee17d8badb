use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FULL_ENV: &[(&str, &str)] = &[
    ("LDAP_SERVER", "ldap.example.org"),
    ("LDAP_METHOD", "tls"),
    ("LDAP_BASE", "ou=people,dc=example,dc=org"),
    ("LDAP_UID", "uid"),
    ("LDAP_BIND_DN", "cn=admin,dc=example,dc=org"),
    ("LDAP_PASSWORD", "ldap-secret"),
    ("DB_HOST", "127.0.0.1"),
    ("DB_NAME", "greenlight_production"),
    ("DB_USERNAME", "postgres"),
    ("DB_PASSWORD", "db-secret"),
];

/// Binary with a clean environment and env file discovery disabled
fn ldapsync() -> Command {
    let mut cmd = Command::cargo_bin("ldapsync").unwrap();
    cmd.env_clear();
    cmd
}

fn with_full_env(cmd: &mut Command) -> &mut Command {
    for (key, value) in FULL_ENV {
        cmd.env(key, value);
    }
    cmd
}

#[test]
fn test_help_output() {
    ldapsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "One-way LDAP to PostgreSQL user synchronization",
        ))
        .stdout(predicate::str::contains("CLI binary").not())
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("mapping"))
        .stdout(predicate::str::contains("--env-file"));
}

#[test]
fn test_version_output() {
    ldapsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_sync_help_lists_interval() {
    ldapsync()
        .args(["sync", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn test_mapping_defaults() {
    ldapsync()
        .args(["--no-env-file", "mapping"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Attribute Mapping ==="))
        .stdout(predicate::str::contains("mail, email, userPrincipalName"))
        .stdout(predicate::str::contains("Identifier column: external_id"));
}

#[test]
fn test_mapping_override_comes_first() {
    ldapsync()
        .args(["--no-env-file", "mapping"])
        .env("LDAP_ATTRIBUTE_MAPPING", "email=userPrincipalName; nickname=cn")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "userPrincipalName, mail, email, userPrincipalName",
        ))
        .stdout(predicate::str::contains("cn, uid, userid, sAMAccountName"));
}

#[test]
fn test_mapping_malformed_override_fails() {
    ldapsync()
        .args(["--no-env-file", "mapping"])
        .env("LDAP_ATTRIBUTE_MAPPING", "email=mail;nonsense")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "mapping nonsense cannot be split into key=value",
        ));
}

#[test]
fn test_config_missing_server_fails() {
    ldapsync()
        .args(["--no-env-file", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LDAP_SERVER"));
}

#[test]
fn test_config_redacts_secrets() {
    with_full_env(ldapsync().args(["--no-env-file", "config"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("ldap.example.org"))
        .stdout(predicate::str::contains("greenlight_production"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("ldap-secret").not())
        .stdout(predicate::str::contains("db-secret").not());
}

#[test]
fn test_config_from_env_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("greenlight.env");
    let content: String = FULL_ENV
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect();
    std::fs::write(&path, content).unwrap();

    ldapsync()
        .arg("--env-file")
        .arg(&path)
        .arg("config")
        .env("DB_NAME", "from_process")
        .assert()
        .success()
        .stdout(predicate::str::contains("from_process"))
        .stdout(predicate::str::contains("greenlight_production").not());
}

#[test]
fn test_missing_env_file_fails() {
    let tmp = TempDir::new().unwrap();

    ldapsync()
        .arg("--env-file")
        .arg(tmp.path().join("nope.env"))
        .arg("mapping")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_env_file_conflicts_with_no_env_file() {
    ldapsync()
        .args(["--env-file", "x.env", "--no-env-file", "mapping"])
        .assert()
        .failure();
}

#[test]
fn test_sync_bad_mapping_fails_before_connecting() {
    with_full_env(ldapsync().args(["--no-env-file", "sync", "--once"]))
        .env("LDAP_ATTRIBUTE_MAPPING", "broken")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid LDAP_ATTRIBUTE_MAPPING"));
}

#[test]
fn test_sync_rejects_zero_interval() {
    with_full_env(ldapsync().args(["--no-env-file", "sync", "--interval", "0s"]))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--interval must be positive"));
}

#[test]
fn test_sync_rejects_bad_interval() {
    ldapsync()
        .args(["--no-env-file", "sync", "--interval", "soon"])
        .assert()
        .failure();
}
