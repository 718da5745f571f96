//! Unit tests for session configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use std::collections::HashMap;
use std::io::Write as _;
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create key file");
    file.write_all(&vec![b'k'; len]).expect("write key file");
    file
}

#[fixture]
fn release_key() -> NamedTempFile {
    key_file(SESSION_KEY_MIN_LEN)
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key: &NamedTempFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path().display().to_string()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn expect_error(result: Result<SessionSettings, SessionConfigError>) -> SessionConfigError {
    match result {
        Ok(_) => panic!("expected session configuration to be rejected"),
        Err(error) => error,
    }
}

#[rstest]
fn release_accepts_explicit_settings(release_key: NamedTempFile) {
    let env = mock_env(release_vars(&release_key));
    let settings =
        session_settings_from_env(&env, BuildMode::Release).expect("valid release settings");
    assert!(settings.cookie_secure);
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(release_key: NamedTempFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&release_key);
    vars.remove(missing);
    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));
    assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case("maybe")]
#[case("")]
fn release_rejects_unparseable_cookie_secure(release_key: NamedTempFile, #[case] value: &str) {
    let mut vars = release_vars(&release_key);
    vars.insert(COOKIE_SECURE_ENV, value.to_owned());
    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));
    assert!(matches!(
        err,
        SessionConfigError::InvalidEnv {
            name: COOKIE_SECURE_ENV,
            ..
        }
    ));
}

#[rstest]
fn release_rejects_ephemeral_keys(release_key: NamedTempFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "1".to_owned());
    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));
    assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_short_keys() {
    let short = key_file(SESSION_KEY_MIN_LEN - 1);
    let err = expect_error(session_settings_from_env(
        &mock_env(release_vars(&short)),
        BuildMode::Release,
    ));
    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort { length, .. } if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn release_requires_a_readable_key(release_key: NamedTempFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(KEY_FILE_ENV, "/nonexistent/session_key".to_owned());
    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));
    assert!(matches!(err, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn debug_defaults_to_secure_cookies_and_an_ephemeral_key() {
    let vars = HashMap::from([(KEY_FILE_ENV, "/nonexistent/session_key".to_owned())]);
    let settings = session_settings_from_env(&mock_env(vars), BuildMode::Debug)
        .expect("debug builds fall back to defaults");
    assert!(settings.cookie_secure);
}

#[rstest]
#[case("0", false)]
#[case("no", false)]
#[case("TRUE", true)]
#[case("garbage", true)]
fn debug_cookie_secure_parsing(#[case] value: &str, #[case] expected: bool) {
    let vars = HashMap::from([
        (KEY_FILE_ENV, "/nonexistent/session_key".to_owned()),
        (COOKIE_SECURE_ENV, value.to_owned()),
    ]);
    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.cookie_secure, expected);
}
