use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("posts_cli_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("posts.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(None, &HashMap::new()).expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
}

#[test]
fn default_file_is_used_only_when_present() {
    let present = temp_config("request_timeout_secs = 7\n");
    let missing = present.with_file_name("absent.toml");

    assert_eq!(resolve_config_path(None, &present), Some(present.clone()));
    assert_eq!(resolve_config_path(None, &missing), None);
    assert_eq!(
        resolve_config_path(Some(missing.as_path()), &present),
        Some(missing.clone())
    );
    fs::remove_dir_all(present.parent().expect("parent")).expect("cleanup");
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        "api_base_url = \"http://127.0.0.1:3000/\"\nrequest_timeout_secs = 5\n",
    );

    let settings = load_settings_from(Some(&path), &HashMap::new()).expect("settings");

    assert_eq!(settings.api_base_url, "http://127.0.0.1:3000");
    assert_eq!(settings.request_timeout_secs, 5);
    assert_eq!(settings.default_user_id, 1);
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn env_overrides_file() {
    let path = temp_config("api_base_url = \"http://file.test\"\n");
    let env = HashMap::from([
        ("POSTS_API_URL".to_string(), "http://short.test".to_string()),
        ("APP__API_BASE_URL".to_string(), "https://env.test/v1/".to_string()),
        ("APP__DEFAULT_USER_ID".to_string(), "9".to_string()),
    ]);

    let settings = load_settings_from(Some(&path), &env).expect("settings");

    assert_eq!(settings.api_base_url, "https://env.test/v1");
    assert_eq!(settings.default_user_id, 9);
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn non_numeric_env_values_are_ignored() {
    let env = HashMap::from([(
        "APP__REQUEST_TIMEOUT_SECS".to_string(),
        "soon".to_string(),
    )]);

    let settings = load_settings_from(None, &env).expect("settings");

    assert_eq!(settings.request_timeout_secs, 30);
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let path = env::temp_dir().join("posts_cli_config_test_missing/posts.toml");
    let err = load_settings_from(Some(&path), &HashMap::new()).expect_err("must fail");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn rejects_non_http_base_url() {
    assert!(normalize_base_url("ftp://posts.test").is_err());
    assert!(normalize_base_url("not a url").is_err());
    assert_eq!(
        normalize_base_url("   ").expect("default"),
        Settings::default().api_base_url
    );
}
