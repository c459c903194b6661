use super::*;

#[test]
fn test_parse_empty_config() {
    let config = parse_quay_toml("").unwrap();
    assert_eq!(config, QuayToml::default());
    assert!(config.cache_dir().is_none());
}

#[test]
fn test_parse_full_config() {
    let toml = r#"
registry-urls = ["https://repo.example.com/composer", "https://packagist.org"]

[http]
timeout-secs = 15
max-retries = 1

[cache]
dir = "/var/cache/quay"

[[host-rules]]
match-host = "repo.example.com"
username = "deploy"
password = "secret"

[[host-rules]]
match-host = "https://private.example.com/team/"
host-type = "packagist"
token = "abc"
"#;

    let config = parse_quay_toml(toml).unwrap();
    assert_eq!(config.registry_urls.len(), 2);
    assert_eq!(config.http.timeout_secs, Some(15));
    assert_eq!(config.http.max_retries, Some(1));
    assert_eq!(config.cache_dir(), Some(Utf8PathBuf::from("/var/cache/quay")));
    assert_eq!(config.host_rules.len(), 2);
    assert_eq!(config.host_rules[0].username.as_deref(), Some("deploy"));
    assert_eq!(config.host_rules[1].host_type.as_deref(), Some("packagist"));
    assert_eq!(config.host_rules[1].token.as_deref(), Some("abc"));
}

#[test]
fn test_syntax_error_is_located() {
    let toml = "registry-urls = [\"https://repo.example.com\"]\n[http\ntimeout-secs = 3\n";

    match parse_quay_toml(toml) {
        Err(QuayError::TomlParse { line, column, .. }) => {
            assert_eq!(line, 2);
            assert!(column >= 1);
        },
        other => panic!("expected TomlParse, got {:?}", other),
    }
}

#[test]
fn test_type_error_is_located() {
    let toml = "[http]\ntimeout-secs = \"soon\"\n";

    match parse_quay_toml(toml) {
        Err(QuayError::TomlParse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected TomlParse, got {:?}", other),
    }
}

#[test]
fn test_invalid_registry_url() {
    let err = parse_quay_toml("registry-urls = [\"not a url\"]").unwrap_err();
    assert!(matches!(err, QuayError::ConfigValidation { ref field, .. } if field == "registry-urls"));
}

#[test]
fn test_zero_timeout_rejected() {
    let err = parse_quay_toml("[http]\ntimeout-secs = 0").unwrap_err();
    assert!(matches!(err, QuayError::ConfigValidation { .. }));
}

#[test]
fn test_host_rule_validation() {
    let token_and_password = r#"
[[host-rules]]
match-host = "repo.example.com"
username = "user"
password = "secret"
token = "abc"
"#;
    assert!(parse_quay_toml(token_and_password).is_err());

    let password_only = r#"
[[host-rules]]
match-host = "repo.example.com"
password = "secret"
"#;
    assert!(parse_quay_toml(password_only).is_err());

    let empty_host = r#"
[[host-rules]]
match-host = " "
token = "abc"
"#;
    assert!(parse_quay_toml(empty_host).is_err());
}

#[test]
fn test_round_trip_serialization() {
    let toml = r#"
registry-urls = ["https://repo.example.com"]

[http]
timeout-secs = 10

[[host-rules]]
match-host = "repo.example.com"
token = "abc"
"#;

    let config = parse_quay_toml(toml).unwrap();
    let serialized = serialize_quay_toml(&config).unwrap();
    let reparsed = parse_quay_toml(&serialized).unwrap();

    assert_eq!(config, reparsed);
}

#[test]
fn test_home_expansion() {
    let config = QuayToml {
        cache: CacheSection {
            dir: Some("~/quay-cache".to_string()),
        },
        ..Default::default()
    };

    let dir = config.cache_dir().unwrap();
    if let Some(home) = dirs::home_dir() {
        assert_eq!(dir.as_std_path(), home.join("quay-cache"));
    }
}

#[tokio::test]
async fn test_load_from_file_prefixes_path() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().join("quay.toml")).unwrap();
    tokio::fs::write(&path, "[http]\ntimeout-secs = 0\n").await.unwrap();

    match load_from_file(&path).await {
        Err(QuayError::ConfigValidation { reason, .. }) => assert!(reason.contains("quay.toml")),
        other => panic!("expected ConfigValidation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_missing_file() {
    let err = load_from_file(Utf8Path::new("/nonexistent/quay.toml"))
        .await
        .unwrap_err();
    assert!(matches!(err, QuayError::Io { .. }));
}
