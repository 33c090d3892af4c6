use std::path::PathBuf;

use jmodel_config::{ConfigError, LoggingConfig, ModelConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn empty_config_uses_defaults() {
    let config = ModelConfig::load_from_str("").unwrap();
    assert_eq!(config, ModelConfig::default());

    assert!(config.resolution.allow_create_missing);
    assert!(config.resolution.omit_standard_packages);
    assert_eq!(config.resolution.root_type, "java.lang.Object");
    assert_eq!(config.resolution.root_exception_type, "java.lang.Throwable");
    assert!(!config.parse.freeze_after_parse);
    assert!(config.classpath.minimal_jdk);
    assert!(config.classpath.mirrors.is_empty());
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn sections_override_individual_keys() {
    let config = ModelConfig::load_from_str(
        r#"
[resolution]
allow_create_missing = false

[parse]
freeze_after_parse = true

[classpath]
minimal_jdk = false
mirrors = ["/opt/mirrors/app.json"]

[logging]
level = "jmodel.syntax=debug"
json = true
"#,
    )
    .unwrap();

    assert!(!config.resolution.allow_create_missing);
    assert!(config.resolution.omit_standard_packages);
    assert!(config.parse.freeze_after_parse);
    assert!(!config.classpath.minimal_jdk);
    assert_eq!(
        config.classpath.mirrors,
        vec![PathBuf::from("/opt/mirrors/app.json")]
    );
    assert_eq!(config.logging.level, "jmodel.syntax=debug");
    assert!(config.logging.json);

    let options = config.resolution_options();
    assert!(!options.allow_create_missing);
    assert_eq!(options.root_type, "java.lang.Object");
    assert!(config.parse_options().freeze_after_parse);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = ModelConfig::load_from_str("[parse]\nfreeze = true\n").unwrap_err();
    match err {
        ConfigError::Toml(message) => {
            assert!(message.contains("unknown field"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(ModelConfig::load_from_str("[cache]\nsize = 1\n").is_err());
}

#[test]
fn load_from_path_resolves_mirror_paths_next_to_the_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("jmodel.toml");
    std::fs::write(
        &config_path,
        "[classpath]\nmirrors = [\"mirrors/app.json\"]\n",
    )
    .unwrap();

    let config = ModelConfig::load_from_path(&config_path).unwrap();
    assert_eq!(
        config.classpath.mirrors,
        vec![dir.path().join("mirrors/app.json")]
    );
}

#[test]
fn missing_config_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = ModelConfig::load_from_path(&missing).unwrap_err();
    match &err {
        ConfigError::Io { path, .. } => assert_eq!(path, &missing.display().to_string()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("absent.toml"));
}
