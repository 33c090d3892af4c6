use jmodel_config::{init_tracing, ConfigError, LoggingConfig, ModelConfig};
use jmodel_syntax::parse_source;
use jmodel_types::ModelError;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const APP_MIRRORS: &str = r#"[
  {
    "name": "app.Service",
    "category": "interface",
    "modifiers": "PUBLIC | ABSTRACT"
  }
]"#;

#[test]
fn configured_mirrors_come_before_the_builtin_platform_types() {
    init_tracing(&LoggingConfig::default());

    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("mirrors")).unwrap();
    std::fs::write(dir.path().join("mirrors/app.json"), APP_MIRRORS).unwrap();
    let config_path = dir.path().join("jmodel.toml");
    std::fs::write(&config_path, "[classpath]\nmirrors = [\"mirrors/app.json\"]\n").unwrap();

    let config = ModelConfig::load_from_path(&config_path).unwrap();
    let mut model = config.create_model().unwrap();

    let service = model.get_type("app.Service").unwrap();
    assert!(model.raw(service).unwrap().is_declared());
    let list = model.get_type("java.util.List").unwrap();
    assert_eq!(model.qualified_name(list), "java.util.List");
}

#[test]
fn no_classpath_means_no_loader() {
    let config = ModelConfig::load_from_str("[classpath]\nminimal_jdk = false\n").unwrap();
    assert!(config.type_loader().unwrap().is_none());

    let mut model = config.create_model().unwrap();
    assert_eq!(model.get_type("java.util.List"), None);
}

#[test]
fn unreadable_mirror_files_fail_model_creation() {
    let dir = tempdir().unwrap();
    let config = ModelConfig::load_from_str(&format!(
        "[classpath]\nmirrors = [{:?}]\n",
        dir.path().join("missing.json").display().to_string()
    ))
    .unwrap();

    let err = config.create_model().unwrap_err();
    assert!(matches!(err, ConfigError::Classpath(_)), "{err}");
}

#[test]
fn parse_options_follow_the_config() {
    let config = ModelConfig::load_from_str(
        "[parse]\nfreeze_after_parse = true\n[classpath]\nminimal_jdk = false\n",
    )
    .unwrap();
    let mut model = config.create_model().unwrap();

    let file = parse_source(&mut model, "class Frozen { int x; }", &config.parse_options());
    assert!(!file.has_errors());
    let frozen = file.types[0];
    let int = model.get_type("int").unwrap();
    let err = model.add_field(frozen, "y", int).unwrap_err();
    assert!(matches!(err, ModelError::ReadOnly { .. }), "{err}");
}
