//! Project configuration driving the DCE pass

use std::fs;
use tempfile::TempDir;
use yxir::shake_modules;
use yxir::util::config::{
    load_project_config, save_project_config, Backend, DceConfig, ProjectConfig,
    PROJECT_CONFIG_FILE,
};

use crate::fixtures::program;

#[test]
fn test_config_file_controls_roots() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(PROJECT_CONFIG_FILE);
    fs::write(
        &path,
        r#"
[dce]
backend = "native"
extra_roots = ["app.unused"]
keep_patterns = ["^app\\.Circle\\."]
"#,
    )
    .unwrap();

    let config = load_project_config(&path).unwrap().dce;
    assert_eq!(config.backend, Backend::Native);
    assert_eq!(config.entry_point, "main");

    let mut p = program();
    let outcome = shake_modules(&mut p.arena, &config).unwrap();
    assert!(p.arena.is_live(p.unused));
    assert!(!outcome.report.removed.contains(&"app.Circle.debug".to_string()));
    assert!(outcome.report.removed.contains(&"app.Square".to_string()));
}

#[test]
fn test_unknown_extra_root_fails_the_pass() {
    let config = DceConfig {
        extra_roots: vec!["app.Missing".to_string()],
        ..DceConfig::default()
    };
    let mut p = program();
    let err = shake_modules(&mut p.arena, &config).unwrap_err();
    assert!(format!("{:#}", err).contains("app.Missing"));
    // 失败时不剪枝
    assert!(p.arena.is_live(p.unused));
}

#[test]
fn test_disabled_config_keeps_everything() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(PROJECT_CONFIG_FILE);
    let project = ProjectConfig {
        dce: DceConfig {
            enabled: false,
            ..DceConfig::release()
        },
    };
    save_project_config(&path, &project).unwrap();

    let config = load_project_config(&path).unwrap().dce;
    let mut p = program();
    let outcome = shake_modules(&mut p.arena, &config).unwrap();
    assert!(outcome.report.is_noop());
    assert!(p.arena.is_live(p.unused));
    assert!(p.arena.is_live(p.square_area));
}
