use std::io::Write;
use tempfile::NamedTempFile;
use trail_engine::config::loader::ConfigLoader;

#[tokio::test]
async fn test_default_config_loading() {
    let config = ConfigLoader::load_default()
        .await
        .expect("Failed to load default config");
    assert!(config.playback.settle_delay_ms > 0);
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
playback:
  settle_delay_ms: 120
  keyboard: false
layout:
  tooltip_width: 280
analytics:
  endpoint: "http://localhost:9000/events"
  debug: true
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Failed to load config from file");

    assert_eq!(config.playback.settle_delay_ms, 120);
    assert!(!config.playback.keyboard);
    assert_eq!(config.layout.tooltip_width, 280.0);
    assert_eq!(config.layout.tooltip_height, 160.0);
    assert!(config.analytics.debug);
}

#[tokio::test]
async fn test_load_empty_file() {
    let file = NamedTempFile::new().unwrap();
    let config = ConfigLoader::load_from(file.path()).await.unwrap();
    assert_eq!(config.playback.settle_delay_ms, 300);
}

#[tokio::test]
async fn test_load_from_nonexistent_file() {
    let result =
        ConfigLoader::load_from(std::path::Path::new("/nonexistent/path/config.yaml")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_load_invalid_yaml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "playback: [not, a, map]").unwrap();
    assert!(ConfigLoader::load_from(file.path()).await.is_err());
}
