use super::*;
use std::path::PathBuf;

#[test]
fn test_config_default() {
    let config = BrowserManagerConfig::default();
    assert_eq!(config.debug_port, 9222);
    assert!(config.launch);
    assert!(!config.headless);
}

#[test]
fn test_config_endpoint() {
    let config = BrowserManagerConfig::default();
    assert_eq!(config.endpoint(), "http://localhost:9222");

    let explicit = BrowserManagerConfig {
        endpoint: Some("http://10.0.0.2:9333/".into()),
        ..Default::default()
    };
    assert_eq!(explicit.endpoint(), "http://10.0.0.2:9333");
}

#[test]
fn test_config_profile_dir() {
    let config = BrowserManagerConfig::default();
    assert!(config.get_profile_dir().ends_with(".chatcast/browser-profile"));

    let custom = BrowserManagerConfig {
        profile_dir: Some(PathBuf::from("/tmp/cc-profile")),
        ..Default::default()
    };
    assert_eq!(custom.get_profile_dir(), PathBuf::from("/tmp/cc-profile"));
}

#[test]
fn test_browser_error_display() {
    let err = BrowserError::ConnectionFailed("timeout".to_string());
    assert_eq!(err.to_string(), "Connection failed: timeout");

    let err = BrowserError::ChromeNotFound;
    assert_eq!(err.to_string(), "Chrome not found. Please install Google Chrome.");

    let err = BrowserError::NotRunning("http://localhost:1".to_string());
    assert!(err.to_string().contains("launching is disabled"));
}

#[tokio::test]
async fn test_close_without_connect() {
    let manager = BrowserManager::new(BrowserManagerConfig::default());
    assert!(manager.close().await.is_ok());
    assert!(matches!(manager.client().await, Err(BrowserError::NotConnected)));
}

#[tokio::test]
async fn test_connect_without_browser_and_launch_disabled() {
    // Port 9 (discard) has nothing speaking DevTools.
    let manager = BrowserManager::new(BrowserManagerConfig {
        endpoint: Some("http://127.0.0.1:9".into()),
        launch: false,
        ..Default::default()
    });
    let err = manager.connect().await.unwrap_err();
    assert!(matches!(err, BrowserError::NotRunning(endpoint) if endpoint == "http://127.0.0.1:9"));
}

#[test]
fn test_launch_args() {
    use super::manager_core::launch_args;

    let profile = PathBuf::from("/tmp/cc-profile");
    let args = launch_args(&BrowserManagerConfig::default(), &profile);
    assert_eq!(args[0], "--remote-debugging-port=9222");
    assert!(args.contains(&"--user-data-dir=/tmp/cc-profile".to_string()));
    assert!(args.contains(&"--allow-file-access-from-files".to_string()));
    assert!(!args.iter().any(|a| a.starts_with("--headless")));

    let headless = BrowserManagerConfig {
        headless: true,
        debug_port: 9333,
        ..Default::default()
    };
    let args = launch_args(&headless, &profile);
    assert_eq!(args[0], "--remote-debugging-port=9333");
    assert!(args.contains(&"--headless=new".to_string()));
}

#[test]
fn test_configured_executable_wins() {
    let dir = tempfile::tempdir().unwrap();
    let binary = dir.path().join("my-chrome");
    std::fs::write(&binary, b"").unwrap();
    let manager = BrowserManager::new(BrowserManagerConfig {
        executable: Some(binary.clone()),
        ..Default::default()
    });
    assert_eq!(manager.find_chrome(), Some(binary));
}
