use super::*;

#[test]
fn default_config_is_valid() {
    let config = RelayConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.ping_interval(), Duration::from_secs(10));
    assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:3000".parse().unwrap());
}

#[test]
fn explicit_arguments_are_parsed() {
    let config = RelayConfig::try_parse_from([
        "relay",
        "8080",
        "--bind",
        "127.0.0.1",
        "--ping-interval-secs",
        "5",
        "--outbound-capacity",
        "32",
    ])
    .expect("arguments should parse");

    assert_eq!(config.port, 8080);
    assert_eq!(config.ping_interval(), Duration::from_secs(5));
    assert_eq!(config.outbound_capacity, 32);
    assert_eq!(config.listen_addr().unwrap(), "127.0.0.1:8080".parse().unwrap());
}

#[test]
fn non_numeric_port_is_rejected_by_parser() {
    assert!(RelayConfig::try_parse_from(["relay", "http"]).is_err());
}

#[test]
fn zero_ping_interval_is_rejected() {
    let config = RelayConfig { ping_interval_secs: 0, ..RelayConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::ZeroPingInterval)));
}

#[test]
fn zero_outbound_capacity_is_rejected() {
    let config = RelayConfig { outbound_capacity: 0, ..RelayConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::ZeroOutboundCapacity)));
}

#[test]
fn hostname_bind_is_rejected() {
    let config = RelayConfig { bind: "localhost".into(), ..RelayConfig::default() };
    match config.validate() {
        Err(ConfigError::InvalidBindAddr(bind)) => assert_eq!(bind, "localhost"),
        other => panic!("expected InvalidBindAddr, got {other:?}"),
    }
}

#[test]
fn ipv6_bind_is_accepted() {
    let config = RelayConfig { bind: "::1".into(), port: 9000, ..RelayConfig::default() };
    assert_eq!(config.listen_addr().unwrap(), "[::1]:9000".parse().unwrap());
}

// =============================================================================
// .env
// =============================================================================

fn dotenv_fixture(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("relay-{}-{name}.env", std::process::id()));
    std::fs::write(&path, contents).expect("write .env fixture");
    path
}

fn load_from(path: &std::path::Path) -> DotenvStatus {
    report_dotenv(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

#[test]
fn missing_dotenv_is_not_reported() {
    let path = std::env::temp_dir().join("relay-does-not-exist/.env");
    assert_eq!(load_from(&path), DotenvStatus::Missing);
}

#[test]
fn malformed_dotenv_is_reported_not_swallowed() {
    let path = dotenv_fixture("malformed", "RELAY_TEST_UNTERMINATED=\"no closing quote\n");
    let status = load_from(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(status, DotenvStatus::Invalid);
}

#[test]
fn valid_dotenv_is_loaded() {
    let path = dotenv_fixture("valid", "RELAY_TEST_DOTENV_LOADED=1\n");
    let status = load_from(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(status, DotenvStatus::Loaded);
    assert_eq!(std::env::var("RELAY_TEST_DOTENV_LOADED").as_deref(), Ok("1"));
}
