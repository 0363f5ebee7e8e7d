pub mod mock_transport;

use querysmith::config::Config;

/// Config pointed at nothing, with side effects (history) disabled
pub fn test_config() -> Config {
    Config {
        api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        api_key: "".to_string(),
        history_enabled: false,
        deadline_ms: 1_000,
        transport_timeout_ms: 900,
        ..Config::default()
    }
}
