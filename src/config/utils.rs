/// Configuration utilities - loading, reloading, and access helpers
///
/// - Loading configuration from a TOML file (defaults when missing)
/// - Environment overrides for endpoints and fee tiers
/// - Hot-reloading at runtime
/// - Thread-safe access helpers
use super::schemas::Config;
use crate::constants::CONFIG_FILE_PATH;
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Load configuration from the default path and initialize the global CONFIG
pub fn load_config() -> Result<(), String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
///
/// Missing files fall back to defaults; environment overrides are applied
/// and the result is validated before it becomes visible.
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = read_config_file(path)?;

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Read, override and validate a configuration file without touching the global
pub fn read_config_file(path: &str) -> Result<Config, String> {
    let mut config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    logger::debug(
        LogTag::Config,
        &format!(
            "Loaded config: rpc={} websocket_enabled={} commitment={}",
            config.rpc.url, config.websocket.enabled, config.confirmation.commitment
        ),
    );

    Ok(config)
}

/// Apply environment overrides through a lookup function
///
/// Recognized keys: `TRADEBOT_RPC_URL`, `TRADEBOT_WS_URL`,
/// `DEX_CU_PRICE_MICRO`, `DEX_CU_PRICE_MICRO_FAST`,
/// `DEX_CU_PRICE_MICRO_TURBO`, `DEX_CU_PRICE_MICRO_ULTRA`.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("TRADEBOT_RPC_URL").filter(|v| !v.trim().is_empty()) {
        config.rpc.url = url.trim().to_string();
    }
    if let Some(url) = lookup("TRADEBOT_WS_URL").filter(|v| !v.trim().is_empty()) {
        config.websocket.url = Some(url.trim().to_string());
    }

    let fee_overrides: [(&str, &mut u64); 4] = [
        ("DEX_CU_PRICE_MICRO", &mut config.fees.cu_price_micro_default),
        ("DEX_CU_PRICE_MICRO_FAST", &mut config.fees.cu_price_micro_fast),
        ("DEX_CU_PRICE_MICRO_TURBO", &mut config.fees.cu_price_micro_turbo),
        ("DEX_CU_PRICE_MICRO_ULTRA", &mut config.fees.cu_price_micro_ultra),
    ];
    for (key, slot) in fee_overrides {
        if let Some(raw) = lookup(key) {
            match raw.trim().parse::<u64>() {
                Ok(value) => *slot = value,
                Err(_) => logger::warning(
                    LogTag::Config,
                    &format!("Ignoring {}='{}': not an integer", key, raw),
                ),
            }
        }
    }
}

/// Reload configuration from the default path
pub fn reload_config() -> Result<(), String> {
    reload_config_from_path(CONFIG_FILE_PATH)
}

/// Reload configuration from a specific file path
///
/// The configuration is replaced atomically, so reads are always consistent.
pub fn reload_config_from_path(path: &str) -> Result<(), String> {
    let new_config = read_config_file(path)?;

    match CONFIG.get() {
        Some(config_lock) => {
            *config_lock.write() = new_config;
            Ok(())
        }
        None => Err("Config not initialized. Call load_config() first.".to_string()),
    }
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when `load_config()` was never called.
///
/// # Example
/// ```ignore
/// let timeout = with_config(|cfg| cfg.confirmation.timeout_secs);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let config_lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));
    let config = config_lock.read();
    f(&config)
}

/// Get a clone of the entire configuration
///
/// Useful when values are needed across await points.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Save the current configuration to disk
pub fn save_config(path: Option<&str>) -> Result<(), String> {
    let path = path.unwrap_or(CONFIG_FILE_PATH);

    let config_str = with_config(|cfg| {
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))
    })?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
    }

    std::fs::write(path, config_str)
        .map_err(|e| format!("Failed to write config file '{}': {}", path, e))?;

    Ok(())
}

/// Check if configuration has been initialized
pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_temp(
            r#"
[rpc]
url = "https://mainnet.helius-rpc.com/?api-key=abc"

[polling]
max_attempts = 5
"#,
        );

        let config = read_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.rpc.url, "https://mainnet.helius-rpc.com/?api-key=abc");
        assert_eq!(config.polling.max_attempts, 5);
        assert_eq!(config.polling.interval_ms, 500);
        assert!(config.websocket.enabled);
        assert_eq!(config.websocket.subscribe_ack_timeout_secs, 10);
        assert_eq!(config.confirmation.commitment, "confirmed");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = read_config_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.polling, crate::config::PollingConfig::default());
    }

    #[test]
    fn test_invalid_commitment_rejected() {
        let file = write_temp("[confirmation]\ncommitment = \"eventually\"\n");
        let err = read_config_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.contains("eventually"));
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let file = write_temp("[rpc\nurl = ");
        let path = file.path().to_str().unwrap().to_string();
        let err = read_config_file(&path).unwrap_err();
        assert!(err.contains(&path));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TRADEBOT_RPC_URL", "http://127.0.0.1:8899"),
            ("TRADEBOT_WS_URL", "ws://127.0.0.1:8900"),
            ("DEX_CU_PRICE_MICRO_TURBO", "2500"),
            ("DEX_CU_PRICE_MICRO_ULTRA", "lots"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.rpc.url, "http://127.0.0.1:8899");
        assert_eq!(config.websocket.url.as_deref(), Some("ws://127.0.0.1:8900"));
        assert_eq!(config.fees.cu_price_micro_turbo, 2500);
        // Unparseable values leave the default in place
        assert_eq!(config.fees.cu_price_micro_ultra, 10_000);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.websocket.enabled = false;
        config.confirmation.timeout_secs = 15;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
