use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cache_dir: PathBuf,
    pub provider: ProviderSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8000)?
        .set_default("cache_dir", "computed_data")?
        .set_default("provider.base_url", "http://localhost:8100")?
        .set_default("provider.timeout_secs", 120)
}

/// Optional `config/server.{toml,...}` file merged over defaults, then
/// `REPLAY_`-prefixed environment variables over both
/// (e.g. `REPLAY_PORT`, `REPLAY_PROVIDER__BASE_URL`).
pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    let settings = defaults()?
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(config::Environment::with_prefix("REPLAY").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let settings = defaults().unwrap().build().unwrap();
        let config: ServerConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.cache_dir, PathBuf::from("computed_data"));
        assert_eq!(config.provider.timeout_secs, 120);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let settings = defaults()
            .unwrap()
            .add_source(config::File::from_str(
                "port = 9001\n[provider]\nbase_url = \"http://provider:9100\"\ntimeout_secs = 30\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ServerConfig = settings.try_deserialize().unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.provider.base_url, "http://provider:9100");
        assert_eq!(config.provider.timeout_secs, 30);
        // untouched keys keep their defaults
        assert_eq!(config.host, "0.0.0.0");
    }
}
