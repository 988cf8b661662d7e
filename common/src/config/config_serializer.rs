use serde::Serialize;
use serde::de::DeserializeOwned;

/// Text format a config is stored in.
pub trait ConfigSerializer<TConfig> {
    fn serialize(&self, config: &TConfig) -> Result<String, String>;
    fn deserialize(&self, content: &str) -> Result<TConfig, String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlConfigSerializer;

impl YamlConfigSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl<TConfig> ConfigSerializer<TConfig> for YamlConfigSerializer
where
    TConfig: DeserializeOwned + Serialize,
{
    fn serialize(&self, config: &TConfig) -> Result<String, String> {
        serde_yaml_ng::to_string(config)
            .map_err(|e| format!("Cannot write {} as YAML: {}", config_name::<TConfig>(), e))
    }

    fn deserialize(&self, content: &str) -> Result<TConfig, String> {
        serde_yaml_ng::from_str(content)
            .map_err(|e| format!("Invalid YAML for {}: {}", config_name::<TConfig>(), e))
    }
}

/// `ServerConfig` rather than `tictactoe_server::server_config::ServerConfig`.
fn config_name<TConfig>() -> &'static str {
    let full = std::any::type_name::<TConfig>();
    full.rsplit("::").next().unwrap_or(full)
}
