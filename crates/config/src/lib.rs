//! secretary-config - 配置加载库

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secretary_common::string_or_scalar;
use serde::Deserialize;
use thiserror::Error;

pub use secretary_vault::VaultConfig;

/// Vault 客户端识别的标准环境变量（去掉 `VAULT_` 前缀后）
const VAULT_ENV_KEYS: &[&str] = &[
    "addr",
    "token",
    "max_retries",
    "cacert",
    "client_cert",
    "client_key",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 格式日志
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(deserialize_with = "string_or_scalar")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// 构建配置来源：默认文件 < 环境文件 < `APP_` 变量 < 标准 `VAULT_` 变量
    pub fn figment(config_dir: &str) -> Figment {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_env());

        Figment::new()
            .merge(Serialized::default("env", &env))
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(
                Env::prefixed("VAULT_")
                    .only(VAULT_ENV_KEYS)
                    .map(|key| {
                        let key = key.as_str().to_ascii_lowercase();
                        match key.as_str() {
                            "addr" => "vault.address".to_string(),
                            "cacert" => "vault.ca_cert".to_string(),
                            other => format!("vault.{}", other),
                        }
                        .into()
                    }),
            )
    }

    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_dir).extract()?;
        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.env == "development"
    }
}
