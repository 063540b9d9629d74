//! telemetry - 日志初始化
//!
//! 库本身只产生 `tracing` 事件，宿主进程通过这里安装 subscriber。

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use tracing_subscriber::util::TryInitError;

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// 初始化 tracing
///
/// `RUST_LOG` 优先于 `log_level`。已安装过 subscriber 时返回错误。
pub fn init_tracing(log_level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
}
