//! 通用健康检查模块
//!
//! 提供健康状态、检查结果记录以及结果接收器（sink）的基础类型。
//! 宿主应用自行创建 `CheckState` 并传给检查器，本模块不维护任何全局状态。

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Ok,
    Warning,
    Critical,
}

impl HealthStatus {
    /// 是否为健康状态
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个组件的健康检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// 组件名称
    pub name: String,
    /// 最近一次的状态，首次检查前为空
    pub status: Option<HealthStatus>,
    /// 状态说明
    pub message: String,
    /// 状态码
    pub status_code: u16,
    /// 最近检查时间
    pub last_checked: Option<DateTime<Utc>>,
    /// 最近成功时间
    pub last_success: Option<DateTime<Utc>>,
    /// 最近失败时间
    pub last_failure: Option<DateTime<Utc>>,
}

impl Check {
    /// 创建尚未检查过的结果
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: None,
            message: String::new(),
            status_code: 0,
            last_checked: None,
            last_success: None,
            last_failure: None,
        }
    }

    /// 记录一次检查结果
    ///
    /// `last_checked` 总是更新；成功只更新 `last_success`，
    /// 失败（WARNING / CRITICAL）只更新 `last_failure`。
    pub fn record(
        &mut self,
        status: HealthStatus,
        message: impl Into<String>,
        status_code: u16,
        at: DateTime<Utc>,
    ) {
        self.status = Some(status);
        self.message = message.into();
        self.status_code = status_code;
        self.last_checked = Some(at);
        if status.is_ok() {
            self.last_success = Some(at);
        } else {
            self.last_failure = Some(at);
        }
    }

    /// 是否健康
    pub fn is_healthy(&self) -> bool {
        self.status.is_some_and(HealthStatus::is_ok)
    }
}

/// 健康检查结果接收器
///
/// 每次检查调用一次 `update`。
pub trait CheckSink: Send + Sync {
    fn update(&self, status: HealthStatus, message: &str, status_code: u16);
}

/// 线程安全的检查状态，可在检查过程中并发读取快照
#[derive(Debug)]
pub struct CheckState {
    inner: RwLock<Check>,
}

impl CheckState {
    /// 创建新的检查状态
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Check::new(name)),
        }
    }

    /// 获取当前结果的副本
    pub fn snapshot(&self) -> Check {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn name(&self) -> String {
        self.snapshot().name
    }

    pub fn status(&self) -> Option<HealthStatus> {
        self.snapshot().status
    }

    pub fn message(&self) -> String {
        self.snapshot().message
    }

    pub fn status_code(&self) -> u16 {
        self.snapshot().status_code
    }
}

impl CheckSink for CheckState {
    fn update(&self, status: HealthStatus, message: &str, status_code: u16) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.record(status, message, status_code, Utc::now());
    }
}

/// 健康检查 trait
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// 获取组件名称
    fn component_name(&self) -> &'static str;

    /// 执行一次健康检查，并把结果写入 sink
    async fn check(&self, sink: &dyn CheckSink);
}
