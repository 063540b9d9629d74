//! common - 通用类型和工具库

pub mod de;
pub mod health;
pub mod retry;

pub use de::*;
pub use health::*;
pub use retry::*;
