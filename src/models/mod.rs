//! # 数据模型模块
//!
//! 定义批处理配置、发现的输入文件和运行结果。
//!
//! ## 依赖关系
//! - 被 `batch/`, `cli/` 和 `commands/` 使用
//! - 子模块: config, discovered, result

pub mod config;
pub mod discovered;
pub mod result;

pub use config::{Configuration, QueueOrder, ValidatedConfig};
pub use discovered::DiscoveredFile;
pub use result::{RunOutcome, RunResult};
