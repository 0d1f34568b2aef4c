//! # 批处理模块
//!
//! 将目录树中的模型逐个送入切片引擎并写出结果。
//!
//! ## 功能
//! - 按深度和正则递归发现输入文件
//! - 工作队列（FIFO / LIFO）
//! - 输出路径解析，可保留目录结构
//! - 单模型串行的批处理状态机
//! - CSV 运行报告
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `walkdir` 遍历目录，`tokio` 等待引擎事件

pub mod collector;
pub mod controller;
pub mod output_path;
pub mod queue;
pub mod report;

pub use controller::{BatchController, BatchEvent};
