//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `list`: 列出符合条件的模型文件
//! - `run`: 批量切片并写出结果
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: list, run

pub mod list;
pub mod run;

use clap::{Parser, Subcommand};

/// MultiSlice - 批量切片工具
#[derive(Parser)]
#[command(name = "multislice")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Batch-slice a directory tree of 3D models through an external slicing engine",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// List model files matching the discovery settings
    List(list::ListArgs),

    /// Slice every matching model and write the results
    Run(run::RunArgs),
}
