//! # run 子命令 CLI 定义
//!
//! 批量切片并写出结果
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/run.rs`

use super::list::DiscoveryArgs;
use crate::models::{Configuration, QueueOrder};

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 队列消费顺序
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OrderArg {
    /// Process files in discovery order
    Fifo,
    /// Process the last discovered file first (legacy plugin behaviour)
    Lifo,
}

impl From<OrderArg> for QueueOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Fifo => QueueOrder::Fifo,
            OrderArg::Lifo => QueueOrder::Lifo,
        }
    }
}

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub discovery: DiscoveryArgs,

    /// Output directory for sliced files
    #[arg(short, long)]
    pub output: PathBuf,

    /// Reproduce the input folder structure under the output directory
    #[arg(long, default_value_t = false)]
    pub preserve_dirs: bool,

    /// Queue order
    #[arg(long, value_enum, default_value = "fifo")]
    pub order: OrderArg,

    // ─────────────────────────────────────────────────────────────
    // Engine options
    // ─────────────────────────────────────────────────────────────
    /// Slicer executable
    #[arg(short, long, env = "MULTISLICE_ENGINE")]
    pub engine: String,

    /// Slicer argument; `{input}` and `{output}` are substituted (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Output file suffix produced by the slicer
    #[arg(long, default_value = "gcode")]
    pub suffix: String,

    // ─────────────────────────────────────────────────────────────
    // Reporting
    // ─────────────────────────────────────────────────────────────
    /// Write a per-model CSV report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl RunArgs {
    pub fn to_configuration(&self) -> Configuration {
        let mut config = Configuration::new();
        self.discovery.apply(&mut config);
        config.set_output_root(&self.output);
        config.set_preserve_directory_structure(self.preserve_dirs);
        config.set_queue_order(self.order.into());
        config
    }
}
