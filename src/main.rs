//! # MultiSlice - 批量切片工具
//!
//! 在目录树中按正则和深度查找 3D 模型文件，逐个交给外部切片引擎处理，
//! 并将结果写入输出目录。
//!
//! ## 子命令
//! - `list` - 列出符合条件的模型文件
//! - `run`  - 批量切片并写出结果
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/   (文件发现、队列、输出路径、批处理状态机)
//!   │     ├── engine/  (切片引擎接口与外部命令实现)
//!   │     └── models/  (配置与运行结果)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod engine;
mod error;
mod models;
mod utils;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command).await {
        utils::output::print_error(&format!("{}", e));
        if e.validation_kind().is_some() {
            utils::output::print_info("Please check the options and try again (see --help)");
        }
        std::process::exit(1);
    }
}
