//! # list 子命令 CLI 定义
//!
//! 列出符合发现条件的模型文件，同时定义与 `run` 共用的发现参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs`, `cli/run.rs` 使用
//! - 参数传递给 `commands/list.rs`

use crate::models::config::{Configuration, DEFAULT_FILE_PATTERN};

use clap::Args;
use std::path::PathBuf;

/// 文件发现参数
#[derive(Args, Debug, Clone)]
pub struct DiscoveryArgs {
    /// Root directory to search for models
    #[arg(short, long)]
    pub input: PathBuf,

    /// Regex the file name must match from its first character
    #[arg(short, long, default_value = DEFAULT_FILE_PATTERN)]
    pub pattern: String,

    /// Maximum directory depth to descend (root = 0)
    #[arg(short = 'd', long)]
    pub max_depth: Option<String>,

    /// Follow subdirectories (unlimited depth unless --max-depth is given)
    #[arg(short = 'r', long, default_value_t = false)]
    pub follow: bool,
}

impl DiscoveryArgs {
    /// 写入发现相关的配置项
    pub fn apply(&self, config: &mut Configuration) {
        config.set_input_root(&self.input);
        config.set_file_pattern(&self.pattern);
        config.set_follow_subdirectories(self.follow);

        match &self.max_depth {
            Some(depth) => config.set_max_depth(depth),
            None if self.follow => config.set_max_depth(&usize::MAX.to_string()),
            None => {}
        }
    }
}

/// list 子命令参数
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub discovery: DiscoveryArgs,

    /// Print absolute paths instead of file names
    #[arg(short, long, default_value_t = false)]
    pub absolute: bool,
}

impl ListArgs {
    /// 列出文件时输出目录不参与，使用输入目录占位
    pub fn to_configuration(&self) -> Configuration {
        let mut config = Configuration::new();
        self.discovery.apply(&mut config);
        config.set_output_root(&self.discovery.input);
        config
    }
}
