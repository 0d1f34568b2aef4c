//! # 批处理配置与校验
//!
//! 保存用户提供的选项（文件名正则、输入/输出根目录、遍历深度等），
//! 并在运行开始前进行校验。
//!
//! ## 校验顺序（遇到第一个失败即返回）
//! 1. `file_pattern` 能编译为正则
//! 2. `input_root` 存在且为目录
//! 3. `output_root` 存在且为目录
//! 4. `max_depth` 可解析为非负整数
//!
//! ## 依赖关系
//! - 被 `cli/`, `commands/` 和 `batch/controller.rs` 使用
//! - 使用 `regex` crate

use crate::error::{MultiSliceError, Result};

use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 默认文件名模式：所有 .stl 文件
pub const DEFAULT_FILE_PATTERN: &str = r".*\.stl";

/// 默认最大深度（仅根目录）
pub const DEFAULT_MAX_DEPTH: &str = "0";

/// 工作队列的消费顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum QueueOrder {
    /// 按发现顺序处理
    #[default]
    Fifo,
    /// 从列表末尾开始处理（旧插件的行为）
    Lifo,
}

impl std::fmt::Display for QueueOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueOrder::Fifo => write!(f, "fifo"),
            QueueOrder::Lifo => write!(f, "lifo"),
        }
    }
}

/// 用户配置（未校验）
#[derive(Debug, Clone)]
pub struct Configuration {
    pub file_pattern: String,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub follow_subdirectories: bool,
    /// 原始深度字符串，校验时解析
    pub max_depth: String,
    pub preserve_directory_structure: bool,
    pub queue_order: QueueOrder,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            input_root: PathBuf::new(),
            output_root: PathBuf::new(),
            follow_subdirectories: false,
            max_depth: DEFAULT_MAX_DEPTH.to_string(),
            preserve_directory_structure: false,
            queue_order: QueueOrder::default(),
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input_root(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !path.as_os_str().is_empty() {
            self.input_root = path;
        }
    }

    pub fn set_output_root(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !path.as_os_str().is_empty() {
            self.output_root = path;
        }
    }

    /// 设置文件名正则；空字符串保留当前值
    pub fn set_file_pattern(&mut self, regex: &str) {
        if !regex.is_empty() {
            self.file_pattern = regex.to_string();
        }
    }

    /// 设置最大深度；空字符串保留当前值
    pub fn set_max_depth(&mut self, depth: &str) {
        let depth = depth.trim();
        if !depth.is_empty() {
            self.max_depth = depth.to_string();
        }
    }

    pub fn set_follow_subdirectories(&mut self, follow: bool) {
        self.follow_subdirectories = follow;
    }

    pub fn set_preserve_directory_structure(&mut self, preserve: bool) {
        self.preserve_directory_structure = preserve;
    }

    pub fn set_queue_order(&mut self, order: QueueOrder) {
        self.queue_order = order;
    }

    /// 校验配置，成功时返回可直接用于运行的 [`ValidatedConfig`]
    ///
    /// 校验不会修改任何状态。
    pub fn validate(&self) -> Result<ValidatedConfig> {
        let pattern =
            Regex::new(&self.file_pattern).map_err(|e| MultiSliceError::InvalidPattern {
                pattern: self.file_pattern.clone(),
                source: e,
            })?;

        let input_root = existing_dir(&self.input_root).ok_or_else(|| {
            MultiSliceError::InvalidInputPath {
                path: self.input_root.display().to_string(),
            }
        })?;

        let output_root = existing_dir(&self.output_root).ok_or_else(|| {
            MultiSliceError::InvalidOutputPath {
                path: self.output_root.display().to_string(),
            }
        })?;

        let max_depth =
            self.max_depth
                .trim()
                .parse::<usize>()
                .map_err(|_| MultiSliceError::InvalidDepth {
                    value: self.max_depth.clone(),
                })?;

        Ok(ValidatedConfig {
            pattern,
            input_root,
            output_root,
            follow_subdirectories: self.follow_subdirectories,
            max_depth,
            preserve_directory_structure: self.preserve_directory_structure,
            queue_order: self.queue_order,
        })
    }
}

/// 规范化为绝对路径；路径为空、不存在或不是目录时返回 None
fn existing_dir(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() || !path.is_dir() {
        return None;
    }
    path.canonicalize().ok()
}

/// 已校验的配置
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    /// 文件名正则（以前缀方式匹配）
    pub pattern: Regex,
    /// 规范化后的输入根目录
    pub input_root: PathBuf,
    /// 规范化后的输出根目录
    pub output_root: PathBuf,
    pub follow_subdirectories: bool,
    pub max_depth: usize,
    pub preserve_directory_structure: bool,
    pub queue_order: QueueOrder,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationKind;

    fn config_with_dirs(input: &Path, output: &Path) -> Configuration {
        let mut config = Configuration::new();
        config.set_input_root(input);
        config.set_output_root(output);
        config
    }

    #[test]
    fn test_defaults() {
        let config = Configuration::new();
        assert_eq!(config.file_pattern, DEFAULT_FILE_PATTERN);
        assert_eq!(config.max_depth, "0");
        assert!(!config.follow_subdirectories);
        assert!(!config.preserve_directory_structure);
        assert_eq!(config.queue_order, QueueOrder::Fifo);
    }

    #[test]
    fn test_empty_setters_keep_previous_values() {
        let mut config = Configuration::new();
        config.set_file_pattern("");
        config.set_max_depth("  ");
        config.set_input_root("");
        assert_eq!(config.file_pattern, DEFAULT_FILE_PATTERN);
        assert_eq!(config.max_depth, "0");
        assert!(config.input_root.as_os_str().is_empty());

        config.set_file_pattern(r"part_\d+");
        config.set_max_depth("3");
        assert_eq!(config.file_pattern, r"part_\d+");
        assert_eq!(config.max_depth, "3");
    }

    #[test]
    fn test_validate_ok() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut config = config_with_dirs(input.path(), output.path());
        config.set_max_depth(" 2 ");
        config.set_preserve_directory_structure(true);

        let validated = config.validate().unwrap();
        assert_eq!(validated.max_depth, 2);
        assert!(validated.input_root.is_absolute());
        assert!(validated.output_root.is_absolute());
        assert!(validated.preserve_directory_structure);
    }

    #[test]
    fn test_invalid_pattern_checked_first() {
        let mut config = Configuration::new();
        config.set_file_pattern("(unclosed");
        config.set_max_depth("nope");

        let err = config.validate().unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidPattern));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_invalid_input_path() {
        let output = tempfile::tempdir().unwrap();
        let config = config_with_dirs(Path::new("/definitely/not/here"), output.path());
        let err = config.validate().unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidInputPath));

        let unset = Configuration::new();
        let err = unset.validate().unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidInputPath));
    }

    #[test]
    fn test_input_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("model.stl");
        std::fs::write(&file, b"solid").unwrap();

        let config = config_with_dirs(&file, dir.path());
        let err = config.validate().unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidInputPath));
    }

    #[test]
    fn test_invalid_output_path() {
        let input = tempfile::tempdir().unwrap();
        let config = config_with_dirs(input.path(), Path::new("/definitely/not/here"));
        let err = config.validate().unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidOutputPath));
    }

    #[test]
    fn test_invalid_depth() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        for bad in ["-1", "abc", "1.5"] {
            let mut config = config_with_dirs(input.path(), output.path());
            config.set_max_depth(bad);
            let err = config.validate().unwrap_err();
            assert_eq!(err.validation_kind(), Some(ValidationKind::InvalidDepth));
        }
    }
}
