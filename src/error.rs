//! # 统一错误处理模块
//!
//! 定义 MultiSlice 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// 配置校验失败的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    InvalidPattern,
    InvalidInputPath,
    InvalidOutputPath,
    InvalidDepth,
}

/// MultiSlice 统一错误类型
#[derive(Error, Debug)]
pub enum MultiSliceError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory: {path}")]
    CreateDirError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 配置校验错误
    // ─────────────────────────────────────────────────────────────
    #[error("Regex string \"{pattern}\" is not a valid regex: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Input path \"{path}\" is not a valid directory")]
    InvalidInputPath { path: String },

    #[error("Output path \"{path}\" is not a valid directory")]
    InvalidOutputPath { path: String },

    #[error("Depth value \"{value}\" is not a valid non-negative integer")]
    InvalidDepth { value: String },

    // ─────────────────────────────────────────────────────────────
    // 引擎错误
    // ─────────────────────────────────────────────────────────────
    #[error("Engine failed on {model}: {reason}")]
    EngineFailed { model: String, reason: String },

    #[error("Writer failed to persist {model} to {path}")]
    WriteFailed { model: String, path: String },

    // ─────────────────────────────────────────────────────────────
    // 报告错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl MultiSliceError {
    /// 若为配置校验错误，返回其类别
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            MultiSliceError::InvalidPattern { .. } => Some(ValidationKind::InvalidPattern),
            MultiSliceError::InvalidInputPath { .. } => Some(ValidationKind::InvalidInputPath),
            MultiSliceError::InvalidOutputPath { .. } => Some(ValidationKind::InvalidOutputPath),
            MultiSliceError::InvalidDepth { .. } => Some(ValidationKind::InvalidDepth),
            _ => None,
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MultiSliceError>;
