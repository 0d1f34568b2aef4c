//! # 批处理运行结果
//!
//! 记录一次运行中发现的文件数、成功写出的文件数、首个错误以及逐模型记录。
//!
//! ## 依赖关系
//! - 由 `batch/controller.rs` 生成
//! - 被 `batch/report.rs`, `commands/run.rs` 使用

use serde::Serialize;
use std::path::{Path, PathBuf};

/// 运行的终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    Done,
    Cancelled,
    Failed,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Done => write!(f, "done"),
            RunOutcome::Cancelled => write!(f, "cancelled"),
            RunOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// 单个模型的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Written,
    Cancelled,
    Failed,
}

/// 单个模型的处理记录（CSV 报告的一行）
#[derive(Debug, Clone, Serialize)]
pub struct ModelRecord {
    pub input: String,
    pub output: String,
    pub status: ModelStatus,
    pub error: String,
}

/// 一次运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// 发现的文件数
    pub found: usize,
    /// 成功写出的文件数
    pub written: usize,
    pub outcome: RunOutcome,
    /// 首个错误信息
    pub first_error: Option<String>,
    pub records: Vec<ModelRecord>,
}

impl RunResult {
    pub fn new(found: usize) -> Self {
        RunResult {
            found,
            written: 0,
            outcome: RunOutcome::Done,
            first_error: None,
            records: Vec::new(),
        }
    }

    pub fn record_written(&mut self, input: &Path, output: &Path) {
        self.written += 1;
        self.records.push(ModelRecord {
            input: input.display().to_string(),
            output: output.display().to_string(),
            status: ModelStatus::Written,
            error: String::new(),
        });
    }

    /// 在两个模型之间停止，没有模型被中断
    pub fn mark_cancelled(&mut self) {
        self.outcome = RunOutcome::Cancelled;
    }

    pub fn record_cancelled(&mut self, input: &Path) {
        self.mark_cancelled();
        self.records.push(ModelRecord {
            input: input.display().to_string(),
            output: String::new(),
            status: ModelStatus::Cancelled,
            error: String::new(),
        });
    }

    pub fn record_failure(&mut self, input: &Path, output: Option<PathBuf>, error: String) {
        self.outcome = RunOutcome::Failed;
        if self.first_error.is_none() {
            self.first_error = Some(error.clone());
        }
        self.records.push(ModelRecord {
            input: input.display().to_string(),
            output: output.map(|p| p.display().to_string()).unwrap_or_default(),
            status: ModelStatus::Failed,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_is_kept() {
        let mut result = RunResult::new(3);
        result.record_written(Path::new("/in/a.stl"), Path::new("/out/a.gcode"));
        result.record_failure(Path::new("/in/b.stl"), None, "first".into());
        result.record_failure(Path::new("/in/c.stl"), None, "second".into());

        assert_eq!(result.written, 1);
        assert_eq!(result.outcome, RunOutcome::Failed);
        assert_eq!(result.first_error.as_deref(), Some("first"));
        assert_eq!(result.records.len(), 3);
    }
}
