//! # 运行报告
//!
//! 将逐模型处理记录写出为 CSV。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 调用
//! - 使用 `csv` + `serde`

use crate::error::{MultiSliceError, Result};
use crate::models::RunResult;

use std::fs::File;
use std::path::Path;

/// 写出 CSV 报告（input, output, status, error）
pub fn write_csv_report(path: &Path, result: &RunResult) -> Result<()> {
    let file = File::create(path).map_err(|e| MultiSliceError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut wtr = csv::Writer::from_writer(file);
    for record in &result.records {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(|e| MultiSliceError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
