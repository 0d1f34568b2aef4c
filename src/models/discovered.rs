//! # 发现的输入文件
//!
//! 由文件发现阶段产生，创建后不可变。
//!
//! ## 依赖关系
//! - 由 `batch/collector.rs` 创建
//! - 被 `batch/queue.rs`, `batch/controller.rs` 使用

use std::path::{Path, PathBuf};

/// 一个待处理的模型文件
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredFile {
    path: PathBuf,
    root: PathBuf,
    depth: usize,
}

impl DiscoveredFile {
    /// `depth` 为所在目录相对根目录的深度，根目录为 0
    pub fn new(path: PathBuf, root: PathBuf, depth: usize) -> Self {
        DiscoveredFile { path, root, depth }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 文件名（用于显示）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// 相对于发现根目录的路径
    pub fn relative_path(&self) -> &Path {
        self.path.strip_prefix(&self.root).unwrap_or(&self.path)
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_and_name() {
        let file = DiscoveredFile::new(
            PathBuf::from("/data/models/a/b/part.stl"),
            PathBuf::from("/data/models"),
            2,
        );
        assert_eq!(file.relative_path(), Path::new("a/b/part.stl"));
        assert_eq!(file.file_name(), "part.stl");
        assert_eq!(file.depth(), 2);
    }
}
