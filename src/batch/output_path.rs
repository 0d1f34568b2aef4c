//! # 输出路径解析
//!
//! 计算处理结果的目标路径，可选地在输出目录下复刻输入目录结构。
//!
//! ## 依赖关系
//! - 被 `batch/controller.rs` 调用
//! - 使用 `models/config.rs` 中的目录设置

use crate::error::{MultiSliceError, Result};

use std::fs;
use std::path::{Path, PathBuf};

/// 输出路径解析器
#[derive(Debug, Clone)]
pub struct OutputPathResolver {
    input_root: PathBuf,
    output_root: PathBuf,
    preserve_structure: bool,
    suffix: String,
}

impl OutputPathResolver {
    /// `suffix` 为引擎的输出后缀，不含前导点
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        preserve_structure: bool,
        suffix: &str,
    ) -> Self {
        OutputPathResolver {
            input_root: input_root.into(),
            output_root: output_root.into(),
            preserve_structure,
            suffix: suffix.trim_start_matches('.').to_string(),
        }
    }

    /// 计算 `file` 的输出路径，并创建所需的目录（可重复调用）
    pub fn resolve(&self, file: &Path) -> Result<PathBuf> {
        let file_name = output_file_name(file, &self.suffix)?;

        if !self.preserve_structure {
            return Ok(self.output_root.join(file_name));
        }

        let relative = file.strip_prefix(&self.input_root).map_err(|_| {
            MultiSliceError::Other(format!(
                "{} is not inside input directory {}",
                file.display(),
                self.input_root.display()
            ))
        })?;

        let target_dir = match relative.parent() {
            Some(parent) => self.output_root.join(parent),
            None => self.output_root.clone(),
        };

        fs::create_dir_all(&target_dir).map_err(|e| MultiSliceError::CreateDirError {
            path: target_dir.display().to_string(),
            source: e,
        })?;

        Ok(target_dir.join(file_name))
    }
}

/// 以新后缀替换文件原有后缀
pub fn output_file_name(file: &Path, suffix: &str) -> Result<PathBuf> {
    let name = file
        .file_name()
        .ok_or_else(|| MultiSliceError::Other(format!("{} has no file name", file.display())))?;

    Ok(Path::new(name).with_extension(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        let name = output_file_name(Path::new("/in/model.stl"), "gcode").unwrap();
        assert_eq!(name, PathBuf::from("model.gcode"));

        let name = output_file_name(Path::new("/in/part.v2.STL"), "gcode").unwrap();
        assert_eq!(name, PathBuf::from("part.v2.gcode"));

        let name = output_file_name(Path::new("/in/noext"), "gcode").unwrap();
        assert_eq!(name, PathBuf::from("noext.gcode"));
    }

    #[test]
    fn test_flat_output() {
        let out = tempfile::tempdir().unwrap();
        let resolver = OutputPathResolver::new("/in", out.path(), false, "gcode");

        let path = resolver.resolve(Path::new("/in/a/b/model.stl")).unwrap();
        assert_eq!(path, out.path().join("model.gcode"));
        assert!(!out.path().join("a").exists());
    }

    #[test]
    fn test_preserved_structure() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let resolver = OutputPathResolver::new(input.path(), out.path(), true, ".gcode");

        let model = input.path().join("a/b/model.stl");
        let path = resolver.resolve(&model).unwrap();
        assert_eq!(path, out.path().join("a/b/model.gcode"));
        assert!(out.path().join("a/b").is_dir());

        // 目录已存在时再次解析
        let again = resolver.resolve(&model).unwrap();
        assert_eq!(again, path);
    }

    #[test]
    fn test_preserved_structure_root_file() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let resolver = OutputPathResolver::new(input.path(), out.path(), true, "gcode");

        let path = resolver.resolve(&input.path().join("top.stl")).unwrap();
        assert_eq!(path, out.path().join("top.gcode"));
    }

    #[test]
    fn test_file_outside_input_root() {
        let out = tempfile::tempdir().unwrap();
        let resolver = OutputPathResolver::new("/in", out.path(), true, "gcode");
        assert!(resolver.resolve(Path::new("/elsewhere/model.stl")).is_err());
    }
}
