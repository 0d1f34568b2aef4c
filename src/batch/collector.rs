//! # 文件发现
//!
//! 按深度上限和文件名正则递归收集待处理的模型文件。
//!
//! ## 匹配规则
//! - 正则只需从文件名开头匹配（前缀匹配），匹配结束后的剩余字符不影响结果
//! - 根目录深度为 0，`max_depth = 0` 时不进入任何子目录
//! - 无权限访问的子目录记录警告并跳过整个子树，不中断遍历
//! - 指回祖先目录的符号链接同样记录警告并跳过
//! - 结果顺序取决于目录迭代顺序，不保证稳定
//!
//! ## 依赖关系
//! - 被 `batch/controller.rs` 和 `commands/list.rs` 调用
//! - 使用 `walkdir` 遍历目录

use crate::models::DiscoveredFile;

use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一次发现的结果
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    /// 遍历过程中被跳过的目录
    pub warnings: Vec<String>,
}

impl Discovery {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// 文件名列表（用于显示）
    pub fn names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file_name()).collect()
    }

    /// 绝对路径列表（用于处理）
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path().to_path_buf()).collect()
    }
}

/// 文件名是否从开头匹配正则
pub fn prefix_match(pattern: &Regex, name: &str) -> bool {
    // leftmost-first：若存在从 0 开始的匹配，最左匹配必然从 0 开始
    pattern.find(name).is_some_and(|m| m.start() == 0)
}

/// 递归收集 `root` 下匹配 `pattern` 且深度不超过 `max_depth` 的文件
pub fn discover(root: &Path, pattern: &Regex, max_depth: usize) -> Discovery {
    let mut discovery = Discovery::default();

    // walkdir 中根目录下的文件深度为 1
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth.saturating_add(1))
        .follow_links(true);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                discovery.warnings.push(describe_walk_error(&err, root));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if prefix_match(pattern, &name) {
            discovery.files.push(DiscoveredFile::new(
                entry.path().to_path_buf(),
                root.to_path_buf(),
                entry.depth() - 1,
            ));
        }
    }

    discovery
}

fn describe_walk_error(err: &walkdir::Error, root: &Path) -> String {
    let path = err.path().unwrap_or(root).display().to_string();

    if let Some(loop_ancestor) = err.loop_ancestor() {
        return format!(
            "Directory {} links back to {}. Skipping.",
            path,
            loop_ancestor.display()
        );
    }

    match err.io_error().map(|e| e.kind()) {
        Some(ErrorKind::PermissionDenied) => format!(
            "Could not access directory {}, reason: permission denied. Skipping.",
            path
        ),
        _ => format!("Could not access {}, reason: {}. Skipping.", path, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn stl_pattern() -> Regex {
        Regex::new(r".*\.stl").unwrap()
    }

    /// x.stl, y.STL, sub/z.stl, sub/deeper/w.stl
    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.stl"), b"solid x").unwrap();
        fs::write(dir.path().join("y.STL"), b"solid y").unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/z.stl"), b"solid z").unwrap();
        fs::write(dir.path().join("sub/deeper/w.stl"), b"solid w").unwrap();
        dir
    }

    fn relative_set(discovery: &Discovery) -> HashSet<String> {
        discovery
            .files
            .iter()
            .map(|f| f.relative_path().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_prefix_match() {
        let pattern = stl_pattern();
        assert!(prefix_match(&pattern, "x.stl"));
        assert!(prefix_match(&pattern, "x.stl.bak"));
        assert!(!prefix_match(&pattern, "y.STL"));

        let literal = Regex::new("part").unwrap();
        assert!(prefix_match(&literal, "part_01.stl"));
        assert!(!prefix_match(&literal, "my_part.stl"));
    }

    #[test]
    fn test_depth_zero_only_root_files() {
        let tree = sample_tree();
        let discovery = discover(tree.path(), &stl_pattern(), 0);

        let expected: HashSet<String> = ["x.stl".to_string()].into_iter().collect();
        assert_eq!(relative_set(&discovery), expected);
        assert!(discovery.warnings.is_empty());
    }

    #[test]
    fn test_depth_one_includes_direct_subdirectories() {
        let tree = sample_tree();
        let discovery = discover(tree.path(), &stl_pattern(), 1);

        let expected: HashSet<String> = ["x.stl", "sub/z.stl"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(relative_set(&discovery), expected);

        let depths: HashSet<usize> = discovery.files.iter().map(|f| f.depth()).collect();
        assert_eq!(depths, [0, 1].into_iter().collect());
    }

    #[test]
    fn test_deep_limit_finds_everything() {
        let tree = sample_tree();
        let discovery = discover(tree.path(), &stl_pattern(), usize::MAX);
        assert_eq!(discovery.len(), 3);
        assert!(discovery.paths().iter().all(|p| p.starts_with(tree.path())));
    }

    #[test]
    fn test_set_is_stable_across_runs() {
        let tree = sample_tree();
        let first = discover(tree.path(), &stl_pattern(), 5);
        let second = discover(tree.path(), &stl_pattern(), 5);
        assert_eq!(relative_set(&first), relative_set(&second));
    }

    #[test]
    fn test_names_and_paths() {
        let tree = sample_tree();
        let discovery = discover(tree.path(), &stl_pattern(), 0);
        assert_eq!(discovery.names(), vec!["x.stl".to_string()]);
        assert_eq!(discovery.paths(), vec![tree.path().join("x.stl")]);
    }

    #[test]
    fn test_empty_result() {
        let tree = sample_tree();
        let pattern = Regex::new(r".*\.obj").unwrap();
        let discovery = discover(tree.path(), &pattern, 3);
        assert!(discovery.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped_with_warning() {
        let tree = sample_tree();
        std::os::unix::fs::symlink(tree.path(), tree.path().join("sub/back")).unwrap();

        let discovery = discover(tree.path(), &stl_pattern(), 10);

        // 循环子树被跳过，其余文件照常发现
        let expected: HashSet<String> = ["x.stl", "sub/z.stl", "sub/deeper/w.stl"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(relative_set(&discovery), expected);
        assert_eq!(discovery.warnings.len(), 1);
        assert!(discovery.warnings[0].contains("links back"));
        assert!(discovery.warnings[0].contains("sub/back"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tree = sample_tree();
        let locked = tree.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.stl"), b"solid h").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root 用户不受权限位限制
        let readable = fs::read_dir(&locked).is_ok();
        let discovery = discover(tree.path(), &stl_pattern(), 1);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            return;
        }

        let expected: HashSet<String> = ["x.stl", "sub/z.stl"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(relative_set(&discovery), expected);
        assert_eq!(discovery.warnings.len(), 1);
        assert!(discovery.warnings[0].contains("permission denied"));
    }
}
