//! # list 命令实现
//!
//! 按发现设置列出模型文件，不调用切片引擎。
//!
//! ## 依赖关系
//! - 使用 `cli/list.rs` 定义的参数
//! - 使用 `batch/collector.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::collector;
use crate::cli::list::ListArgs;
use crate::error::Result;
use crate::utils::{output, progress};

/// 执行 list 命令
pub fn execute(args: ListArgs) -> Result<()> {
    let config = args.to_configuration().validate()?;

    let spinner = progress::create_spinner("Searching for models...");
    let discovery = collector::discover(&config.input_root, &config.pattern, config.max_depth);
    spinner.finish_and_clear();

    for warning in &discovery.warnings {
        output::print_warning(warning);
    }

    if discovery.is_empty() {
        output::print_warning(&format!(
            "No files matched '{}' under {}",
            args.discovery.pattern,
            config.input_root.display()
        ));
        return Ok(());
    }

    if args.absolute {
        for path in discovery.paths() {
            println!("{}", path.display());
        }
    } else {
        for name in discovery.names() {
            println!("{}", name);
        }
    }

    output::print_separator();
    let deepest = discovery.files.iter().map(|f| f.depth()).max().unwrap_or(0);
    output::print_info(&format!(
        "Found {} files (deepest at depth {})",
        discovery.len(),
        deepest
    ));

    Ok(())
}
