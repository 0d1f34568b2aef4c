//! # 外部命令切片引擎
//!
//! 通过外部切片程序（如 CuraEngine、PrusaSlicer 命令行）实现 [`HostEngine`]。
//!
//! ## 参数占位符
//! - `{input}`: 每个已加载模型的路径（含该占位符的参数对每个模型展开一次）
//! - `{output}`: 引擎的临时输出文件
//!
//! ## 工作区代数
//! 每次 `clear_workspace` 使代数加一。后台任务只在代数未变时提交结果，
//! 清空之后才完成的加载或切片不会写回工作区。
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 使用
//! - 使用 `tokio::process` 运行外部程序，`tempfile` 管理临时输出文件

use super::{EngineState, HostEngine, LoadCompletion, Scene, StateChange, StateSink};
use crate::error::{MultiSliceError, Result};

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempfile::TempPath;
use tokio::process::Command;
use tokio::task::JoinHandle;

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Default)]
struct Workspace {
    scene: Scene,
    generation: u64,
}

/// 外部命令引擎
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    suffix: String,
    /// 切片程序的输出文件，引擎释放时删除
    scratch: TempPath,
    workspace: Arc<Mutex<Workspace>>,
    tasks: Vec<JoinHandle<()>>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, suffix: &str) -> Result<Self> {
        let suffix = suffix.trim_start_matches('.').to_string();
        let scratch = tempfile::Builder::new()
            .prefix("multislice-")
            .suffix(&format!(".{}", suffix))
            .tempfile()
            .map_err(|e| MultiSliceError::FileWriteError {
                path: std::env::temp_dir().display().to_string(),
                source: e,
            })?
            .into_temp_path();

        Ok(CommandEngine {
            program: program.into(),
            args,
            suffix,
            scratch,
            workspace: Arc::new(Mutex::new(Workspace::default())),
            tasks: Vec::new(),
        })
    }

    fn workspace(&self) -> MutexGuard<'_, Workspace> {
        lock(&self.workspace)
    }

    /// 展开参数中的占位符
    fn expand_args(&self, models: &[PathBuf]) -> Vec<String> {
        let output = self.scratch.display().to_string();
        let mut expanded = Vec::with_capacity(self.args.len());

        for arg in &self.args {
            let arg = arg.replace(OUTPUT_PLACEHOLDER, &output);
            if arg.contains(INPUT_PLACEHOLDER) {
                for model in models {
                    expanded.push(arg.replace(INPUT_PLACEHOLDER, &model.display().to_string()));
                }
            } else {
                expanded.push(arg);
            }
        }

        expanded
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

fn lock(workspace: &Mutex<Workspace>) -> MutexGuard<'_, Workspace> {
    workspace.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 代数未变时修改场景并返回 true
fn commit(workspace: &Mutex<Workspace>, generation: u64, apply: impl FnOnce(&mut Scene)) -> bool {
    let mut workspace = lock(workspace);
    if workspace.generation != generation {
        return false;
    }
    apply(&mut workspace.scene);
    true
}

impl HostEngine for CommandEngine {
    fn load_file(&mut self, path: &Path, done: LoadCompletion) {
        self.tasks.retain(|t| !t.is_finished());

        let path = path.to_path_buf();
        let workspace = Arc::clone(&self.workspace);
        let generation = self.workspace().generation;

        let task = tokio::spawn(async move {
            let metadata = tokio::fs::metadata(&path).await;
            let outcome = match metadata {
                Ok(meta) if meta.is_file() => {
                    let loaded = path.clone();
                    if commit(&workspace, generation, move |scene| scene.models.push(loaded)) {
                        Ok(())
                    } else {
                        Err(format!("workspace was cleared while loading {}", path.display()))
                    }
                }
                Ok(_) => Err(format!("{} is not a regular file", path.display())),
                Err(e) => Err(format!("cannot read {}: {}", path.display(), e)),
            };
            let _ = done.send(outcome);
        });
        self.tasks.push(task);
    }

    fn run_processing(&mut self, states: StateSink) {
        self.tasks.retain(|t| !t.is_finished());

        let (models, generation) = {
            let workspace = self.workspace();
            (workspace.scene.models.clone(), workspace.generation)
        };
        if models.is_empty() {
            let _ = states.send(StateChange::with_detail(
                EngineState::Disabled,
                "no model loaded",
            ));
            return;
        }

        let _ = states.send(StateChange::new(EngineState::Processing));

        let program = self.program.clone();
        let args = self.expand_args(&models);
        let scratch = self.scratch.to_path_buf();
        let workspace = Arc::clone(&self.workspace);

        let task = tokio::spawn(async move {
            let change = match run_slicer(&program, &args, &scratch).await {
                Ok(bytes) => {
                    if commit(&workspace, generation, move |scene| scene.output = Some(bytes)) {
                        StateChange::new(EngineState::Done)
                    } else {
                        StateChange::with_detail(
                            EngineState::Error,
                            "workspace was cleared during slicing",
                        )
                    }
                }
                Err(e) => StateChange::with_detail(EngineState::Error, format!("{:#}", e)),
            };
            let _ = states.send(change);
        });
        self.tasks.push(task);
    }

    fn clear_workspace(&mut self) {
        self.abort_tasks();
        {
            let mut workspace = self.workspace();
            workspace.generation += 1;
            workspace.scene = Scene::default();
        }
        let _ = std::fs::remove_file(&self.scratch);
    }

    fn scene(&self) -> Scene {
        self.workspace().scene.clone()
    }

    fn output_suffix(&self) -> &str {
        &self.suffix
    }
}

impl Drop for CommandEngine {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// 运行切片程序并读取其输出文件
async fn run_slicer(program: &str, args: &[String], scratch: &Path) -> anyhow::Result<Vec<u8>> {
    let _ = tokio::fs::remove_file(scratch).await;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("failed to start '{}'", program))?;

    if !output.status.success() {
        bail!(
            "'{}' exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    tokio::fs::read(scratch)
        .await
        .with_context(|| format!("'{}' produced no output at {}", program, scratch.display()))
}
