//! # 批处理控制器
//!
//! 驱动外部切片引擎逐个处理模型的状态机：
//!
//! ```text
//! Idle → Validating → Discovering → (Preparing → Loading → Processing → Writing)* → Done
//!                                                                              ↘ Cancelled | Failed
//! ```
//!
//! ## 约定
//! - 任意时刻最多只有一个模型被加载、处理或写出
//! - 每个引擎请求使用新的一次性完成句柄，请求 N+1 阶段前必须观察到 N 阶段完成
//! - 停止请求立即释放挂起的等待，不写出当前模型，也不再加载下一个模型
//! - 因停止或失败终止时清空引擎工作区
//! - 写出失败或引擎错误使运行以 `Failed` 终止，不会无限等待
//! - 控制器不直接输出，所有信息通过 [`BatchEvent`] 发出
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 调用
//! - 使用 `batch/collector.rs`, `batch/queue.rs`, `batch/output_path.rs`
//! - 使用 `engine/` 中的 [`HostEngine`] 与 [`SceneWriter`]

use super::collector;
use super::output_path::OutputPathResolver;
use super::queue::WorkQueue;
use crate::engine::{EngineState, HostEngine, SceneWriter, StateChange};
use crate::error::{MultiSliceError, Result};
use crate::models::{Configuration, DiscoveredFile, RunOutcome, RunResult, ValidatedConfig};

use std::fs::{self, File};
use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    Discovering,
    Preparing,
    Loading,
    Processing,
    Writing,
    Done,
    Cancelled,
    Failed,
}

/// 控制器向展示层发出的事件
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Log(String),
    Warning(String),
    Error(String),
    Discovered {
        total: usize,
    },
    ModelStarted {
        index: usize,
        total: usize,
        name: String,
    },
    ModelWritten {
        input: PathBuf,
        output: PathBuf,
    },
    RunCompleted(Box<RunResult>),
}

/// 当前正在处理的模型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentModel {
    pub path: PathBuf,
    pub suffix: String,
    pub name: String,
}

impl From<DiscoveredFile> for CurrentModel {
    fn from(file: DiscoveredFile) -> Self {
        let name = file.file_name();
        let path = file.into_path();
        let suffix = path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        CurrentModel { path, suffix, name }
    }
}

/// 停止句柄，可在其他任务中请求停止当前运行
#[derive(Clone)]
pub struct StopHandle {
    stop_tx: Arc<watch::Sender<bool>>,
    running: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<BatchEvent>,
}

impl StopHandle {
    /// 请求停止；空闲时只记录日志，重复调用无副作用
    pub fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            let _ = self
                .events
                .send(BatchEvent::Log("No run in progress, nothing to stop".into()));
            return;
        }

        if !self.stop_tx.send_replace(true) {
            let _ = self.events.send(BatchEvent::Log(
                "Cancel signal emitted, stopping MultiSlice".into(),
            ));
        }
    }
}

#[cfg(test)]
impl<E, W> BatchController<E, W> {
    pub fn current_model(&self) -> Option<&CurrentModel> {
        self.current.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

/// 单个模型处理失败的原因
enum StageError {
    Cancelled,
    Failed {
        output: Option<PathBuf>,
        error: MultiSliceError,
    },
}

impl From<MultiSliceError> for StageError {
    fn from(error: MultiSliceError) -> Self {
        StageError::Failed {
            output: None,
            error,
        }
    }
}

/// 批处理控制器
pub struct BatchController<E, W> {
    engine: E,
    writer: W,
    events: mpsc::UnboundedSender<BatchEvent>,
    state: RunState,
    current: Option<CurrentModel>,
    stop_tx: Arc<watch::Sender<bool>>,
    running: Arc<AtomicBool>,
}

impl<E: HostEngine, W: SceneWriter> BatchController<E, W> {
    pub fn new(engine: E, writer: W, events: mpsc::UnboundedSender<BatchEvent>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        BatchController {
            engine,
            writer,
            events,
            state: RunState::Idle,
            current: None,
            stop_tx: Arc::new(stop_tx),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop_tx: Arc::clone(&self.stop_tx),
            running: Arc::clone(&self.running),
            events: self.events.clone(),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn emit(&self, event: BatchEvent) {
        let _ = self.events.send(event);
    }

    fn log(&self, msg: impl Into<String>) {
        self.emit(BatchEvent::Log(msg.into()));
    }

    /// 校验配置并运行；校验失败时发出错误事件、回到 `Idle` 并返回错误
    pub async fn run(&mut self, config: &Configuration) -> Result<RunResult> {
        self.state = RunState::Validating;
        match config.validate() {
            Ok(validated) => {
                self.log(format!(
                    "Searching '{}' (pattern '{}', max depth {}, follow subdirectories: {}, {} order)",
                    validated.input_root.display(),
                    validated.pattern.as_str(),
                    validated.max_depth,
                    if validated.follow_subdirectories { "yes" } else { "no" },
                    validated.queue_order
                ));
                Ok(self.run_validated(&validated).await)
            }
            Err(e) => {
                self.emit(BatchEvent::Error(e.to_string()));
                self.state = RunState::Idle;
                Err(e)
            }
        }
    }

    /// 使用已校验的配置运行一次批处理
    async fn run_validated(&mut self, config: &ValidatedConfig) -> RunResult {
        self.stop_tx.send_replace(false);
        let mut stop = self.stop_tx.subscribe();
        self.running.store(true, Ordering::SeqCst);

        let result = self.execute(config, &mut stop).await;

        self.running.store(false, Ordering::SeqCst);
        self.current = None;
        self.state = match result.outcome {
            RunOutcome::Done => RunState::Done,
            RunOutcome::Cancelled => RunState::Cancelled,
            RunOutcome::Failed => RunState::Failed,
        };
        self.emit(BatchEvent::RunCompleted(Box::new(result.clone())));
        result
    }

    async fn execute(
        &mut self,
        config: &ValidatedConfig,
        stop: &mut watch::Receiver<bool>,
    ) -> RunResult {
        self.state = RunState::Discovering;
        let discovery = collector::discover(&config.input_root, &config.pattern, config.max_depth);
        for warning in &discovery.warnings {
            self.emit(BatchEvent::Warning(warning.clone()));
        }

        let total = discovery.len();
        let mut result = RunResult::new(total);
        self.emit(BatchEvent::Discovered { total });

        if total == 0 {
            self.log("Found 0 files, please try again");
            return result;
        }
        self.log(format!("Found {} files", total));

        let resolver = OutputPathResolver::new(
            &config.input_root,
            &config.output_root,
            config.preserve_directory_structure,
            self.engine.output_suffix(),
        );
        let mut queue = WorkQueue::new(discovery.files, config.queue_order);
        let mut index = 0;

        loop {
            if *stop.borrow() {
                self.log(format!("Stopped with {} file(s) left", queue.len()));
                result.mark_cancelled();
                return result;
            }

            self.state = RunState::Preparing;
            let model = match queue.pop() {
                Some(file) => CurrentModel::from(file),
                None => break,
            };
            index += 1;
            self.current = Some(model.clone());
            self.emit(BatchEvent::ModelStarted {
                index,
                total,
                name: model.name.clone(),
            });

            match self.process_model(&model, &resolver, stop).await {
                Ok(output) => {
                    result.record_written(&model.path, &output);
                    self.emit(BatchEvent::ModelWritten {
                        input: model.path.clone(),
                        output,
                    });
                    self.log("Clearing build plate and preparing next model");
                    self.engine.clear_workspace();
                    self.current = None;
                    if !queue.is_empty() {
                        self.log(format!("{} file(s) to go", queue.len()));
                    }
                }
                Err(StageError::Cancelled) => {
                    self.log(format!("Stopped before {} was written", model.name));
                    self.engine.clear_workspace();
                    result.record_cancelled(&model.path);
                    return result;
                }
                Err(StageError::Failed { output, error }) => {
                    self.emit(BatchEvent::Error(error.to_string()));
                    self.engine.clear_workspace();
                    result.record_failure(&model.path, output, error.to_string());
                    return result;
                }
            }
        }

        self.log("Found no more models. Done!");
        result
    }

    /// 加载 → 切片 → 写出，返回输出路径
    async fn process_model(
        &mut self,
        model: &CurrentModel,
        resolver: &OutputPathResolver,
        stop: &mut watch::Receiver<bool>,
    ) -> std::result::Result<PathBuf, StageError> {
        // Loading
        self.state = RunState::Loading;
        self.engine.clear_workspace();
        self.log(format!("Loading model {}", model.name));

        let (load_tx, load_rx) = oneshot::channel();
        self.engine.load_file(&model.path, load_tx);
        match suspend(stop, load_rx).await? {
            Ok(Ok(())) => {}
            Ok(Err(reason)) => return Err(engine_failure(model, reason)),
            Err(_) => {
                return Err(engine_failure(
                    model,
                    "engine dropped the load request".into(),
                ))
            }
        }

        // Processing
        self.state = RunState::Processing;
        self.log("Slicing...");

        let (state_tx, mut state_rx) = mpsc::unbounded_channel();
        self.engine.run_processing(state_tx);
        let change = suspend(stop, wait_terminal(&mut state_rx))
            .await?
            .ok_or_else(|| {
                engine_failure(model, "engine stopped reporting before slicing finished".into())
            })?;

        if change.state != EngineState::Done {
            let reason = change
                .detail
                .unwrap_or_else(|| {
                    format!(
                        "slicing ended in state {} ({})",
                        change.state,
                        change.state.code()
                    )
                });
            return Err(engine_failure(model, reason));
        }

        if *stop.borrow() {
            return Err(StageError::Cancelled);
        }

        // Writing
        self.state = RunState::Writing;
        let path = resolver.resolve(&model.path)?;
        self.log(format!(
            "Writing {} to file {} (from .{} model)",
            self.engine.output_suffix(),
            display_name(&path),
            model.suffix
        ));
        self.log(format!("Saving to: {}", path.display()));

        let scene = self.engine.scene();
        let file = File::create(&path).map_err(|e| StageError::Failed {
            output: Some(path.clone()),
            error: MultiSliceError::FileWriteError {
                path: path.display().to_string(),
                source: e,
            },
        })?;
        let mut stream = BufWriter::new(file);
        let written = self.writer.write(&mut stream, &scene) && stream.flush().is_ok();
        drop(stream);

        if !written {
            let _ = fs::remove_file(&path);
            return Err(StageError::Failed {
                output: Some(path.clone()),
                error: MultiSliceError::WriteFailed {
                    model: model.name.clone(),
                    path: path.display().to_string(),
                },
            });
        }

        Ok(path)
    }
}

fn engine_failure(model: &CurrentModel, reason: String) -> StageError {
    StageError::Failed {
        output: None,
        error: MultiSliceError::EngineFailed {
            model: model.name.clone(),
            reason,
        },
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 等待引擎完成通知，期间若收到停止请求则立即返回
async fn suspend<F: Future>(
    stop: &mut watch::Receiver<bool>,
    completion: F,
) -> std::result::Result<F::Output, StageError> {
    tokio::select! {
        biased;
        _ = stop_requested(stop) => Err(StageError::Cancelled),
        out = completion => Ok(out),
    }
}

async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    if stop.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// 等待终止状态；通道关闭时返回 None
async fn wait_terminal(states: &mut mpsc::UnboundedReceiver<StateChange>) -> Option<StateChange> {
    while let Some(change) = states.recv().await {
        if change.state.is_terminal() {
            return Some(change);
        }
    }
    None
}
