//! # 切片引擎接口
//!
//! 批处理控制器通过此处的窄接口驱动外部切片引擎。
//!
//! ## 约定
//! - `load_file` 异步完成，对每次调用恰好触发一次加载完成通知
//! - `run_processing` 异步完成，通过状态通道报告状态变化，`Done` 表示成功
//! - `clear_workspace` 同步移除所有已加载模型
//! - `SceneWriter::write` 同步返回是否写出成功
//!
//! 每次请求都携带一个新的一次性完成句柄，不存在跨请求的持久订阅。
//!
//! ## 依赖关系
//! - 被 `batch/controller.rs` 使用
//! - 子模块: command (外部命令引擎), writer (G-code 写出)

pub mod command;
pub mod writer;

pub use command::CommandEngine;
pub use writer::GcodeWriter;

use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

/// 引擎后端状态（数值与宿主后端的状态码一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted = 1,
    Processing = 2,
    Done = 3,
    Error = 4,
    Disabled = 5,
}

impl EngineState {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 处理请求的终止状态
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EngineState::Done | EngineState::Error | EngineState::Disabled
        )
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::NotStarted => write!(f, "not started"),
            EngineState::Processing => write!(f, "processing"),
            EngineState::Done => write!(f, "done"),
            EngineState::Error => write!(f, "error"),
            EngineState::Disabled => write!(f, "disabled"),
        }
    }
}

/// 状态变化事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub state: EngineState,
    pub detail: Option<String>,
}

impl StateChange {
    pub fn new(state: EngineState) -> Self {
        StateChange {
            state,
            detail: None,
        }
    }

    pub fn with_detail(state: EngineState, detail: impl Into<String>) -> Self {
        StateChange {
            state,
            detail: Some(detail.into()),
        }
    }
}

/// 加载完成通知，失败时携带原因
pub type LoadCompletion = oneshot::Sender<std::result::Result<(), String>>;

/// 处理状态通知
pub type StateSink = mpsc::UnboundedSender<StateChange>;

/// 引擎工作区快照
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// 当前已加载的模型
    pub models: Vec<PathBuf>,
    /// 最近一次处理的输出
    pub output: Option<Vec<u8>>,
}

/// 宿主切片引擎
pub trait HostEngine {
    /// 加载模型，完成后通过 `done` 通知
    fn load_file(&mut self, path: &Path, done: LoadCompletion);

    /// 对已加载的模型执行切片，状态变化通过 `states` 通知
    fn run_processing(&mut self, states: StateSink);

    /// 移除所有已加载的模型
    fn clear_workspace(&mut self);

    fn scene(&self) -> Scene;

    /// 输出文件后缀，例如 `gcode`
    fn output_suffix(&self) -> &str;
}

/// 将工作区内容写入输出流
pub trait SceneWriter {
    fn write(&mut self, stream: &mut dyn Write, scene: &Scene) -> bool;
}
