//! # run 命令实现
//!
//! 校验配置后驱动批处理控制器，渲染进度并汇总结果。
//!
//! ## 功能
//! - 外部命令切片引擎 + G-code 写出
//! - 进度条与彩色日志
//! - Ctrl-C 停止当前运行
//! - 结果汇总表与可选 CSV 报告
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 定义的参数
//! - 使用 `batch/`, `engine/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::report::write_csv_report;
use crate::batch::controller::RunState;
use crate::batch::{BatchController, BatchEvent};
use crate::cli::run::RunArgs;
use crate::engine::{CommandEngine, GcodeWriter};
use crate::error::{MultiSliceError, Result};
use crate::models::{RunOutcome, RunResult};
use crate::utils::{output, progress};

use indicatif::ProgressBar;
use tabled::{Table, Tabled};
use tokio::sync::mpsc::UnboundedReceiver;

/// 结果汇总行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Found")]
    found: usize,
    #[tabled(rename = "Written")]
    written: usize,
    #[tabled(rename = "Bytes")]
    bytes: u64,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "First error")]
    first_error: String,
}

impl SummaryRow {
    fn new(result: &RunResult, state: RunState, bytes: u64) -> Self {
        SummaryRow {
            found: result.found,
            written: result.written,
            bytes,
            state: format!("{:?}", state),
            first_error: result.first_error.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

/// 执行 run 命令
pub async fn execute(args: RunArgs) -> Result<()> {
    output::print_header("Multi Slicing");

    // 校验在控制器内进行
    let configuration = args.to_configuration();

    let engine = CommandEngine::new(&args.engine, args.engine_args.clone(), &args.suffix)?;
    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut controller = BatchController::new(engine, GcodeWriter::new(), event_tx);

    let renderer = tokio::spawn(render_events(event_rx));

    let stop = controller.stop_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    let run = controller.run(&configuration).await;

    ctrl_c.abort();
    let _ = ctrl_c.await;
    let final_state = controller.state();
    let bytes_written = controller.writer().bytes_written();
    // 关闭事件通道，让渲染任务退出
    drop(controller);
    let _ = renderer.await;

    let result = run?;

    output::print_separator();
    println!(
        "{}",
        Table::new([SummaryRow::new(&result, final_state, bytes_written)])
    );

    if let Some(report) = &args.report {
        write_csv_report(report, &result)?;
        output::print_success(&format!("Report written to {}", report.display()));
    }

    match result.outcome {
        RunOutcome::Done => {
            output::print_done(&format!(
                "Sliced {} of {} models into '{}'",
                result.written,
                result.found,
                configuration.output_root.display()
            ));
            Ok(())
        }
        RunOutcome::Cancelled => {
            output::print_warning(&format!(
                "Stopped after {} of {} models",
                result.written, result.found
            ));
            Ok(())
        }
        RunOutcome::Failed => Err(MultiSliceError::Other(format!(
            "Run failed after {} of {} models",
            result.written, result.found
        ))),
    }
}

/// 在进度条之上渲染控制器事件
async fn render_events(mut events: UnboundedReceiver<BatchEvent>) {
    let mut bar: Option<ProgressBar> = None;
    let mut discovered = false;

    while let Some(event) = events.recv().await {
        match event {
            BatchEvent::Discovered { total } => {
                discovered = true;
                if total > 0 {
                    bar = Some(progress::create_model_bar(total as u64));
                }
            }
            // 发现之前的错误只可能是校验失败，由命令的返回值报告
            BatchEvent::Error(_) if !discovered => {}
            BatchEvent::ModelStarted { name, .. } => {
                if let Some(pb) = &bar {
                    pb.set_message(name);
                }
            }
            BatchEvent::ModelWritten { input, output: target } => {
                with_bar(&bar, || output::print_written(&input, &target));
                if let Some(pb) = &bar {
                    pb.inc(1);
                }
            }
            BatchEvent::Log(msg) => with_bar(&bar, || output::print_info(&msg)),
            BatchEvent::Warning(msg) => with_bar(&bar, || output::print_warning(&msg)),
            BatchEvent::Error(msg) => with_bar(&bar, || output::print_error(&msg)),
            BatchEvent::RunCompleted(_) => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
            }
        }
    }

    if let Some(pb) = bar {
        pb.finish_and_clear();
    }
}

fn with_bar(bar: &Option<ProgressBar>, f: impl FnOnce()) {
    match bar {
        Some(pb) => pb.suspend(f),
        None => f(),
    }
}
