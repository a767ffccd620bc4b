// 运行命令
//
// 流程：校验阈值 → 加载姿态录制 → 后台启动流水线 → 逐帧输出叠加文字 → 输出统计汇总 → 可选写入报告

use crate::config::AppConfig;
use crate::detection::detector::RecordedPoseDetector;
use crate::detection::recording::PoseRecording;
use crate::error::{AppError, AppResult};
use crate::metrics::SystemClock;
use crate::pipeline::{spawn_run, PipelineConfig};
use crate::utils::{now_timestamp, FrameOutcome, RunReport};
use crate::video::source::{FrameSource, RecordingSource};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// 运行参数
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 姿态录制文件
    pub recording: PathBuf,
    /// 覆盖配置中的关键点阈值
    pub threshold: Option<i64>,
    /// 汇总报告输出路径（JSON）
    pub summary_out: Option<PathBuf>,
    /// 处理 N 帧后取消运行
    pub stop_after: Option<u64>,
}

/// 回放录制并分类，逐帧结果写入 out
pub fn run_recording<W: Write>(options: &RunOptions, app_config: &AppConfig, out: &mut W) -> AppResult<RunReport> {
    let mut config = app_config.clone();
    if let Some(threshold) = options.threshold {
        config.classifier.threshold = threshold;
    }
    // 阈值无效时不加载录制、不启动运行
    let pipeline_config = PipelineConfig::from_app_config(&config)?;
    let threshold = pipeline_config.threshold.get();

    info!("[RUN] 录制文件: {}", options.recording.display());
    let recording = Arc::new(PoseRecording::load(&options.recording)?);
    let source = RecordingSource::new(recording.clone());
    let source_name = source.describe();
    let detector = RecordedPoseDetector::new(recording, pipeline_config.detector.clone());

    let started_at = now_timestamp();
    let handle = spawn_run(
        pipeline_config,
        Box::new(SystemClock),
        Box::new(source),
        Box::new(detector),
        options.stop_after,
    )?;
    let run_id = handle.run_id().to_string();

    for outcome in handle.outcomes().iter() {
        write_outcome(out, &outcome)?;
    }

    let summary = match handle.join() {
        Ok(summary) => summary,
        Err(e) => {
            if let AppError::Cancelled { processed_frames } = &e {
                warn!("[RUN] 运行已取消: run_id={}, 已处理 {} 帧", run_id, processed_frames);
            }
            return Err(e);
        }
    };

    writeln!(out, "{}", summary.dialog_text())?;

    let report = RunReport {
        run_id,
        source: source_name,
        threshold,
        started_at,
        finished_at: now_timestamp(),
        summary,
    };

    if let Some(path) = &options.summary_out {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("[RUN] 汇总报告已写入: {}", path.display());
    }

    Ok(report)
}

fn write_outcome<W: Write>(out: &mut W, outcome: &FrameOutcome) -> AppResult<()> {
    let [label, fps] = outcome.overlay_lines();
    writeln!(out, "#{:<6} {:<10} {:<10} landmarks={}",
        outcome.frame_index, label, fps, outcome.landmarks.len())?;
    Ok(())
}
