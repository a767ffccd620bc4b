// 视频分类流水线
//
// 逐帧：帧源 -> 姿态检测 -> 阈值分类 -> 统计 -> on_frame 观察者。
// 帧严格按到达顺序处理，瞬时帧率依赖相邻帧的时间差。
//
// 状态机：Idle -> Running -> Finished | Cancelled | Failed
// - 帧源正常结束：Finished，返回 RunSummary
// - 取消：处理完当前帧后停止，返回 AppError::Cancelled，不生成汇总
// - 帧源/检测器故障：返回 AppError::SourceFailure，不生成汇总

use crate::config::{AppConfig, PoseDetectorConfig};
use crate::detection::classifier::{FrameClassifier, LandmarkThreshold};
use crate::detection::detector::PoseDetector;
use crate::error::{AppError, AppResult};
use crate::metrics::{Clock, StreamMetrics, SystemClock};
use crate::utils::{generate_id, FrameOutcome, RunSummary};
use crate::video::source::FrameSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, info_span, warn};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finished,
    Cancelled,
    Failed,
}

/// 流水线配置，构造时完成校验
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub threshold: LandmarkThreshold,
    /// 原样转交给检测器
    pub detector: PoseDetectorConfig,
}

impl PipelineConfig {
    /// 阈值为负数时返回配置错误
    pub fn new(threshold: i64, detector: PoseDetectorConfig) -> AppResult<Self> {
        Ok(Self {
            threshold: LandmarkThreshold::try_from(threshold)?,
            detector,
        })
    }

    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            threshold: config.classifier.validated_threshold()?,
            detector: config.detector.clone(),
        })
    }
}

pub struct VideoClassificationPipeline {
    run_id: String,
    config: PipelineConfig,
    classifier: FrameClassifier,
    clock: Box<dyn Clock>,
    cancel_flag: Arc<AtomicBool>,
    metrics: StreamMetrics,
    state: RunState,
}

impl VideoClassificationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: PipelineConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            run_id: generate_id(),
            classifier: FrameClassifier::new(config.threshold),
            config,
            clock,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            metrics: StreamMetrics::new(),
            state: RunState::Idle,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// 使用外部（如取消登记表中的）取消标志
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = flag;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// 取消标志的句柄，置位后流水线在下一次帧间检查时停止
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    /// 本次运行的统计（失败或取消时仅供诊断参考）
    pub fn metrics(&self) -> &StreamMetrics {
        &self.metrics
    }

    /// 执行一次运行
    ///
    /// 每次调用都会重新创建统计状态；取消标志由调用方管理，不会自动复位。
    pub fn run<S, D, F>(
        &mut self,
        source: &mut S,
        detector: &mut D,
        mut on_frame: F,
    ) -> AppResult<RunSummary>
    where
        S: FrameSource + ?Sized,
        D: PoseDetector + ?Sized,
        F: FnMut(&FrameOutcome),
    {
        let span = info_span!("run", run_id = %self.run_id);
        let _enter = span.enter();

        self.state = RunState::Running;
        self.metrics = StreamMetrics::new();
        self.metrics.start(self.clock.now());

        info!("[PIPELINE] === 开始运行 === 帧源={}, 检测器={}, 阈值={}",
            source.describe(), detector.name(), self.config.threshold.get());

        if self.cancel_requested() {
            return Err(self.cancel());
        }

        loop {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => return Err(self.fail(e)),
            };

            // 未检测到姿态时 detect 返回空集合，按正常规则归类
            let landmarks = match detector.detect(&frame) {
                Ok(landmarks) => landmarks,
                Err(e) => return Err(self.fail(e)),
            };

            let label = self.classifier.classify(&landmarks);
            let instantaneous_rate = self.metrics.record_frame(label, self.clock.now());

            let outcome = FrameOutcome {
                frame_index: frame.index(),
                label,
                landmarks,
                instantaneous_rate,
            };
            on_frame(&outcome);

            if self.cancel_requested() {
                return Err(self.cancel());
            }
        }

        let summary = self.metrics.finish(self.clock.now());
        self.state = RunState::Finished;

        info!("[PIPELINE] === 运行完成 === 总帧数={}, Human 帧数={}, 平均帧率={:.2}, 准确率={:.2}%",
            summary.total_frames, summary.human_frames, summary.average_rate, summary.accuracy_pct);
        Ok(summary)
    }

    fn cancel_requested(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }

    fn cancel(&mut self) -> AppError {
        self.state = RunState::Cancelled;
        let processed_frames = self.metrics.total_frames();
        info!("[PIPELINE] 运行被取消: 已处理 {} 帧", processed_frames);
        AppError::Cancelled { processed_frames }
    }

    /// 帧源或检测器故障统一转换为 SourceFailure
    fn fail(&mut self, cause: AppError) -> AppError {
        self.state = RunState::Failed;
        let err = match cause {
            AppError::SourceFailure { .. } => cause,
            other => AppError::source_failure(self.metrics.total_frames(), other.to_string()),
        };
        error!("[PIPELINE] 运行中止: {} (已处理 {} 帧, 其中 Human {} 帧)",
            err, self.metrics.total_frames(), self.metrics.human_frames());
        err
    }
}

impl Drop for VideoClassificationPipeline {
    fn drop(&mut self) {
        if self.state == RunState::Running {
            warn!("[PIPELINE] 流水线在运行中被释放: run_id={}", self.run_id);
        }
    }
}

/// 以给定阈值执行一次运行（系统时钟）
///
/// 阈值无效时在进入 Running 之前返回配置错误，不读取任何帧。
pub fn run<S, D, F>(source: &mut S, detector: &mut D, on_frame: F, threshold: i64) -> AppResult<RunSummary>
where
    S: FrameSource + ?Sized,
    D: PoseDetector + ?Sized,
    F: FnMut(&FrameOutcome),
{
    let config = PipelineConfig::new(threshold, PoseDetectorConfig::default())?;
    VideoClassificationPipeline::new(config).run(source, detector, on_frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::detector::ScriptedDetector;
    use crate::metrics::ManualClock;
    use crate::utils::ClassificationLabel;
    use crate::video::source::MemorySource;
    use std::time::{Duration, Instant};

    fn pipeline(base: Instant) -> VideoClassificationPipeline {
        VideoClassificationPipeline::with_clock(
            PipelineConfig::default(),
            Box::new(ManualClock::new(base, Duration::from_millis(500))),
        )
    }

    fn seven_of_ten() -> ScriptedDetector {
        let mut counts = vec![20; 7];
        counts.extend([3; 3]);
        ScriptedDetector::from_counts(counts)
    }

    #[test]
    fn test_state_transitions_to_finished() {
        let mut p = pipeline(Instant::now());
        assert_eq!(p.state(), RunState::Idle);

        let summary = p
            .run(&mut MemorySource::blank(10, 64, 48), &mut seven_of_ten(), |_| {})
            .unwrap();
        assert_eq!(p.state(), RunState::Finished);
        assert_eq!(summary.total_frames, 10);
        assert_eq!(summary.human_frames, 7);
        assert_eq!(summary.accuracy_pct, 70.0);
    }

    #[test]
    fn test_rates_for_half_second_frames() {
        let mut p = pipeline(Instant::now());
        let mut rates = Vec::new();
        p.run(&mut MemorySource::blank(5, 64, 48), &mut seven_of_ten(), |o| {
            rates.push(o.instantaneous_rate)
        })
        .unwrap();
        assert_eq!(rates, vec![0.0, 2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_empty_source_finishes_immediately() {
        let mut p = pipeline(Instant::now());
        let mut calls = 0;
        let summary = p
            .run(&mut MemorySource::default(), &mut ScriptedDetector::default(), |_| calls += 1)
            .unwrap();
        assert_eq!(calls, 0);
        assert_eq!(summary.total_frames, 0);
        assert_eq!(summary.accuracy_pct, 0.0);
        assert_eq!(summary.average_rate, 0.0);
        assert_eq!(p.state(), RunState::Finished);
    }

    #[test]
    fn test_cancel_after_third_frame() {
        let mut p = pipeline(Instant::now());
        let flag = p.cancel_flag();
        let mut seen = Vec::new();

        let err = p
            .run(&mut MemorySource::blank(10, 64, 48), &mut seven_of_ten(), |o| {
                seen.push(o.frame_index);
                if o.frame_index == 2 {
                    flag.store(true, Ordering::SeqCst);
                }
            })
            .unwrap_err();

        assert!(matches!(err, AppError::Cancelled { processed_frames: 3 }));
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(p.state(), RunState::Cancelled);
    }

    #[test]
    fn test_cancelled_before_start_pulls_no_frames() {
        let mut p = pipeline(Instant::now());
        p.cancel_flag().store(true, Ordering::SeqCst);
        let mut detector = seven_of_ten();

        let err = p
            .run(&mut MemorySource::blank(10, 64, 48), &mut detector, |_| {})
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled { processed_frames: 0 }));
        assert_eq!(detector.calls(), 0);
    }

    #[test]
    fn test_source_failure_after_five_frames() {
        let mut p = pipeline(Instant::now());
        let mut calls = 0;
        let err = p
            .run(
                &mut MemorySource::blank(10, 64, 48).failing_after(5),
                &mut seven_of_ten(),
                |_| calls += 1,
            )
            .unwrap_err();

        assert!(err.is_source_failure());
        assert_eq!(calls, 5);
        assert_eq!(p.state(), RunState::Failed);
        assert_eq!(p.metrics().total_frames(), 5);
    }

    #[test]
    fn test_detector_failure_is_source_failure() {
        let mut p = pipeline(Instant::now());
        let mut labels = Vec::new();
        let err = p
            .run(
                &mut MemorySource::blank(10, 64, 48),
                &mut seven_of_ten().failing_at(4),
                |o| labels.push(o.label),
            )
            .unwrap_err();

        match err {
            AppError::SourceFailure { frame_index, .. } => assert_eq!(frame_index, 4),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(labels, vec![ClassificationLabel::Human; 4]);
    }

    #[test]
    fn test_same_inputs_give_identical_summaries() {
        let base = Instant::now();
        let first = pipeline(base)
            .run(&mut MemorySource::blank(10, 64, 48), &mut seven_of_ten(), |_| {})
            .unwrap();
        let second = pipeline(base)
            .run(&mut MemorySource::blank(10, 64, 48), &mut seven_of_ten(), |_| {})
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.average_rate.to_bits(), second.average_rate.to_bits());
    }

    #[test]
    fn test_rerun_starts_fresh_metrics() {
        let mut p = pipeline(Instant::now());
        p.run(&mut MemorySource::blank(4, 64, 48), &mut seven_of_ten(), |_| {})
            .unwrap();
        let summary = p
            .run(&mut MemorySource::blank(2, 64, 48), &mut ScriptedDetector::default(), |_| {})
            .unwrap();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.human_frames, 0);
        assert!(summary.human_frames <= summary.total_frames);
    }

    #[test]
    fn test_negative_threshold_is_config_error() {
        let mut source = MemorySource::blank(3, 64, 48);
        let mut detector = seven_of_ten();
        let mut calls = 0;

        let err = run(&mut source, &mut detector, |_| calls += 1, -1).unwrap_err();
        assert!(err.is_config());
        assert_eq!(calls, 0);
        assert_eq!(detector.calls(), 0);
        // 帧源未被读取
        assert!(source.next_frame().unwrap().is_some());
    }
}
