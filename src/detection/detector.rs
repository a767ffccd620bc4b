// 姿态检测器
//
// 姿态估计模型视为黑盒能力：输入一帧，输出该帧的关键点序列；
// 未检测到姿态返回空集合（不是错误），只有不可恢复的故障才返回 Err。
//
// 实现：
// - RecordedPoseDetector: 回放姿态录制文件，命令行使用
// - ScriptedDetector: 按脚本返回指定数量的关键点，用于测试与演示

use crate::config::PoseDetectorConfig;
use crate::detection::recording::PoseRecording;
use crate::error::{AppError, AppResult};
use crate::utils::{Frame, Landmark, LandmarkSet};
use std::sync::Arc;
use tracing::{debug, info};

/// 姿态检测能力接口
pub trait PoseDetector: Send {
    fn name(&self) -> &str;

    fn detect(&mut self, frame: &Frame) -> AppResult<LandmarkSet>;
}

/// 回放录制文件的检测器
pub struct RecordedPoseDetector {
    recording: Arc<PoseRecording>,
    config: PoseDetectorConfig,
}

impl RecordedPoseDetector {
    pub fn new(recording: Arc<PoseRecording>, config: PoseDetectorConfig) -> Self {
        info!("[DETECTOR] 回放检测器: {} 帧, 检测置信度={}, 跟踪置信度={}, 平滑={}",
            recording.frame_count(), config.min_detection_confidence,
            config.min_tracking_confidence, config.smooth_landmarks);
        Self { recording, config }
    }

    pub fn config(&self) -> &PoseDetectorConfig {
        &self.config
    }
}

impl PoseDetector for RecordedPoseDetector {
    fn name(&self) -> &str {
        "recorded"
    }

    fn detect(&mut self, frame: &Frame) -> AppResult<LandmarkSet> {
        let landmarks = self.recording.landmarks_for(frame.index()).ok_or_else(|| {
            AppError::source_failure(frame.index(), "录制数据中没有该帧的检测结果")
        })?;
        debug!("[DETECTOR] 第 {} 帧: {} 个关键点", frame.index(), landmarks.len());
        Ok(landmarks)
    }
}

/// 脚本化检测器：第 i 帧返回 counts[i] 个关键点，超出脚本的帧视为未检测到姿态
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    counts: Vec<usize>,
    fail_at: Option<u64>,
    calls: usize,
}

impl ScriptedDetector {
    pub fn from_counts(counts: Vec<usize>) -> Self {
        Self { counts, fail_at: None, calls: 0 }
    }

    /// 处理到指定帧时报告不可恢复的故障
    pub fn failing_at(mut self, frame_index: u64) -> Self {
        self.fail_at = Some(frame_index);
        self
    }

    /// detect 被调用的次数
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl PoseDetector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    fn detect(&mut self, frame: &Frame) -> AppResult<LandmarkSet> {
        self.calls += 1;

        if self.fail_at == Some(frame.index()) {
            return Err(AppError::source_failure(frame.index(), "检测器故障"));
        }

        let count = usize::try_from(frame.index())
            .ok()
            .and_then(|i| self.counts.get(i))
            .copied()
            .unwrap_or(0);

        let landmarks = (0..count as u32)
            .map(|i| Landmark::new(i, (i as i32 * 7) % frame.width().max(1) as i32, i as i32))
            .collect();
        Ok(LandmarkSet::new(frame.width(), frame.height(), landmarks))
    }
}
