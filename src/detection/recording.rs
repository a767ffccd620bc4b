// 姿态录制文件
//
// 文件格式（JSON，坐标为归一化值）：
// { "width": 640, "height": 480, "frames": [ [[x, y, z], ...], [], ... ] }
// 空数组表示该帧未检测到姿态。

use crate::error::{AppError, AppResult};
use crate::utils::{Landmark, LandmarkSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecording {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<Vec<[f32; 3]>>,
}

impl PoseRecording {
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::NotFound(format!("录制文件不存在: {}", path.display())));
        }

        let content = std::fs::read_to_string(path)?;
        let recording: PoseRecording = serde_json::from_str(&content)?;

        if recording.width == 0 || recording.height == 0 {
            return Err(AppError::InvalidArgument(format!(
                "录制文件画面尺寸无效: {}x{}",
                recording.width, recording.height
            )));
        }

        info!("[RECORDING] 已加载录制: {}, {}x{}, {} 帧",
            path.display(), recording.width, recording.height, recording.frames.len());
        Ok(recording)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// 第 frame_index 帧的关键点（换算为像素坐标），超出录制范围返回 None
    pub fn landmarks_for(&self, frame_index: u64) -> Option<LandmarkSet> {
        let points = self.frames.get(usize::try_from(frame_index).ok()?)?;
        let landmarks = points
            .iter()
            .enumerate()
            .map(|(i, [x, y, z])| {
                Landmark::from_normalized(i as u32, *x, *y, *z, self.width, self.height)
            })
            .collect();
        Some(LandmarkSet::new(self.width, self.height, landmarks))
    }
}
