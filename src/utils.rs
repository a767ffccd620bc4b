// 数据类型与工具模块
//
// 帧、关键点、分类标签、单帧结果与运行汇总等在各模块间共享的数据结构。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 视频帧
///
/// 帧源产出后不可变；流水线在一次迭代内独占持有，处理完即丢弃或交给显示层。
#[derive(Debug, Clone)]
pub struct Frame {
    index: u64,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { index, width, height, data }
    }

    /// 不携带像素数据的帧（回放录制的姿态数据时使用）
    pub fn without_pixels(index: u64, width: u32, height: u32) -> Self {
        Self::new(index, width, height, Vec::new())
    }

    /// 帧序号（从 0 开始，等于到达顺序）
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// 归一化坐标 (0.0 - 1.0)，z 为相对深度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 单个姿态关键点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 关键点编号，跨帧稳定（如 11 = 左肩）
    pub index: u32,
    /// 像素坐标
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedPoint>,
}

impl Landmark {
    pub fn new(index: u32, x: i32, y: i32) -> Self {
        Self { index, x, y, normalized: None }
    }

    /// 由检测器输出的归一化坐标换算像素坐标（向零截断）
    pub fn from_normalized(index: u32, x: f32, y: f32, z: f32, width: u32, height: u32) -> Self {
        Self {
            index,
            x: (x * width as f32) as i32,
            y: (y * height as f32) as i32,
            normalized: Some(NormalizedPoint { x, y, z }),
        }
    }
}

/// 一帧内检测到的关键点序列，可以为空（未检测到姿态）
///
/// 所有关键点共享同一帧的坐标空间，由 width/height 记录。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    width: u32,
    height: u32,
    landmarks: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(width: u32, height: u32, landmarks: Vec<Landmark>) -> Self {
        Self { width, height, landmarks }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self::new(width, height, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Landmark> {
        self.landmarks.iter()
    }

    pub fn as_slice(&self) -> &[Landmark] {
        &self.landmarks
    }
}

/// 单帧分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationLabel {
    Human,
    NonHuman,
}

impl ClassificationLabel {
    pub fn is_human(&self) -> bool {
        matches!(self, ClassificationLabel::Human)
    }

    /// 叠加在画面上的文字
    pub fn overlay_text(&self) -> &'static str {
        match self {
            ClassificationLabel::Human => "Human",
            ClassificationLabel::NonHuman => "Non-Human",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.overlay_text())
    }
}

/// 单帧处理结果，发送给 on_frame 观察者后即丢弃
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub frame_index: u64,
    pub label: ClassificationLabel,
    pub landmarks: LandmarkSet,
    /// 瞬时帧率（与上一帧时间间隔的倒数），首帧为 0
    pub instantaneous_rate: f64,
}

impl FrameOutcome {
    /// 画面叠加文字：分类标签与取整后的 FPS
    pub fn overlay_lines(&self) -> [String; 2] {
        [
            self.label.overlay_text().to_string(),
            format!("FPS: {}", self.instantaneous_rate as i64),
        ]
    }
}

/// 运行汇总，仅在帧源正常结束时生成一次
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_frames: u64,
    pub human_frames: u64,
    /// 平均帧率：总帧数 / 运行开始到结束的时长
    pub average_rate: f64,
    /// 判定为 Human 的帧占比 (0 - 100)
    pub accuracy_pct: f64,
}

impl RunSummary {
    /// 统计对话框文字
    pub fn dialog_text(&self) -> String {
        format!(
            "Average FPS: {}\nAccuracy: {:.2}%",
            self.average_rate as u64, self.accuracy_pct
        )
    }
}

/// 运行报告（命令行落盘用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub source: String,
    pub threshold: usize,
    pub started_at: String,
    pub finished_at: String,
    pub summary: RunSummary,
}

/// 生成唯一 ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 当前本地时间
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 获取应用数据目录
///
/// 优先级：环境变量 GAITGATE_DATA_DIR > 系统数据目录/gaitgate > 当前目录/data
pub fn get_app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GAITGATE_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join("gaitgate");
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("data")
}
