// 帧源
//
// next_frame 返回 Ok(None) 表示流正常结束，Err 表示读取/解码故障。
// 文件类帧源是有限的，实时采集设备的帧源可以视为无界。

use crate::detection::recording::PoseRecording;
use crate::error::{AppError, AppResult};
use crate::utils::Frame;
use crossbeam_channel::{Receiver, Sender};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// 帧源能力接口
pub trait FrameSource: Send {
    fn describe(&self) -> String;

    fn next_frame(&mut self) -> AppResult<Option<Frame>>;
}

/// 内存帧源，可在指定位置注入读取故障
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: VecDeque<Frame>,
    fail_after: Option<u64>,
    produced: u64,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            fail_after: None,
            produced: 0,
        }
    }

    /// count 个不带像素数据的帧
    pub fn blank(count: u64, width: u32, height: u32) -> Self {
        Self::new((0..count).map(|i| Frame::without_pixels(i, width, height)).collect())
    }

    /// 产出 count 帧后报告读取故障
    pub fn failing_after(mut self, count: u64) -> Self {
        self.fail_after = Some(count);
        self
    }
}

impl FrameSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory({} frames)", self.frames.len() as u64 + self.produced)
    }

    fn next_frame(&mut self) -> AppResult<Option<Frame>> {
        if self.fail_after == Some(self.produced) {
            return Err(AppError::source_failure(self.produced, "读取帧失败"));
        }

        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.produced += 1;
        }
        Ok(frame)
    }
}

/// 通道帧源（实时采集）
///
/// 采集线程通过 Sender 推送帧；Sender 全部关闭即正常结束，推送 Err 表示设备故障。
pub struct ChannelSource {
    receiver: Receiver<AppResult<Frame>>,
    name: String,
}

impl ChannelSource {
    pub fn new(name: impl Into<String>, receiver: Receiver<AppResult<Frame>>) -> Self {
        Self {
            receiver,
            name: name.into(),
        }
    }
}

/// 创建有界帧通道，返回 (采集端, 帧源)
pub fn frame_channel(name: impl Into<String>, capacity: usize) -> (Sender<AppResult<Frame>>, ChannelSource) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (tx, ChannelSource::new(name, rx))
}

impl FrameSource for ChannelSource {
    fn describe(&self) -> String {
        format!("channel({})", self.name)
    }

    fn next_frame(&mut self) -> AppResult<Option<Frame>> {
        match self.receiver.recv() {
            Ok(Ok(frame)) => Ok(Some(frame)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                debug!("[SOURCE] 采集端已关闭: {}", self.name);
                Ok(None)
            }
        }
    }
}

/// 录制回放帧源：录制中每一条记录对应一帧
pub struct RecordingSource {
    recording: Arc<PoseRecording>,
    next_index: u64,
}

impl RecordingSource {
    pub fn new(recording: Arc<PoseRecording>) -> Self {
        Self {
            recording,
            next_index: 0,
        }
    }
}

impl FrameSource for RecordingSource {
    fn describe(&self) -> String {
        format!(
            "recording({}x{}, {} frames)",
            self.recording.width,
            self.recording.height,
            self.recording.frame_count()
        )
    }

    fn next_frame(&mut self) -> AppResult<Option<Frame>> {
        if self.next_index >= self.recording.frame_count() as u64 {
            return Ok(None);
        }
        let frame = Frame::without_pixels(self.next_index, self.recording.width, self.recording.height);
        self.next_index += 1;
        Ok(Some(frame))
    }
}
