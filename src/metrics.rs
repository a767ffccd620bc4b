// 运行统计模块
//
// 单次运行内的帧计数、瞬时帧率与汇总。每次运行开始时重新创建，不跨运行保留。
// 除数为 0 的情况（首帧、空流、零时长）一律定义为 0，任何长度的运行都能得到完整汇总。

use crate::utils::{ClassificationLabel, RunSummary};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// 时钟能力接口
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// 系统单调时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 手动时钟：第 n 次读取返回 base + step * n，用于可复现的运行
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    step: Duration,
    ticks: AtomicU32,
}

impl ManualClock {
    pub fn new(base: Instant, step: Duration) -> Self {
        Self {
            base,
            step,
            ticks: AtomicU32::new(0),
        }
    }

    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let n = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.base + self.step * n
    }
}

/// 流统计
#[derive(Debug, Clone, Default)]
pub struct StreamMetrics {
    total_frames: u64,
    human_frames: u64,
    previous_timestamp: Option<Instant>,
    run_start_timestamp: Option<Instant>,
}

impl StreamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 重置计数，以 now 作为本次运行的起点
    pub fn start(&mut self, now: Instant) {
        *self = Self {
            run_start_timestamp: Some(now),
            ..Self::default()
        };
    }

    /// 记录一帧，返回瞬时帧率
    ///
    /// 必须按帧到达顺序调用：帧率取决于相邻两帧的时间差。
    pub fn record_frame(&mut self, label: ClassificationLabel, now: Instant) -> f64 {
        self.total_frames += 1;
        if label.is_human() {
            self.human_frames += 1;
        }

        let rate = match self.previous_timestamp {
            Some(previous) => reciprocal(now.saturating_duration_since(previous)),
            None => 0.0,
        };
        self.previous_timestamp = Some(now);

        debug!("[METRICS] 帧 #{}: {}, 瞬时帧率={:.2}", self.total_frames, label, rate);
        rate
    }

    /// 生成汇总
    pub fn finish(&self, now: Instant) -> RunSummary {
        let average_rate = match self.run_start_timestamp {
            Some(start) if self.total_frames > 0 => {
                let elapsed = now.saturating_duration_since(start).as_secs_f64();
                if elapsed > 0.0 {
                    self.total_frames as f64 / elapsed
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let accuracy_pct = if self.total_frames == 0 {
            0.0
        } else {
            100.0 * self.human_frames as f64 / self.total_frames as f64
        };

        RunSummary {
            total_frames: self.total_frames,
            human_frames: self.human_frames,
            average_rate,
            accuracy_pct,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn human_frames(&self) -> u64 {
        self.human_frames
    }
}

fn reciprocal(elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        1.0 / secs
    } else {
        0.0
    }
}
