// 人物检测模块
//
// 对每一帧做姿态关键点检测，按关键点数量判定画面中是否有人。
//
// 子模块：
// - classifier: 关键点数量阈值分类（固定规则，不做训练）
// - detector: 姿态检测器能力接口，以及回放录制数据 / 脚本化的检测器实现
// - recording: 姿态录制文件（每帧归一化关键点）的读取与换算

pub mod classifier;
pub mod detector;
pub mod recording;
