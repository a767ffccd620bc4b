// 视频帧源模块
//
// 子模块：
// - source: 帧源能力接口（正常结束与读取故障严格区分）及内存、通道、录制回放三种实现

pub mod source;
