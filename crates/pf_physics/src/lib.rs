// crates/pf_physics/src/lib.rs

//! 积水模拟核心
//!
//! 提供地表积水与排水过程的时间步进模拟，包括：
//! - 降雨强迫序列 (forcing)
//! - 水深状态管理 (state) - 双缓冲
//! - 汇流求解 (flow) - D4 邻域按水头梯度再分配
//! - 下渗模型 (infiltration) - 按土地利用分类查表，随进程衰减
//! - 泵站控制 (pump) - 带迟滞与冷却的状态机
//! - 平滑后处理 (smoothing)
//! - 引擎核心 (engine) - 调度序列驱动的主循环与构建器
//!
//! # 控制流
//!
//! 每个调度步先一次性施加该步降雨，再按子迭代数依次执行
//! 汇流 → 下渗 → 泵站评估；全部步完成后由平滑器导出结果场。
//!
//! # Trait 抽象
//!
//! - [`PumpLogSink`]: 泵站事件日志接口，由 pf_io 提供 CSV 实现

#![warn(clippy::all)]

pub mod engine;
pub mod flow;
pub mod forcing;
pub mod infiltration;
pub mod pump;
pub mod smoothing;
pub mod state;

// 重导出常用类型
pub use engine::{EngineConfig, PumpPlacement, RunStats, Simulation, SimulationBuilder};
pub use flow::FlowSolver;
pub use forcing::{RainStep, RainfallSchedule};
pub use infiltration::InfiltrationModel;
pub use pump::{
    MemoryPumpLog, NullPumpLog, Pump, PumpController, PumpLogRecord, PumpLogSink, PumpSpec,
    PumpState,
};
pub use smoothing::Smoother;
pub use state::WaterState;

/// D4 邻域偏移 (西, 东, 北, 南)，固定顺序
pub const D4_OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
