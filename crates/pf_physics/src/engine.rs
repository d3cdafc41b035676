// crates/pf_physics/src/engine.rs

//! 引擎核心
//!
//! 由降雨调度序列驱动的主循环：每个调度步先一次性施加降雨，
//! 再按该步子迭代数依次执行 汇流 → 下渗 → 泵站评估。
//! 全部步完成后由平滑器导出最终水深场。
//!
//! # 架构说明
//!
//! 引擎完全串行、单线程；水深双缓冲按单写者纪律顺序访问，
//! 不需要任何加锁。泵站按固定数组顺序评估，日志为同步副作用。
//!
//! # 使用示例
//!
//! ```
//! use pf_physics::{EngineConfig, NullPumpLog, RainfallSchedule, SimulationBuilder};
//! use pf_terrain::TerrainField;
//!
//! let terrain = TerrainField::uniform(5, 5, 0.0, 0);
//! let schedule = RainfallSchedule::from_parallel(vec![10.0], vec![60.0], vec![1]).unwrap();
//!
//! let mut sim = SimulationBuilder::new(EngineConfig::default())
//!     .with_terrain(terrain)
//!     .with_schedule(schedule)
//!     .build()
//!     .unwrap();
//!
//! let mut log = NullPumpLog;
//! let stats = sim.run(&mut log).unwrap();
//! assert_eq!(stats.sub_iterations, 1);
//! let result = sim.output();
//! ```

use crate::flow::FlowSolver;
use crate::forcing::RainfallSchedule;
use crate::infiltration::InfiltrationModel;
use crate::pump::{Pump, PumpController, PumpLogSink, PumpSpec};
use crate::smoothing::Smoother;
use crate::state::WaterState;
use pf_foundation::error::{PfError, PfResult};
use pf_terrain::TerrainField;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// 引擎配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 像素分辨率 [m]
    #[serde(default = "default_cell_size")]
    pub cell_size_m: f64,

    /// 泵站状态切换后的冷却子迭代数
    #[serde(default = "default_pump_cooldown")]
    pub pump_cooldown: u32,
}

fn default_cell_size() -> f64 {
    0.5
}
fn default_pump_cooldown() -> u32 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cell_size_m: default_cell_size(),
            pump_cooldown: default_pump_cooldown(),
        }
    }
}

impl EngineConfig {
    /// 单像素面积 [m²]
    #[inline]
    pub fn cell_area_m2(&self) -> f64 {
        self.cell_size_m * self.cell_size_m
    }
}

/// 运行统计
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    /// 完成的调度步数
    pub steps: usize,
    /// 完成的子迭代总数
    pub sub_iterations: usize,
    /// 计算耗时 [s]
    pub elapsed_secs: f64,
}

/// 泵站布设（参数 + 已解析像素坐标）
#[derive(Debug, Clone, Copy)]
pub struct PumpPlacement {
    /// 泵站参数
    pub spec: PumpSpec,
    /// 取水像素 (列, 行)，可能越界
    pub source_px: (i64, i64),
    /// 排水像素 (列, 行)，可能越界
    pub discharge_px: (i64, i64),
}

/// 模拟构建器
///
/// 校验输入、一次性分配全部缓冲；配置异常在此失败，
/// 不会留下半初始化的模拟状态。
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    config: EngineConfig,
    terrain: Option<TerrainField>,
    schedule: RainfallSchedule,
    placements: Vec<PumpPlacement>,
}

impl SimulationBuilder {
    /// 创建构建器
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            terrain: None,
            schedule: RainfallSchedule::default(),
            placements: Vec::new(),
        }
    }

    /// 设置地形场
    pub fn with_terrain(mut self, terrain: TerrainField) -> Self {
        self.terrain = Some(terrain);
        self
    }

    /// 设置降雨调度
    pub fn with_schedule(mut self, schedule: RainfallSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// 追加一个泵站
    pub fn with_pump(mut self, placement: PumpPlacement) -> Self {
        self.placements.push(placement);
        self
    }

    /// 批量设置泵站
    pub fn with_pumps(mut self, placements: Vec<PumpPlacement>) -> Self {
        self.placements = placements;
        self
    }

    /// 构建模拟
    pub fn build(self) -> PfResult<Simulation> {
        let terrain = self
            .terrain
            .ok_or_else(|| PfError::config("未设置地形场"))?;

        if self.config.cell_size_m <= 0.0 {
            return Err(PfError::invalid_config(
                "cell_size_m",
                self.config.cell_size_m.to_string(),
                "必须为正",
            ));
        }

        let pumps: Vec<Pump> = self
            .placements
            .iter()
            .enumerate()
            .map(|(id, p)| {
                Pump::resolve(
                    id,
                    p.spec,
                    p.source_px,
                    p.discharge_px,
                    &terrain,
                    self.config.cell_size_m,
                )
            })
            .collect();

        let state = WaterState::zeros(terrain.len());
        let controller =
            PumpController::new(pumps, self.config.pump_cooldown, self.config.cell_area_m2());

        Ok(Simulation {
            config: self.config,
            terrain,
            schedule: self.schedule,
            state,
            flow: FlowSolver::new(),
            infiltration: InfiltrationModel::new(),
            pumps: controller,
            smoother: Smoother::new(),
        })
    }
}

/// 积水模拟
pub struct Simulation {
    config: EngineConfig,
    terrain: TerrainField,
    schedule: RainfallSchedule,
    state: WaterState,
    flow: FlowSolver,
    infiltration: InfiltrationModel,
    pumps: PumpController,
    smoother: Smoother,
}

impl Simulation {
    /// 引擎配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 地形场
    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    /// 当前水深切片
    pub fn depth(&self) -> &[f64] {
        self.state.depth()
    }

    /// 泵站控制器
    pub fn pumps(&self) -> &PumpController {
        &self.pumps
    }

    /// 执行全部调度步
    ///
    /// 每步顺序：施加降雨（一次）→ 子迭代循环（汇流 → 下渗 → 泵站）。
    /// 日志写出失败视为致命错误，立即中止。
    pub fn run(&mut self, sink: &mut dyn PumpLogSink) -> PfResult<RunStats> {
        let num_steps = self.schedule.len();
        let start = Instant::now();
        let mut total_sub = 0usize;

        info!(
            "模拟启动: {}x{} 栅格, {} 调度步, {} 泵站",
            self.terrain.width(),
            self.terrain.height(),
            num_steps,
            self.pumps.len()
        );

        for step_index in 0..num_steps {
            let step = self.schedule.steps()[step_index];
            info!(
                "调度步 {}/{}: {} mm / {} min, {} 子迭代",
                step_index + 1,
                num_steps,
                step.depth_mm,
                step.duration_min,
                step.sub_iterations
            );

            // 本步降雨一次性施加到全部活跃单元
            self.state.add_uniform(&self.terrain, step.depth_m());

            for sub in 0..step.sub_iterations {
                self.flow.relax(&self.terrain, &mut self.state);
                self.infiltration.apply(
                    &self.terrain,
                    &mut self.state,
                    &step,
                    step_index,
                    num_steps,
                );
                self.pumps.evaluate(
                    &self.terrain,
                    &mut self.state,
                    step_index,
                    sub,
                    step.duration_hours(),
                    step.sub_iterations,
                    sink,
                )?;
                total_sub += 1;
            }
        }

        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "模拟完成: {} 调度步, {} 子迭代, 耗时 {:.2} s",
            num_steps, total_sub, elapsed
        );

        Ok(RunStats {
            steps: num_steps,
            sub_iterations: total_sub,
            elapsed_secs: elapsed,
        })
    }

    /// 导出平滑后的最终水深场
    pub fn output(&self) -> Vec<f64> {
        self.smoother.smooth(&self.terrain, self.state.depth())
    }
}
