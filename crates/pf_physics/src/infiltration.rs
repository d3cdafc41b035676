// crates/pf_physics/src/infiltration.rs

//! 下渗模型
//!
//! 每个子迭代按土地利用分类逐单元移除水深，无邻域交互。
//!
//! # 模型
//!
//! - 下渗率查表：分类 0→0, 1→10, 2→5, 3→30 [mm/hr]
//! - 随运行进程衰减：`decay = max(0.1, 1 − progress·0.9)`，
//!   `progress = step_index / (num_steps − 1)`（单步调度时为 0）
//! - mm/hr 换算为本子迭代移除深度：乘以该步历时除以子迭代数
//! - 水深减去移除量，下限为零（不能移除超过现存水量）
//!
//! 在同一子迭代内紧随汇流扫描之后执行。

use crate::forcing::RainStep;
use crate::state::WaterState;
use pf_terrain::{TerrainField, LANDUSE_CLASSES};

/// 各土地利用分类的下渗率 [mm/hr]
pub const INFILTRATION_MM_PER_HR: [f64; LANDUSE_CLASSES] = [0.0, 10.0, 5.0, 30.0];

/// 衰减下限
const DECAY_FLOOR: f64 = 0.1;

/// 下渗模型
#[derive(Debug, Clone)]
pub struct InfiltrationModel {
    rates_mm_hr: [f64; LANDUSE_CLASSES],
}

impl Default for InfiltrationModel {
    fn default() -> Self {
        Self {
            rates_mm_hr: INFILTRATION_MM_PER_HR,
        }
    }
}

impl InfiltrationModel {
    /// 使用默认下渗率表创建
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义下渗率表创建
    pub fn with_rates(rates_mm_hr: [f64; LANDUSE_CLASSES]) -> Self {
        Self { rates_mm_hr }
    }

    /// 运行进程衰减因子
    ///
    /// `progress = step_index / (num_steps - 1)`，单步调度时进程为 0。
    #[inline]
    pub fn decay_factor(step_index: usize, num_steps: usize) -> f64 {
        let progress = if num_steps > 1 {
            step_index as f64 / (num_steps - 1) as f64
        } else {
            0.0
        };
        (1.0 - progress * 0.9).max(DECAY_FLOOR)
    }

    /// 对全部活跃单元执行一次下渗
    ///
    /// 逐单元操作当前缓冲，移除后水深不为负。
    pub fn apply(
        &self,
        terrain: &TerrainField,
        state: &mut WaterState,
        step: &RainStep,
        step_index: usize,
        num_steps: usize,
    ) {
        if step.sub_iterations == 0 {
            return;
        }

        let decay = Self::decay_factor(step_index, num_steps);
        let hours_per_iter = step.duration_hours() / step.sub_iterations as f64;

        let depth = state.depth_mut();
        for (i, d) in depth.iter_mut().enumerate() {
            if !terrain.is_active(i) {
                continue;
            }
            let rate = self.rates_mm_hr[terrain.landuse_class(i)];
            let removal_m = rate * decay / 1000.0 * hours_per_iter;
            *d = (*d - removal_m).max(0.0);
        }
    }
}
