// crates/pf_physics/src/forcing.rs

//! 降雨强迫序列
//!
//! 提供按序施加的降雨调度：每步包含降雨深度、真实历时和子迭代数。
//!
//! # 语义
//!
//! - 调度步严格按序执行，不重排、不重叠
//! - 每步降雨在其子迭代开始前一次性施加到全部活跃单元
//! - 三个平行输入列表长度必须一致，否则构建失败
//!
//! # 使用示例
//!
//! ```
//! use pf_physics::forcing::RainfallSchedule;
//!
//! let schedule = RainfallSchedule::from_parallel(
//!     vec![10.0, 5.0],   // mm
//!     vec![60.0, 30.0],  // 分钟
//!     vec![10, 5],       // 子迭代数
//! ).unwrap();
//! assert_eq!(schedule.len(), 2);
//! ```

use pf_foundation::error::{PfError, PfResult};
use serde::{Deserialize, Serialize};

/// 单个降雨调度步
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainStep {
    /// 降雨深度 [mm]
    pub depth_mm: f64,
    /// 真实历时 [分钟]
    pub duration_min: f64,
    /// 子迭代数
    pub sub_iterations: usize,
}

impl RainStep {
    /// 创建调度步
    pub fn new(depth_mm: f64, duration_min: f64, sub_iterations: usize) -> Self {
        Self {
            depth_mm,
            duration_min,
            sub_iterations,
        }
    }

    /// 降雨深度 [m]
    #[inline]
    pub fn depth_m(&self) -> f64 {
        self.depth_mm / 1000.0
    }

    /// 历时 [小时]
    #[inline]
    pub fn duration_hours(&self) -> f64 {
        self.duration_min / 60.0
    }
}

/// 降雨调度序列
///
/// 构建后只读，模拟期间不再修改。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RainfallSchedule {
    steps: Vec<RainStep>,
}

impl RainfallSchedule {
    /// 从调度步序列创建
    pub fn new(steps: Vec<RainStep>) -> Self {
        Self { steps }
    }

    /// 从三个平行列表创建
    ///
    /// 列表长度不一致时返回 `SizeMismatch` 错误。
    pub fn from_parallel(
        depth_mm: Vec<f64>,
        duration_min: Vec<f64>,
        sub_iterations: Vec<usize>,
    ) -> PfResult<Self> {
        PfError::check_size("duration_min", depth_mm.len(), duration_min.len())?;
        PfError::check_size("sub_iterations", depth_mm.len(), sub_iterations.len())?;

        let steps = depth_mm
            .into_iter()
            .zip(duration_min)
            .zip(sub_iterations)
            .map(|((mm, min), it)| RainStep::new(mm, min, it))
            .collect();
        Ok(Self { steps })
    }

    /// 调度步数量
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 调度步切片
    #[inline]
    pub fn steps(&self) -> &[RainStep] {
        &self.steps
    }

    /// 调度步迭代器
    pub fn iter(&self) -> impl Iterator<Item = &RainStep> {
        self.steps.iter()
    }

    /// 累计降雨深度 [mm]
    pub fn total_depth_mm(&self) -> f64 {
        self.steps.iter().map(|s| s.depth_mm).sum()
    }

    /// 累计子迭代数
    pub fn total_sub_iterations(&self) -> usize {
        self.steps.iter().map(|s| s.sub_iterations).sum()
    }
}
