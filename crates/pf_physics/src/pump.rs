// crates/pf_physics/src/pump.rs

//! 泵站控制
//!
//! 维护有序的泵站状态机集合，每个子迭代执行一次激活与取水逻辑。
//!
//! # 状态机
//!
//! 状态 ∈ {INACTIVE, ACTIVE}，初始 INACTIVE：
//!
//! - INACTIVE → ACTIVE：源单元水深 > `threshold_on` 且冷却计数为 0
//! - ACTIVE → INACTIVE：源单元水深 < `threshold_off` 且冷却计数为 0，
//!   其中 `threshold_off = threshold_on · (1 − 0.1)`，下限 0
//! - 任何状态切换都将冷却计数重置为配置的子迭代数，防止抖动
//! - 冷却计数每个子迭代递减 1，与状态无关
//!
//! # 取水
//!
//! 仅 ACTIVE 状态取水：以源像素为圆心、按栅格分辨率换算的像素半径
//! （最小 1 像素）构成离散圆盘，逐单元移除 `min(水深, 目标深度)`，
//! 累计移除量整体加到排水单元（无损耗，既定设计选择，不做再平衡）。
//!
//! # 失效泵站
//!
//! 源或排水像素落在栅格界外的泵站在构建时被永久禁用（标记 invalid，
//! 不再评估），这是可恢复情况而非错误。
//!
//! 每个 (步, 子迭代, 泵) 无论状态如何都产生一条日志记录，立即落盘。

use crate::state::WaterState;
use glam::DVec2;
use pf_foundation::error::PfResult;
use pf_terrain::TerrainField;
use tracing::warn;

/// 迟滞比例：`threshold_off = threshold_on · (1 − HYSTERESIS_FRACTION)`
pub const HYSTERESIS_FRACTION: f64 = 0.1;

/// 泵站状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PumpState {
    /// 停机（初始状态）
    #[default]
    Inactive,
    /// 运行中
    Active,
}

/// 泵站参数（构建输入）
///
/// 地理点使用 `DVec2`，约定 x = 经度，y = 纬度。
#[derive(Debug, Clone, Copy)]
pub struct PumpSpec {
    /// 取水点（经度, 纬度）
    pub source: DVec2,
    /// 排水点（经度, 纬度）
    pub discharge: DVec2,
    /// 抽水能力 [m³/hr]
    pub capacity_m3_hr: f64,
    /// 激活阈值水深 [m]
    pub threshold_on: f64,
    /// 取水半径 [m]
    pub radius_m: f64,
}

/// 泵站（状态机实例）
#[derive(Debug, Clone)]
pub struct Pump {
    id: usize,
    spec: PumpSpec,
    source_px: (i64, i64),
    radius_px: i64,
    threshold_off: f64,
    state: PumpState,
    cooldown: u32,
    valid: bool,
    source_idx: usize,
    discharge_idx: usize,
}

impl Pump {
    /// 从参数与已解析的像素坐标创建泵站
    ///
    /// 源或排水像素越界时标记为失效并告警，不会报错。
    pub fn resolve(
        id: usize,
        spec: PumpSpec,
        source_px: (i64, i64),
        discharge_px: (i64, i64),
        terrain: &TerrainField,
        cell_size_m: f64,
    ) -> Self {
        let valid = terrain.in_bounds(source_px.0, source_px.1)
            && terrain.in_bounds(discharge_px.0, discharge_px.1);
        if !valid {
            warn!(
                "泵站 {} 像素越界，已永久禁用: source={:?}, discharge={:?}",
                id, source_px, discharge_px
            );
        }

        let (source_idx, discharge_idx) = if valid {
            (
                terrain.idx(source_px.0 as usize, source_px.1 as usize),
                terrain.idx(discharge_px.0 as usize, discharge_px.1 as usize),
            )
        } else {
            (0, 0)
        };

        Self {
            id,
            spec,
            source_px,
            radius_px: ((spec.radius_m / cell_size_m) as i64).max(1),
            threshold_off: (spec.threshold_on * (1.0 - HYSTERESIS_FRACTION)).max(0.0),
            state: PumpState::Inactive,
            cooldown: 0,
            valid,
            source_idx,
            discharge_idx,
        }
    }

    /// 泵站编号
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// 当前状态
    #[inline]
    pub fn state(&self) -> PumpState {
        self.state
    }

    /// 是否有效（像素均在界内）
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// 是否运行中
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == PumpState::Active
    }

    /// 关断阈值 [m]
    #[inline]
    pub fn threshold_off(&self) -> f64 {
        self.threshold_off
    }

    /// 像素半径
    #[inline]
    pub fn radius_px(&self) -> i64 {
        self.radius_px
    }
}

/// 单条泵站事件记录
///
/// 每个 (步, 子迭代, 泵) 一条，字段与外部日志接口一一对应。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpLogRecord {
    /// 调度步编号
    pub step: usize,
    /// 子迭代编号
    pub sub_iteration: usize,
    /// 泵站编号
    pub pump_id: usize,
    /// 取水点纬度
    pub source_lat: f64,
    /// 取水点经度
    pub source_lon: f64,
    /// 排水点纬度
    pub discharge_lat: f64,
    /// 排水点经度
    pub discharge_lon: f64,
    /// 源单元水深 [m]
    pub depth_at_source: f64,
    /// 激活阈值 [m]
    pub threshold_on: f64,
    /// 关断阈值 [m]
    pub threshold_off: f64,
    /// 本子迭代抽水深度 [m]
    pub pumped_depth: f64,
    /// 是否运行中
    pub active: bool,
}

/// 泵站事件日志接口
///
/// 核心将日志视为同步副作用，每条记录立即落盘；
/// CSV 实现由 pf_io 提供。
pub trait PumpLogSink {
    /// 写出一条记录并立即刷新
    fn record(&mut self, record: &PumpLogRecord) -> PfResult<()>;
}

/// 空日志（测试与无日志运行用）
#[derive(Debug, Default)]
pub struct NullPumpLog;

impl PumpLogSink for NullPumpLog {
    fn record(&mut self, _record: &PumpLogRecord) -> PfResult<()> {
        Ok(())
    }
}

/// 内存日志（测试用，收集全部记录）
#[derive(Debug, Default)]
pub struct MemoryPumpLog {
    /// 收集到的记录
    pub records: Vec<PumpLogRecord>,
}

impl PumpLogSink for MemoryPumpLog {
    fn record(&mut self, record: &PumpLogRecord) -> PfResult<()> {
        self.records.push(*record);
        Ok(())
    }
}

/// 泵站控制器
///
/// 持有有序泵站数组，按固定数组顺序逐泵评估；
/// 泵站共享水深栅格但互不访问彼此状态。
#[derive(Debug, Clone)]
pub struct PumpController {
    pumps: Vec<Pump>,
    cooldown_reset: u32,
    cell_area_m2: f64,
}

impl PumpController {
    /// 创建控制器
    ///
    /// `cooldown_reset` 为状态切换后的冷却子迭代数，
    /// `cell_area_m2` 为单像素面积，用于容量→深度换算。
    pub fn new(pumps: Vec<Pump>, cooldown_reset: u32, cell_area_m2: f64) -> Self {
        Self {
            pumps,
            cooldown_reset,
            cell_area_m2,
        }
    }

    /// 泵站数量
    #[inline]
    pub fn len(&self) -> usize {
        self.pumps.len()
    }

    /// 是否无泵
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pumps.is_empty()
    }

    /// 泵站切片
    #[inline]
    pub fn pumps(&self) -> &[Pump] {
        &self.pumps
    }

    /// 对全部泵站执行一次评估
    ///
    /// 固定数组顺序；每泵一条日志记录，无论状态。
    pub fn evaluate(
        &mut self,
        terrain: &TerrainField,
        state: &mut WaterState,
        step_index: usize,
        sub_iteration: usize,
        duration_hours: f64,
        sub_iterations: usize,
        sink: &mut dyn PumpLogSink,
    ) -> PfResult<()> {
        let depth = state.depth_mut();

        for pump in &mut self.pumps {
            if !pump.valid {
                // 失效泵站不访问栅格，仅保持日志矩形完整
                sink.record(&Self::make_record(pump, step_index, sub_iteration, 0.0, 0.0))?;
                continue;
            }

            let depth_at_source = depth[pump.source_idx];

            // 状态切换（需冷却计数归零）
            match pump.state {
                PumpState::Inactive => {
                    if depth_at_source > pump.spec.threshold_on && pump.cooldown == 0 {
                        pump.state = PumpState::Active;
                        pump.cooldown = self.cooldown_reset;
                    }
                }
                PumpState::Active => {
                    if depth_at_source < pump.threshold_off && pump.cooldown == 0 {
                        pump.state = PumpState::Inactive;
                        pump.cooldown = self.cooldown_reset;
                    }
                }
            }

            // 取水（仅 ACTIVE；圆盘为空或干燥时可低于额定能力）
            let mut pumped = 0.0;
            if pump.state == PumpState::Active && sub_iterations > 0 {
                let cells = Self::disk_cells(terrain, pump.source_px, pump.radius_px);
                if !cells.is_empty() {
                    let volume_m3 =
                        pump.spec.capacity_m3_hr * (duration_hours / sub_iterations as f64);
                    let target_per_cell =
                        volume_m3 / (self.cell_area_m2 * cells.len() as f64);

                    for &idx in &cells {
                        let removed = depth[idx].min(target_per_cell);
                        depth[idx] -= removed;
                        pumped += removed;
                    }
                    depth[pump.discharge_idx] += pumped;
                }
            }

            // 冷却计数递减，与状态无关
            if pump.cooldown > 0 {
                pump.cooldown -= 1;
            }

            sink.record(&Self::make_record(
                pump,
                step_index,
                sub_iteration,
                depth_at_source,
                pumped,
            ))?;
        }

        Ok(())
    }

    /// 取水圆盘：界内且活跃、欧氏距离平方 ≤ 半径平方的单元
    fn disk_cells(terrain: &TerrainField, center: (i64, i64), radius_px: i64) -> Vec<usize> {
        let (cx, cy) = center;
        let r2 = radius_px * radius_px;
        let mut cells = Vec::new();

        for y in (cy - radius_px)..=(cy + radius_px) {
            for x in (cx - radius_px)..=(cx + radius_px) {
                if !terrain.in_bounds(x, y) {
                    continue;
                }
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let idx = terrain.idx(x as usize, y as usize);
                if terrain.is_active(idx) {
                    cells.push(idx);
                }
            }
        }
        cells
    }

    fn make_record(
        pump: &Pump,
        step: usize,
        sub_iteration: usize,
        depth_at_source: f64,
        pumped_depth: f64,
    ) -> PumpLogRecord {
        PumpLogRecord {
            step,
            sub_iteration,
            pump_id: pump.id,
            source_lat: pump.spec.source.y,
            source_lon: pump.spec.source.x,
            discharge_lat: pump.spec.discharge.y,
            discharge_lon: pump.spec.discharge.x,
            depth_at_source,
            threshold_on: pump.spec.threshold_on,
            threshold_off: pump.threshold_off,
            pumped_depth,
            active: pump.state == PumpState::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(threshold_on: f64, capacity: f64, radius_m: f64) -> PumpSpec {
        PumpSpec {
            source: DVec2::new(106.8, -6.2),
            discharge: DVec2::new(106.9, -6.1),
            capacity_m3_hr: capacity,
            threshold_on,
            radius_m,
        }
    }

    /// 9x9 平坦地形，单泵控制器
    fn setup(
        threshold_on: f64,
        capacity: f64,
        cooldown: u32,
    ) -> (TerrainField, WaterState, PumpController) {
        let terrain = TerrainField::uniform(9, 9, 0.0, 0);
        let state = WaterState::zeros(81);
        let pump = Pump::resolve(
            0,
            spec(threshold_on, capacity, 1.0),
            (4, 4),
            (7, 7),
            &terrain,
            1.0,
        );
        let ctl = PumpController::new(vec![pump], cooldown, 1.0);
        (terrain, state, ctl)
    }

    #[test]
    fn test_threshold_off_hysteresis() {
        let t = TerrainField::uniform(3, 3, 0.0, 0);
        let p = Pump::resolve(0, spec(0.5, 10.0, 1.0), (1, 1), (1, 1), &t, 1.0);
        assert!((p.threshold_off() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_radius_px_minimum_one() {
        let t = TerrainField::uniform(3, 3, 0.0, 0);
        // 0.3 m 半径 / 0.5 m 分辨率 → 截断为 0 → 下限 1 像素
        let p = Pump::resolve(0, spec(0.5, 10.0, 0.3), (1, 1), (1, 1), &t, 0.5);
        assert_eq!(p.radius_px(), 1);

        let p = Pump::resolve(0, spec(0.5, 10.0, 2.0), (1, 1), (1, 1), &t, 0.5);
        assert_eq!(p.radius_px(), 4);
    }

    #[test]
    fn test_out_of_bounds_pump_disabled() {
        let t = TerrainField::uniform(3, 3, 0.0, 0);
        let p = Pump::resolve(0, spec(0.5, 10.0, 1.0), (5, 1), (1, 1), &t, 1.0);
        assert!(!p.is_valid());

        let p = Pump::resolve(0, spec(0.5, 10.0, 1.0), (1, 1), (-1, 0), &t, 1.0);
        assert!(!p.is_valid());
    }

    #[test]
    fn test_activation_and_extraction() {
        let (terrain, mut state, mut ctl) = setup(0.5, 3600.0, 0);
        state.depth_mut()[terrain.idx(4, 4)] = 0.6;

        let mut log = MemoryPumpLog::default();
        ctl.evaluate(&terrain, &mut state, 0, 0, 1.0, 1, &mut log).unwrap();

        assert!(ctl.pumps()[0].is_active());
        let rec = &log.records[0];
        assert!(rec.active);
        assert!(rec.pumped_depth > 0.0);
        // 排水单元收到累计抽水深度
        assert!((state.depth()[terrain.idx(7, 7)] - rec.pumped_depth).abs() < 1e-12);
    }

    #[test]
    fn test_below_threshold_stays_inactive() {
        let (terrain, mut state, mut ctl) = setup(0.5, 3600.0, 0);
        state.depth_mut()[terrain.idx(4, 4)] = 0.5; // 不超过阈值（严格大于）

        let mut log = NullPumpLog;
        ctl.evaluate(&terrain, &mut state, 0, 0, 1.0, 1, &mut log).unwrap();
        assert!(!ctl.pumps()[0].is_active());
    }

    #[test]
    fn test_extraction_never_negative() {
        // 大容量泵在近乎干燥的圆盘上：移除量受 min(水深, 目标) 约束
        let (terrain, mut state, mut ctl) = setup(0.1, 1e6, 0);
        state.depth_mut()[terrain.idx(4, 4)] = 0.2;

        let mut log = MemoryPumpLog::default();
        ctl.evaluate(&terrain, &mut state, 0, 0, 1.0, 1, &mut log).unwrap();

        assert!(state.depth().iter().all(|&d| d >= 0.0));
        // 实际抽水不超过圆盘现存总水量
        assert!(log.records[0].pumped_depth <= 0.2 + 1e-12);
    }

    #[test]
    fn test_hysteresis_band_keeps_active() {
        // 水深位于 [threshold_off, threshold_on] 区间内时保持 ACTIVE
        let (terrain, mut state, mut ctl) = setup(0.5, 0.0, 0);
        let src = terrain.idx(4, 4);

        state.depth_mut()[src] = 0.6;
        let mut log = NullPumpLog;
        ctl.evaluate(&terrain, &mut state, 0, 0, 1.0, 1, &mut log).unwrap();
        assert!(ctl.pumps()[0].is_active());

        // 降到迟滞带内：仍 ACTIVE
        state.depth_mut()[src] = 0.47;
        ctl.evaluate(&terrain, &mut state, 0, 1, 1.0, 1, &mut log).unwrap();
        assert!(ctl.pumps()[0].is_active());

        // 低于 threshold_off：关断
        state.depth_mut()[src] = 0.44;
        ctl.evaluate(&terrain, &mut state, 0, 2, 1.0, 1, &mut log).unwrap();
        assert!(!ctl.pumps()[0].is_active());
    }

    #[test]
    fn test_cooldown_separates_transitions() {
        // 冷却 3：切换后至少间隔 3 个子迭代才允许再次切换
        let (terrain, mut state, mut ctl) = setup(0.5, 0.0, 3);
        let src = terrain.idx(4, 4);
        let mut log = NullPumpLog;

        state.depth_mut()[src] = 0.6;
        ctl.evaluate(&terrain, &mut state, 0, 0, 1.0, 1, &mut log).unwrap();
        assert!(ctl.pumps()[0].is_active());

        // 立即降到关断阈值以下，冷却期间不允许切换
        state.depth_mut()[src] = 0.1;
        ctl.evaluate(&terrain, &mut state, 0, 1, 1.0, 1, &mut log).unwrap();
        assert!(ctl.pumps()[0].is_active());
        ctl.evaluate(&terrain, &mut state, 0, 2, 1.0, 1, &mut log).unwrap();
        assert!(ctl.pumps()[0].is_active());

        // 第 3 个子迭代后冷却归零，允许关断
        ctl.evaluate(&terrain, &mut state, 0, 3, 1.0, 1, &mut log).unwrap();
        assert!(!ctl.pumps()[0].is_active());
    }

    #[test]
    fn test_invalid_pump_logs_zero() {
        let terrain = TerrainField::uniform(3, 3, 0.0, 0);
        let mut state = WaterState::zeros(9);
        let pump = Pump::resolve(0, spec(0.5, 100.0, 1.0), (9, 9), (1, 1), &terrain, 1.0);
        let mut ctl = PumpController::new(vec![pump], 0, 1.0);

        let mut log = MemoryPumpLog::default();
        ctl.evaluate(&terrain, &mut state, 0, 0, 1.0, 1, &mut log).unwrap();

        let rec = &log.records[0];
        assert!(!rec.active);
        assert_eq!(rec.pumped_depth, 0.0);
        assert!(!ctl.pumps()[0].is_active());
    }

    #[test]
    fn test_disk_excludes_inactive_cells() {
        let mut elev = vec![0.0; 81];
        elev[4 * 9 + 5] = f64::NAN; // 圆盘内一个非活跃单元
        let terrain = TerrainField::new(9, 9, elev, vec![0; 81], None).unwrap();

        let cells = PumpController::disk_cells(&terrain, (4, 4), 1);
        // 半径 1 的 D4 圆盘本应 5 个单元，排除非活跃后 4 个
        assert_eq!(cells.len(), 4);
        assert!(!cells.contains(&(4 * 9 + 5)));
    }

    #[test]
    fn test_pumps_evaluated_in_order() {
        let terrain = TerrainField::uniform(9, 9, 0.0, 0);
        let mut state = WaterState::zeros(81);
        state.depth_mut()[terrain.idx(2, 2)] = 0.9;
        state.depth_mut()[terrain.idx(6, 6)] = 0.9;

        let p0 = Pump::resolve(0, spec(0.5, 0.0, 1.0), (2, 2), (1, 1), &terrain, 1.0);
        let p1 = Pump::resolve(1, spec(0.5, 0.0, 1.0), (6, 6), (1, 1), &terrain, 1.0);
        let mut ctl = PumpController::new(vec![p0, p1], 0, 1.0);

        let mut log = MemoryPumpLog::default();
        ctl.evaluate(&terrain, &mut state, 0, 0, 1.0, 1, &mut log).unwrap();

        let ids: Vec<usize> = log.records.iter().map(|r| r.pump_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
