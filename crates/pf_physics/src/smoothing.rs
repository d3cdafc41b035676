// crates/pf_physics/src/smoothing.rs

//! 平滑后处理
//!
//! 对最终水深场做一次邻域平均，消除单像素尖峰。
//!
//! # 规则
//!
//! 对每个活跃的内部单元，按固定方向顺序检查 4 个正交邻居：
//! 在水深 ≥ 自身水深的活跃邻居中取平均；没有这样的邻居时保持原值。
//! 边界与无数据单元原样通过。
//!
//! 纯空间修饰性处理，不保证体积守恒，不属于物理模型。

use crate::D4_OFFSETS;
use pf_terrain::TerrainField;

/// 平滑器
#[derive(Debug, Clone, Copy, Default)]
pub struct Smoother;

impl Smoother {
    /// 创建平滑器
    pub fn new() -> Self {
        Self
    }

    /// 对水深场执行一次平滑，返回新场
    pub fn smooth(&self, terrain: &TerrainField, depth: &[f64]) -> Vec<f64> {
        let width = terrain.width();
        let height = terrain.height();
        let mut out = depth.to_vec();

        for y in 1..height as i64 - 1 {
            for x in 1..width as i64 - 1 {
                let idx = terrain.idx(x as usize, y as usize);
                if !terrain.is_active(idx) {
                    continue;
                }

                let mut sum = 0.0;
                let mut count = 0usize;
                for &(dx, dy) in &D4_OFFSETS {
                    let n_idx = terrain.idx((x + dx) as usize, (y + dy) as usize);
                    if !terrain.is_active(n_idx) {
                        continue;
                    }
                    if depth[n_idx] >= depth[idx] {
                        sum += depth[n_idx];
                        count += 1;
                    }
                }

                if count > 0 {
                    out[idx] = sum / count as f64;
                }
            }
        }

        out
    }
}
