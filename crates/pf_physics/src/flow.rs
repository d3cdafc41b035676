// crates/pf_physics/src/flow.rs

//! 汇流求解
//!
//! 单次松弛扫描：按水头梯度在单元与其 D4 邻域之间再分配水深。
//!
//! # 算法
//!
//! 对每个活跃的内部单元（最外一圈作为封闭边界被排除）：
//!
//! 1. 水头 = 高程 + 水深
//! 2. 对 4 个正交邻居计算水头差（自身 − 邻居），正值为下坡候选
//! 3. 若正势之和 > 0，则将该单元 *全部当前水深* 按各邻居势占比分配
//! 4. 无下坡邻居时本次扫描水深不变
//!
//! 同步 (Jacobi) 更新：全部单元读取扫描开始时的快照，写入临时缓冲，
//! 整格处理完后交换，扫描内部顺序不影响结果。
//! 非活跃单元既不送出也不接收。

use crate::state::WaterState;
use crate::D4_OFFSETS;
use pf_terrain::TerrainField;

/// 汇流求解器
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowSolver;

impl FlowSolver {
    /// 创建求解器
    pub fn new() -> Self {
        Self
    }

    /// 执行一次松弛扫描
    ///
    /// 读当前缓冲、写临时缓冲，结束后交换。
    pub fn relax(&self, terrain: &TerrainField, state: &mut WaterState) {
        let width = terrain.width();
        let height = terrain.height();

        {
            let (depth, scratch) = state.buffers_mut();
            scratch.copy_from_slice(depth);

            for y in 1..height as i64 - 1 {
                for x in 1..width as i64 - 1 {
                    let idx = terrain.idx(x as usize, y as usize);
                    if !terrain.is_active(idx) {
                        continue;
                    }

                    let head = terrain.elevation(idx) + depth[idx];
                    let mut flows = [0.0_f64; 4];
                    let mut total = 0.0_f64;

                    for (d, &(dx, dy)) in D4_OFFSETS.iter().enumerate() {
                        let (nx, ny) = (x + dx, y + dy);
                        let n_idx = terrain.idx(nx as usize, ny as usize);
                        if !terrain.is_active(n_idx) {
                            continue;
                        }

                        let diff = head - (terrain.elevation(n_idx) + depth[n_idx]);
                        if diff > 0.0 {
                            flows[d] = diff;
                            total += diff;
                        }
                    }

                    if total > 0.0 {
                        for (d, &(dx, dy)) in D4_OFFSETS.iter().enumerate() {
                            if flows[d] <= 0.0 {
                                continue;
                            }
                            let (nx, ny) = (x + dx, y + dy);
                            let n_idx = terrain.idx(nx as usize, ny as usize);

                            // 按势占比分配全部水深，占比之和为 1
                            let amount = (flows[d] / total) * depth[idx];
                            scratch[idx] -= amount;
                            scratch[n_idx] += amount;
                        }
                    }
                }
            }
        }

        state.swap();
    }
}
