// crates/pf_physics/src/state.rs

//! 水深状态管理
//!
//! 提供双缓冲的逐单元水深场：当前缓冲 + 临时缓冲，
//! 每个子迭代交换一次，运行期间不再重新分配。
//!
//! # 设计说明
//!
//! 汇流采用同步 (Jacobi) 更新：所有单元读取子迭代开始时的快照，
//! 写入临时缓冲，整个栅格处理完毕后交换。双缓冲永不互为别名，
//! 因此单线程实现无需加锁，并发实现也只需保持快照语义。

use pf_terrain::TerrainField;

/// 水深状态（双缓冲）
///
/// 水深不变量：≥ 0，下渗和泵站取水后均受保护。
#[derive(Debug, Clone)]
pub struct WaterState {
    current: Vec<f64>,
    scratch: Vec<f64>,
}

impl WaterState {
    /// 创建全零水深场
    pub fn zeros(len: usize) -> Self {
        Self {
            current: vec![0.0; len],
            scratch: vec![0.0; len],
        }
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// 当前水深切片
    #[inline]
    pub fn depth(&self) -> &[f64] {
        &self.current
    }

    /// 当前水深可变切片
    #[inline]
    pub fn depth_mut(&mut self) -> &mut [f64] {
        &mut self.current
    }

    /// 拆分借用：当前缓冲只读 + 临时缓冲可写
    ///
    /// 用于 Jacobi 更新：读快照、写临时，互不别名。
    #[inline]
    pub fn buffers_mut(&mut self) -> (&[f64], &mut [f64]) {
        (&self.current, &mut self.scratch)
    }

    /// 交换当前缓冲与临时缓冲
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.scratch);
    }

    /// 向全部活跃单元均匀加水 [m]
    ///
    /// 非活跃单元（NaN / 无数据）不受降雨影响。
    pub fn add_uniform(&mut self, terrain: &TerrainField, depth_m: f64) {
        for (i, d) in self.current.iter_mut().enumerate() {
            if terrain.is_active(i) {
                *d += depth_m;
            }
        }
    }

    /// 总水量 [m·单元]（诊断用）
    pub fn total_depth(&self) -> f64 {
        self.current.iter().sum()
    }
}
