// crates/pf_terrain/src/field.rs

//! 地形场
//!
//! 提供模拟域的只读地形数据：高程、土地利用分类和无数据掩膜。
//!
//! # 设计说明
//!
//! - 扁平化索引 `idx = y * width + x`，与所有逐单元数组保持一致
//! - 高程为 NaN 或等于无数据哨兵值的单元视为 *非活跃*，
//!   被排除在降雨、汇流、下渗与泵站取水之外
//! - 土地利用分类超出 [0, 3] 时钳制为 0（既定策略，不报错）

use pf_foundation::error::{PfError, PfResult};

/// 土地利用分类数量
pub const LANDUSE_CLASSES: usize = 4;

/// 无数据哨兵比较容差
const NODATA_EPS: f64 = 1e-10;

/// 地形场
///
/// 模拟运行期间只读，构建一次后不再修改。
#[derive(Debug, Clone)]
pub struct TerrainField {
    width: usize,
    height: usize,
    elevation: Vec<f64>,
    landuse: Vec<i32>,
    nodata: Option<f64>,
}

impl TerrainField {
    /// 从高程与土地利用数组创建地形场
    ///
    /// 两个数组长度必须等于 `width * height`，否则返回错误。
    pub fn new(
        width: usize,
        height: usize,
        elevation: Vec<f64>,
        landuse: Vec<i32>,
        nodata: Option<f64>,
    ) -> PfResult<Self> {
        if width == 0 || height == 0 {
            return Err(PfError::invalid_input(format!(
                "栅格尺寸无效: {}x{}",
                width, height
            )));
        }
        PfError::check_size("elevation", width * height, elevation.len())?;
        PfError::check_size("landuse", width * height, landuse.len())?;

        Ok(Self {
            width,
            height,
            elevation,
            landuse,
            nodata,
        })
    }

    /// 创建均一地形（测试与合成场景用）
    ///
    /// 所有单元高程相同、土地利用分类相同、无无数据哨兵。
    pub fn uniform(width: usize, height: usize, elevation: f64, landuse_class: i32) -> Self {
        Self {
            width,
            height,
            elevation: vec![elevation; width * height],
            landuse: vec![landuse_class; width * height],
            nodata: None,
        }
    }

    /// 宽度（像素）
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// 高度（像素）
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// 单元总数
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 无数据哨兵值
    #[inline]
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// 扁平化索引
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// 坐标是否在栅格范围内
    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// 单元高程
    #[inline]
    pub fn elevation(&self, idx: usize) -> f64 {
        self.elevation[idx]
    }

    /// 单元是否活跃
    ///
    /// 高程为 NaN 或等于无数据哨兵的单元为非活跃。
    #[inline]
    pub fn is_active(&self, idx: usize) -> bool {
        let v = self.elevation[idx];
        if v.is_nan() {
            return false;
        }
        match self.nodata {
            Some(nd) => (v - nd).abs() >= NODATA_EPS,
            None => true,
        }
    }

    /// 单元土地利用分类
    ///
    /// 超出 [0, 3] 的分类值钳制为 0。
    #[inline]
    pub fn landuse_class(&self, idx: usize) -> usize {
        let k = self.landuse[idx];
        if k < 0 || k as usize >= LANDUSE_CLASSES {
            0
        } else {
            k as usize
        }
    }

    /// 活跃单元数
    pub fn active_cells(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_active(i)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_size_mismatch() {
        let r = TerrainField::new(3, 3, vec![0.0; 8], vec![0; 9], None);
        assert!(r.is_err());
    }

    #[test]
    fn test_new_zero_dims() {
        let r = TerrainField::new(0, 3, vec![], vec![], None);
        assert!(r.is_err());
    }

    #[test]
    fn test_active_mask() {
        let mut elev = vec![1.0; 9];
        elev[4] = f64::NAN;
        elev[5] = -32767.0;
        let t = TerrainField::new(3, 3, elev, vec![0; 9], Some(-32767.0)).unwrap();

        assert!(t.is_active(0));
        assert!(!t.is_active(4)); // NaN
        assert!(!t.is_active(5)); // 无数据哨兵
        assert_eq!(t.active_cells(), 7);
    }

    #[test]
    fn test_nodata_without_sentinel() {
        // 未配置哨兵时，仅 NaN 为非活跃
        let mut elev = vec![-32767.0; 4];
        elev[0] = f64::NAN;
        let t = TerrainField::new(2, 2, elev, vec![0; 4], None).unwrap();
        assert!(!t.is_active(0));
        assert!(t.is_active(1));
    }

    #[test]
    fn test_landuse_clamp() {
        let t = TerrainField::new(2, 2, vec![0.0; 4], vec![-1, 0, 3, 7], None).unwrap();
        assert_eq!(t.landuse_class(0), 0); // 负值钳制
        assert_eq!(t.landuse_class(1), 0);
        assert_eq!(t.landuse_class(2), 3);
        assert_eq!(t.landuse_class(3), 0); // 超界钳制
    }

    #[test]
    fn test_idx_and_bounds() {
        let t = TerrainField::uniform(4, 3, 0.0, 0);
        assert_eq!(t.idx(1, 2), 9);
        assert!(t.in_bounds(3, 2));
        assert!(!t.in_bounds(4, 0));
        assert!(!t.in_bounds(-1, 0));
    }
}
