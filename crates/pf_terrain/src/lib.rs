// crates/pf_terrain/src/lib.rs

//! 地形数据管理
//!
//! 提供高程与土地利用栅格的存储和访问。
//!
//! # 模块
//!
//! - `field`: 地形场（高程 + 土地利用 + 无数据掩膜）

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field;

// 重导出常用类型
pub use field::{TerrainField, LANDUSE_CLASSES};
