// crates/pf_io/src/lib.rs

//! PondFlow IO 模块
//!
//! 提供模拟核心的外部协作者实现。
//!
//! # 模块
//!
//! - [`raster`]: 栅格读写 (GDAL)
//! - [`geo`]: 地理坐标 → 像素坐标换算
//! - [`pump_log`]: 泵站事件 CSV 日志
//! - [`error`]: IO 错误类型
//!
//! # 可选依赖
//!
//! - `gdal`: 启用 GDAL 栅格驱动与坐标系变换；
//!   未启用时驱动返回 `NotAvailable`，坐标换算退化为恒等变换

#![warn(clippy::all)]

pub mod error;
pub mod geo;
pub mod pump_log;
pub mod raster;

// 重导出常用类型
pub use error::{IoError, IoResult};
pub use geo::CoordinateMapper;
pub use pump_log::CsvPumpLog;
pub use raster::{RasterBand, RasterMetadata, RasterSource};
