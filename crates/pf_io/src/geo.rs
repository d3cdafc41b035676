// crates/pf_io/src/geo.rs

//! 地理坐标 → 像素坐标换算
//!
//! 将 EPSG:4326 经纬度换算为栅格像素坐标 (列, 行)。
//!
//! # 语义
//!
//! - 启用 `gdal` feature 且栅格带投影时，先做 EPSG:4326 → 栅格 CRS
//!   的坐标系变换，再经地理变换求像素
//! - 栅格无投影（或未启用 gdal）时告警并按原样使用输入坐标
//! - 结果可能落在栅格界外：调用方（泵站构建）将其视为失效泵站，
//!   绝不作为错误抛出

use crate::raster::RasterMetadata;
use tracing::warn;

/// 坐标换算器
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    geo_transform: [f64; 6],
    projection: Option<String>,
}

impl CoordinateMapper {
    /// 从栅格元数据创建
    pub fn new(metadata: &RasterMetadata) -> Self {
        Self {
            geo_transform: metadata.geo_transform,
            projection: metadata.projection.clone(),
        }
    }

    /// 经纬度 → 像素坐标 (列, 行)
    ///
    /// 四舍五入到最近像素；结果可能越界，调用方自行判定。
    pub fn lat_lon_to_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        let (x, y) = self.to_raster_crs(lat, lon);
        let px = (x - self.geo_transform[0]) / self.geo_transform[1];
        let py = (y - self.geo_transform[3]) / self.geo_transform[5];
        ((px + 0.5).floor() as i64, (py + 0.5).floor() as i64)
    }

    /// EPSG:4326 → 栅格 CRS
    #[cfg(feature = "gdal")]
    fn to_raster_crs(&self, lat: f64, lon: f64) -> (f64, f64) {
        use gdal::spatial_ref::{CoordTransform, SpatialRef};

        let Some(wkt) = self.projection.as_deref().filter(|p| !p.is_empty()) else {
            warn!("栅格无坐标系，按原样使用输入坐标");
            return (lon, lat);
        };

        let transformed = (|| -> Result<(f64, f64), gdal::errors::GdalError> {
            let src = SpatialRef::from_epsg(4326)?;
            let dst = SpatialRef::from_wkt(wkt)?;
            src.set_axis_mapping_strategy(gdal::spatial_ref::AxisMappingStrategy::TraditionalGisOrder);
            dst.set_axis_mapping_strategy(gdal::spatial_ref::AxisMappingStrategy::TraditionalGisOrder);
            let transform = CoordTransform::new(&src, &dst)?;

            let mut xs = [lon];
            let mut ys = [lat];
            let mut zs: [f64; 0] = [];
            transform.transform_coords(&mut xs, &mut ys, &mut zs)?;
            Ok((xs[0], ys[0]))
        })();

        match transformed {
            Ok(xy) => xy,
            Err(e) => {
                warn!("坐标系变换失败，按原样使用输入坐标: {}", e);
                (lon, lat)
            }
        }
    }

    /// EPSG:4326 → 栅格 CRS (无 GDAL 支持：恒等变换)
    #[cfg(not(feature = "gdal"))]
    fn to_raster_crs(&self, lat: f64, lon: f64) -> (f64, f64) {
        if self.projection.is_some() {
            warn!("未启用 gdal feature，跳过坐标系变换");
        }
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> RasterMetadata {
        RasterMetadata {
            width: 200,
            height: 100,
            geo_transform: [106.0, 0.01, 0.0, -6.0, 0.0, -0.01],
            projection: None,
            nodata: None,
        }
    }

    #[test]
    fn test_lat_lon_to_pixel_identity_crs() {
        // 无投影：输入按 (lon, lat) 直接换算
        let mapper = CoordinateMapper::new(&metadata());
        let (col, row) = mapper.lat_lon_to_pixel(-6.5, 107.0);
        assert_eq!(col, 100);
        assert_eq!(row, 50);
    }

    #[test]
    fn test_out_of_bounds_result_returned() {
        // 界外坐标原样返回，不报错
        let mapper = CoordinateMapper::new(&metadata());
        let (col, row) = mapper.lat_lon_to_pixel(-20.0, 200.0);
        assert!(col > 200 || row > 100);
    }

    #[test]
    fn test_rounding_to_nearest_pixel() {
        let mapper = CoordinateMapper::new(&metadata());
        // 106.006 → 0.6 像素 → 四舍五入到 1
        let (col, _) = mapper.lat_lon_to_pixel(-6.0, 106.006);
        assert_eq!(col, 1);
    }
}
