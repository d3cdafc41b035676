// crates/pf_io/src/raster.rs

//! 栅格读写
//!
//! 提供 DEM 与土地利用栅格的读取，以及结果场的 GeoTIFF 写出。
//!
//! # 功能
//!
//! - 读取栅格元数据（地理变换、投影、NoData）
//! - 读取高程 / 土地利用波段
//! - 写出结果 GeoTIFF（复制输入的地理变换与投影）
//!
//! # 依赖
//!
//! 需要启用 `gdal` feature 并安装 GDAL 库；未启用时全部操作
//! 返回 [`IoError::NotAvailable`]。

use crate::error::IoError;
use std::path::Path;

/// 栅格元数据
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    /// 宽度 (像素)
    pub width: usize,
    /// 高度 (像素)
    pub height: usize,
    /// 地理变换参数 [x_origin, x_res, x_rot, y_origin, y_rot, y_res]
    pub geo_transform: [f64; 6],
    /// 投影 WKT
    pub projection: Option<String>,
    /// NoData 值
    pub nodata: Option<f64>,
}

impl RasterMetadata {
    /// 像素分辨率 (x, y)
    pub fn resolution(&self) -> (f64, f64) {
        (self.geo_transform[1].abs(), self.geo_transform[5].abs())
    }

    /// 地理坐标转像素坐标（浮点）
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = (x - self.geo_transform[0]) / self.geo_transform[1];
        let py = (y - self.geo_transform[3]) / self.geo_transform[5];
        (px, py)
    }

    /// 像素坐标转地理坐标
    pub fn pixel_to_geo(&self, px: f64, py: f64) -> (f64, f64) {
        let x = self.geo_transform[0] + px * self.geo_transform[1];
        let y = self.geo_transform[3] + py * self.geo_transform[5];
        (x, y)
    }
}

/// 栅格波段数据
#[derive(Debug, Clone)]
pub struct RasterBand {
    /// 数据（行优先，`y * width + x`）
    pub data: Vec<f64>,
    /// 宽度
    pub width: usize,
    /// 高度
    pub height: usize,
    /// NoData 值
    pub nodata: Option<f64>,
}

impl RasterBand {
    /// 获取指定位置的值；越界或 NoData 时返回 None
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let val = self.data[y * self.width + x];
        if let Some(nd) = self.nodata {
            if (val - nd).abs() < 1e-10 {
                return None;
            }
        }
        Some(val)
    }

    /// 转换为土地利用分类数组（取整）
    ///
    /// NaN 与 NoData 单元记为 -1，由地形层钳制为分类 0。
    pub fn to_classes(&self) -> Vec<i32> {
        self.data
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    return -1;
                }
                if let Some(nd) = self.nodata {
                    if (v - nd).abs() < 1e-10 {
                        return -1;
                    }
                }
                v.round() as i32
            })
            .collect()
    }
}

/// 栅格数据源（GDAL）
#[cfg(feature = "gdal")]
pub struct RasterSource {
    dataset: gdal::Dataset,
    metadata: RasterMetadata,
}

#[cfg(feature = "gdal")]
impl RasterSource {
    /// 打开栅格文件
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        use gdal::Dataset;

        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileNotFound(path.to_path_buf()));
        }

        let dataset = Dataset::open(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
        let (width, height) = dataset.raster_size();
        if width == 0 || height == 0 {
            return Err(IoError::InvalidDimensions { width, height });
        }

        let geo_transform = dataset.geo_transform()?;
        let projection = {
            let wkt = dataset.projection();
            if wkt.is_empty() {
                None
            } else {
                Some(wkt)
            }
        };
        let nodata = dataset.rasterband(1).ok().and_then(|b| b.no_data_value());

        let metadata = RasterMetadata {
            width,
            height,
            geo_transform,
            projection,
            nodata,
        };

        Ok(Self { dataset, metadata })
    }

    /// 栅格元数据
    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    /// 读取首波段
    pub fn read_band(&self) -> Result<RasterBand, IoError> {
        let band = self
            .dataset
            .rasterband(1)
            .map_err(|_| IoError::BandNotFound(1))?;
        let nodata = band.no_data_value();

        let (width, height) = (self.metadata.width, self.metadata.height);
        let buffer = band
            .read_as::<f64>((0, 0), (width, height), (width, height), None)
            .map_err(|e| IoError::ReadFailed(e.to_string()))?;
        let (_, data) = buffer.into_shape_and_vec();

        Ok(RasterBand {
            data,
            width,
            height,
            nodata,
        })
    }

    /// 写出结果 GeoTIFF
    ///
    /// 复制本数据源的地理变换与投影，NoData 沿用输入哨兵。
    pub fn write_geotiff(
        &self,
        path: impl AsRef<Path>,
        data: &[f64],
    ) -> Result<(), IoError> {
        use gdal::raster::Buffer;
        use gdal::DriverManager;

        let (width, height) = (self.metadata.width, self.metadata.height);
        if data.len() != width * height {
            return Err(IoError::WriteFailed(format!(
                "数据长度 {} 与栅格尺寸 {}x{} 不匹配",
                data.len(),
                width,
                height
            )));
        }

        let driver = DriverManager::get_driver_by_name("GTiff")
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;
        let mut out = driver
            .create_with_band_type::<f64, _>(path.as_ref(), width, height, 1)
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;

        out.set_geo_transform(&self.metadata.geo_transform)
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;
        if let Some(proj) = &self.metadata.projection {
            out.set_projection(proj)
                .map_err(|e| IoError::WriteFailed(e.to_string()))?;
        }

        let mut band = out
            .rasterband(1)
            .map_err(|_| IoError::BandNotFound(1))?;
        if let Some(nd) = self.metadata.nodata {
            band.set_no_data_value(Some(nd))
                .map_err(|e| IoError::WriteFailed(e.to_string()))?;
        }

        let mut buffer = Buffer::new((width, height), data.to_vec());
        band.write((0, 0), (width, height), &mut buffer)
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;

        Ok(())
    }
}

/// 无 GDAL 支持时的占位实现
#[cfg(not(feature = "gdal"))]
pub struct RasterSource {
    metadata: RasterMetadata,
}

#[cfg(not(feature = "gdal"))]
impl RasterSource {
    /// 打开栅格文件 (无 GDAL 支持)
    pub fn open(_path: impl AsRef<Path>) -> Result<Self, IoError> {
        Err(IoError::NotAvailable)
    }

    /// 栅格元数据
    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    /// 读取首波段 (无 GDAL 支持)
    pub fn read_band(&self) -> Result<RasterBand, IoError> {
        Err(IoError::NotAvailable)
    }

    /// 写出结果 GeoTIFF (无 GDAL 支持)
    pub fn write_geotiff(
        &self,
        _path: impl AsRef<Path>,
        _data: &[f64],
    ) -> Result<(), IoError> {
        Err(IoError::NotAvailable)
    }
}
