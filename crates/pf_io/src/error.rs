// crates/pf_io/src/error.rs

//! IO 错误类型

use std::path::PathBuf;
use thiserror::Error;

/// IO 结果类型
pub type IoResult<T> = Result<T, IoError>;

/// 栅格与日志 IO 错误
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件不存在
    #[error("文件不存在: {0}")]
    FileNotFound(PathBuf),

    /// 打开数据集失败
    #[error("打开数据集失败: {0}")]
    OpenFailed(String),

    /// 波段不存在
    #[error("波段 {0} 不存在")]
    BandNotFound(usize),

    /// 读取数据失败
    #[error("读取数据失败: {0}")]
    ReadFailed(String),

    /// 写出数据失败
    #[error("写出数据失败: {0}")]
    WriteFailed(String),

    /// 栅格尺寸无效
    #[error("栅格尺寸无效: {width}x{height}")]
    InvalidDimensions {
        /// 宽度
        width: usize,
        /// 高度
        height: usize,
    },

    /// 日志文件打开失败
    #[error("日志文件打开失败: {path}: {source}")]
    LogOpenFailed {
        /// 日志路径
        path: PathBuf,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// GDAL 不可用
    #[error("GDAL 不可用（未启用 gdal feature）")]
    NotAvailable,

    /// 其他错误
    #[error("IO 错误: {0}")]
    Other(String),
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Other(e.to_string())
    }
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for IoError {
    fn from(e: gdal::errors::GdalError) -> Self {
        IoError::Other(e.to_string())
    }
}
