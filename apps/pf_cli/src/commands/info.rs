// apps/pf_cli/src/commands/info.rs

//! 栅格信息命令

use anyhow::{Context, Result};
use clap::Args;
use pf_io::RasterSource;
use std::path::PathBuf;

/// 栅格信息参数
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// 栅格文件路径
    pub raster: PathBuf,
}

/// 打印栅格元数据
pub fn execute(args: InfoArgs) -> Result<()> {
    let source = RasterSource::open(&args.raster)
        .with_context(|| format!("打开栅格失败: {}", args.raster.display()))?;
    let meta = source.metadata();
    let (rx, ry) = meta.resolution();

    println!("文件: {}", args.raster.display());
    println!("尺寸: {} x {} 像素", meta.width, meta.height);
    println!("分辨率: {:.6} x {:.6}", rx, ry);
    println!(
        "投影: {}",
        meta.projection.as_deref().unwrap_or("(未定义)")
    );
    match meta.nodata {
        Some(nd) => println!("NoData: {}", nd),
        None => println!("NoData: (未定义)"),
    }

    Ok(())
}
