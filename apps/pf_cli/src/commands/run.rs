// apps/pf_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 解析逗号分隔的平行参数列表、打开栅格、解析泵站坐标，
//! 构建并运行模拟，写出平滑后的结果栅格。
//!
//! # 配置校验
//!
//! 降雨与泵站的平行列表长度不一致是致命配置错误，
//! 在任何模拟状态分配之前报告并中止。

use anyhow::{bail, Context, Result};
use clap::Args;
use glam::DVec2;
use pf_io::{CoordinateMapper, CsvPumpLog, RasterSource};
use pf_physics::engine::PumpPlacement;
use pf_physics::{EngineConfig, PumpSpec, RainfallSchedule, SimulationBuilder};
use pf_terrain::TerrainField;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// 省略半径列表时每泵使用的默认取水半径 [m]
const DEFAULT_PUMP_RADIUS_M: f64 = 2.0;

/// 运行模拟参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// DEM 栅格路径
    #[arg(long)]
    pub dem: PathBuf,

    /// 土地利用栅格路径
    #[arg(long)]
    pub landuse: PathBuf,

    /// 输出栅格路径
    #[arg(short, long)]
    pub output: PathBuf,

    /// 泵站事件日志路径 (CSV)
    #[arg(long, default_value = "pump_log.csv")]
    pub pump_log: PathBuf,

    /// 逗号分隔: 每步降雨深度 [mm]
    #[arg(long)]
    pub rain_mm: String,

    /// 逗号分隔: 每步历时 [分钟]
    #[arg(long)]
    pub duration_min: String,

    /// 逗号分隔: 每步子迭代数
    #[arg(long)]
    pub sub_iterations: String,

    /// 逗号分隔: 泵站取水点纬度
    #[arg(long, default_value = "")]
    pub pump_source_lat: String,

    /// 逗号分隔: 泵站取水点经度
    #[arg(long, default_value = "")]
    pub pump_source_lon: String,

    /// 逗号分隔: 泵站排水点纬度
    #[arg(long, default_value = "")]
    pub pump_discharge_lat: String,

    /// 逗号分隔: 泵站排水点经度
    #[arg(long, default_value = "")]
    pub pump_discharge_lon: String,

    /// 逗号分隔: 泵站抽水能力 [m³/hr]
    #[arg(long, default_value = "")]
    pub pump_capacity: String,

    /// 逗号分隔: 泵站激活阈值水深 [m]
    #[arg(long, default_value = "")]
    pub pump_threshold: String,

    /// 逗号分隔: 泵站取水半径 [m]，省略时每泵取 2.0
    #[arg(long)]
    pub pump_radius: Option<String>,

    /// 像素分辨率 [m]，省略时取栅格分辨率
    #[arg(long)]
    pub cell_size: Option<f64>,

    /// 泵站状态切换冷却子迭代数
    #[arg(long, default_value = "5")]
    pub pump_cooldown: u32,
}

/// 解析逗号分隔列表；空串视为空列表
fn parse_list<T>(name: &str, input: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(',')
        .map(|tok| {
            tok.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("参数 {} 解析失败: '{}': {}", name, tok, e))
        })
        .collect()
}

/// 解析泵站平行列表为参数集合
///
/// 全部列表长度必须一致；半径列表省略时每泵取默认值。
fn parse_pump_specs(args: &RunArgs) -> Result<Vec<PumpSpec>> {
    let source_lat: Vec<f64> = parse_list("pump_source_lat", &args.pump_source_lat)?;
    let source_lon: Vec<f64> = parse_list("pump_source_lon", &args.pump_source_lon)?;
    let discharge_lat: Vec<f64> = parse_list("pump_discharge_lat", &args.pump_discharge_lat)?;
    let discharge_lon: Vec<f64> = parse_list("pump_discharge_lon", &args.pump_discharge_lon)?;
    let capacity: Vec<f64> = parse_list("pump_capacity", &args.pump_capacity)?;
    let threshold: Vec<f64> = parse_list("pump_threshold", &args.pump_threshold)?;

    let n = source_lat.len();
    for (name, len) in [
        ("pump_source_lon", source_lon.len()),
        ("pump_discharge_lat", discharge_lat.len()),
        ("pump_discharge_lon", discharge_lon.len()),
        ("pump_capacity", capacity.len()),
        ("pump_threshold", threshold.len()),
    ] {
        if len != n {
            bail!("泵站参数列表长度不一致: {} 有 {} 项, 期望 {}", name, len, n);
        }
    }

    let radius: Vec<f64> = match &args.pump_radius {
        Some(list) => {
            let r: Vec<f64> = parse_list("pump_radius", list)?;
            if r.len() != n {
                bail!("泵站参数列表长度不一致: pump_radius 有 {} 项, 期望 {}", r.len(), n);
            }
            r
        }
        None => vec![DEFAULT_PUMP_RADIUS_M; n],
    };

    Ok((0..n)
        .map(|i| PumpSpec {
            source: DVec2::new(source_lon[i], source_lat[i]),
            discharge: DVec2::new(discharge_lon[i], discharge_lat[i]),
            capacity_m3_hr: capacity[i],
            threshold_on: threshold[i],
            radius_m: radius[i],
        })
        .collect())
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== PondFlow 模拟启动 ===");

    // 先校验全部配置，失败则在任何模拟状态分配前中止
    let schedule = RainfallSchedule::from_parallel(
        parse_list("rain_mm", &args.rain_mm)?,
        parse_list("duration_min", &args.duration_min)?,
        parse_list("sub_iterations", &args.sub_iterations)?,
    )
    .context("降雨调度列表无效")?;

    let pump_specs = parse_pump_specs(&args)?;
    info!(
        "配置: {} 调度步 (共 {} mm), {} 泵站",
        schedule.len(),
        schedule.total_depth_mm(),
        pump_specs.len()
    );

    // 打开输入栅格
    let dem = RasterSource::open(&args.dem)
        .with_context(|| format!("打开 DEM 失败: {}", args.dem.display()))?;
    let elevation = dem.read_band().context("读取 DEM 波段失败")?;
    let meta = dem.metadata().clone();

    let landuse_src = RasterSource::open(&args.landuse)
        .with_context(|| format!("打开土地利用栅格失败: {}", args.landuse.display()))?;
    let landuse = landuse_src.read_band().context("读取土地利用波段失败")?;
    if landuse.width != meta.width || landuse.height != meta.height {
        bail!(
            "土地利用栅格尺寸 {}x{} 与 DEM {}x{} 不一致",
            landuse.width,
            landuse.height,
            meta.width,
            meta.height
        );
    }

    let terrain = TerrainField::new(
        meta.width,
        meta.height,
        elevation.data,
        landuse.to_classes(),
        elevation.nodata,
    )?;
    info!(
        "栅格: {}x{}, 活跃单元 {}",
        terrain.width(),
        terrain.height(),
        terrain.active_cells()
    );

    // 泵站坐标解析：越界像素由核心标记为失效泵站
    let mapper = CoordinateMapper::new(&meta);
    let placements: Vec<PumpPlacement> = pump_specs
        .into_iter()
        .map(|spec| PumpPlacement {
            spec,
            source_px: mapper.lat_lon_to_pixel(spec.source.y, spec.source.x),
            discharge_px: mapper.lat_lon_to_pixel(spec.discharge.y, spec.discharge.x),
        })
        .collect();

    let cell_size = args.cell_size.unwrap_or_else(|| meta.resolution().0);
    let config = EngineConfig {
        cell_size_m: cell_size,
        pump_cooldown: args.pump_cooldown,
    };

    // 日志打开失败是致命错误
    let mut log = CsvPumpLog::create(&args.pump_log)
        .with_context(|| format!("打开泵站日志失败: {}", args.pump_log.display()))?;

    let mut sim = SimulationBuilder::new(config)
        .with_terrain(terrain)
        .with_schedule(schedule)
        .with_pumps(placements)
        .build()?;

    let stats = sim.run(&mut log)?;
    info!(
        "完成: {} 调度步, {} 子迭代, 耗时 {:.2} s",
        stats.steps, stats.sub_iterations, stats.elapsed_secs
    );

    // 写出平滑后的结果场
    let result = sim.output();
    dem.write_geotiff(&args.output, &result)
        .with_context(|| format!("写出结果栅格失败: {}", args.output.display()))?;
    info!("结果已写出: {}", args.output.display());

    Ok(())
}
