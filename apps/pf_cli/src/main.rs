// apps/pf_cli/src/main.rs

//! PondFlow 命令行界面
//!
//! 提供地表积水模拟的命令行工具。
//!
//! # 架构层级
//!
//! 本模块属于应用层：负责参数解析、栅格打开与泵站坐标解析，
//! 模拟核心只接收构建完成的配置与数据。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// PondFlow 地表积水模拟命令行工具
#[derive(Parser)]
#[command(name = "pf_cli")]
#[command(author = "PondFlow Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PondFlow surface ponding simulator", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行模拟
    Run(commands::run::RunArgs),
    /// 显示栅格信息
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 执行命令
    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
