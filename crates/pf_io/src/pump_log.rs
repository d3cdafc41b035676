// crates/pf_io/src/pump_log.rs

//! 泵站事件 CSV 日志
//!
//! 追加式 CSV 记录流：每个 (步, 子迭代, 泵) 一条记录，
//! 写出后立即刷新。核心把日志视为同步副作用，
//! 日志打开失败属于致命配置错误。

use crate::error::IoError;
use pf_foundation::error::{PfError, PfResult};
use pf_physics::pump::{PumpLogRecord, PumpLogSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV 表头
const HEADER: &str = "step,sub_iteration,pump_id,source_lat,source_lon,\
discharge_lat,discharge_lon,depth_at_source,threshold_on,threshold_off,\
pumped_depth,active";

/// CSV 泵站日志
pub struct CsvPumpLog {
    writer: BufWriter<File>,
}

impl CsvPumpLog {
    /// 创建日志文件并写入表头
    pub fn create(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| IoError::LogOpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADER)?;
        writer.flush()?;

        Ok(Self { writer })
    }
}

impl PumpLogSink for CsvPumpLog {
    fn record(&mut self, r: &PumpLogRecord) -> PfResult<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            r.step,
            r.sub_iteration,
            r.pump_id,
            r.source_lat,
            r.source_lon,
            r.discharge_lat,
            r.discharge_lon,
            r.depth_at_source,
            r.threshold_on,
            r.threshold_off,
            r.pumped_depth,
            if r.active { 1 } else { 0 },
        )
        .map_err(|e| PfError::io_with_source("泵站日志写出失败", e))?;

        // 每条记录立即落盘
        self.writer
            .flush()
            .map_err(|e| PfError::io_with_source("泵站日志刷新失败", e))?;
        Ok(())
    }
}
