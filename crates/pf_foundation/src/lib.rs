// crates/pf_foundation/src/lib.rs

//! PondFlow Foundation Layer
//!
//! 零依赖基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//!
//! # 设计原则
//!
//! 1. **零外部依赖**: 仅依赖 thiserror
//! 2. **层次化**: 基础层只定义核心错误，模拟相关错误在上层扩展
//! 3. **易用性**: 提供便捷的构造方法和校验辅助
//!
//! # 示例
//!
//! ```
//! use pf_foundation::error::{PfError, PfResult};
//!
//! fn read_config() -> PfResult<()> {
//!     Err(PfError::config("配置文件格式错误"))
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

// 重导出常用类型
pub use error::{PfError, PfResult};

/// 条件校验宏：条件不成立时返回给定错误
///
/// ```
/// use pf_foundation::{ensure, error::{PfError, PfResult}};
///
/// fn check(value: i32) -> PfResult<()> {
///     ensure!(value > 0, PfError::invalid_input("value must be positive"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

/// Option 解包宏：None 时返回给定错误
///
/// ```
/// use pf_foundation::{require, error::{PfError, PfResult}};
///
/// fn get_value(opt: Option<i32>) -> PfResult<i32> {
///     let v = require!(opt, PfError::not_found("value"));
///     Ok(v)
/// }
/// ```
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err),
        }
    };
}

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{PfError, PfResult};
    pub use crate::{ensure, require};
}
