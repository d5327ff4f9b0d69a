// crates/nk_foundation/src/lib.rs

//! Nunatak Foundation Layer
//!
//! 基础层，提供整个项目的公共抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`field`]: 规则网格、二维标量场与掩码
//! - [`units`]: 模式时间（秒）与日历换算
//!
//! # 示例
//!
//! ```
//! use nk_foundation::{Calendar, Grid, ScalarField};
//!
//! let grid = Grid::new(4, 4, 5000.0, 5000.0);
//! let field = ScalarField::constant(&grid, 273.15);
//! assert_eq!(field.len(), 16);
//!
//! let cal = Calendar::default();
//! assert_eq!(cal.seconds_to_years(cal.years_to_seconds(3.0)), 3.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod field;
pub mod units;

// 重导出常用类型
pub use error::{NkError, NkResult};
pub use field::{BoundaryMask, CellType, CellTypeMask, Grid, ScalarField};
pub use units::Calendar;
