// crates/nk_io/src/lib.rs

//! Nunatak IO 模块
//!
//! 外力缓冲的存储协作者。
//!
//! # 模块
//!
//! - [`source`]: `RecordSource` 接口（时间轴、按索引读记录、变量存在性）
//! - [`memory`]: 内存记录源
//! - [`json`]: JSON 外力文件
//! - [`error`]: IO 错误类型
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use nk_io::{JsonForcingFile, RecordSource};
//!
//! let file = JsonForcingFile::open("forcing.json")?;
//! let axis = file.record_axis("air_temp")?;
//! let first = file.read_record("air_temp", 0)?;
//! ```

pub mod error;
pub mod json;
pub mod memory;
pub mod source;

// 重导出常用类型
pub use error::{IoError, IoResult};
pub use json::{ForcingDocument, ForcingVariable, JsonForcingFile};
pub use memory::MemorySource;
pub use source::{RecordAxisData, RecordSource};
