// crates/nk_physics/src/forcing/mod.rs

//! 时变外力
//!
//! 气温、降水、海洋温盐等外力以二维场时间序列的形式存放在记录源中，
//! [`ForcingBuffer`] 只在内存中保留其中一段（或周期数据的全部）。
//!
//! # 使用示例
//!
//! ```rust,ignore
//! let mut buffer = ForcingBuffer::attach(source, "air_temp", ForcingOptions::from_config(&config))?;
//! collector.register_shared(shared_buffer.clone());
//!
//! // dt 确定之后
//! buffer.ensure_covered(t, dt)?;
//! let mean = buffer.average_over(t, dt)?;
//! ```

pub mod axis;
pub mod buffer;
pub mod error;
pub mod interpolation;

pub use axis::RecordAxis;
pub use buffer::{ForcingBuffer, ForcingOptions, Periodicity};
pub use error::{ForcingError, ForcingResult};
pub use interpolation::{Interpolation, InterpolationKind};
