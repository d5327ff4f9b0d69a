// crates/nk_config/src/lib.rs

//! Nunatak Config Layer
//!
//! 配置层，提供可序列化的运行配置及其验证。
//!
//! # 模块概览
//!
//! - [`run_config`]: RunConfig（时间轴、时间步控制、外力缓冲、报告时刻）
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: nk_cli        ─> uses RunConfig
//! Layer 3: nk_physics    ─> 从 RunConfig 构建时间步控制器与外力缓冲
//! Layer 2: nk_config     ─> RunConfig (本层)
//! Layer 1: nk_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod run_config;

// 重导出核心类型
pub use error::ConfigError;
pub use run_config::{
    ForcingConfig, ForcingInterpolation, ReportingConfig, RunConfig, SkipConfig, TimeConfig,
    TimeSteppingConfig,
};
