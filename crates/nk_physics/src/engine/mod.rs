// crates/nk_physics/src/engine/mod.rs

//! 时间推进引擎
//!
//! # 模块结构
//!
//! - `stepper` - 模式时钟、逐步计划与跳步倒计数

pub mod stepper;

// 重导出常用类型
pub use stepper::{StepPlan, StepperStats, TimeStepper};
