// crates/nk_physics/src/lib.rs

//! 冰盖模式的时间推进核心
//!
//! 提供：
//! - 自适应时间步长 (timestepping) - 限制收集、决策、命中整倍数、量化、跳步
//! - 时变外力 (forcing) - 有界的记录缓冲、时间插值与时间平均
//! - 引擎 (engine) - 模式时钟与逐步计划
//!
//! 偏微分方程求解（应力平衡、质量守恒、热力学）以及冰崩速率的物理
//! 不在本模块内，它们通过 [`TimestepRestriction`]、[`RetreatMechanism`]、
//! [`FrontRetreatLimiter`] 与 [`nk_io::RecordSource`] 接入。
//!
//! # 数据流
//!
//! ```text
//! 子系统.max_timestep(t) ──► RestrictionCollector ──► TimestepResolver ──► (dt, 原因, 跳步计数)
//!                                                                   │
//!                               ForcingBuffer.ensure_covered / average_over ◄──┘
//! ```

pub mod engine;
pub mod forcing;
pub mod timestepping;

// 重导出常用类型
pub use engine::{StepPlan, StepperStats, TimeStepper};
pub use forcing::{
    ForcingBuffer, ForcingError, ForcingOptions, ForcingResult, InterpolationKind, Periodicity,
    RecordAxis,
};
pub use timestepping::{
    max_timestep_cfl_2d, max_timestep_diffusivity, quantize, CflFrontRetreat, FixedRestriction,
    FrontGeometry, FrontRetreatLimiter, MaxStep, ReportingSchedule, RestrictionCollector,
    RetreatMechanism, SharedRestriction, SkipCounter, TimestepResolver, TimestepRestriction,
    TimesteppingInfo,
};
