// crates/nk_physics/src/timestepping/mod.rs

//! 自适应时间步长
//!
//! # 模块结构
//!
//! - `max_step` - 单个原因下的最大时间步长
//! - `restriction` - 限制来源接口与收集器
//! - `limits` - 扩散条件、二维 CFL 条件、固定限制
//! - `front_retreat` - 冰崩前缘后退的 CFL 限制
//! - `reporting` - 输出时刻
//! - `resolver` - 合并限制、命中整倍数、量化
//! - `skip` - 跳步计数器

pub mod front_retreat;
pub mod limits;
pub mod max_step;
pub mod reporting;
pub mod resolver;
pub mod restriction;
pub mod skip;

/// 控制决策中使用的原因字符串
pub mod reasons {
    /// 绝对最大步长
    pub const MAX: &str = "max";
    /// 扩散条件被绝对最大步长截断
    pub const MAX_TIME_STEP: &str = "max time step";
    /// 运行结束
    pub const END_OF_RUN: &str = "end of the run";
    /// 扩散稳定性条件（廉价物理）
    pub const DIFFUSIVITY: &str = "diffusivity";
    /// 二维 CFL 条件
    pub const CFL_2D: &str = "2D CFL";
    /// 前缘后退
    pub const FRONT_RETREAT: &str = "front retreat";
}

// 重导出常用类型
pub use front_retreat::CflFrontRetreat;
pub use limits::{max_timestep_cfl_2d, max_timestep_diffusivity, FixedRestriction};
pub use max_step::MaxStep;
pub use reporting::ReportingSchedule;
pub use resolver::{quantize, TimestepResolver, TimesteppingInfo};
pub use restriction::{
    FrontGeometry, FrontRetreatLimiter, RestrictionCollector, RetreatMechanism,
    SharedRestriction, TimestepRestriction,
};
pub use skip::SkipCounter;
