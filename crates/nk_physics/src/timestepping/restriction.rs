// crates/nk_physics/src/timestepping/restriction.rs

//! 时间步长限制收集
//!
//! 每个物理/IO 子系统实现 [`TimestepRestriction`]，注册到
//! [`RestrictionCollector`]。新模块只需实现该 trait，收集器无需改动。
//!
//! 冰崩前缘后退比较特殊：各机制只提供后退速率场，速率逐点求和后
//! 一次性交给 [`FrontRetreatLimiter`]，得到一个限制（而非每个机制一个）。

use std::sync::Arc;

use nk_config::RunConfig;
use nk_foundation::{BoundaryMask, CellTypeMask, NkError, NkResult, ScalarField};
use parking_lot::RwLock;
use tracing::trace;

use super::max_step::MaxStep;
use super::reasons;

/// 时间步长限制来源
pub trait TimestepRestriction: Send + Sync {
    /// 名称（用于诊断）
    fn name(&self) -> &str;

    /// 在 `t` 时刻允许的最大时间步长
    fn max_timestep(&self, t: f64) -> MaxStep;
}

/// 冰前缘后退机制（冰崩、前缘融化等）
pub trait RetreatMechanism: Send + Sync {
    /// 名称
    fn name(&self) -> &str;

    /// 后退速率 [m/s]
    fn calving_rate(&self) -> &ScalarField;
}

/// 前缘后退时间步长限制器
pub trait FrontRetreatLimiter: Send + Sync {
    /// 对合并后的后退速率给出一个限制
    fn max_timestep(
        &self,
        cell_type: &CellTypeMask,
        bc_mask: &BoundaryMask,
        retreat_rate: &ScalarField,
    ) -> MaxStep;
}

/// 共享的可变子系统（例如外力缓冲）
///
/// 名称在注册时读取一次。
pub struct SharedRestriction<T> {
    name: String,
    inner: Arc<RwLock<T>>,
}

impl<T: TimestepRestriction> SharedRestriction<T> {
    /// 包装
    pub fn new(inner: Arc<RwLock<T>>) -> Self {
        let name = inner.read().name().to_string();
        Self { name, inner }
    }
}

impl<T: TimestepRestriction> TimestepRestriction for SharedRestriction<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_timestep(&self, t: f64) -> MaxStep {
        self.inner.read().max_timestep(t)
    }
}

/// 计算冰前缘限制所需的几何
#[derive(Debug, Clone, Copy)]
pub struct FrontGeometry<'a> {
    /// 单元类型
    pub cell_type: &'a CellTypeMask,
    /// 厚度边界条件掩码
    pub bc_mask: &'a BoundaryMask,
}

/// 限制收集器
pub struct RestrictionCollector {
    restrictions: Vec<Box<dyn TimestepRestriction>>,
    retreat: Vec<Box<dyn RetreatMechanism>>,
    limiter: Option<Box<dyn FrontRetreatLimiter>>,
    front_retreat_use_cfl: bool,
    /// 绝对最大时间步长 [s]
    maximum_time_step: f64,
    /// 运行结束时间 [s]
    end_time: f64,
}

impl RestrictionCollector {
    /// 创建
    pub fn new(maximum_time_step: f64, end_time: f64) -> Self {
        Self {
            restrictions: Vec::new(),
            retreat: Vec::new(),
            limiter: None,
            front_retreat_use_cfl: false,
            maximum_time_step,
            end_time,
        }
    }

    /// 从运行配置创建
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.maximum_time_step(), config.end_time())
            .with_front_retreat_cfl(config.time_stepping.front_retreat_use_cfl)
    }

    /// 是否对前缘后退使用 CFL 限制
    pub fn with_front_retreat_cfl(mut self, enabled: bool) -> Self {
        self.front_retreat_use_cfl = enabled;
        self
    }

    /// 注册限制来源
    pub fn register<R: TimestepRestriction + 'static>(&mut self, restriction: R) {
        self.restrictions.push(Box::new(restriction));
    }

    /// 注册共享的限制来源
    pub fn register_shared<T: TimestepRestriction + 'static>(&mut self, inner: Arc<RwLock<T>>) {
        self.register(SharedRestriction::new(inner));
    }

    /// 添加前缘后退机制
    pub fn add_retreat_mechanism<M: RetreatMechanism + 'static>(&mut self, mechanism: M) {
        self.retreat.push(Box::new(mechanism));
    }

    /// 设置前缘后退限制器
    pub fn set_front_retreat_limiter<L: FrontRetreatLimiter + 'static>(&mut self, limiter: L) {
        self.limiter = Some(Box::new(limiter));
    }

    /// 运行结束时间 [s]
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// 已注册的限制来源名称
    pub fn names(&self) -> Vec<&str> {
        self.restrictions.iter().map(|r| r.name()).collect()
    }

    /// 已注册的前缘后退机制名称
    pub fn retreat_mechanisms(&self) -> Vec<&str> {
        self.retreat.iter().map(|m| m.name()).collect()
    }

    /// 收集 `t` 时刻的全部限制
    ///
    /// 顺序：已注册来源（注册顺序）、前缘后退、最大步长、运行结束。
    pub fn collect(&self, t: f64, front: &FrontGeometry<'_>) -> NkResult<Vec<MaxStep>> {
        let mut list = Vec::with_capacity(self.restrictions.len() + 3);

        for r in &self.restrictions {
            let step = r.max_timestep(t);
            trace!("{}: {}", r.name(), step);
            list.push(step);
        }

        if !self.retreat.is_empty() && self.front_retreat_use_cfl {
            list.push(self.front_retreat(front)?);
        }

        list.push(MaxStep::new(self.maximum_time_step.max(0.0), reasons::MAX));
        list.push(MaxStep::new((self.end_time - t).max(0.0), reasons::END_OF_RUN));

        Ok(list)
    }

    fn front_retreat(&self, front: &FrontGeometry<'_>) -> NkResult<MaxStep> {
        let limiter = self.limiter.as_ref().ok_or_else(|| {
            NkError::configuration("启用了前缘后退 CFL 限制，但没有设置限制器")
        })?;

        let mut combined = ScalarField::zeros(front.cell_type.grid());
        for mechanism in &self.retreat {
            combined.add_scaled(1.0, mechanism.calving_rate())?;
        }

        Ok(limiter.max_timestep(front.cell_type, front.bc_mask, &combined))
    }
}
