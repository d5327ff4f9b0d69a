// crates/nk_physics/src/engine/stepper.rs

//! 时间推进
//!
//! 持有模式时钟、限制收集器、决策器与跳步倒计数。驱动循环：
//!
//! ```rust,ignore
//! while !stepper.is_finished() {
//!     let plan = stepper.plan(&front)?;
//!     for buffer in &forcing {
//!         buffer.write().ensure_covered(stepper.current_time(), plan.dt)?;
//!     }
//!     if plan.update_expensive {
//!         // 应力平衡等
//!     }
//!     stepper.commit(&plan)?;
//! }
//! ```

use nk_config::RunConfig;
use nk_foundation::{ensure, Calendar, NkError, NkResult};
use tracing::info;

use crate::timestepping::{FrontGeometry, RestrictionCollector, TimestepResolver};

/// 单步计划
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
    /// 时间步长 [s]
    pub dt: f64,
    /// 诊断原因
    pub reason: String,
    /// 本步之后的跳步计数
    pub skip_counter: u32,
    /// 本步是否需要重算昂贵的物理过程
    pub update_expensive: bool,
}

/// 步进统计
#[derive(Debug, Clone, Default)]
pub struct StepperStats {
    /// 已完成步数
    pub steps: usize,
    /// 重算昂贵物理过程的次数
    pub expensive_updates: usize,
    /// 最小步长 [s]
    pub dt_min: Option<f64>,
    /// 最大步长 [s]
    pub dt_max: Option<f64>,
}

/// 时间推进器
pub struct TimeStepper {
    calendar: Calendar,
    current: f64,
    end: f64,
    collector: RestrictionCollector,
    resolver: TimestepResolver,
    skip_counter: u32,
    stats: StepperStats,
}

impl TimeStepper {
    /// 创建
    pub fn new(
        calendar: Calendar,
        start: f64,
        collector: RestrictionCollector,
        resolver: TimestepResolver,
    ) -> Self {
        let end = collector.end_time();
        Self {
            calendar,
            current: start,
            end,
            collector,
            resolver,
            skip_counter: 0,
            stats: StepperStats::default(),
        }
    }

    /// 从运行配置创建（收集器中尚无子系统）
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.calendar(),
            config.start_time(),
            RestrictionCollector::from_config(config),
            TimestepResolver::from_config(config),
        )
    }

    /// 收集器（用于注册子系统）
    pub fn collector_mut(&mut self) -> &mut RestrictionCollector {
        &mut self.collector
    }

    /// 当前时间 [s]
    pub fn current_time(&self) -> f64 {
        self.current
    }

    /// 结束时间 [s]
    pub fn end_time(&self) -> f64 {
        self.end
    }

    /// 当前跳步计数
    pub fn skip_counter(&self) -> u32 {
        self.skip_counter
    }

    /// 统计
    pub fn stats(&self) -> &StepperStats {
        &self.stats
    }

    /// 是否已到达结束时间
    pub fn is_finished(&self) -> bool {
        self.current >= self.end
    }

    /// 计算下一步
    pub fn plan(&mut self, front: &FrontGeometry<'_>) -> NkResult<StepPlan> {
        let restrictions = self.collector.collect(self.current, front)?;
        let info = self
            .resolver
            .resolve(self.current, restrictions, self.skip_counter)?;

        Ok(StepPlan {
            dt: info.dt,
            reason: info.reason,
            skip_counter: info.skip_counter,
            update_expensive: self.skip_counter == 0,
        })
    }

    /// 接受计划并推进时间
    pub fn commit(&mut self, plan: &StepPlan) -> NkResult<()> {
        ensure!(
            plan.dt > 0.0 && plan.dt.is_finite(),
            NkError::invalid_input(format!("时间步长必须为正的有限值: {}", plan.dt))
        );

        info!(
            "{} -> {}: dt = {:.4} yr ({}){}",
            self.calendar.date(self.current),
            self.calendar.date(self.current + plan.dt),
            self.calendar.seconds_to_years(plan.dt),
            plan.reason,
            if plan.update_expensive { "" } else { " [skip]" }
        );

        self.current += plan.dt;
        self.skip_counter = plan.skip_counter.saturating_sub(1);

        self.stats.steps += 1;
        if plan.update_expensive {
            self.stats.expensive_updates += 1;
        }
        self.stats.dt_min = Some(self.stats.dt_min.map_or(plan.dt, |d| d.min(plan.dt)));
        self.stats.dt_max = Some(self.stats.dt_max.map_or(plan.dt, |d| d.max(plan.dt)));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestepping::{reasons, FixedRestriction, MaxStep, SkipCounter};
    use nk_foundation::{BoundaryMask, CellType, CellTypeMask, Grid};

    fn masks() -> (CellTypeMask, BoundaryMask) {
        let grid = Grid::new(2, 2, 1.0, 1.0);
        (
            CellTypeMask::uniform(grid, CellType::GroundedIce),
            BoundaryMask::empty(&grid),
        )
    }

    #[test]
    fn test_run_reaches_end_exactly() {
        let (cells, bc) = masks();
        let front = FrontGeometry { cell_type: &cells, bc_mask: &bc };

        let collector = RestrictionCollector::new(3.0, 10.0);
        let resolver = TimestepResolver::new(Calendar::default(), 0.0);
        let mut stepper = TimeStepper::new(Calendar::default(), 0.0, collector, resolver);

        let mut dts = Vec::new();
        while !stepper.is_finished() {
            let plan = stepper.plan(&front).unwrap();
            dts.push(plan.dt);
            stepper.commit(&plan).unwrap();
        }
        assert_eq!(dts.len(), 4);
        assert!((dts[3] - 1.0).abs() < 1e-12);
        assert!((stepper.current_time() - 10.0).abs() < 1e-12);
        assert_eq!(stepper.stats().steps, 4);
    }

    #[test]
    fn test_skip_countdown_elides_expensive_updates() {
        let (cells, bc) = masks();
        let front = FrontGeometry { cell_type: &cells, bc_mask: &bc };

        let mut collector = RestrictionCollector::new(1000.0, 1000.0);
        collector.register(FixedRestriction::new(MaxStep::new(1.0, reasons::DIFFUSIVITY)));
        collector.register(FixedRestriction::new(MaxStep::new(4.0, reasons::CFL_2D)));
        let resolver =
            TimestepResolver::new(Calendar::default(), 0.0).with_skip(SkipCounter::enabled(10));
        let mut stepper = TimeStepper::new(Calendar::default(), 0.0, collector, resolver);

        // floor(0.95 * 4) = 3：每 3 步重算一次
        let mut flags = Vec::new();
        for _ in 0..8 {
            let plan = stepper.plan(&front).unwrap();
            flags.push(plan.update_expensive);
            stepper.commit(&plan).unwrap();
        }
        assert_eq!(flags, vec![true, false, false, true, false, false, true, false]);
        assert_eq!(stepper.stats().expensive_updates, 3);
    }

    #[test]
    fn test_non_positive_step_rejected() {
        let collector = RestrictionCollector::new(1.0, 10.0);
        let resolver = TimestepResolver::new(Calendar::default(), 0.0);
        let mut stepper = TimeStepper::new(Calendar::default(), 0.0, collector, resolver);
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let plan = StepPlan {
                dt,
                reason: "test".into(),
                skip_counter: 0,
                update_expensive: true,
            };
            let err = stepper.commit(&plan).unwrap_err();
            assert!(matches!(err, NkError::InvalidInput { .. }));
        }
        assert_eq!(stepper.current_time(), 0.0);
        assert_eq!(stepper.stats().steps, 0);
    }
}
