// crates/nk_physics/src/timestepping/reporting.rs

//! 输出/报告时刻
//!
//! 时间序列输出、额外空间场输出与快照都要求模式恰好停在指定时刻，
//! 因此各自作为一个限制来源注册。

use super::max_step::MaxStep;
use super::restriction::TimestepRestriction;

/// 与下一个报告时刻距离小于此值时跳到再下一个 [s]
const DEFAULT_EPSILON: f64 = 1.0;

/// 报告时刻表
#[derive(Debug, Clone)]
pub struct ReportingSchedule {
    name: String,
    /// 严格递增的报告时刻 [s]
    times: Vec<f64>,
    epsilon: f64,
}

impl ReportingSchedule {
    /// 创建，时刻会被排序去重
    pub fn new(name: impl Into<String>, mut times: Vec<f64>) -> Self {
        times.retain(|t| t.is_finite());
        times.sort_by(f64::total_cmp);
        times.dedup();
        Self {
            name: name.into(),
            times,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// 设置最短距离 [s]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon.max(0.0);
        self
    }

    /// 报告时刻 [s]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// `t` 之后的下一个报告时刻
    pub fn next_after(&self, t: f64) -> Option<f64> {
        let k = self.times.partition_point(|&s| s <= t);
        let mut candidates = self.times[k..].iter().copied();
        let next = candidates.next()?;
        if next - t < self.epsilon {
            candidates.next()
        } else {
            Some(next)
        }
    }
}

impl TimestepRestriction for ReportingSchedule {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_timestep(&self, t: f64) -> MaxStep {
        match self.next_after(t) {
            Some(next) => MaxStep::new(next - t, self.name.as_str()),
            None => MaxStep::unlimited(self.name.as_str()),
        }
    }
}
