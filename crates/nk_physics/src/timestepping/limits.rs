// crates/nk_physics/src/timestepping/limits.rs

//! 常用的稳定性限制
//!
//! ## 扩散条件
//!
//! 显式 SIA 质量守恒的稳定性条件：
//!
//! $$ \Delta t \leq \frac{2 \cdot r}{D_{max} (1/\Delta x^2 + 1/\Delta y^2)} $$
//!
//! 其中 $r$ 为安全系数（`adaptive_ratio`）。
//!
//! ## 二维 CFL 条件
//!
//! $$ \Delta t \leq \frac{1}{|u|_{max}/\Delta x + |v|_{max}/\Delta y} $$

use nk_foundation::Grid;

use super::max_step::MaxStep;
use super::reasons;
use super::restriction::TimestepRestriction;

/// 速度/扩散系数低于此值视为零
const NEGLIGIBLE: f64 = 1e-30;

/// 扩散条件
///
/// `d_max` 为最大扩散系数 [m²/s]，非正时不限制。结果不超过绝对最大步长
/// `maximum_time_step` [s]；被截断时原因为 `"max time step"`，此时扩散条件
/// 不再是决定性限制，跳步计数器也不会重新计算。
pub fn max_timestep_diffusivity(
    d_max: f64,
    grid: &Grid,
    adaptive_ratio: f64,
    maximum_time_step: f64,
) -> MaxStep {
    let dt_diffusivity = if d_max.is_nan() || d_max <= NEGLIGIBLE {
        MaxStep::unlimited(reasons::DIFFUSIVITY)
    } else {
        let grid_factor = 1.0 / (grid.dx * grid.dx) + 1.0 / (grid.dy * grid.dy);
        MaxStep::new(adaptive_ratio * 2.0 / (d_max * grid_factor), reasons::DIFFUSIVITY)
    };
    let dt_max = MaxStep::new(maximum_time_step, reasons::MAX_TIME_STEP);
    std::cmp::min(dt_diffusivity, dt_max)
}

/// 二维 CFL 条件
///
/// `u_max`、`v_max` 为两个方向的最大速度绝对值 [m/s]。
pub fn max_timestep_cfl_2d(u_max: f64, v_max: f64, grid: &Grid) -> MaxStep {
    let rate = u_max.abs() / grid.dx + v_max.abs() / grid.dy;
    if rate > NEGLIGIBLE {
        MaxStep::new(1.0 / rate, reasons::CFL_2D)
    } else {
        MaxStep::unlimited(reasons::CFL_2D)
    }
}

/// 外部给定的固定限制
///
/// 用于由外部求解器逐步计算好、再交给收集器的标量限制。
#[derive(Debug, Clone)]
pub struct FixedRestriction {
    step: MaxStep,
}

impl FixedRestriction {
    /// 创建
    pub fn new(step: MaxStep) -> Self {
        Self { step }
    }

    /// 更新限制值
    pub fn set(&mut self, step: MaxStep) {
        self.step = step;
    }
}

impl TimestepRestriction for FixedRestriction {
    fn name(&self) -> &str {
        self.step.reason()
    }

    fn max_timestep(&self, _t: f64) -> MaxStep {
        self.step.clone()
    }
}
