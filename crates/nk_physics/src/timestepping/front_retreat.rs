// crates/nk_physics/src/timestepping/front_retreat.rs

//! 冰崩前缘后退的 CFL 限制
//!
//! 只考虑冰前缘单元（与冰相邻的无冰海洋单元），并排除厚度由
//! 边界条件给定的单元。前缘一步内后退不超过一个网格：
//!
//! $$ \Delta t \leq \frac{1}{c_{max} / \min(\Delta x, \Delta y) + \epsilon} $$

use nk_foundation::{BoundaryMask, CellTypeMask, ScalarField};
use tracing::debug;

use super::max_step::MaxStep;
use super::reasons;
use super::restriction::FrontRetreatLimiter;

/// 防止除零
const RATE_EPSILON: f64 = 1e-16;

/// 后退速率低于此值视为静止 [m/s]
const MIN_RETREAT_RATE: f64 = 1e-14;

/// 基于 CFL 的前缘后退限制器
#[derive(Debug, Clone, Copy, Default)]
pub struct CflFrontRetreat;

impl CflFrontRetreat {
    /// 前缘单元上的最大后退速率
    pub fn max_front_rate(
        cell_type: &CellTypeMask,
        bc_mask: &BoundaryMask,
        retreat_rate: &ScalarField,
    ) -> f64 {
        let grid = cell_type.grid();
        let mut max_rate = 0.0_f64;
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                if cell_type.is_ice_front(i, j) && !bc_mask.get(i, j) {
                    max_rate = max_rate.max(retreat_rate.get(i, j).abs());
                }
            }
        }
        max_rate
    }
}

impl FrontRetreatLimiter for CflFrontRetreat {
    fn max_timestep(
        &self,
        cell_type: &CellTypeMask,
        bc_mask: &BoundaryMask,
        retreat_rate: &ScalarField,
    ) -> MaxStep {
        let max_rate = Self::max_front_rate(cell_type, bc_mask, retreat_rate);
        if max_rate < MIN_RETREAT_RATE {
            return MaxStep::unlimited(reasons::FRONT_RETREAT);
        }

        let spacing = cell_type.grid().min_spacing();
        let dt = 1.0 / (max_rate / spacing + RATE_EPSILON);
        debug!("前缘最大后退速率 {:.3e} m/s, dt = {:.3e} s", max_rate, dt);
        MaxStep::new(dt, reasons::FRONT_RETREAT)
    }
}
