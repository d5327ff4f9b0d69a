// crates/nk_physics/src/forcing/interpolation.rs

//! 时间插值
//!
//! 对一组请求时刻预先计算左右记录索引与权重，随后对每个网格点复用：
//!
//! $$ f(x) = (1 - \alpha) f_L + \alpha f_R $$
//!
//! - 分段常数：`L = R`，`alpha = 0`
//! - 线性：在两端外推为常数
//! - 线性周期：最后一条记录与（下一周期的）第一条记录之间也做线性插值

use nk_config::ForcingInterpolation;

/// 插值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationKind {
    /// 分段常数
    PiecewiseConstant,
    /// 线性
    Linear,
    /// 线性周期
    LinearPeriodic,
}

impl From<ForcingInterpolation> for InterpolationKind {
    fn from(kind: ForcingInterpolation) -> Self {
        match kind {
            ForcingInterpolation::PiecewiseConstant => Self::PiecewiseConstant,
            ForcingInterpolation::Linear => Self::Linear,
        }
    }
}

/// 最后一个不大于 `x` 的时刻的索引（`x` 早于第一个时刻时为 0）
pub fn bsearch(times: &[f64], x: f64) -> usize {
    times.partition_point(|&s| s <= x).saturating_sub(1)
}

/// 预计算的插值索引与权重
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    left: Vec<usize>,
    right: Vec<usize>,
    alpha: Vec<f64>,
}

impl Interpolation {
    /// 计算
    ///
    /// # 参数
    ///
    /// - `times`: 严格递增的记录时刻，不能为空
    /// - `points`: 请求时刻（周期情形下已映射到 `[0, period)`）
    /// - `period`: 周期长度 [s]，仅用于线性周期插值
    pub fn new(kind: InterpolationKind, times: &[f64], points: &[f64], period: f64) -> Self {
        let mut result = Self {
            left: Vec::with_capacity(points.len()),
            right: Vec::with_capacity(points.len()),
            alpha: Vec::with_capacity(points.len()),
        };

        for &x in points {
            let (l, r, a) = match kind {
                InterpolationKind::PiecewiseConstant => {
                    let l = bsearch(times, x);
                    (l, l, 0.0)
                }
                InterpolationKind::Linear => linear(times, x),
                InterpolationKind::LinearPeriodic => linear_periodic(times, x, period),
            };
            result.left.push(l);
            result.right.push(r);
            result.alpha.push(a);
        }

        result
    }

    /// 请求时刻数
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// 第 `k` 个请求时刻的左索引
    pub fn left(&self, k: usize) -> usize {
        self.left[k]
    }

    /// 第 `k` 个请求时刻的右索引
    pub fn right(&self, k: usize) -> usize {
        self.right[k]
    }

    /// 第 `k` 个请求时刻的权重
    pub fn alpha(&self, k: usize) -> f64 {
        self.alpha[k]
    }

    /// 对一条时间序列求值
    pub fn interpolate(&self, values: &[f64]) -> Vec<f64> {
        (0..self.len())
            .map(|k| {
                let (l, r, a) = (self.left[k], self.right[k], self.alpha[k]);
                (1.0 - a) * values[l] + a * values[r]
            })
            .collect()
    }
}

fn linear(times: &[f64], x: f64) -> (usize, usize, f64) {
    let last = times.len() - 1;
    if x <= times[0] {
        return (0, 0, 0.0);
    }
    if x >= times[last] {
        return (last, last, 0.0);
    }
    let l = bsearch(times, x);
    let r = l + 1;
    (l, r, (x - times[l]) / (times[r] - times[l]))
}

fn linear_periodic(times: &[f64], x: f64, period: f64) -> (usize, usize, f64) {
    let last = times.len() - 1;
    let (t0, t_last) = (times[0], times[last]);

    if x < t0 || x >= t_last {
        // 最后一条记录到下一周期第一条记录之间
        let gap = t0 + period - t_last;
        if gap <= 0.0 {
            return (last, last, 0.0);
        }
        let x = if x < t0 { x + period } else { x };
        return (last, 0, ((x - t_last) / gap).clamp(0.0, 1.0));
    }

    linear(times, x)
}
