// crates/nk_physics/src/forcing/axis.rs

//! 外力记录时间轴
//!
//! 每条记录 `k` 有时刻 `time[k]` 和有效区间 `[bounds[2k], bounds[2k+1])`。
//! 文件中没有时间边界时按相邻记录合成：
//!
//! - 单条记录：`[t - 1, t + 1]`
//! - 多条记录：记录 `k` 的右边界等于记录 `k+1` 的时刻，最后一条延长 1
//! - 没有时间维：一条 `t = 0` 的记录，边界 `[-1, 1]`

use nk_io::RecordAxisData;

use super::error::{ForcingError, ForcingResult};
use super::interpolation::{bsearch, InterpolationKind};

/// 合成边界时最后一条记录的延长量 [s]
const SYNTHETIC_EXTENSION: f64 = 1.0;

/// 记录时间轴
#[derive(Debug, Clone, PartialEq)]
pub struct RecordAxis {
    times: Vec<f64>,
    bounds: Vec<f64>,
}

impl RecordAxis {
    /// 没有时间维的单条记录
    pub fn constant() -> Self {
        Self {
            times: vec![0.0],
            bounds: vec![-1.0, 1.0],
        }
    }

    /// 从记录源读取的数据构造
    pub fn from_data(
        field: &str,
        data: Option<RecordAxisData>,
        kind: InterpolationKind,
    ) -> ForcingResult<Self> {
        let Some(RecordAxisData { mut times, bounds }) = data else {
            return Ok(Self::constant());
        };

        let n = times.len();
        if n == 0 {
            return Err(ForcingError::configuration(field, "时间轴为空"));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(ForcingError::configuration(field, "时间轴包含非有限值"));
        }

        let bounds = match bounds {
            Some(bounds) => {
                if bounds.len() != 2 * n {
                    return Err(ForcingError::configuration(
                        field,
                        format!("时间边界长度 {} 与 {} 条记录不一致", bounds.len(), n),
                    ));
                }
                if kind == InterpolationKind::PiecewiseConstant && n > 1 {
                    // 分段常数插值以区间左端为记录时刻
                    for (k, t) in times.iter_mut().enumerate() {
                        *t = bounds[2 * k];
                    }
                }
                bounds
            }
            None => synthesize_bounds(&times),
        };

        if !is_strictly_increasing(&times) {
            return Err(ForcingError::configuration(field, "记录时刻必须严格递增"));
        }

        Ok(Self { times, bounds })
    }

    /// 记录数
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// 是否为空（构造后不会为空）
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 记录时刻
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// 时间边界（长度 2n）
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// 第 `k` 条记录的有效区间
    pub fn interval(&self, k: usize) -> (f64, f64) {
        (self.bounds[2 * k], self.bounds[2 * k + 1])
    }

    /// 包含 `t` 的记录（两端截断）
    pub fn bracket(&self, t: f64) -> usize {
        bsearch(&self.times, t)
    }
}

fn synthesize_bounds(times: &[f64]) -> Vec<f64> {
    if let [t] = times {
        return vec![t - 1.0, t + 1.0];
    }
    let n = times.len();
    let mut bounds = Vec::with_capacity(2 * n);
    for k in 0..n {
        bounds.push(times[k]);
        bounds.push(if k + 1 < n {
            times[k + 1]
        } else {
            times[k] + SYNTHETIC_EXTENSION
        });
    }
    bounds
}

fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}
