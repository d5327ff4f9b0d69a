// crates/nk_physics/src/timestepping/resolver.rs

//! 时间步长决策
//!
//! 把收集到的全部限制合并为一个时间步长：
//!
//! 1. 稳定排序，取最小 `dt_max` 与次小 `dt_other`
//! 2. 命中 N 年整倍数
//! 3. 更新跳步计数器
//! 4. 按分辨率量化
//!
//! 当前时间和跳步计数显式传入传出，决策器只保存整倍数的参考时刻。

use nk_config::RunConfig;
use nk_foundation::{Calendar, NkError, NkResult};
use tracing::debug;

use super::max_step::MaxStep;
use super::skip::SkipCounter;

/// 分辨率为 0 时判断“已到达整倍数时刻”的容差 [s]
const HIT_MULTIPLES_TOLERANCE: f64 = 1e-6;

/// 量化时倍数的相对容差
const QUANTIZE_SLACK: f64 = 4.0 * f64::EPSILON;

/// 单步决策结果
#[derive(Debug, Clone, PartialEq)]
pub struct TimesteppingInfo {
    /// 时间步长 [s]
    pub dt: f64,
    /// 诊断用原因 `"<a> (overrides <b>)"`
    pub reason: String,
    /// 本步之后的跳步计数
    pub skip_counter: u32,
}

/// 时间步长决策器
#[derive(Debug, Clone)]
pub struct TimestepResolver {
    calendar: Calendar,
    start_time: f64,
    /// 命中整倍数的年数（0 表示关闭）
    hit_multiples: u32,
    /// 最近一次到达的整倍数时刻
    last_multiple: f64,
    /// 量化分辨率 [s]
    resolution: f64,
    skip: SkipCounter,
}

impl TimestepResolver {
    /// 创建（不命中整倍数、不量化、不跳步）
    pub fn new(calendar: Calendar, start_time: f64) -> Self {
        Self {
            calendar,
            start_time,
            hit_multiples: 0,
            last_multiple: start_time,
            resolution: 0.0,
            skip: SkipCounter::disabled(),
        }
    }

    /// 从运行配置创建
    pub fn from_config(config: &RunConfig) -> Self {
        let ts = &config.time_stepping;
        Self::new(config.calendar(), config.start_time())
            .with_hit_multiples(ts.hit_multiples_years)
            .with_resolution(ts.resolution_seconds)
            .with_skip(SkipCounter::from_config(&ts.skip))
    }

    /// 设置整倍数年数
    pub fn with_hit_multiples(mut self, years: u32) -> Self {
        self.hit_multiples = years;
        self.last_multiple = self.calendar.last_multiple(self.start_time, years);
        self
    }

    /// 设置量化分辨率 [s]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution.max(0.0);
        self
    }

    /// 设置跳步规则
    pub fn with_skip(mut self, skip: SkipCounter) -> Self {
        self.skip = skip;
        self
    }

    /// 量化分辨率 [s]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// 跳步规则
    pub fn skip(&self) -> &SkipCounter {
        &self.skip
    }

    /// 最近一次到达的整倍数时刻 [s]
    pub fn last_multiple(&self) -> f64 {
        self.last_multiple
    }

    /// 决策
    ///
    /// # 参数
    ///
    /// - `current_time`: 当前时间 [s]
    /// - `restrictions`: 本步收集到的全部限制
    /// - `skip_counter`: 进入本步时的跳步计数
    pub fn resolve(
        &mut self,
        current_time: f64,
        mut restrictions: Vec<MaxStep>,
        skip_counter: u32,
    ) -> NkResult<TimesteppingInfo> {
        if restrictions.is_empty() {
            return Err(NkError::invalid_input("没有任何时间步长限制"));
        }
        if restrictions.len() == 1 {
            restrictions.push(MaxStep::unlimited("none"));
        }

        // Vec::sort 是稳定排序
        restrictions.sort();
        let dt_max = &restrictions[0];
        let dt_other = &restrictions[1];

        let mut dt = dt_max.value();
        let mut reason = format!("{} (overrides {})", dt_max.reason(), dt_other.reason());

        if self.hit_multiples > 0 {
            let next = self.next_multiple(current_time);
            let to_next = next - current_time;
            if to_next < dt {
                dt = to_next;
                reason = format!(
                    "hit multiples of {} years (overrides {})",
                    self.hit_multiples,
                    dt_max.reason()
                );
            }
        }

        let skip_counter = self.skip.update(dt_max, dt_other, skip_counter);

        if self.resolution > 0.0 {
            dt = quantize(dt, self.resolution);
        }

        debug!(
            "{}: dt = {:.6e} s, {}, skip = {}",
            self.calendar.date(current_time),
            dt,
            reason,
            skip_counter
        );

        Ok(TimesteppingInfo {
            dt,
            reason,
            skip_counter,
        })
    }

    /// 下一个整倍数时刻，必要时推进参考时刻
    fn next_multiple(&mut self, current_time: f64) -> f64 {
        let tolerance = if self.resolution > 0.0 {
            self.resolution
        } else {
            HIT_MULTIPLES_TOLERANCE
        };

        let next = self
            .calendar
            .increment_date(self.last_multiple, self.hit_multiples);

        if (current_time - next).abs() < tolerance {
            // 当前时刻恰为整倍数
            self.last_multiple = current_time;
        } else if current_time > next {
            // 跨过了一个或多个整倍数（例如重启）
            self.last_multiple = self
                .calendar
                .last_multiple(current_time, self.hit_multiples);
        } else {
            return next;
        }

        let next = self
            .calendar
            .increment_date(self.last_multiple, self.hit_multiples);
        if (current_time - next).abs() < tolerance {
            self.last_multiple = next;
            return self
                .calendar
                .increment_date(next, self.hit_multiples);
        }
        next
    }
}

/// 把 `dt` 向下取整到 `resolution` 的整数倍
///
/// 倍数按相对容差取整，`resolution` 不能用二进制精确表示时（如 0.1 s），
/// 已是整倍数的 `dt` 保持不变，结果也不会超过 `dt`。
/// 取整结果小于 `resolution` 时保留原值，避免在运行末尾产生零步长。
pub fn quantize(dt: f64, resolution: f64) -> f64 {
    if resolution <= 0.0 || !dt.is_finite() {
        return dt;
    }
    let k = (dt / resolution * (1.0 + QUANTIZE_SLACK)).floor();
    let quantized = (k * resolution).min(dt);
    if k >= 1.0 {
        quantized
    } else {
        dt
    }
}
