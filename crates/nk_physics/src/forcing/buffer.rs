// crates/nk_physics/src/forcing/buffer.rs

//! 外力缓冲
//!
//! 把存储上可能很长的二维场时间序列表示为一个有界的内存窗口。
//! 驻留记录始终是连续的 `[first, first + n)`，存放在固定容量的槽位中，
//! 通过轮转的 `head` 定位：记录 `first + k` 位于槽位 `(head + k) % capacity`。
//! 窗口前移时只需推进 `head`，并读取缺失的记录。
//!
//! 周期数据在 [`ForcingBuffer::attach`] 时全部读入，此后不再读取。

use std::sync::Arc;

use nk_config::RunConfig;
use nk_foundation::{Calendar, ScalarField};
use nk_io::RecordSource;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use super::axis::RecordAxis;
use super::error::{ForcingError, ForcingResult};
use super::interpolation::{Interpolation, InterpolationKind};
use crate::timestepping::{MaxStep, TimestepRestriction};

/// 周期设置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Periodicity {
    /// 周期 [s]
    pub period: f64,
    /// 参考时刻 [s]
    pub reference_time: f64,
}

/// 外力缓冲选项
#[derive(Debug, Clone)]
pub struct ForcingOptions {
    /// 非周期数据最多驻留的记录数
    pub capacity: usize,
    /// 求时间平均时每年的采样数
    pub evaluations_per_year: u32,
    /// 插值方式
    pub interpolation: InterpolationKind,
    /// 周期设置（None 表示非周期）
    pub periodic: Option<Periodicity>,
    /// 记录边界限制的最短步长 [s]
    pub min_record_step: f64,
    /// 日历（年 <-> 秒）
    pub calendar: Calendar,
}

impl Default for ForcingOptions {
    fn default() -> Self {
        Self {
            capacity: 60,
            evaluations_per_year: 60,
            interpolation: InterpolationKind::Linear,
            periodic: None,
            min_record_step: 1.0,
            calendar: Calendar::default(),
        }
    }
}

impl ForcingOptions {
    /// 从运行配置创建
    pub fn from_config(config: &RunConfig) -> Self {
        let cal = config.calendar();
        let forcing = &config.forcing;
        let periodic = forcing.periodic.then(|| Periodicity {
            period: cal.years_to_seconds(forcing.period_years),
            reference_time: cal.years_to_seconds(forcing.reference_year),
        });
        Self {
            capacity: forcing.buffer_size,
            evaluations_per_year: forcing.evaluations_per_year,
            interpolation: forcing.interpolation.into(),
            periodic,
            min_record_step: config.time_stepping.record_step_floor_seconds,
            calendar: cal,
        }
    }

    /// 设置容量
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// 设置插值方式
    pub fn with_interpolation(mut self, kind: InterpolationKind) -> Self {
        self.interpolation = kind;
        self
    }

    /// 设置每年采样数
    pub fn with_evaluations_per_year(mut self, n: u32) -> Self {
        self.evaluations_per_year = n;
        self
    }

    /// 设置周期
    pub fn with_period(mut self, period: f64, reference_time: f64) -> Self {
        self.periodic = Some(Periodicity {
            period,
            reference_time,
        });
        self
    }
}

/// 外力缓冲
pub struct ForcingBuffer {
    name: String,
    source: Option<Arc<dyn RecordSource>>,
    axis: RecordAxis,
    interpolation: InterpolationKind,
    periodic: Option<Periodicity>,
    evaluations_per_year: u32,
    min_record_step: f64,
    calendar: Calendar,
    /// 固定容量的槽位
    slots: Vec<Option<ScalarField>>,
    /// 记录 `first` 所在的槽位
    head: usize,
    /// 第一条驻留记录（None 表示尚未读取）
    first: Option<usize>,
    /// 驻留记录数
    n: usize,
}

impl ForcingBuffer {
    /// 关联到记录源中的变量
    ///
    /// # 错误
    ///
    /// - 变量不存在、时刻不递增、周期数据超过缓冲容量：`Configuration`
    /// - 读取周期数据失败：`Io`
    pub fn attach(
        source: Arc<dyn RecordSource>,
        variable: &str,
        options: ForcingOptions,
    ) -> ForcingResult<Self> {
        if !source.has_variable(variable) {
            return Err(ForcingError::configuration(
                variable,
                format!("在 {} 中找不到该变量", source.describe()),
            ));
        }

        let mut interpolation = options.interpolation;
        let periodic = match options.periodic {
            Some(p) if p.period > 0.0 => Some(p),
            Some(p) => {
                return Err(ForcingError::configuration(
                    variable,
                    format!("周期必须为正, 实际 {}", p.period),
                ))
            }
            None => None,
        };
        if periodic.is_some() && interpolation == InterpolationKind::Linear {
            interpolation = InterpolationKind::LinearPeriodic;
        }

        let axis = RecordAxis::from_data(variable, source.record_axis(variable)?, interpolation)?;
        let n_records = axis.len();

        let capacity = if periodic.is_some() {
            if options.capacity < n_records {
                return Err(ForcingError::configuration(
                    variable,
                    format!(
                        "周期数据需要缓冲全部 {} 条记录, 缓冲容量只有 {}",
                        n_records, options.capacity
                    ),
                ));
            }
            n_records
        } else {
            options.capacity.min(n_records).max(1)
        };

        let mut buffer = Self {
            name: variable.to_string(),
            source: Some(source),
            axis,
            interpolation,
            periodic,
            evaluations_per_year: options.evaluations_per_year,
            min_record_step: options.min_record_step,
            calendar: options.calendar,
            slots: vec![None; capacity],
            head: 0,
            first: None,
            n: 0,
        };

        debug!(
            "外力 {}: {} 条记录, 缓冲容量 {}, 插值 {:?}{}",
            buffer.name,
            n_records,
            capacity,
            buffer.interpolation,
            if buffer.periodic.is_some() { ", 周期" } else { "" }
        );

        if buffer.periodic.is_some() {
            buffer.load_from(0)?;
        }

        Ok(buffer)
    }

    /// 空间给定、时间不变的外力（没有记录源）
    pub fn constant(name: impl Into<String>, field: ScalarField) -> Self {
        Self {
            name: name.into(),
            source: None,
            axis: RecordAxis::constant(),
            interpolation: InterpolationKind::PiecewiseConstant,
            periodic: None,
            evaluations_per_year: 1,
            min_record_step: ForcingOptions::default().min_record_step,
            calendar: Calendar::default(),
            slots: vec![Some(field)],
            head: 0,
            first: Some(0),
            n: 1,
        }
    }

    /// 变量名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 缓冲容量
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 时间序列的记录总数
    pub fn n_records(&self) -> usize {
        self.axis.len()
    }

    /// 驻留记录的范围
    pub fn resident_range(&self) -> Option<std::ops::Range<usize>> {
        self.first.map(|first| first..first + self.n)
    }

    /// 记录时刻 [s]
    pub fn times(&self) -> &[f64] {
        self.axis.times()
    }

    /// 时间边界 [s]
    pub fn bounds(&self) -> &[f64] {
        self.axis.bounds()
    }

    /// 是否周期
    pub fn is_periodic(&self) -> bool {
        self.periodic.is_some()
    }

    /// 实际使用的插值方式
    pub fn interpolation(&self) -> InterpolationKind {
        self.interpolation
    }

    /// 保证驻留窗口覆盖 `[t, t + dt]`
    ///
    /// 周期数据与常数外力不做任何事。读取失败后窗口被清空。
    pub fn ensure_covered(&mut self, t: f64, dt: f64) -> ForcingResult<()> {
        if self.source.is_none() || self.periodic.is_some() {
            return Ok(());
        }

        let interp = Interpolation::new(self.interpolation, self.axis.times(), &[t, t + dt], 0.0);
        let first = interp.left(0);
        let last = interp.right(1).max(first);

        if let Some(range) = self.resident_range() {
            if range.contains(&first) && range.contains(&last) {
                return Ok(());
            }
        }

        let required = last - first + 1;

        if required > self.capacity() {
            return Err(ForcingError::Capacity {
                field: self.name.clone(),
                required,
                capacity: self.capacity(),
            });
        }

        self.load_from(first)
    }

    /// `t` 时刻的值
    pub fn value_at(&self, t: f64) -> ForcingResult<ScalarField> {
        self.evaluate(&[t])
    }

    /// `[t, t + dt]` 上的时间平均（矩形公式）
    ///
    /// 只有一条驻留记录时直接返回该记录。
    pub fn average_over(&self, t: f64, dt: f64) -> ForcingResult<ScalarField> {
        if self.n == 1 {
            return self.resident(0).cloned();
        }

        let years = self.calendar.seconds_to_years(dt);
        let m = (f64::from(self.evaluations_per_year) * years).ceil();
        let m = if m.is_finite() && m >= 1.0 {
            m as usize
        } else {
            1
        };

        let step = dt / m as f64;
        let samples: Vec<f64> = (0..m).map(|k| t + k as f64 * step).collect();
        self.evaluate(&samples)
    }

    /// 在若干时刻求值后取算术平均
    fn evaluate(&self, samples: &[f64]) -> ForcingResult<ScalarField> {
        let Some(first) = self.first.filter(|_| self.n > 0) else {
            return Err(ForcingError::configuration(
                &self.name,
                "没有驻留记录, 需要先调用 ensure_covered",
            ));
        };

        let (points, period) = match self.periodic {
            Some(p) => (
                samples
                    .iter()
                    .map(|&s| self.calendar.time_mod(s - p.reference_time, p.period))
                    .collect::<Vec<_>>(),
                p.period,
            ),
            None => (samples.to_vec(), 0.0),
        };

        let resident_times = &self.axis.times()[first..first + self.n];
        let interp = Interpolation::new(self.interpolation, resident_times, &points, period);

        let weights = self.sample_weights(&interp)?;
        let scale = 1.0 / weights.len() as f64;

        let mut result = self.resident(0)?.clone();
        result
            .as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .for_each(|(p, out)| {
                let sum: f64 = weights
                    .iter()
                    .map(|&(l, r, a)| (1.0 - a) * l[p] + a * r[p])
                    .sum();
                *out = sum * scale;
            });

        Ok(result)
    }

    /// 每个采样时刻的 (左记录, 右记录, 权重)
    fn sample_weights(&self, interp: &Interpolation) -> ForcingResult<Vec<(&[f64], &[f64], f64)>> {
        let mut weights = Vec::with_capacity(interp.len());
        for k in 0..interp.len() {
            let left = self.resident(interp.left(k))?.as_slice();
            let right = self.resident(interp.right(k))?.as_slice();
            weights.push((left, right, interp.alpha(k)));
        }
        Ok(weights)
    }

    /// 窗口中第 `k` 条驻留记录
    fn resident(&self, k: usize) -> ForcingResult<&ScalarField> {
        if self.first.is_none() || k >= self.n {
            return Err(ForcingError::configuration(&self.name, "没有驻留记录"));
        }
        let slot = (self.head + k) % self.slots.len();
        self.slots[slot]
            .as_ref()
            .ok_or_else(|| ForcingError::configuration(&self.name, "缓冲槽位为空"))
    }

    /// 使窗口从记录 `start` 开始，复用重叠的记录并读取缺失的记录
    fn load_from(&mut self, start: usize) -> ForcingResult<()> {
        let n_records = self.axis.len();
        let capacity = self.capacity();
        if start >= n_records {
            return Err(ForcingError::configuration(
                &self.name,
                format!("起始记录 {start} 超出范围 (共 {n_records} 条)"),
            ));
        }

        if self.first == Some(start) {
            return Ok(());
        }

        let mut missing = capacity.min(n_records - start);
        let mut start = start;
        let mut kept = 0;

        match self.first {
            Some(first) if self.n > 0 && start >= first && start < first + self.n => {
                let discarded = start - first;
                kept = first + self.n - start;
                self.head = (self.head + discarded) % capacity;
                missing = missing.saturating_sub(kept);
                start += kept;
                self.first = Some(first + discarded);
            }
            _ => {
                self.head = 0;
                self.first = Some(start);
            }
        }
        self.n = kept;

        if missing == 0 {
            return Ok(());
        }

        let Some(source) = self.source.clone() else {
            return Ok(());
        };

        let (a, _) = self.axis.interval(start);
        let (_, b) = self.axis.interval(start + missing - 1);
        debug!(
            "读取外力 {}: {} 条记录, 时间区间 {} 至 {}",
            self.name,
            missing,
            self.calendar.date(a),
            self.calendar.date(b)
        );

        for j in 0..missing {
            let record = match source.read_record(&self.name, start + j) {
                Ok(record) => record,
                Err(e) => {
                    warn!("读取外力 {} 第 {} 条记录失败, 缓冲窗口已清空", self.name, start + j);
                    self.invalidate();
                    return Err(e.into());
                }
            };
            trace!(
                "{}: 第 {} 条记录, {}",
                self.name,
                start + j,
                self.calendar.date(self.axis.times()[start + j])
            );
            let slot = (self.head + kept + j) % capacity;
            self.slots[slot] = Some(record);
        }
        self.n = kept + missing;

        Ok(())
    }

    fn invalidate(&mut self) {
        self.first = None;
        self.n = 0;
        self.head = 0;
    }
}

impl TimestepRestriction for ForcingBuffer {
    fn name(&self) -> &str {
        &self.name
    }

    /// 到当前记录有效区间结束的距离
    ///
    /// 不足 `min_record_step` 时看下一条记录的区间长度，没有下一条记录则不限制。
    fn max_timestep(&self, t: f64) -> MaxStep {
        let reason = format!("{} record boundary", self.name);
        let k = self.axis.bracket(t);
        let (_, right) = self.axis.interval(k);
        let dt = (right - t).max(0.0);

        if dt > self.min_record_step {
            MaxStep::new(dt, reason)
        } else if k + 1 < self.axis.len() {
            let (a, b) = self.axis.interval(k + 1);
            MaxStep::new(b - a, reason)
        } else {
            MaxStep::unlimited(reason)
        }
    }
}

impl std::fmt::Debug for ForcingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForcingBuffer")
            .field("name", &self.name)
            .field("n_records", &self.axis.len())
            .field("capacity", &self.capacity())
            .field("resident", &self.resident_range())
            .field("interpolation", &self.interpolation)
            .field("periodic", &self.periodic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nk_foundation::Grid;
    use nk_io::{MemorySource, RecordAxisData};

    fn years(y: f64) -> f64 {
        Calendar::default().years_to_seconds(y)
    }

    fn grid() -> Grid {
        Grid::new(3, 2, 1000.0, 1000.0)
    }

    /// 记录 k 的值恒为 values[k]
    fn series(times: Vec<f64>, values: &[f64]) -> MemorySource {
        let g = grid();
        let records = values.iter().map(|&v| ScalarField::constant(&g, v)).collect();
        MemorySource::new("test", g)
            .with_series("smb", RecordAxisData::from_times(times), records)
            .unwrap()
    }

    #[test]
    fn test_missing_variable_is_configuration_error() {
        let source = Arc::new(series(vec![0.0], &[1.0]));
        let err = ForcingBuffer::attach(source, "precipitation", ForcingOptions::default())
            .unwrap_err();
        assert!(matches!(err, ForcingError::Configuration { .. }));
    }

    #[test]
    fn test_capacity_clamped_to_series_length() {
        let source = Arc::new(series(vec![0.0, 1.0], &[1.0, 2.0]));
        let buffer = ForcingBuffer::attach(source, "smb", ForcingOptions::default()).unwrap();
        assert_eq!(buffer.capacity(), 2);
        assert_eq!(buffer.resident_range(), None);
    }

    #[test]
    fn test_linear_value_at() {
        let source = Arc::new(series(vec![0.0, years(10.0)], &[0.0, 10.0]));
        let mut buffer = ForcingBuffer::attach(source, "smb", ForcingOptions::default()).unwrap();
        buffer.ensure_covered(0.0, years(10.0)).unwrap();
        let v = buffer.value_at(years(2.5)).unwrap();
        assert!((v.get(1, 1) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_average_of_linear_ramp() {
        let source = Arc::new(series(vec![0.0, years(10.0)], &[0.0, 10.0]));
        let options = ForcingOptions::default().with_evaluations_per_year(1);
        let mut buffer = ForcingBuffer::attach(source, "smb", options).unwrap();
        buffer.ensure_covered(0.0, years(4.0)).unwrap();
        // 采样 0, 1, 2, 3 年
        let avg = buffer.average_over(0.0, years(4.0)).unwrap();
        assert!((avg.get(0, 0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_average_uses_one_sample() {
        let source = Arc::new(series(vec![0.0, years(10.0)], &[0.0, 10.0]));
        let mut buffer = ForcingBuffer::attach(source, "smb", ForcingOptions::default()).unwrap();
        buffer.ensure_covered(years(5.0), 0.0).unwrap();
        let avg = buffer.average_over(years(5.0), 0.0).unwrap();
        assert!((avg.get(0, 0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_forcing() {
        let g = grid();
        let buffer = ForcingBuffer::constant("topg", ScalarField::constant(&g, -300.0));
        assert_eq!(buffer.bounds(), &[-1.0, 1.0]);
        assert!(!buffer.max_timestep(0.0).is_finite());
        let avg = buffer.average_over(years(100.0), years(50.0)).unwrap();
        assert_eq!(avg.get(2, 1), -300.0);
    }

    #[test]
    fn test_no_time_dimension_loads_single_record() {
        let g = grid();
        let source = MemorySource::new("test", g)
            .with_static("topg", ScalarField::constant(&g, 7.0))
            .unwrap();
        let mut buffer =
            ForcingBuffer::attach(Arc::new(source), "topg", ForcingOptions::default()).unwrap();
        buffer.ensure_covered(years(500.0), years(1.0)).unwrap();
        assert_eq!(buffer.resident_range(), Some(0..1));
        assert_eq!(buffer.value_at(years(500.0)).unwrap().get(0, 0), 7.0);
    }

    #[test]
    fn test_max_timestep_to_record_boundary() {
        let source = Arc::new(series(vec![0.0, 10.0, 20.0], &[0.0, 1.0, 2.0]));
        let buffer = ForcingBuffer::attach(source, "smb", ForcingOptions::default()).unwrap();

        let step = buffer.max_timestep(3.0);
        assert!((step.value() - 7.0).abs() < 1e-12);
        assert_eq!(step.reason(), "smb record boundary");

        // 距边界不足 1 s，取下一条记录的区间长度
        let step = buffer.max_timestep(9.5);
        assert!((step.value() - 10.0).abs() < 1e-12);

        // 最后一条记录之后不限制
        assert!(!buffer.max_timestep(20.5).is_finite());
    }

    #[test]
    fn test_record_step_floor_configurable() {
        let source = Arc::new(series(vec![0.0, 10.0, 20.0], &[0.0, 1.0, 2.0]));
        let options = ForcingOptions {
            min_record_step: 5.0,
            ..ForcingOptions::default()
        };
        let buffer = ForcingBuffer::attach(source, "smb", options).unwrap();
        let step = buffer.max_timestep(7.0);
        assert!((step.value() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_read_failure_invalidates_window() {
        let source = Arc::new(
            series(vec![0.0, 10.0, 20.0, 30.0], &[0.0, 1.0, 2.0, 3.0]).with_read_failure("smb", 3),
        );
        let options = ForcingOptions::default()
            .with_capacity(2)
            .with_interpolation(InterpolationKind::PiecewiseConstant);
        let mut buffer = ForcingBuffer::attach(source, "smb", options).unwrap();
        buffer.ensure_covered(0.0, 5.0).unwrap();
        assert_eq!(buffer.resident_range(), Some(0..2));

        let err = buffer.ensure_covered(25.0, 3.0).unwrap_err();
        assert!(matches!(err, ForcingError::Io(_)));
        assert_eq!(buffer.resident_range(), None);
        assert!(buffer.value_at(25.0).is_err());
    }

    #[test]
    fn test_periodic_requires_full_buffer() {
        let source = Arc::new(series(vec![0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]));
        let options = ForcingOptions::default().with_capacity(2).with_period(3.0, 0.0);
        let err = ForcingBuffer::attach(source, "smb", options).unwrap_err();
        assert!(matches!(err, ForcingError::Configuration { .. }));
    }

    #[test]
    fn test_periodic_promotes_linear() {
        let source = Arc::new(series(vec![0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]));
        let options = ForcingOptions::default().with_period(3.0, 0.0);
        let buffer = ForcingBuffer::attach(source, "smb", options).unwrap();
        assert!(buffer.is_periodic());
        assert_eq!(buffer.interpolation(), InterpolationKind::LinearPeriodic);
        assert_eq!(buffer.resident_range(), Some(0..3));
    }
}
