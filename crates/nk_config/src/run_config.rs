// crates/nk_config/src/run_config.rs

//! RunConfig - 运行配置
//!
//! 面向用户的数值以年为单位（分辨率除外），通过 [`RunConfig::calendar`]
//! 换算到模式内部使用的秒。

use serde::{Deserialize, Serialize};
use std::path::Path;

use nk_foundation::Calendar;

use crate::error::ConfigError;

/// 运行配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// 时间轴
    #[serde(default)]
    pub time: TimeConfig,

    /// 时间步控制
    #[serde(default)]
    pub time_stepping: TimeSteppingConfig,

    /// 外力缓冲
    #[serde(default)]
    pub forcing: ForcingConfig,

    /// 输出/报告时刻
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// 时间轴配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 起始时间 [年]
    #[serde(default)]
    pub start_year: f64,

    /// 结束时间 [年]
    #[serde(default = "default_end_year")]
    pub end_year: f64,

    /// 每年天数
    #[serde(default = "default_year_length_days")]
    pub year_length_days: f64,
}

fn default_end_year() -> f64 { 1000.0 }
fn default_year_length_days() -> f64 { 365.0 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start_year: 0.0,
            end_year: default_end_year(),
            year_length_days: default_year_length_days(),
        }
    }
}

/// 时间步控制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSteppingConfig {
    /// 绝对最大时间步长 [年]
    #[serde(default = "default_maximum_time_step_years")]
    pub maximum_time_step_years: f64,

    /// 命中 N 年整倍数（0 表示关闭）
    #[serde(default)]
    pub hit_multiples_years: u32,

    /// 时间步长量化分辨率 [s]（0 表示不量化）
    #[serde(default = "default_resolution_seconds")]
    pub resolution_seconds: f64,

    /// 扩散稳定性条件的安全系数
    #[serde(default = "default_adaptive_ratio")]
    pub adaptive_ratio: f64,

    /// 跳步机制
    #[serde(default)]
    pub skip: SkipConfig,

    /// 冰崩前缘后退是否参与 CFL 限制
    #[serde(default)]
    pub front_retreat_use_cfl: bool,

    /// 外力记录边界的最短步长 [s]
    #[serde(default = "default_record_step_floor_seconds")]
    pub record_step_floor_seconds: f64,
}

fn default_maximum_time_step_years() -> f64 { 60.0 }
fn default_resolution_seconds() -> f64 { 1.0 }
fn default_adaptive_ratio() -> f64 { 0.12 }
fn default_record_step_floor_seconds() -> f64 { 1.0 }

impl Default for TimeSteppingConfig {
    fn default() -> Self {
        Self {
            maximum_time_step_years: default_maximum_time_step_years(),
            hit_multiples_years: 0,
            resolution_seconds: default_resolution_seconds(),
            adaptive_ratio: default_adaptive_ratio(),
            skip: SkipConfig::default(),
            front_retreat_use_cfl: false,
            record_step_floor_seconds: default_record_step_floor_seconds(),
        }
    }
}

/// 跳步配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkipConfig {
    /// 是否启用
    #[serde(default)]
    pub enabled: bool,

    /// 最大跳步数
    #[serde(default = "default_skip_max")]
    pub max: u32,
}

fn default_skip_max() -> u32 { 10 }

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max: default_skip_max(),
        }
    }
}

/// 外力时间插值方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForcingInterpolation {
    /// 分段常数（使用记录的时间边界）
    PiecewiseConstant,
    /// 线性
    #[default]
    Linear,
}

/// 外力缓冲配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcingConfig {
    /// 每个外力场在内存中最多保留的记录数
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// 求时间平均时每年的采样次数
    #[serde(default = "default_evaluations_per_year")]
    pub evaluations_per_year: u32,

    /// 插值方式
    #[serde(default)]
    pub interpolation: ForcingInterpolation,

    /// 是否按周期解释
    #[serde(default)]
    pub periodic: bool,

    /// 周期 [年]
    #[serde(default)]
    pub period_years: f64,

    /// 周期参考时间 [年]
    #[serde(default)]
    pub reference_year: f64,
}

fn default_buffer_size() -> usize { 60 }
fn default_evaluations_per_year() -> u32 { 60 }

impl Default for ForcingConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            evaluations_per_year: default_evaluations_per_year(),
            interpolation: ForcingInterpolation::default(),
            periodic: false,
            period_years: 0.0,
            reference_year: 0.0,
        }
    }
}

/// 报告/输出时刻配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// 时间序列输出时刻 [年]
    #[serde(default)]
    pub times_years: Vec<f64>,
}

impl RunConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为格式化 JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let time = &self.time;
        if !(time.year_length_days > 0.0) {
            return Err(ConfigError::invalid(
                "time.year_length_days",
                time.year_length_days,
                "每年天数必须为正",
            ));
        }
        if !(time.end_year > time.start_year) {
            return Err(ConfigError::invalid(
                "time.end_year",
                time.end_year,
                format!("结束时间必须晚于起始时间 {}", time.start_year),
            ));
        }

        let ts = &self.time_stepping;
        if !(ts.maximum_time_step_years > 0.0) {
            return Err(ConfigError::invalid(
                "time_stepping.maximum_time_step_years",
                ts.maximum_time_step_years,
                "最大时间步长必须为正",
            ));
        }
        if !(ts.resolution_seconds >= 0.0) {
            return Err(ConfigError::invalid(
                "time_stepping.resolution_seconds",
                ts.resolution_seconds,
                "分辨率不能为负",
            ));
        }
        if !(ts.adaptive_ratio > 0.0) {
            return Err(ConfigError::invalid(
                "time_stepping.adaptive_ratio",
                ts.adaptive_ratio,
                "安全系数必须为正",
            ));
        }
        if ts.skip.enabled && ts.skip.max == 0 {
            return Err(ConfigError::invalid(
                "time_stepping.skip.max",
                ts.skip.max,
                "启用跳步时最大跳步数必须至少为 1",
            ));
        }
        if !(ts.record_step_floor_seconds >= 0.0) {
            return Err(ConfigError::invalid(
                "time_stepping.record_step_floor_seconds",
                ts.record_step_floor_seconds,
                "不能为负",
            ));
        }

        let forcing = &self.forcing;
        if forcing.buffer_size == 0 {
            return Err(ConfigError::invalid("forcing.buffer_size", 0, "缓冲区至少容纳一条记录"));
        }
        if forcing.evaluations_per_year == 0 {
            return Err(ConfigError::invalid(
                "forcing.evaluations_per_year",
                0,
                "每年采样次数必须为正",
            ));
        }
        if forcing.periodic && !(forcing.period_years > 0.0) {
            return Err(ConfigError::invalid(
                "forcing.period_years",
                forcing.period_years,
                "周期外力必须给出正的周期",
            ));
        }

        let times = &self.reporting.times_years;
        if times.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(ConfigError::invalid(
                "reporting.times_years",
                format!("{times:?}"),
                "报告时刻必须严格递增",
            ));
        }

        Ok(())
    }

    /// 日历
    pub fn calendar(&self) -> Calendar {
        Calendar::days_per_year(self.time.year_length_days)
    }

    /// 起始时间 [s]
    pub fn start_time(&self) -> f64 {
        self.calendar().years_to_seconds(self.time.start_year)
    }

    /// 结束时间 [s]
    pub fn end_time(&self) -> f64 {
        self.calendar().years_to_seconds(self.time.end_year)
    }

    /// 绝对最大时间步长 [s]
    pub fn maximum_time_step(&self) -> f64 {
        self.calendar()
            .years_to_seconds(self.time_stepping.maximum_time_step_years)
    }

    /// 报告时刻 [s]
    pub fn reporting_times(&self) -> Vec<f64> {
        let cal = self.calendar();
        self.reporting
            .times_years
            .iter()
            .map(|&y| cal.years_to_seconds(y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.forcing.buffer_size, 60);
        assert!(!config.time_stepping.skip.enabled);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "time": { "end_year": 500 }, "time_stepping": { "hit_multiples_years": 100 } }"#;
        let config = RunConfig::from_json_str(json).unwrap();
        assert_eq!(config.time.end_year, 500.0);
        assert_eq!(config.time_stepping.hit_multiples_years, 100);
        assert_eq!(config.time_stepping.resolution_seconds, 1.0);
        assert_eq!(config.forcing.interpolation, ForcingInterpolation::Linear);
    }

    #[test]
    fn test_rejects_reversed_run() {
        let json = r#"{ "time": { "start_year": 10, "end_year": 5 } }"#;
        let err = RunConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "time.end_year"));
    }

    #[test]
    fn test_rejects_periodic_without_period() {
        let mut config = RunConfig::default();
        config.forcing.periodic = true;
        assert!(config.validate().is_err());
        config.forcing.period_years = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_enabled_skip_with_zero_max() {
        let mut config = RunConfig::default();
        config.time_stepping.skip = SkipConfig { enabled: true, max: 0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unsorted_reporting_times() {
        let mut config = RunConfig::default();
        config.reporting.times_years = vec![10.0, 5.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seconds_conversions() {
        let config = RunConfig::default();
        let year = config.calendar().seconds_per_year();
        assert!((config.end_time() - 1000.0 * year).abs() < 1e-3);
        assert!((config.maximum_time_step() - 60.0 * year).abs() < 1e-3);
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut config = RunConfig::default();
        config.time_stepping.skip.enabled = true;
        config.reporting.times_years = vec![1.0, 2.0];

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json_string().unwrap().as_bytes()).unwrap();

        let loaded = RunConfig::from_file(file.path()).unwrap();
        assert!(loaded.time_stepping.skip.enabled);
        assert_eq!(loaded.reporting.times_years, vec![1.0, 2.0]);
    }
}
