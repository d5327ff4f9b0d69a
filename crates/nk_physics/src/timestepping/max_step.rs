// crates/nk_physics/src/timestepping/max_step.rs

//! 最大时间步长
//!
//! 每个子系统以 [`MaxStep`] 报告它允许的最大时间步长及原因。
//! `+inf` 表示该子系统不限制时间步长。

use std::cmp::Ordering;
use std::fmt;

use tracing::warn;

/// 单个原因下允许的最大时间步长 [s]
///
/// 按 `value` 升序排序，`+inf` 排在最后。值相同时保持原顺序
/// （调用方使用稳定排序）。
#[derive(Debug, Clone)]
pub struct MaxStep {
    value: f64,
    reason: String,
}

impl MaxStep {
    /// 创建
    ///
    /// 负值和 NaN 被截断为 0 并记录警告。
    pub fn new(value: f64, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let value = if value >= 0.0 {
            value
        } else {
            warn!("时间步长限制 {reason} 给出无效值 {value}, 按 0 处理");
            0.0
        };
        Self { value, reason }
    }

    /// 不限制时间步长
    pub fn unlimited(reason: impl Into<String>) -> Self {
        Self {
            value: f64::INFINITY,
            reason: reason.into(),
        }
    }

    /// 步长 [s]
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// 原因
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// 是否有限
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    /// 拆分为 (值, 原因)
    pub fn into_parts(self) -> (f64, String) {
        (self.value, self.reason)
    }
}

impl PartialEq for MaxStep {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MaxStep {}

impl PartialOrd for MaxStep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MaxStep {
    /// 只比较 `value`，原因不参与排序
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
    }
}

impl fmt::Display for MaxStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_finite() {
            write!(f, "{:.6e} s ({})", self.value, self.reason)
        } else {
            write!(f, "inf ({})", self.reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infinity_sorts_last() {
        let mut list = vec![
            MaxStep::unlimited("end"),
            MaxStep::new(5.0, "CFL"),
            MaxStep::new(3.0, "max"),
        ];
        list.sort();
        let reasons: Vec<_> = list.iter().map(MaxStep::reason).collect();
        assert_eq!(reasons, vec!["max", "CFL", "end"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut list = vec![
            MaxStep::new(2.0, "a"),
            MaxStep::new(1.0, "b"),
            MaxStep::new(2.0, "c"),
        ];
        list.sort();
        assert_eq!(list[1].reason(), "a");
        assert_eq!(list[2].reason(), "c");
    }

    #[test]
    fn test_equality_ignores_reason() {
        assert_eq!(MaxStep::new(1.0, "x"), MaxStep::new(1.0, "y"));
        assert!(MaxStep::new(1.0, "x") < MaxStep::unlimited("y"));
    }

    #[test]
    fn test_invalid_values_clamped_to_zero() {
        for v in [-1.0, -f64::INFINITY, f64::NAN] {
            let step = MaxStep::new(v, "external");
            assert_eq!(step.value(), 0.0);
            assert_eq!(step.reason(), "external");
        }
        // 截断后仍是最严格的限制
        let mut list = vec![MaxStep::new(1.0, "a"), MaxStep::new(f64::NAN, "b")];
        list.sort();
        assert_eq!(list[0].reason(), "b");
    }

    #[test]
    fn test_display() {
        assert_eq!(MaxStep::unlimited("none").to_string(), "inf (none)");
        assert!(MaxStep::new(2.0, "max").to_string().ends_with("(max)"));
    }
}
