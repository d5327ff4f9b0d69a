// crates/nk_foundation/src/units.rs

//! 模式时间与日历
//!
//! 模式内部时间统一以秒计。年与秒之间的换算由 [`Calendar`] 完成，
//! 默认使用 365 天日历（无闰年），与长时间尺度的冰盖强迫数据一致。

use serde::{Deserialize, Serialize};

/// 一天的秒数
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// 365 天日历下一年的秒数
pub const SECONDS_PER_YEAR_365: f64 = 365.0 * SECONDS_PER_DAY;

/// 固定年长的日历
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    seconds_per_year: f64,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::days_per_year(365.0)
    }
}

impl Calendar {
    /// 按每年天数创建
    pub fn days_per_year(days: f64) -> Self {
        Self {
            seconds_per_year: days * SECONDS_PER_DAY,
        }
    }

    /// 一年的秒数
    #[inline]
    pub fn seconds_per_year(&self) -> f64 {
        self.seconds_per_year
    }

    /// 年 -> 秒
    #[inline]
    pub fn years_to_seconds(&self, years: f64) -> f64 {
        years * self.seconds_per_year
    }

    /// 秒 -> 年
    #[inline]
    pub fn seconds_to_years(&self, seconds: f64) -> f64 {
        seconds / self.seconds_per_year
    }

    /// 在 `t` 的基础上增加整年数
    pub fn increment_date(&self, t: f64, years: u32) -> f64 {
        t + self.years_to_seconds(f64::from(years))
    }

    /// 不晚于 `t` 的最近一个 `years` 年整倍数时刻
    pub fn last_multiple(&self, t: f64, years: u32) -> f64 {
        if years == 0 {
            return t;
        }
        let step = self.years_to_seconds(f64::from(years));
        (t / step).floor() * step
    }

    /// 周期化：返回 `t` 对 `period` 取模后落在 `[0, period)` 内的值
    pub fn time_mod(&self, t: f64, period: f64) -> f64 {
        if period <= 0.0 {
            return t;
        }
        let r = t.rem_euclid(period);
        // rem_euclid 在舍入边界可能返回 period 本身
        if r >= period {
            0.0
        } else {
            r
        }
    }

    /// 日志用的日期字符串
    pub fn date(&self, t: f64) -> String {
        format!("{:.3} yr", self.seconds_to_years(t))
    }
}
