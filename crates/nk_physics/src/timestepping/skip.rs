// crates/nk_physics/src/timestepping/skip.rs

//! 跳步计数器
//!
//! 当扩散条件（廉价物理）是最紧的限制时，昂贵的更新（应力平衡）
//! 可以在若干个廉价步之后再重算一次。计数器本身由驱动循环持有，
//! 每一步经 [`SkipCounter::update`] 传入传出。

use nk_config::SkipConfig;

use super::max_step::MaxStep;
use super::reasons;

/// 安全系数（为次紧限制留出 5% 余量）
const SKIP_SAFETY: f64 = 0.95;

/// 跳步规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipCounter {
    enabled: bool,
    skip_max: u32,
}

impl Default for SkipCounter {
    fn default() -> Self {
        Self::disabled()
    }
}

impl SkipCounter {
    /// 关闭跳步
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            skip_max: 0,
        }
    }

    /// 启用跳步，最多跳 `skip_max` 步
    pub fn enabled(skip_max: u32) -> Self {
        Self {
            enabled: true,
            skip_max,
        }
    }

    /// 从配置创建
    pub fn from_config(config: &SkipConfig) -> Self {
        if config.enabled {
            Self::enabled(config.max)
        } else {
            Self::disabled()
        }
    }

    /// 是否启用
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 最大跳步数
    pub fn skip_max(&self) -> u32 {
        self.skip_max
    }

    /// 计算本步之后的计数
    ///
    /// `dt_max`、`dt_other` 为排序后最小与次小的限制（整倍数截断之前）。
    pub fn update(&self, dt_max: &MaxStep, dt_other: &MaxStep, incoming: u32) -> u32 {
        if !self.enabled {
            return 0;
        }

        let mut counter = incoming;

        if dt_max.reason() == reasons::DIFFUSIVITY && incoming == 0 {
            counter = self.from_ratio(dt_other.value(), dt_max.value());
        }

        let binding_is_deadline =
            dt_max.reason() == reasons::MAX || dt_max.reason() == reasons::END_OF_RUN;
        if binding_is_deadline && counter > 1 {
            counter = 1;
        }

        counter
    }

    fn from_ratio(&self, dt_other: f64, dt_max: f64) -> u32 {
        if dt_max <= 0.0 {
            return self.skip_max;
        }
        let ratio = (SKIP_SAFETY * dt_other / dt_max).floor();
        if !ratio.is_finite() || ratio >= f64::from(self.skip_max) {
            self.skip_max
        } else {
            // ratio 在 [0, skip_max) 内
            ratio as u32
        }
    }
}
