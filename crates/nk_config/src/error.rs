// crates/nk_config/src/error.rs

//! 配置层错误类型

use nk_foundation::NkError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 无效值
    pub fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for NkError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => NkError::io_with_source("读取配置失败", e),
            other => NkError::configuration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("time_stepping.maximum_time_step_years", -1, "必须为正");
        assert!(err.to_string().contains("maximum_time_step_years"));
    }

    #[test]
    fn test_into_foundation_error() {
        let err: NkError = ConfigError::Parse("bad json".into()).into();
        assert!(err.is_configuration());
    }
}
