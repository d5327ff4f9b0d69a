// crates/nk_physics/src/forcing/error.rs

//! 外力缓冲错误

use nk_foundation::NkError;
use nk_io::IoError;
use thiserror::Error;

/// 外力缓冲结果类型
pub type ForcingResult<T> = Result<T, ForcingError>;

/// 外力缓冲错误
///
/// 三类错误都是致命的：配置错误阻止运行开始，容量与读取错误终止当前步。
#[derive(Error, Debug)]
pub enum ForcingError {
    /// 配置错误（时间不递增、周期数据缓冲过小、变量缺失等）
    #[error("外力 {field} 配置错误: {message}")]
    Configuration { field: String, message: String },

    /// 非周期缓冲无法在容量内覆盖所需区间
    #[error("外力 {field} 需要 {required} 条记录, 缓冲容量只有 {capacity}")]
    Capacity {
        field: String,
        required: usize,
        capacity: usize,
    },

    /// 读取记录失败
    #[error(transparent)]
    Io(#[from] IoError),
}

impl ForcingError {
    /// 配置错误
    pub fn configuration(field: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<ForcingError> for NkError {
    fn from(err: ForcingError) -> Self {
        match err {
            ForcingError::Configuration { .. } => NkError::configuration(err.to_string()),
            ForcingError::Capacity {
                field,
                required,
                capacity,
            } => NkError::capacity(field, required, capacity),
            ForcingError::Io(e) => e.into(),
        }
    }
}
