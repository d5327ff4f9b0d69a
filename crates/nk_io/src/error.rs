// crates/nk_io/src/error.rs
//! IO 错误类型定义
//!
//! 外力记录源的统一错误枚举。所有错误最终可转换为 NkError 以实现跨层错误传递。

use nk_foundation::NkError;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 变量不存在
    #[error("变量不存在: {variable} (来源 {source_name})")]
    VariableNotFound {
        variable: String,
        source_name: String,
    },

    /// 记录索引越界
    #[error("记录索引越界: {variable} 第 {index} 条, 共 {len} 条")]
    RecordOutOfRange {
        variable: String,
        index: usize,
        len: usize,
    },

    /// 数据结构不合法
    #[error("数据不合法: {variable}, {reason}")]
    Malformed { variable: String, reason: String },

    /// 解析错误
    #[error("文件解析错误: {file} - {message}")]
    Parse { file: String, message: String },

    /// 底层 IO 错误
    #[error("读取失败: {file}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl IoError {
    /// 变量不存在
    pub fn variable_not_found(variable: &str, source_name: impl Into<String>) -> Self {
        Self::VariableNotFound {
            variable: variable.to_string(),
            source_name: source_name.into(),
        }
    }

    /// 数据不合法
    pub fn malformed(variable: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<IoError> for NkError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::VariableNotFound { .. } | IoError::Malformed { .. } => {
                NkError::configuration(err.to_string())
            }
            IoError::Io { file, source } => {
                NkError::io_with_source(format!("读取 {file} 失败"), source)
            }
            other => NkError::io(other.to_string()),
        }
    }
}
