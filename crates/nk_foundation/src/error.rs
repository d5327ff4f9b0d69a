// crates/nk_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `NkError` 枚举和 `NkResult` 类型别名，用于整个项目的错误处理。
//!
//! # 错误分类
//!
//! 1. **配置错误**: 初始化阶段发现，模拟无法启动（时间非单调、缓冲区过小、缺少变量）
//! 2. **容量错误**: 非周期缓冲区无法在容量内覆盖请求的时间区间
//! 3. **IO 错误**: 读取外力记录失败，不重试，整次模拟中止
//!
//! 所有致命错误都会在每个进程上立即中止当前步，不允许部分状态继续运行。
//!
//! # 示例
//!
//! ```
//! use nk_foundation::error::{NkError, NkResult};
//!
//! fn read_forcing() -> NkResult<()> {
//!     Err(NkError::configuration("时间必须严格递增"))
//! }
//! assert!(read_forcing().is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type NkResult<T> = Result<T, NkError>;

/// Nunatak 错误类型
#[derive(Error, Debug)]
pub enum NkError {
    /// 配置错误（初始化阶段，致命）
    #[error("配置错误: {message}")]
    Configuration {
        /// 具体错误信息
        message: String,
    },

    /// 缓冲区容量不足
    #[error("缓冲区容量不足: {field} 需要 {required} 条记录, 容量 {capacity}")]
    Capacity {
        /// 外力场名称
        field: String,
        /// 需要的记录数
        required: usize,
        /// 缓冲区容量
        capacity: usize,
    },

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 资源未找到
    #[error("资源未找到: {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },
}

impl NkError {
    /// 配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// 容量错误
    pub fn capacity(field: impl Into<String>, required: usize, capacity: usize) -> Self {
        Self::Capacity {
            field: field.into(),
            required,
            capacity,
        }
    }

    /// IO 错误（无底层源）
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// IO 错误（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 资源未找到
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// 是否为致命的初始化错误
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> NkResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }
}

impl From<std::io::Error> for NkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// 条件不满足时提前返回错误
///
/// ```
/// use nk_foundation::{ensure, NkError, NkResult};
///
/// fn positive(x: f64) -> NkResult<f64> {
///     ensure!(x > 0.0, NkError::invalid_input("x 必须为正"));
///     Ok(x)
/// }
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
