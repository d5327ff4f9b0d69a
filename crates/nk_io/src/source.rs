// crates/nk_io/src/source.rs

//! 外力记录源接口
//!
//! 外力缓冲通过此接口访问持久化的时间序列：
//! - 枚举某变量的记录时间与（可选的）时间边界
//! - 按索引读取单条记录
//! - 检查变量是否存在

use nk_foundation::{Grid, ScalarField};

use crate::error::IoResult;

/// 某变量的时间轴数据（原样读取，未经验证）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordAxisData {
    /// 记录时间 [s]
    pub times: Vec<f64>,
    /// 时间边界，长度为 2 * times.len()；缺失时为 None
    pub bounds: Option<Vec<f64>>,
}

impl RecordAxisData {
    /// 无边界的时间轴
    pub fn from_times(times: Vec<f64>) -> Self {
        Self { times, bounds: None }
    }

    /// 带边界的时间轴
    pub fn with_bounds(times: Vec<f64>, bounds: Vec<f64>) -> Self {
        Self {
            times,
            bounds: Some(bounds),
        }
    }
}

/// 只读的外力记录源
///
/// 所有进程以相同顺序调用这些方法，读取在语义上是集合操作。
pub trait RecordSource: Send + Sync {
    /// 来源描述（用于日志与错误信息）
    fn describe(&self) -> String;

    /// 记录所在网格
    fn grid(&self) -> Grid;

    /// 变量是否存在
    fn has_variable(&self, variable: &str) -> bool;

    /// 读取时间轴
    ///
    /// 变量没有时间维时返回 `Ok(None)`，此时该变量只有一条记录。
    fn record_axis(&self, variable: &str) -> IoResult<Option<RecordAxisData>>;

    /// 读取第 `index` 条记录
    fn read_record(&self, variable: &str, index: usize) -> IoResult<ScalarField>;
}
