// crates/nk_io/src/memory.rs

//! 内存记录源
//!
//! 用于合成外力、测试以及由其它格式预先转换得到的数据。
//! 记录每次读取的索引，便于检查缓冲区只读取缺失的记录。

use std::collections::{HashMap, HashSet};

use nk_foundation::{Grid, ScalarField};
use parking_lot::RwLock;

use crate::error::{IoError, IoResult};
use crate::source::{RecordAxisData, RecordSource};

#[derive(Debug, Clone)]
struct MemoryVariable {
    axis: Option<RecordAxisData>,
    records: Vec<ScalarField>,
}

/// 内存记录源
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    grid: Grid,
    variables: HashMap<String, MemoryVariable>,
    failing: HashSet<(String, usize)>,
    read_log: RwLock<Vec<(String, usize)>>,
}

impl MemorySource {
    /// 创建空记录源
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            grid,
            variables: HashMap::new(),
            failing: HashSet::new(),
            read_log: RwLock::new(Vec::new()),
        }
    }

    /// 添加带时间维的变量
    pub fn with_series(
        mut self,
        variable: &str,
        axis: RecordAxisData,
        records: Vec<ScalarField>,
    ) -> IoResult<Self> {
        if axis.times.len() != records.len() {
            return Err(IoError::malformed(
                variable,
                format!("{} 个时间点, {} 条记录", axis.times.len(), records.len()),
            ));
        }
        if let Some(bounds) = &axis.bounds {
            if bounds.len() != 2 * axis.times.len() {
                return Err(IoError::malformed(variable, "时间边界长度必须为时间点数的两倍"));
            }
        }
        self.check_records(variable, &records)?;
        self.variables.insert(
            variable.to_string(),
            MemoryVariable {
                axis: Some(axis),
                records,
            },
        );
        Ok(self)
    }

    /// 添加没有时间维的变量（单条记录）
    pub fn with_static(mut self, variable: &str, field: ScalarField) -> IoResult<Self> {
        self.check_records(variable, std::slice::from_ref(&field))?;
        self.variables.insert(
            variable.to_string(),
            MemoryVariable {
                axis: None,
                records: vec![field],
            },
        );
        Ok(self)
    }

    /// 让指定记录的读取失败
    pub fn with_read_failure(mut self, variable: &str, index: usize) -> Self {
        self.failing.insert((variable.to_string(), index));
        self
    }

    /// 已读取的记录（按读取顺序）
    pub fn read_log(&self) -> Vec<(String, usize)> {
        self.read_log.read().clone()
    }

    /// 指定变量已读取的记录索引
    pub fn reads_of(&self, variable: &str) -> Vec<usize> {
        self.read_log
            .read()
            .iter()
            .filter(|(v, _)| v == variable)
            .map(|(_, k)| *k)
            .collect()
    }

    /// 清空读取日志
    pub fn clear_read_log(&self) {
        self.read_log.write().clear();
    }

    fn check_records(&self, variable: &str, records: &[ScalarField]) -> IoResult<()> {
        match records.iter().position(|r| !r.matches(&self.grid)) {
            Some(k) => Err(IoError::malformed(
                variable,
                format!("第 {k} 条记录的形状与网格不一致"),
            )),
            None => Ok(()),
        }
    }

    fn variable(&self, variable: &str) -> IoResult<&MemoryVariable> {
        self.variables
            .get(variable)
            .ok_or_else(|| IoError::variable_not_found(variable, self.name.clone()))
    }
}

impl RecordSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn grid(&self) -> Grid {
        self.grid
    }

    fn has_variable(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    fn record_axis(&self, variable: &str) -> IoResult<Option<RecordAxisData>> {
        Ok(self.variable(variable)?.axis.clone())
    }

    fn read_record(&self, variable: &str, index: usize) -> IoResult<ScalarField> {
        let var = self.variable(variable)?;
        if self.failing.contains(&(variable.to_string(), index)) {
            return Err(IoError::Io {
                file: self.describe(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("无法读取 {variable} 第 {index} 条记录"),
                ),
            });
        }
        let record = var
            .records
            .get(index)
            .ok_or_else(|| IoError::RecordOutOfRange {
                variable: variable.to_string(),
                index,
                len: var.records.len(),
            })?;
        self.read_log.write().push((variable.to_string(), index));
        Ok(record.clone())
    }
}
