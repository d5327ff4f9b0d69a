// crates/nk_io/src/json.rs

//! JSON 外力文件
//!
//! 文件结构：
//!
//! ```json
//! {
//!   "grid": { "nx": 2, "ny": 1, "dx": 5000.0, "dy": 5000.0 },
//!   "variables": {
//!     "air_temp": {
//!       "units": "K",
//!       "time": [0.0, 31536000.0],
//!       "time_bounds": [0.0, 31536000.0, 31536000.0, 63072000.0],
//!       "records": [[250.0, 251.0], [252.0, 253.0]]
//!     }
//!   }
//! }
//! ```
//!
//! `time` 缺失表示变量没有时间维（只能有一条记录），`time_bounds` 可选。
//! 打开文件时只保留元数据，每次读取记录都重新打开文件。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nk_foundation::{Grid, ScalarField};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{IoError, IoResult};
use crate::source::{RecordAxisData, RecordSource};

/// 变量数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForcingVariable {
    /// 单位（仅用于显示）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// 记录时间 [s]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<f64>>,
    /// 时间边界 [s]，长度 2n
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_bounds: Option<Vec<f64>>,
    /// 行主序记录
    pub records: Vec<Vec<f64>>,
}

/// 外力文件文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcingDocument {
    /// 网格
    pub grid: Grid,
    /// 变量表
    pub variables: BTreeMap<String, ForcingVariable>,
}

impl ForcingDocument {
    /// 创建空文档
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            variables: BTreeMap::new(),
        }
    }

    /// 检查所有变量的结构
    pub fn validate(&self) -> IoResult<()> {
        let n_points = self.grid.n_points();
        for (name, var) in &self.variables {
            let expected = var.time.as_ref().map_or(1, Vec::len);
            if var.records.len() != expected {
                return Err(IoError::malformed(
                    name,
                    format!("期望 {expected} 条记录, 实际 {}", var.records.len()),
                ));
            }
            if let Some(bounds) = &var.time_bounds {
                if var.time.is_none() || bounds.len() != 2 * expected {
                    return Err(IoError::malformed(name, "时间边界与时间轴不一致"));
                }
            }
            if let Some(k) = var.records.iter().position(|r| r.len() != n_points) {
                return Err(IoError::malformed(
                    name,
                    format!("第 {k} 条记录长度不等于网格点数 {n_points}"),
                ));
            }
        }
        Ok(())
    }

    /// 写入文件
    pub fn write(&self, path: &Path) -> IoResult<()> {
        let text = serde_json::to_string_pretty(self).map_err(|e| IoError::Parse {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|source| IoError::Io {
            file: path.display().to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone)]
struct VariableMeta {
    axis: Option<RecordAxisData>,
    n_records: usize,
}

/// 基于 JSON 文件的记录源
#[derive(Debug, Clone)]
pub struct JsonForcingFile {
    path: PathBuf,
    grid: Grid,
    variables: BTreeMap<String, VariableMeta>,
}

impl JsonForcingFile {
    /// 打开文件并读取元数据
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = load_document(&path)?;

        let variables = doc
            .variables
            .iter()
            .map(|(name, var)| {
                let axis = var.time.as_ref().map(|times| RecordAxisData {
                    times: times.clone(),
                    bounds: var.time_bounds.clone(),
                });
                let meta = VariableMeta {
                    axis,
                    n_records: var.records.len(),
                };
                (name.clone(), meta)
            })
            .collect();

        Ok(Self {
            path,
            grid: doc.grid,
            variables,
        })
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 变量名列表
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }

    /// 变量的记录数
    pub fn n_records(&self, variable: &str) -> Option<usize> {
        self.variables.get(variable).map(|m| m.n_records)
    }

    fn meta(&self, variable: &str) -> IoResult<&VariableMeta> {
        self.variables
            .get(variable)
            .ok_or_else(|| IoError::variable_not_found(variable, self.describe()))
    }
}

fn load_document(path: &Path) -> IoResult<ForcingDocument> {
    let text = std::fs::read_to_string(path).map_err(|source| IoError::Io {
        file: path.display().to_string(),
        source,
    })?;
    let doc: ForcingDocument = serde_json::from_str(&text).map_err(|e| IoError::Parse {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;
    doc.validate()?;
    Ok(doc)
}

impl RecordSource for JsonForcingFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn grid(&self) -> Grid {
        self.grid
    }

    fn has_variable(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    fn record_axis(&self, variable: &str) -> IoResult<Option<RecordAxisData>> {
        Ok(self.meta(variable)?.axis.clone())
    }

    fn read_record(&self, variable: &str, index: usize) -> IoResult<ScalarField> {
        let n_records = self.meta(variable)?.n_records;
        if index >= n_records {
            return Err(IoError::RecordOutOfRange {
                variable: variable.to_string(),
                index,
                len: n_records,
            });
        }

        let mut doc = load_document(&self.path)?;
        let var = doc
            .variables
            .remove(variable)
            .ok_or_else(|| IoError::variable_not_found(variable, self.describe()))?;
        let data = var
            .records
            .into_iter()
            .nth(index)
            .ok_or_else(|| IoError::malformed(variable, "文件在打开后被修改"))?;

        trace!("{}: 读取 {} 第 {} 条记录", self.describe(), variable, index);

        ScalarField::from_vec(&doc.grid, data)
            .map_err(|e| IoError::malformed(variable, e.to_string()))
    }
}
