// ==========================================
// 学校教务管理系统 - 导入领域模型
// ==========================================
// 职责: 原始行 / 校验结果 / 进度 / 分块写入结果
// 生命周期: RawRecord 只存在于一次导入调用内
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 原始行（列名 → 单元格文本）
pub type RawRecord = HashMap<String, String>;

/// 数据行号 = 下标 + 2（1 起始, 且跳过表头行）
pub fn row_number_for_index(index: usize) -> usize {
    index + 2
}

// ==========================================
// FieldValue - 按列 schema 解码后的字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Currency(f64),
    Date(NaiveDate),
    Empty,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_currency(&self) -> Option<f64> {
        match self {
            FieldValue::Currency(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(v) => Some(*v),
            _ => None,
        }
    }
}

pub type TypedRecord = HashMap<String, FieldValue>;

// ==========================================
// 校验结果
// ==========================================

/// 通过校验的记录（保留原始行, 附带解码值与外键解析结果）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedRecord {
    pub row_num: usize,
    pub record: RawRecord,
    pub values: TypedRecord,
    /// 外键列名 → 解析到的实体 ID
    pub references: HashMap<String, String>,
}

impl AcceptedRecord {
    pub fn text(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(FieldValue::as_text)
    }

    pub fn reference(&self, field: &str) -> Option<&str> {
        self.references.get(field).map(String::as_str)
    }
}

/// 未通过校验的记录（每条只有一个原因: 第一条失败的规则）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidRecord {
    pub record: RawRecord,
    pub reason: String,
    pub row_num: usize,
}

/// 校验结果
///
/// 不变量: 每条输入记录恰好出现在两个序列之一, 且保持输入顺序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid_records: Vec<AcceptedRecord>,
    pub invalid_records: Vec<InvalidRecord>,
}

impl ValidationResult {
    pub fn total(&self) -> usize {
        self.valid_records.len() + self.invalid_records.len()
    }

    /// 按行号挑选有效记录（调用方勾选的子集）, 保持原顺序
    pub fn select_rows(&self, row_nums: &[usize]) -> Vec<AcceptedRecord> {
        self.valid_records
            .iter()
            .filter(|r| row_nums.contains(&r.row_num))
            .cloned()
            .collect()
    }
}

// ==========================================
// 导入进度
// ==========================================
// processed 在一次运行内单调不减; errors 由调用方累积
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub processed: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

// ==========================================
// 分块写入结果
// ==========================================
// 失败策略: fail-fast, 不重试, 不回滚
// 已写入的块保持提交, 剩余块不再尝试
#[derive(Debug)]
pub enum ChunkedWriteOutcome<E> {
    Completed {
        written: usize,
    },
    PartiallyCommitted {
        committed: usize,
        remaining: usize,
        failed_chunk: usize, // 失败块下标（0 起始）
        error: E,
    },
}

impl<E> ChunkedWriteOutcome<E> {
    pub fn is_complete(&self) -> bool {
        matches!(self, ChunkedWriteOutcome::Completed { .. })
    }

    /// 已提交的记录数（无论是否全部成功）
    pub fn committed(&self) -> usize {
        match self {
            ChunkedWriteOutcome::Completed { written } => *written,
            ChunkedWriteOutcome::PartiallyCommitted { committed, .. } => *committed,
        }
    }

    /// 转为普通 Result: 失败时原样返回写入错误
    pub fn into_result(self) -> Result<usize, E> {
        match self {
            ChunkedWriteOutcome::Completed { written } => Ok(written),
            ChunkedWriteOutcome::PartiallyCommitted { error, .. } => Err(error),
        }
    }

    pub fn map_err<F, E2>(self, f: F) -> ChunkedWriteOutcome<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            ChunkedWriteOutcome::Completed { written } => ChunkedWriteOutcome::Completed { written },
            ChunkedWriteOutcome::PartiallyCommitted {
                committed,
                remaining,
                failed_chunk,
                error,
            } => ChunkedWriteOutcome::PartiallyCommitted {
                committed,
                remaining,
                failed_chunk,
                error: f(error),
            },
        }
    }
}

// ==========================================
// 导入模板（静态透传: 表头 + 示例行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportTemplate {
    pub entity: String,
    pub headers: Vec<String>,
    pub sample_rows: Vec<RawRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_number_offset() {
        assert_eq!(row_number_for_index(0), 2);
        assert_eq!(row_number_for_index(9), 11);
    }

    #[test]
    fn test_outcome_into_result_keeps_error() {
        let outcome: ChunkedWriteOutcome<String> = ChunkedWriteOutcome::PartiallyCommitted {
            committed: 4,
            remaining: 6,
            failed_chunk: 2,
            error: "disk full".to_string(),
        };
        assert_eq!(outcome.committed(), 4);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.into_result(), Err("disk full".to_string()));
    }
}
