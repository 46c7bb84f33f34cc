// ==========================================
// 学校教务管理系统 - 列 schema 与记录解码
// ==========================================
// 职责: RawRecord（字符串键值）→ TypedRecord（按列类型解码）
// 顺序: 先检查全部必填列, 再逐列解析
// 说明: 解码结果为显式的成功 / 失败值, 业务规则只看到类型化数据
// ==========================================

use crate::domain::import::{FieldValue, RawRecord, TypedRecord};
use crate::importer::data_cleaner::DataCleaner;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Currency,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub required: bool,
    pub kind: ColumnKind,
}

impl ColumnSchema {
    pub fn required(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            kind,
        }
    }

    pub fn optional(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            kind,
        }
    }
}

/// 单字段问题（作为无效记录的原因文本）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    #[error("缺少必填字段: {field}")]
    Missing { field: String },

    #[error("字段 {field} 不是有效数字: '{value}'")]
    NotANumber { field: String, value: String },

    #[error("字段 {field} 日期格式错误（期望 YYYY-MM-DD）: '{value}'")]
    InvalidDate { field: String, value: String },
}

/// schema 中的必填列名
pub fn required_fields(schema: &[ColumnSchema]) -> Vec<String> {
    schema
        .iter()
        .filter(|c| c.required)
        .map(|c| c.name.clone())
        .collect()
}

/// 必填检查: 字段存在且 TRIM 后非空
pub fn check_required(raw: &RawRecord, required: &[String]) -> Result<(), FieldIssue> {
    for field in required {
        let present = raw
            .get(field)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(FieldIssue::Missing {
                field: field.clone(),
            });
        }
    }
    Ok(())
}

/// 解码一条记录
pub fn decode_record(raw: &RawRecord, schema: &[ColumnSchema]) -> Result<TypedRecord, FieldIssue> {
    check_required(raw, &required_fields(schema))?;

    let cleaner = DataCleaner;
    let mut typed = TypedRecord::new();

    for column in schema {
        let text = match cleaner.normalize_null(raw.get(&column.name).map(String::as_str)) {
            Some(text) => text,
            None => {
                typed.insert(column.name.clone(), FieldValue::Empty);
                continue;
            }
        };

        let value = match column.kind {
            ColumnKind::Text => FieldValue::Text(text),
            ColumnKind::Currency => match cleaner.parse_currency(&text) {
                Ok(Some(v)) => FieldValue::Currency(v),
                Ok(None) => FieldValue::Empty,
                Err(_) => {
                    return Err(FieldIssue::NotANumber {
                        field: column.name.clone(),
                        value: text,
                    })
                }
            },
            ColumnKind::Integer => match cleaner.parse_integer(&text) {
                Ok(Some(v)) => FieldValue::Integer(v),
                Ok(None) => FieldValue::Empty,
                Err(_) => {
                    return Err(FieldIssue::NotANumber {
                        field: column.name.clone(),
                        value: text,
                    })
                }
            },
            ColumnKind::Date => match cleaner.parse_date(&text) {
                Some(d) => FieldValue::Date(d),
                None => {
                    return Err(FieldIssue::InvalidDate {
                        field: column.name.clone(),
                        value: text,
                    })
                }
            },
        };
        typed.insert(column.name.clone(), value);
    }

    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn schema() -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::required("name", ColumnKind::Text),
            ColumnSchema::required("roll_number", ColumnKind::Text),
            ColumnSchema::optional("opening_balance", ColumnKind::Currency),
            ColumnSchema::optional("date_of_birth", ColumnKind::Date),
        ]
    }

    #[test]
    fn test_decode_success() {
        let typed = decode_record(
            &raw(&[
                ("name", " Ali "),
                ("roll_number", "R1"),
                ("opening_balance", "1,500"),
            ]),
            &schema(),
        )
        .unwrap();

        assert_eq!(typed["name"], FieldValue::Text("Ali".to_string()));
        assert_eq!(typed["opening_balance"], FieldValue::Currency(1500.0));
        assert_eq!(typed["date_of_birth"], FieldValue::Empty);
    }

    #[test]
    fn test_required_checked_before_parsing() {
        // 同时缺少必填字段且金额非法: 报缺失
        let issue = decode_record(
            &raw(&[("name", "Ali"), ("roll_number", "  "), ("opening_balance", "abc")]),
            &schema(),
        )
        .unwrap_err();
        assert_eq!(
            issue,
            FieldIssue::Missing {
                field: "roll_number".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_currency_is_issue_not_panic() {
        let issue = decode_record(
            &raw(&[("name", "Ali"), ("roll_number", "R1"), ("opening_balance", "lots")]),
            &schema(),
        )
        .unwrap_err();
        assert!(issue.to_string().contains("opening_balance"));
        assert!(issue.to_string().contains("lots"));
    }
}
