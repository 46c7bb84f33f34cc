// ==========================================
// 学校教务管理系统 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 比较键归一化 / 宽松数值解析
// 红线: 解析失败返回 Err 值, 从不 panic
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

/// 非数字文本
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("不是有效数字: '{0}'")]
pub struct NotANumber(pub String);

pub struct DataCleaner;

impl DataCleaner {
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 空白字符串视为缺失
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 比较键: TRIM + 小写（唯一性 / 外键匹配）
    pub fn normalize_key(&self, value: &str) -> String {
        value.trim().to_lowercase()
    }

    /// 宽松金额解析
    ///
    /// - 去除千分位逗号与空白
    /// - 空输入: Ok(None)
    /// - 非数字（含 NaN / inf）: Err(NotANumber)
    pub fn parse_currency(&self, value: &str) -> Result<Option<f64>, NotANumber> {
        let stripped: String = value
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        if stripped.is_empty() {
            return Ok(None);
        }
        match stripped.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(NotANumber(value.trim().to_string())),
        }
    }

    /// 整数解析（同样容忍千分位）
    pub fn parse_integer(&self, value: &str) -> Result<Option<i64>, NotANumber> {
        let stripped: String = value
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        if stripped.is_empty() {
            return Ok(None);
        }
        stripped
            .parse::<i64>()
            .map(Some)
            .map_err(|_| NotANumber(value.trim().to_string()))
    }

    /// 日期解析: YYYY-MM-DD, 兼容 YYYY/MM/DD
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
            .ok()
    }
}
