// ==========================================
// 学校教务管理系统 - 唯一键冲突处理
// ==========================================
// 职责: 检测与已落库数据 / 同批次已接受记录的重复键
// 策略: 首次出现者胜出, 之后的重复记录无效
// 比较: TRIM + 小写; 复合键按列拼接
// ==========================================

use crate::domain::import::RawRecord;
use crate::importer::data_cleaner::DataCleaner;
use std::collections::{HashMap, HashSet};

/// 唯一性规则
#[derive(Debug, Clone, Default)]
pub struct UniquenessRule {
    /// 组成唯一键的列（单列或复合）
    pub fields: Vec<String>,
    /// 原因文本中使用的键名称（如 "学号"）
    pub label: String,
    /// 已落库的键（已归一化）
    pub existing: HashSet<String>,
}

impl UniquenessRule {
    pub fn new(fields: &[&str], label: &str) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            label: label.to_string(),
            existing: HashSet::new(),
        }
    }

    /// 设置已落库的键（原始值, 内部归一化）
    pub fn with_existing<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaner = DataCleaner;
        self.existing = keys
            .into_iter()
            .map(|k| cleaner.normalize_key(k.as_ref()))
            .collect();
        self
    }

    /// 由多列组成复合比较键; 全部列为空时返回 None（不参与唯一性判断）
    pub fn key_for(&self, record: &RawRecord) -> Option<(String, String)> {
        let cleaner = DataCleaner;
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|f| record.get(f).map(|v| v.trim().to_string()).unwrap_or_default())
            .collect();
        if parts.iter().all(|p| p.is_empty()) {
            return None;
        }
        let display = parts
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" / ");
        let normalized = parts
            .iter()
            .map(|p| cleaner.normalize_key(p))
            .collect::<Vec<_>>()
            .join("|");
        Some((normalized, display))
    }
}

/// 唯一键冲突
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyConflict {
    /// 与已落库数据重复
    Existing { label: String, value: String },
    /// 与本批次之前已接受的记录重复
    InBatch {
        label: String,
        value: String,
        first_row: usize,
    },
}

impl KeyConflict {
    pub fn reason(&self) -> String {
        match self {
            KeyConflict::Existing { label, value } => format!("{}已存在: '{}'", label, value),
            KeyConflict::InBatch {
                label,
                value,
                first_row,
            } => format!(
                "{}在本次导入中重复: '{}'（首次出现于第 {} 行）",
                label, value, first_row
            ),
        }
    }
}

/// 单次校验运行内的唯一键登记表
pub struct ConflictHandler<'a> {
    rules: &'a [UniquenessRule],
    // 每条规则: 归一化键 → 首次接受的行号
    accepted: Vec<HashMap<String, usize>>,
}

impl<'a> ConflictHandler<'a> {
    pub fn new(rules: &'a [UniquenessRule]) -> Self {
        Self {
            rules,
            accepted: vec![HashMap::new(); rules.len()],
        }
    }

    /// 检查记录是否与已落库 / 已接受记录冲突（不登记）
    pub fn check(&self, record: &RawRecord) -> Result<(), KeyConflict> {
        for (rule, accepted) in self.rules.iter().zip(&self.accepted) {
            let Some((key, display)) = rule.key_for(record) else {
                continue;
            };
            if rule.existing.contains(&key) {
                return Err(KeyConflict::Existing {
                    label: rule.label.clone(),
                    value: display,
                });
            }
            if let Some(first_row) = accepted.get(&key) {
                return Err(KeyConflict::InBatch {
                    label: rule.label.clone(),
                    value: display,
                    first_row: *first_row,
                });
            }
        }
        Ok(())
    }

    /// 登记已接受记录的键
    pub fn claim(&mut self, record: &RawRecord, row_num: usize) {
        for (rule, accepted) in self.rules.iter().zip(self.accepted.iter_mut()) {
            if let Some((key, _)) = rule.key_for(record) {
                accepted.entry(key).or_insert(row_num);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(roll: &str) -> RawRecord {
        [("roll_number".to_string(), roll.to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_detect_existing_case_insensitive() {
        let rules = vec![UniquenessRule::new(&["roll_number"], "学号").with_existing(["R-001"])];
        let handler = ConflictHandler::new(&rules);

        let conflict = handler.check(&record("  r-001 ")).unwrap_err();
        assert_eq!(
            conflict,
            KeyConflict::Existing {
                label: "学号".to_string(),
                value: "r-001".to_string()
            }
        );
    }

    #[test]
    fn test_detect_in_batch_after_claim() {
        let rules = vec![UniquenessRule::new(&["roll_number"], "学号")];
        let mut handler = ConflictHandler::new(&rules);

        assert!(handler.check(&record("R-002")).is_ok());
        handler.claim(&record("R-002"), 2);

        match handler.check(&record("r-002")) {
            Err(KeyConflict::InBatch { first_row, .. }) => assert_eq!(first_row, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_composite_key() {
        let rule = UniquenessRule::new(&["name", "section"], "班级");
        let mut rec: RawRecord = RawRecord::new();
        rec.insert("name".to_string(), "Class 5".to_string());
        rec.insert("section".to_string(), "B".to_string());

        let (key, display) = rule.key_for(&rec).unwrap();
        assert_eq!(key, "class 5|b");
        assert_eq!(display, "Class 5 / B");

        rec.insert("section".to_string(), "".to_string());
        let (key, _) = rule.key_for(&rec).unwrap();
        assert_eq!(key, "class 5|");
    }
}
