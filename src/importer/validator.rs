// ==========================================
// 学校教务管理系统 - 导入记录校验器
// ==========================================
// 职责: 将原始记录划分为 有效 / 无效 两个序列
// 规则（逐条按序执行, 第一条失败的规则即为原因）:
//   1. 必填字段存在且 TRIM 后非空; 随后按列类型解码
//   2. 外键解析: 大小写不敏感精确匹配查找表, 失败时原因中写出未解析的值
//   3. 唯一性: 与已落库键、本批次之前已接受的记录均不重复（首次出现者胜出）
// 不变量:
//   - |valid| + |invalid| == |input|, 两个序列都保持输入顺序
//   - row_num = 下标 + 2
// ==========================================

use crate::domain::import::{
    row_number_for_index, AcceptedRecord, InvalidRecord, RawRecord, ValidationResult,
};
use crate::importer::conflict_handler::{ConflictHandler, UniquenessRule};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::schema::{decode_record, ColumnSchema};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

// ==========================================
// ReferenceRule - 外键解析规则
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReferenceRule {
    pub field: String,
    /// 原因文本中的实体名称（如 "班级"）
    pub entity: String,
    /// 归一化名称 → 实体 ID
    lookup: HashMap<String, String>,
    /// 对应多个不同 ID 的归一化名称
    ambiguous: HashSet<String>,
}

impl ReferenceRule {
    /// 构建查找表
    ///
    /// 同一名称重复登记同一 ID 视为一条; 对应不同 ID 的名称记为歧义,
    /// 解析时拒绝
    pub fn new<I, N, V>(field: &str, entity: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<String>,
    {
        let cleaner = DataCleaner;
        let mut lookup: HashMap<String, String> = HashMap::new();
        let mut ambiguous = HashSet::new();
        for (name, id) in entries {
            let key = cleaner.normalize_key(name.as_ref());
            let id = id.into();
            match lookup.get(&key) {
                Some(existing) if *existing != id => {
                    ambiguous.insert(key);
                }
                Some(_) => {}
                None => {
                    lookup.insert(key, id);
                }
            }
        }
        Self {
            field: field.to_string(),
            entity: entity.to_string(),
            lookup,
            ambiguous,
        }
    }

    /// 解析字段值
    ///
    /// # 返回
    /// - Ok(None): 字段为空（是否必填由规则 1 负责）
    /// - Ok(Some(id)): 解析成功
    /// - Err(reason): 未找到, 或名称对应多个实体
    pub fn resolve(&self, record: &RawRecord) -> Result<Option<String>, String> {
        let raw = match record.get(&self.field) {
            Some(v) if !v.trim().is_empty() => v.trim(),
            _ => return Ok(None),
        };
        let key = DataCleaner.normalize_key(raw);
        if self.ambiguous.contains(&key) {
            return Err(format!("{}不唯一: '{}'", self.entity, raw));
        }
        self.lookup
            .get(&key)
            .cloned()
            .map(Some)
            .ok_or_else(|| format!("{}不存在: '{}'", self.entity, raw))
    }
}

// ==========================================
// ValidationRules - 可插拔规则集
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    pub schema: Vec<ColumnSchema>,
    pub references: Vec<ReferenceRule>,
    pub uniqueness: Vec<UniquenessRule>,
}

// ==========================================
// Validator
// ==========================================
pub struct Validator {
    rules: ValidationRules,
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// 校验全部记录
    pub fn validate(&self, records: &[RawRecord]) -> ValidationResult {
        let mut result = ValidationResult::default();
        let mut conflicts = ConflictHandler::new(&self.rules.uniqueness);

        for (idx, record) in records.iter().enumerate() {
            let row_num = row_number_for_index(idx);
            match self.check_record(record, row_num, &conflicts) {
                Ok(accepted) => {
                    conflicts.claim(record, row_num);
                    result.valid_records.push(accepted);
                }
                Err(reason) => {
                    debug!(row_num = row_num, reason = %reason, "记录校验失败");
                    result.invalid_records.push(InvalidRecord {
                        record: record.clone(),
                        reason,
                        row_num,
                    });
                }
            }
        }

        info!(
            total = records.len(),
            valid = result.valid_records.len(),
            invalid = result.invalid_records.len(),
            "记录校验完成"
        );
        result
    }

    fn check_record(
        &self,
        record: &RawRecord,
        row_num: usize,
        conflicts: &ConflictHandler<'_>,
    ) -> Result<AcceptedRecord, String> {
        // 规则 1: 必填 + 类型解码
        let values = decode_record(record, &self.rules.schema).map_err(|e| e.to_string())?;

        // 规则 2: 外键解析
        let mut references = HashMap::new();
        for rule in &self.rules.references {
            if let Some(id) = rule.resolve(record)? {
                references.insert(rule.field.clone(), id);
            }
        }

        // 规则 3: 唯一性
        conflicts.check(record).map_err(|c| c.reason())?;

        Ok(AcceptedRecord {
            row_num,
            record: record.clone(),
            values,
            references,
        })
    }
}
