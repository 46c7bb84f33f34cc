// ==========================================
// 学校教务管理系统 - 导入配置档（学生 / 班级）
// ==========================================
// 职责: 每类实体的 表头 / 列 schema / 校验规则 / 模板示例 / 领域对象构建
// 说明: 查找表与已落库键来自调用方读取的快照
// ==========================================

use crate::domain::class::ClassNode;
use crate::domain::import::{AcceptedRecord, ImportTemplate, RawRecord};
use crate::domain::student::Student;
use crate::domain::types::StudentStatus;
use crate::importer::conflict_handler::UniquenessRule;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema::{ColumnKind, ColumnSchema};
use crate::importer::validator::{ReferenceRule, ValidationRules};
use chrono::Utc;
use uuid::Uuid;

// ==========================================
// ImportProfile Trait
// ==========================================
pub trait ImportProfile: Send + Sync {
    type Item: Send;

    fn entity_name(&self) -> &'static str;

    /// 缺少任一表头时整次导入被拒绝
    fn required_headers(&self) -> Vec<String>;

    fn schema(&self) -> Vec<ColumnSchema>;

    /// 模板示例行（静态透传）
    fn sample_records(&self) -> Vec<RawRecord>;

    fn rules(&self) -> ValidationRules;

    /// 已校验记录 → 领域对象
    fn build(&self, record: &AcceptedRecord) -> ImportResult<Self::Item>;

    fn template(&self) -> ImportTemplate {
        ImportTemplate {
            entity: self.entity_name().to_string(),
            headers: self.schema().into_iter().map(|c| c.name).collect(),
            sample_rows: self.sample_records(),
        }
    }
}

fn sample(pairs: &[(&str, &str)]) -> RawRecord {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn required_text(record: &AcceptedRecord, field: &str) -> ImportResult<String> {
    record
        .text(field)
        .map(str::to_string)
        .ok_or_else(|| ImportError::RecordBuildError {
            row: record.row_num,
            message: format!("字段 {} 缺失", field),
        })
}

// ==========================================
// StudentImportProfile - 学生导入
// ==========================================
// 班级按名称解析（"Class 5 - A" 或无分班时的 "Class 5"）
// 学号与已落库学生、同批次记录均唯一
pub struct StudentImportProfile {
    classes: Vec<ClassNode>,
    existing_roll_numbers: Vec<String>,
}

impl StudentImportProfile {
    pub const NAME: &'static str = "name";
    pub const ROLL_NUMBER: &'static str = "roll_number";
    pub const CLASS: &'static str = "class";
    pub const GUARDIAN_NAME: &'static str = "guardian_name";
    pub const PHONE: &'static str = "phone";
    pub const DATE_OF_BIRTH: &'static str = "date_of_birth";
    pub const OPENING_BALANCE: &'static str = "opening_balance";

    pub fn new(classes: Vec<ClassNode>, existing_roll_numbers: Vec<String>) -> Self {
        Self {
            classes,
            existing_roll_numbers,
        }
    }
}

impl ImportProfile for StudentImportProfile {
    type Item = Student;

    fn entity_name(&self) -> &'static str {
        "students"
    }

    fn required_headers(&self) -> Vec<String> {
        vec![
            Self::NAME.to_string(),
            Self::ROLL_NUMBER.to_string(),
            Self::CLASS.to_string(),
        ]
    }

    fn schema(&self) -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::required(Self::NAME, ColumnKind::Text),
            ColumnSchema::required(Self::ROLL_NUMBER, ColumnKind::Text),
            ColumnSchema::required(Self::CLASS, ColumnKind::Text),
            ColumnSchema::optional(Self::GUARDIAN_NAME, ColumnKind::Text),
            ColumnSchema::optional(Self::PHONE, ColumnKind::Text),
            ColumnSchema::optional(Self::DATE_OF_BIRTH, ColumnKind::Date),
            ColumnSchema::optional(Self::OPENING_BALANCE, ColumnKind::Currency),
        ]
    }

    fn sample_records(&self) -> Vec<RawRecord> {
        vec![
            sample(&[
                (Self::NAME, "Ayesha Khan"),
                (Self::ROLL_NUMBER, "2025-001"),
                (Self::CLASS, "Class 1"),
                (Self::GUARDIAN_NAME, "Imran Khan"),
                (Self::PHONE, "0300-1234567"),
                (Self::DATE_OF_BIRTH, "2018-04-12"),
                (Self::OPENING_BALANCE, "1,500"),
            ]),
            sample(&[
                (Self::NAME, "Bilal Ahmed"),
                (Self::ROLL_NUMBER, "2025-002"),
                (Self::CLASS, "KG"),
                (Self::GUARDIAN_NAME, "Sara Ahmed"),
                (Self::PHONE, ""),
                (Self::DATE_OF_BIRTH, ""),
                (Self::OPENING_BALANCE, "0"),
            ]),
        ]
    }

    fn rules(&self) -> ValidationRules {
        let mut lookup: Vec<(String, String)> = self
            .classes
            .iter()
            .map(|c| (c.display_name(), c.id.clone()))
            .collect();
        // 班级名本身也可解析; 同名多分班时该名称不唯一, 必须带分班
        lookup.extend(self.classes.iter().map(|c| (c.name.clone(), c.id.clone())));

        ValidationRules {
            schema: self.schema(),
            references: vec![ReferenceRule::new(Self::CLASS, "班级", lookup)],
            uniqueness: vec![UniquenessRule::new(&[Self::ROLL_NUMBER], "学号")
                .with_existing(&self.existing_roll_numbers)],
        }
    }

    fn build(&self, record: &AcceptedRecord) -> ImportResult<Student> {
        let class_id = record
            .reference(Self::CLASS)
            .map(str::to_string)
            .ok_or_else(|| ImportError::RecordBuildError {
                row: record.row_num,
                message: "班级未解析".to_string(),
            })?;
        let now = Utc::now();

        Ok(Student {
            id: Uuid::new_v4().to_string(),
            name: required_text(record, Self::NAME)?,
            roll_number: required_text(record, Self::ROLL_NUMBER)?,
            class_id,
            status: StudentStatus::Active,
            opening_balance: record
                .values
                .get(Self::OPENING_BALANCE)
                .and_then(|v| v.as_currency())
                .unwrap_or(0.0),
            guardian_name: record.text(Self::GUARDIAN_NAME).map(str::to_string),
            phone: record.text(Self::PHONE).map(str::to_string),
            date_of_birth: record
                .values
                .get(Self::DATE_OF_BIRTH)
                .and_then(|v| v.as_date()),
            created_at: now,
            updated_at: now,
        })
    }
}

// ==========================================
// ClassImportProfile - 班级导入
// ==========================================
// (名称, 分班) 与已落库班级、同批次记录均唯一
pub struct ClassImportProfile {
    existing: Vec<ClassNode>,
}

impl ClassImportProfile {
    pub const NAME: &'static str = "name";
    pub const SECTION: &'static str = "section";
    pub const SORT_ORDER: &'static str = "sort_order";

    pub fn new(existing: Vec<ClassNode>) -> Self {
        Self { existing }
    }
}

impl ImportProfile for ClassImportProfile {
    type Item = ClassNode;

    fn entity_name(&self) -> &'static str {
        "classes"
    }

    fn required_headers(&self) -> Vec<String> {
        vec![Self::NAME.to_string()]
    }

    fn schema(&self) -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::required(Self::NAME, ColumnKind::Text),
            ColumnSchema::optional(Self::SECTION, ColumnKind::Text),
            ColumnSchema::optional(Self::SORT_ORDER, ColumnKind::Integer),
        ]
    }

    fn sample_records(&self) -> Vec<RawRecord> {
        vec![
            sample(&[(Self::NAME, "Nursery"), (Self::SECTION, ""), (Self::SORT_ORDER, "")]),
            sample(&[(Self::NAME, "Class 1"), (Self::SECTION, "A"), (Self::SORT_ORDER, "")]),
            sample(&[(Self::NAME, "Class 1"), (Self::SECTION, "B"), (Self::SORT_ORDER, "")]),
        ]
    }

    fn rules(&self) -> ValidationRules {
        let existing_keys: Vec<String> = self
            .existing
            .iter()
            .map(|c| {
                format!(
                    "{}|{}",
                    c.name.trim(),
                    c.section.as_deref().unwrap_or("").trim()
                )
            })
            .collect();

        ValidationRules {
            schema: self.schema(),
            references: Vec::new(),
            uniqueness: vec![
                UniquenessRule::new(&[Self::NAME, Self::SECTION], "班级").with_existing(existing_keys)
            ],
        }
    }

    fn build(&self, record: &AcceptedRecord) -> ImportResult<ClassNode> {
        Ok(ClassNode {
            id: Uuid::new_v4().to_string(),
            name: required_text(record, Self::NAME)?,
            section: record.text(Self::SECTION).map(str::to_string),
            sort_order: record
                .values
                .get(Self::SORT_ORDER)
                .and_then(|v| v.as_integer()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::validator::Validator;

    #[test]
    fn test_student_template_matches_schema() {
        let profile = StudentImportProfile::new(Vec::new(), Vec::new());
        let template = profile.template();

        assert_eq!(template.entity, "students");
        assert_eq!(template.headers.len(), 7);
        for header in profile.required_headers() {
            assert!(template.headers.contains(&header));
            assert!(template.sample_rows.iter().all(|r| r.contains_key(&header)));
        }
    }

    #[test]
    fn test_student_class_resolution_with_sections() {
        let classes = vec![
            ClassNode::new("c5a", "Class 5").with_section("A"),
            ClassNode::new("c5b", "Class 5").with_section("B"),
        ];
        let profile = StudentImportProfile::new(classes, vec![]);
        let validator = Validator::new(profile.rules());

        let records = vec![
            sample(&[("name", "X"), ("roll_number", "1"), ("class", "class 5 - b")]),
            sample(&[("name", "Y"), ("roll_number", "2"), ("class", "Class 5")]),
        ];
        let result = validator.validate(&records);

        assert_eq!(result.valid_records.len(), 1);
        assert_eq!(result.valid_records[0].reference("class"), Some("c5b"));
        // 只写年级名而该年级有多个分班: 不猜测, 判为无效
        assert_eq!(result.invalid_records.len(), 1);
        assert_eq!(result.invalid_records[0].row_num, 3);
        assert_eq!(result.invalid_records[0].reason, "班级不唯一: 'Class 5'");
    }

    #[test]
    fn test_student_build() {
        let profile = StudentImportProfile::new(vec![ClassNode::new("c1", "Class 1")], vec![]);
        let validator = Validator::new(profile.rules());
        let result = validator.validate(&profile.sample_records()[..1]);

        let student = profile.build(&result.valid_records[0]).unwrap();
        assert_eq!(student.class_id, "c1");
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.opening_balance, 1500.0);
        assert!(student.date_of_birth.is_some());
    }

    #[test]
    fn test_class_uniqueness_against_existing() {
        let profile = ClassImportProfile::new(vec![ClassNode::new("c1", "Class 1").with_section("A")]);
        let validator = Validator::new(profile.rules());

        let result = validator.validate(&profile.sample_records());

        // Class 1 / A 已存在
        assert_eq!(result.invalid_records.len(), 1);
        assert_eq!(result.invalid_records[0].row_num, 3);
        assert_eq!(result.valid_records.len(), 2);
    }
}
