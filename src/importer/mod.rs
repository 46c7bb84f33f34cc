// ==========================================
// 学校教务管理系统 - 导入层
// ==========================================
// 职责: 外部表格数据 → 校验 → 分块写入
// 流程: 结构检查 → 解码 / 必填 → 外键解析 → 唯一性 → 勾选 → 分块写入
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod pipeline;
pub mod profile;
pub mod schema;
pub mod validator;

// 重导出核心类型
pub use conflict_handler::{ConflictHandler, KeyConflict, UniquenessRule};
pub use data_cleaner::{DataCleaner, NotANumber};
pub use error::{ImportError, ImportResult};
pub use file_parser::CsvParser;
pub use pipeline::ImportPipeline;
pub use profile::{ClassImportProfile, ImportProfile, StudentImportProfile};
pub use schema::{decode_record, ColumnKind, ColumnSchema, FieldIssue};
pub use validator::{ReferenceRule, ValidationRules, Validator};
