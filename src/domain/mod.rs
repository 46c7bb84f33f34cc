// ==========================================
// 学校教务管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod access;
pub mod class;
pub mod fee;
pub mod import;
pub mod promotion;
pub mod student;
pub mod types;

// 重导出核心类型
pub use access::{AccessContext, Capability, CapabilityOverrides, CapabilitySet, Role};
pub use class::ClassNode;
pub use fee::FeeChallan;
pub use import::{
    AcceptedRecord, ChunkedWriteOutcome, FieldValue, ImportProgress, ImportTemplate,
    InvalidRecord, RawRecord, TypedRecord, ValidationResult,
};
pub use promotion::{PromotionPreview, PromotionStep, PromotionSummary};
pub use student::{Student, StudentChange, StudentUpdate};
pub use types::{ChallanId, ChallanStatus, ClassId, StudentId, StudentStatus};
