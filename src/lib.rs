// ==========================================
// 学校教务管理系统 - 核心库
// ==========================================
// 核心: 批量导入流水线 / 升班级联 / 欠费台账
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部表格数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ChallanStatus, StudentStatus};

// 领域实体
pub use domain::{
    AccessContext, Capability, CapabilitySet, ClassNode, FeeChallan, PromotionPreview,
    PromotionStep, PromotionSummary, Role, Student, StudentUpdate, ValidationResult,
};

// 引擎
pub use engine::{ChunkedWriter, ExemptionSet, PromotionExecutor};

// API
pub use api::{ApiError, ApiResult, ImportApi, LedgerApi, PromotionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学校教务管理系统";
