// ==========================================
// 学校教务管理系统 - API 层
// ==========================================
// 职责: 带权限检查的业务入口（导入 / 升班 / 台账 / 设置）, 供 CLI 调用
// 说明: 权限集合由调用方每次请求解析一次后显式传入
// ==========================================

pub mod error;
pub mod import_api;
pub mod ledger_api;
pub mod promotion_api;
pub mod settings_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportReport};
pub use ledger_api::{LedgerApi, StudentLedger};
pub use promotion_api::PromotionApi;
pub use settings_api::{SettingItem, SettingsApi};
