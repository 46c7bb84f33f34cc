// ==========================================
// 学校教务管理系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎, 不拼 SQL
// 组成（叶子在前）:
//   班级排序 → 升班计划 → 豁免集合 → 升班执行
//   分块写入（导入与升班共用）
//   学费台账（只读路径）
// ==========================================

pub mod balance_ledger;
pub mod chunked_writer;
pub mod class_ordering;
pub mod exemption;
pub mod promotion_executor;
pub mod promotion_planner;

// 重导出核心引擎
pub use balance_ledger::{compute_balance, running_ledger, summarize, LedgerEntry, LedgerSummary};
pub use chunked_writer::ChunkedWriter;
pub use class_ordering::{compute_level, sort_classes};
pub use exemption::ExemptionSet;
pub use promotion_executor::{confirm_promotion, PromotionBatch, PromotionExecutor};
pub use promotion_planner::{active_counts_by_class, build_plan, plan_from_snapshot};
