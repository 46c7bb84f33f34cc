// ==========================================
// 学校教务管理系统 - 升班执行引擎
// ==========================================
// 职责: 计划 + 豁免 + 学生快照 → 每个学生的最终变更, 经 ChunkedWriter 写入
// 规则:
//   - 对每个步骤, 处理当前在 from 班、在读且未豁免的学生
//   - to 非空: class_id ← to.id（状态不变）
//   - to 为空: status ← Graduated
//   - 豁免 / 非在读学生: 不产生任何变更
// 红线:
//   - 所有变更基于确认前的同一份快照计算, 每个学生最多变更一次
//   - 快照不在确认时重新校验（预览后数据变化时按旧计划执行）
//   - 写入失败遵循分块写入的 fail-fast / 不回滚语义
// ==========================================

use crate::domain::import::{ChunkedWriteOutcome, ImportProgress};
use crate::domain::promotion::{PromotionStep, PromotionSummary};
use crate::domain::student::{Student, StudentChange, StudentUpdate};
use crate::engine::chunked_writer::ChunkedWriter;
use crate::engine::exemption::ExemptionSet;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use tracing::{info, instrument};

/// 升班变更批次
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromotionBatch {
    pub updates: Vec<StudentUpdate>,
    pub summary: PromotionSummary,
}

/// 计算升班变更（纯函数）
///
/// 输出顺序: 按计划步骤顺序, 步骤内按快照顺序
pub fn confirm_promotion(
    plan: &[PromotionStep],
    exemptions: &ExemptionSet,
    students: &[Student],
) -> PromotionBatch {
    let mut batch = PromotionBatch::default();

    for step in plan {
        let from_id = step.from.id.as_str();
        let in_class = students
            .iter()
            .filter(|s| s.class_id == from_id && s.is_active());

        for student in in_class {
            if exemptions.is_exempt(from_id, &student.id) {
                batch.summary.exempted += 1;
                continue;
            }

            let change = match &step.to {
                Some(to) => {
                    batch.summary.promoted += 1;
                    StudentChange::MoveToClass {
                        from_class_id: from_id.to_string(),
                        to_class_id: to.id.clone(),
                    }
                }
                None => {
                    batch.summary.graduated += 1;
                    StudentChange::Graduate {
                        class_id: from_id.to_string(),
                    }
                }
            };

            batch.updates.push(StudentUpdate {
                student_id: student.id.clone(),
                change,
            });
        }
    }

    batch
}

// ==========================================
// PromotionExecutor - 计算 + 分块落库
// ==========================================
pub struct PromotionExecutor {
    writer: ChunkedWriter,
}

impl PromotionExecutor {
    pub fn new(writer: ChunkedWriter) -> Self {
        Self { writer }
    }

    /// 执行升班
    ///
    /// # 返回
    /// - PromotionSummary: 计算出的变更汇总（不代表已全部写入）
    /// - ChunkedWriteOutcome: 实际写入结果
    #[instrument(skip_all, fields(steps = plan.len()))]
    pub async fn execute<F, Fut, E, P>(
        &self,
        plan: &[PromotionStep],
        exemptions: &ExemptionSet,
        students: &[Student],
        write_fn: F,
        on_progress: P,
    ) -> (PromotionSummary, ChunkedWriteOutcome<E>)
    where
        F: FnMut(Vec<StudentUpdate>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
        P: FnMut(ImportProgress),
    {
        let batch = confirm_promotion(plan, exemptions, students);
        info!(
            promoted = batch.summary.promoted,
            graduated = batch.summary.graduated,
            exempted = batch.summary.exempted,
            "升班变更计算完成"
        );

        let outcome = self
            .writer
            .import_in_chunks(batch.updates, write_fn, on_progress)
            .await;
        (batch.summary, outcome)
    }
}
