// ==========================================
// 学校教务管理系统 - 升班 API
// ==========================================
// 流程: preview（读取快照一次）→ 查看班级名单 → 保存豁免 → confirm
// 红线:
//   - 没有班级时返回 NothingToPromote, 不做任何修改
//   - confirm 基于预览时的快照执行, 不重新校验
//   - 写入中途失败: 已写入的块保留, 错误携带已提交 / 剩余条数
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::error::{require, write_outcome, ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::domain::access::{Capability, CapabilitySet};
use crate::domain::import::ImportProgress;
use crate::domain::promotion::{PromotionPreview, PromotionSummary};
use crate::domain::student::Student;
use crate::domain::types::StudentId;
use crate::engine::chunked_writer::ChunkedWriter;
use crate::engine::exemption::ExemptionSet;
use crate::engine::promotion_executor::PromotionExecutor;
use crate::engine::promotion_planner::plan_from_snapshot;
use crate::repository::SchoolRepository;

pub const NOTHING_TO_PROMOTE: &str = "没有可升班的班级";

/// 升班API
pub struct PromotionApi {
    repo: Arc<dyn SchoolRepository>,
    config: Arc<dyn ImportConfigReader>,
}

impl PromotionApi {
    pub fn new(repo: Arc<dyn SchoolRepository>, config: Arc<dyn ImportConfigReader>) -> Self {
        Self { repo, config }
    }

    /// 生成升班预览
    ///
    /// # 返回
    /// - PromotionPreview::Ready: 计划 + 学生快照
    /// - PromotionPreview::NothingToPromote: 没有班级
    #[instrument(skip_all)]
    pub async fn preview(&self, caps: &CapabilitySet) -> ApiResult<PromotionPreview> {
        require(caps, Capability::PromoteStudents)?;

        let classes = self.repo.list_classes().await?;
        let students = self.repo.list_students().await?;

        match plan_from_snapshot(classes, &students) {
            Some(plan) => {
                info!(steps = plan.len(), students = students.len(), "升班预览已生成");
                Ok(PromotionPreview::Ready { plan, students })
            }
            None => {
                warn!("没有班级, 升班被拒绝");
                Ok(PromotionPreview::NothingToPromote {
                    message: NOTHING_TO_PROMOTE.to_string(),
                })
            }
        }
    }

    /// 某班在读学生名单（基于预览快照）
    pub fn class_roster<'a>(&self, preview: &'a PromotionPreview, class_id: &str) -> Vec<&'a Student> {
        match preview {
            PromotionPreview::Ready { students, .. } => students
                .iter()
                .filter(|s| s.class_id == class_id && s.is_active())
                .collect(),
            PromotionPreview::NothingToPromote { .. } => Vec::new(),
        }
    }

    /// 保存某班豁免（作用域内整体替换）
    ///
    /// # 错误
    /// - InvalidInput: 选中的学生不在该班在读名单中
    pub fn save_exemptions(
        &self,
        caps: &CapabilitySet,
        preview: &PromotionPreview,
        exemptions: &mut ExemptionSet,
        class_id: &str,
        selected: &[StudentId],
    ) -> ApiResult<()> {
        require(caps, Capability::PromoteStudents)?;

        let roster = self.roster_ids(preview, class_id);
        let allowed: HashSet<&StudentId> = roster.iter().collect();
        if let Some(unknown) = selected.iter().find(|id| !allowed.contains(id)) {
            return Err(ApiError::InvalidInput(format!(
                "学生 {} 不在班级 {} 的在读名单中",
                unknown, class_id
            )));
        }

        exemptions.save_for_class(class_id, &roster, selected);
        info!(class_id = %class_id, exempted = selected.len(), "豁免已保存");
        Ok(())
    }

    /// 全选: 该班全部在读学生豁免
    ///
    /// # 返回
    /// - 该班被豁免的人数
    pub fn exempt_whole_class(
        &self,
        caps: &CapabilitySet,
        preview: &PromotionPreview,
        exemptions: &mut ExemptionSet,
        class_id: &str,
    ) -> ApiResult<usize> {
        let roster = self.roster_ids(preview, class_id);
        let selected: Vec<StudentId> = ExemptionSet::select_all(&roster).into_iter().collect();
        self.save_exemptions(caps, preview, exemptions, class_id, &selected)?;
        Ok(selected.len())
    }

    /// 全不选: 清空该班豁免
    pub fn clear_class_exemptions(
        &self,
        caps: &CapabilitySet,
        preview: &PromotionPreview,
        exemptions: &mut ExemptionSet,
        class_id: &str,
    ) -> ApiResult<()> {
        let selected: Vec<StudentId> = ExemptionSet::deselect_all().into_iter().collect();
        self.save_exemptions(caps, preview, exemptions, class_id, &selected)
    }

    fn roster_ids(&self, preview: &PromotionPreview, class_id: &str) -> Vec<StudentId> {
        self.class_roster(preview, class_id)
            .into_iter()
            .map(|s| s.id.clone())
            .collect()
    }

    /// 确认升班
    ///
    /// # 返回
    /// - Ok(PromotionSummary): 全部写入成功
    /// - Err(ApiError::BusinessRuleViolation): 预览为 NothingToPromote
    /// - Err(ApiError::WriteFailed): 中途失败（已写入部分保留）
    #[instrument(skip_all)]
    pub async fn confirm<P>(
        &self,
        caps: &CapabilitySet,
        preview: &PromotionPreview,
        exemptions: &ExemptionSet,
        on_progress: P,
    ) -> ApiResult<PromotionSummary>
    where
        P: FnMut(ImportProgress),
    {
        require(caps, Capability::PromoteStudents)?;

        let (plan, students) = match preview {
            PromotionPreview::Ready { plan, students } => (plan, students),
            PromotionPreview::NothingToPromote { message } => {
                return Err(ApiError::BusinessRuleViolation(message.clone()));
            }
        };

        let chunk_size = self
            .config
            .get_promotion_chunk_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let executor = PromotionExecutor::new(ChunkedWriter::new(chunk_size)?);

        let repo = self.repo.as_ref();
        let (summary, outcome) = executor
            .execute(
                plan,
                exemptions,
                students,
                move |chunk| async move { repo.apply_student_updates(chunk).await.map(|_| ()) },
                on_progress,
            )
            .await;
        write_outcome(outcome)?;

        info!(
            promoted = summary.promoted,
            graduated = summary.graduated,
            exempted = summary.exempted,
            "升班完成"
        );
        Ok(summary)
    }
}
