// ==========================================
// 学校教务管理系统 - 欠费台账 API
// ==========================================
// 职责: 学生欠费余额 / 滚动台账查询（只读）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{require, ApiError, ApiResult};
use crate::domain::access::{Capability, CapabilitySet};
use crate::domain::student::Student;
use crate::engine::balance_ledger::{
    compute_balance, running_ledger, summarize, LedgerEntry, LedgerSummary,
};
use crate::repository::SchoolRepository;

/// 学生台账视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentLedger {
    pub student_id: String,
    pub student_name: String,
    pub summary: LedgerSummary,
    pub entries: Vec<LedgerEntry>,
}

pub struct LedgerApi {
    repo: Arc<dyn SchoolRepository>,
}

impl LedgerApi {
    pub fn new(repo: Arc<dyn SchoolRepository>) -> Self {
        Self { repo }
    }

    /// 学生当前欠费余额（负数为预存）
    pub async fn student_balance(&self, caps: &CapabilitySet, student_id: &str) -> ApiResult<f64> {
        require(caps, Capability::ViewFeeLedger)?;
        let student = self.load_student(student_id).await?;
        let challans = self.repo.list_challans_for_student(&student.id).await?;
        Ok(compute_balance(&student, &challans))
    }

    pub async fn student_ledger(
        &self,
        caps: &CapabilitySet,
        student_id: &str,
    ) -> ApiResult<StudentLedger> {
        require(caps, Capability::ViewFeeLedger)?;
        let student = self.load_student(student_id).await?;
        let challans = self.repo.list_challans_for_student(&student.id).await?;

        Ok(StudentLedger {
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            summary: summarize(&student, &challans),
            entries: running_ledger(&student, &challans),
        })
    }

    async fn load_student(&self, student_id: &str) -> ApiResult<Student> {
        if student_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("学生ID不能为空".to_string()));
        }
        self.repo
            .get_student(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("学生(id={})不存在", student_id)))
    }
}
