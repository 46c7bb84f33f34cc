// ==========================================
// 学校教务管理系统 - 缴费单领域模型
// ==========================================
// 用途: 台账计算的只读输入
// 说明: 金额字段可能缺失（历史数据）, 缺失按 0 计
// ==========================================

use crate::domain::types::{ChallanId, ChallanStatus, StudentId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeChallan {
    pub id: ChallanId,
    pub student_id: StudentId,
    pub issue_date: Option<NaiveDate>,
    pub total_amount: Option<f64>,     // 本期应缴（含上期结转）
    pub previous_balance: Option<f64>, // 上期结转
    pub paid_amount: Option<f64>,
    pub discount: Option<f64>,
    pub status: ChallanStatus,
}

impl FeeChallan {
    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }
}
