// ==========================================
// 学校教务管理系统 - 学费台账引擎
// ==========================================
// 职责: 由学生缴费历史推导当前欠费余额（纯函数, 无 I/O）
// 公式:
//   balance = opening_balance
//           + Σ(total_amount - previous_balance)
//           - Σ(paid_amount)
//           - Σ(discount)
//   （Σ 只针对非 Cancelled 缴费单）
// 红线: 结果可为负（预存）, 不做截断; 缺失 / 非法数值按 0 计
// ==========================================

use crate::domain::fee::FeeChallan;
use crate::domain::student::Student;
use crate::domain::types::ChallanId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 数值兜底: 缺失或非有限值按 0 计
fn amount(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// 单张缴费单的新增应缴（扣除上期结转, 避免重复计入）
fn net_charge(challan: &FeeChallan) -> f64 {
    amount(challan.total_amount) - amount(challan.previous_balance)
}

/// 单张缴费单对余额的净影响
fn net_effect(challan: &FeeChallan) -> f64 {
    net_charge(challan) - amount(challan.paid_amount) - amount(challan.discount)
}

/// 计入台账的缴费单（排除 Cancelled）, 按开单日期升序
///
/// 无日期排最前, 同日期保持输入顺序; 余额、汇总与滚动台账都按此顺序累加,
/// 浮点结果逐位一致
fn counted_in_order(challans: &[FeeChallan]) -> Vec<&FeeChallan> {
    let mut counted: Vec<&FeeChallan> = challans.iter().filter(|c| !c.is_cancelled()).collect();
    counted.sort_by_key(|c| c.issue_date);
    counted
}

/// 计算学生当前余额
pub fn compute_balance(student: &Student, challans: &[FeeChallan]) -> f64 {
    let opening = amount(Some(student.opening_balance));
    counted_in_order(challans)
        .into_iter()
        .fold(opening, |balance, c| balance + net_effect(c))
}

// ==========================================
// LedgerSummary - 台账汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub opening_balance: f64,
    pub charged: f64,
    pub paid: f64,
    pub discount: f64,
    pub balance: f64,
    pub counted_challans: usize,
    pub cancelled_challans: usize,
}

pub fn summarize(student: &Student, challans: &[FeeChallan]) -> LedgerSummary {
    let opening_balance = amount(Some(student.opening_balance));
    let mut charged = 0.0;
    let mut paid = 0.0;
    let mut discount = 0.0;
    let mut counted_challans = 0;
    let mut cancelled_challans = 0;

    for challan in challans {
        if challan.is_cancelled() {
            cancelled_challans += 1;
            continue;
        }
        counted_challans += 1;
        charged += net_charge(challan);
        paid += amount(challan.paid_amount);
        discount += amount(challan.discount);
    }

    LedgerSummary {
        opening_balance,
        charged,
        paid,
        discount,
        balance: compute_balance(student, challans),
        counted_challans,
        cancelled_challans,
    }
}

// ==========================================
// LedgerEntry - 逐单滚动余额
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub challan_id: ChallanId,
    pub issue_date: Option<NaiveDate>,
    pub charge: f64,
    pub paid: f64,
    pub discount: f64,
    pub balance_after: f64,
}

/// 生成滚动台账
///
/// 顺序同 compute_balance; 最后一行的 balance_after 与其一致
pub fn running_ledger(student: &Student, challans: &[FeeChallan]) -> Vec<LedgerEntry> {
    let mut balance = amount(Some(student.opening_balance));
    counted_in_order(challans)
        .into_iter()
        .map(|challan| {
            balance += net_effect(challan);
            LedgerEntry {
                challan_id: challan.id.clone(),
                issue_date: challan.issue_date,
                charge: net_charge(challan),
                paid: amount(challan.paid_amount),
                discount: amount(challan.discount),
                balance_after: balance,
            }
        })
        .collect()
}
