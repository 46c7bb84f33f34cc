// ==========================================
// 学校教务管理系统 - 领域类型定义
// ==========================================
// 职责: 学生状态 / 缴费单状态等枚举
// 序列化格式: 与数据库存储值一致（"Active" / "Graduated" ...）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

pub type StudentId = String;
pub type ClassId = String;
pub type ChallanId = String;

// ==========================================
// 学生状态 (Student Status)
// ==========================================
// 红线: 升班流程只处理 Active 学生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentStatus {
    Active,    // 在读
    Graduated, // 已毕业（升班终态）
    Inactive,  // 休学
    Left,      // 退学 / 转出
}

impl StudentStatus {
    /// 从数据库存储值解析（大小写不敏感，未知值视为 Inactive）
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "active" => StudentStatus::Active,
            "graduated" => StudentStatus::Graduated,
            "left" => StudentStatus::Left,
            _ => StudentStatus::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, StudentStatus::Active)
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentStatus::Active => write!(f, "Active"),
            StudentStatus::Graduated => write!(f, "Graduated"),
            StudentStatus::Inactive => write!(f, "Inactive"),
            StudentStatus::Left => write!(f, "Left"),
        }
    }
}

// ==========================================
// 缴费单状态 (Challan Status)
// ==========================================
// 红线: Cancelled 缴费单不参与任何台账计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallanStatus {
    Unpaid,
    Partial,
    Paid,
    Overdue,
    Cancelled,
}

impl ChallanStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "paid" => ChallanStatus::Paid,
            "partial" | "partially paid" => ChallanStatus::Partial,
            "overdue" => ChallanStatus::Overdue,
            "cancelled" | "canceled" => ChallanStatus::Cancelled,
            _ => ChallanStatus::Unpaid,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChallanStatus::Cancelled)
    }
}

impl fmt::Display for ChallanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallanStatus::Unpaid => write!(f, "Unpaid"),
            ChallanStatus::Partial => write!(f, "Partial"),
            ChallanStatus::Paid => write!(f, "Paid"),
            ChallanStatus::Overdue => write!(f, "Overdue"),
            ChallanStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
