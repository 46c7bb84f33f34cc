// ==========================================
// 学校教务管理系统 - 升班领域模型
// ==========================================
// 用途: 升班计划预览 → 用户编辑豁免 → 确认执行
// ==========================================

use crate::domain::class::ClassNode;
use crate::domain::student::Student;
use serde::{Deserialize, Serialize};

// ==========================================
// PromotionStep - 升班步骤
// ==========================================
// to == None 表示最高年级: 毕业
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionStep {
    pub from: ClassNode,
    pub to: Option<ClassNode>,
    pub total_active_student_count: usize,
}

impl PromotionStep {
    pub fn is_graduation(&self) -> bool {
        self.to.is_none()
    }
}

// ==========================================
// PromotionPreview - 升班预览
// ==========================================
// 快照只在预览时读取一次, 确认时不重新校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromotionPreview {
    /// 没有班级可升（可恢复的提示, 不做任何修改）
    NothingToPromote { message: String },
    Ready {
        plan: Vec<PromotionStep>,
        students: Vec<Student>,
    },
}

/// 升班执行汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionSummary {
    pub promoted: usize,
    pub graduated: usize,
    pub exempted: usize,
}
