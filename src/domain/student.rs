// ==========================================
// 学校教务管理系统 - 学生领域模型
// ==========================================
// 用途: 导入层写入, 升班流程修改 class_id / status, 台账只读
// ==========================================

use crate::domain::types::{ClassId, StudentId, StudentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Student - 学生主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub roll_number: String,         // 学号（导入唯一键）
    pub class_id: ClassId,           // 当前班级
    pub status: StudentStatus,       // 在读 / 毕业 / ...
    pub opening_balance: f64,        // 期初欠费（可为负: 预存）
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// ==========================================
// StudentUpdate - 单个学生的升班变更
// ==========================================
// 由 PromotionExecutor 生成, 经 ChunkedWriter 写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub student_id: StudentId,
    pub change: StudentChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StudentChange {
    /// 升入下一班级（状态保持不变）
    MoveToClass { from_class_id: ClassId, to_class_id: ClassId },
    /// 最高年级毕业（班级保持不变）
    Graduate { class_id: ClassId },
}

impl StudentUpdate {
    /// 在内存快照上应用变更（SQLite 之外的写入端复用）
    pub fn apply_to(&self, student: &mut Student) {
        match &self.change {
            StudentChange::MoveToClass { to_class_id, .. } => {
                student.class_id = to_class_id.clone();
            }
            StudentChange::Graduate { .. } => {
                student.status = StudentStatus::Graduated;
            }
        }
    }
}
