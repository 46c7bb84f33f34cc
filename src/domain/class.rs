// ==========================================
// 学校教务管理系统 - 班级领域模型
// ==========================================
// 红线: 本核心只读取 / 排序班级, 不修改班级
// ==========================================

use crate::domain::types::ClassId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNode {
    pub id: ClassId,
    pub name: String,
    pub section: Option<String>,
    pub sort_order: Option<i64>, // 人工排序号（为空则按名称推断年级）
}

impl ClassNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            section: None,
            sort_order: None,
        }
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// 显示名称（"Class 5 - A"）
    pub fn display_name(&self) -> String {
        match &self.section {
            Some(section) if !section.trim().is_empty() => {
                format!("{} - {}", self.name, section.trim())
            }
            _ => self.name.clone(),
        }
    }
}
