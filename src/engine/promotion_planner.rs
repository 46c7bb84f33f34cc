// ==========================================
// 学校教务管理系统 - 升班计划引擎
// ==========================================
// 职责: 基于已排序班级生成升班步骤序列
//   step[i] = (sorted[i] → sorted[i+1]), 最后一个班级 → 毕业
// 前置条件: 至少 1 个班级; 0 个班级由调用方作为"无可升班级"处理
// ==========================================

use crate::domain::class::ClassNode;
use crate::domain::promotion::PromotionStep;
use crate::domain::student::Student;
use crate::engine::class_ordering::sort_classes;
use std::collections::HashMap;
use tracing::debug;

/// 生成升班计划
///
/// # 参数
/// - sorted_classes: 已按 ClassOrdering 排序的班级
/// - active_count_fn: 班级 → 在读学生数
///
/// # 返回
/// - None: 没有班级（不构建计划）
/// - Some(plan): 长度等于班级数
pub fn build_plan<F>(sorted_classes: &[ClassNode], mut active_count_fn: F) -> Option<Vec<PromotionStep>>
where
    F: FnMut(&ClassNode) -> usize,
{
    if sorted_classes.is_empty() {
        return None;
    }

    let plan: Vec<PromotionStep> = sorted_classes
        .iter()
        .enumerate()
        .map(|(i, from)| PromotionStep {
            from: from.clone(),
            to: sorted_classes.get(i + 1).cloned(),
            total_active_student_count: active_count_fn(from),
        })
        .collect();

    debug!(steps = plan.len(), "升班计划生成完成");
    Some(plan)
}

/// 统计每个班级的在读学生数
pub fn active_counts_by_class(students: &[Student]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for student in students.iter().filter(|s| s.is_active()) {
        *counts.entry(student.class_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// 从快照直接生成计划（排序 + 计数）
pub fn plan_from_snapshot(classes: Vec<ClassNode>, students: &[Student]) -> Option<Vec<PromotionStep>> {
    let sorted = sort_classes(classes);
    let counts = active_counts_by_class(students);
    build_plan(&sorted, |class| counts.get(&class.id).copied().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<ClassNode> {
        vec![
            ClassNode::new("A", "Class 1"),
            ClassNode::new("B", "Class 2"),
            ClassNode::new("C", "Class 3"),
        ]
    }

    #[test]
    fn test_build_plan_empty_is_none() {
        assert!(build_plan(&[], |_| 0).is_none());
    }

    #[test]
    fn test_build_plan_shape() {
        let sorted = classes();
        let counts: HashMap<&str, usize> = [("A", 10), ("B", 8), ("C", 5)].into_iter().collect();

        let plan = build_plan(&sorted, |c| counts[c.id.as_str()]).unwrap();

        assert_eq!(plan.len(), 3);
        for i in 0..plan.len() - 1 {
            assert_eq!(plan[i].to.as_ref().map(|c| c.id.as_str()), Some(sorted[i + 1].id.as_str()));
        }
        assert!(plan[2].is_graduation());
        let totals: Vec<usize> = plan.iter().map(|s| s.total_active_student_count).collect();
        assert_eq!(totals, vec![10, 8, 5]);
    }

    #[test]
    fn test_single_class_graduates() {
        let sorted = vec![ClassNode::new("X", "Class 10")];
        let plan = build_plan(&sorted, |_| 4).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan[0].to.is_none());
        assert_eq!(plan[0].total_active_student_count, 4);
    }
}
