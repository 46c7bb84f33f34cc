// ==========================================
// 学校教务管理系统 - 升班豁免集合
// ==========================================
// 结构: class_id → {student_id}, 由调用方维护
// 红线: "保存某班豁免"是按班级作用域的整体替换
//   1. 从集合中移除该班所有在读学生
//   2. 加入本次选中的学生
//   其它班级的条目不受影响
// ==========================================

use crate::domain::types::{ClassId, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExemptionSet {
    by_class: HashMap<ClassId, HashSet<StudentId>>,
}

impl ExemptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存某班豁免（作用域内整体替换）
    ///
    /// # 参数
    /// - class_id: 班级
    /// - active_roster: 该班当前在读学生
    /// - selected: 本次选中的豁免学生
    pub fn save_for_class<'a, I>(&mut self, class_id: &str, active_roster: &[StudentId], selected: I)
    where
        I: IntoIterator<Item = &'a StudentId>,
    {
        let entry = self.by_class.entry(class_id.to_string()).or_default();
        for student_id in active_roster {
            entry.remove(student_id);
        }
        entry.extend(selected.into_iter().cloned());

        debug!(class_id = %class_id, exempted = entry.len(), "豁免已保存");
    }

    /// 全选: 该班全部在读学生
    pub fn select_all(active_roster: &[StudentId]) -> HashSet<StudentId> {
        active_roster.iter().cloned().collect()
    }

    /// 全不选
    pub fn deselect_all() -> HashSet<StudentId> {
        HashSet::new()
    }

    pub fn is_exempt(&self, class_id: &str, student_id: &str) -> bool {
        self.by_class
            .get(class_id)
            .map(|set| set.contains(student_id))
            .unwrap_or(false)
    }

    pub fn for_class(&self, class_id: &str) -> Option<&HashSet<StudentId>> {
        self.by_class.get(class_id)
    }

    pub fn count_for_class(&self, class_id: &str) -> usize {
        self.by_class.get(class_id).map(HashSet::len).unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.by_class.values().map(HashSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<StudentId> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_save_replaces_within_class() {
        let mut set = ExemptionSet::new();
        let roster = ids(&["s1", "s2", "s3"]);

        set.save_for_class("A", &roster, &ids(&["s1", "s2"]));
        set.save_for_class("A", &roster, &ids(&["s3"]));

        assert!(!set.is_exempt("A", "s1"));
        assert!(!set.is_exempt("A", "s2"));
        assert!(set.is_exempt("A", "s3"));
        assert_eq!(set.count_for_class("A"), 1);
    }

    #[test]
    fn test_save_does_not_touch_other_class() {
        let mut set = ExemptionSet::new();
        set.save_for_class("B", &ids(&["b1", "b2"]), &ids(&["b2"]));
        let before_b = set.for_class("B").cloned();

        set.save_for_class("A", &ids(&["a1"]), &ids(&["a1"]));
        set.save_for_class("A", &ids(&["a1"]), &ExemptionSet::deselect_all());

        assert_eq!(set.for_class("B").cloned(), before_b);
        assert_eq!(set.count_for_class("A"), 0);
        assert_eq!(set.total(), 1);
    }

    #[test]
    fn test_select_all_covers_roster_only() {
        let roster = ids(&["s1", "s2"]);
        let all = ExemptionSet::select_all(&roster);
        assert_eq!(all.len(), 2);
        assert!(all.contains("s1") && all.contains("s2"));
    }
}
