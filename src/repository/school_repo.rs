// ==========================================
// 学校教务管理系统 - 教务数据 Repository Trait
// ==========================================
// 职责: 定义班级 / 学生 / 缴费单数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则, 只做数据 CRUD
// 红线: 每次批量写入调用是一个事务（全部成功或全部回滚）
// ==========================================

use crate::domain::class::ClassNode;
use crate::domain::fee::FeeChallan;
use crate::domain::student::{Student, StudentUpdate};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// SchoolRepository Trait
// ==========================================
// 实现者: SqliteSchoolRepository（使用 rusqlite）
#[async_trait]
pub trait SchoolRepository: Send + Sync {
    // ===== 查询 =====

    /// 全部班级（存储顺序, 排序由 ClassOrdering 负责）
    async fn list_classes(&self) -> RepositoryResult<Vec<ClassNode>>;

    /// 全部学生（任意状态）
    async fn list_students(&self) -> RepositoryResult<Vec<Student>>;

    /// 按 ID 查询学生
    ///
    /// # 返回
    /// - Ok(None): 未找到
    async fn get_student(&self, student_id: &str) -> RepositoryResult<Option<Student>>;

    async fn list_challans_for_student(&self, student_id: &str)
        -> RepositoryResult<Vec<FeeChallan>>;

    /// 已落库学号（导入唯一性校验用）
    async fn existing_roll_numbers(&self) -> RepositoryResult<Vec<String>>;

    // ===== 批量写入（事务化）=====

    /// 批量插入学生
    ///
    /// # 返回
    /// - Ok(usize): 插入条数
    /// - Err: 数据库错误（整个批次回滚）
    async fn insert_students(&self, students: Vec<Student>) -> RepositoryResult<usize>;

    async fn insert_classes(&self, classes: Vec<ClassNode>) -> RepositoryResult<usize>;

    /// 批量应用升班变更
    ///
    /// # 返回
    /// - Err: 数据库错误或学生不存在（整个批次回滚）
    async fn apply_student_updates(&self, updates: Vec<StudentUpdate>) -> RepositoryResult<usize>;

    async fn insert_challans(&self, challans: Vec<FeeChallan>) -> RepositoryResult<usize>;
}
