// ==========================================
// 学校教务管理系统 - 教务数据 Repository 实现
// ==========================================
// 职责: 实现 SchoolRepository（使用 rusqlite）
// 红线: Repository 不含业务规则, 只做数据 CRUD
// 存储格式: 日期 %Y-%m-%d, 时间戳 RFC3339, 状态为 Display 文本
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::class::ClassNode;
use crate::domain::fee::FeeChallan;
use crate::domain::student::{Student, StudentChange, StudentUpdate};
use crate::domain::types::{ChallanStatus, StudentStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::school_repo::SchoolRepository;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

const STUDENT_COLUMNS: &str = "id, name, roll_number, class_id, status, opening_balance, \
     guardian_name, phone, date_of_birth, created_at, updated_at";

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(idx)?
        .filter(|s| !s.trim().is_empty())
        .map(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn parse_timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn map_student(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        roll_number: row.get(2)?,
        class_id: row.get(3)?,
        status: StudentStatus::parse(&row.get::<_, String>(4)?),
        opening_balance: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
        guardian_name: row.get(6)?,
        phone: row.get(7)?,
        date_of_birth: parse_date_column(row, 8)?,
        created_at: parse_timestamp_column(row, 9)?,
        updated_at: parse_timestamp_column(row, 10)?,
    })
}

fn map_class(row: &Row) -> rusqlite::Result<ClassNode> {
    Ok(ClassNode {
        id: row.get(0)?,
        name: row.get(1)?,
        section: row.get(2)?,
        sort_order: row.get(3)?,
    })
}

fn map_challan(row: &Row) -> rusqlite::Result<FeeChallan> {
    Ok(FeeChallan {
        id: row.get(0)?,
        student_id: row.get(1)?,
        issue_date: parse_date_column(row, 2)?,
        total_amount: row.get(3)?,
        previous_balance: row.get(4)?,
        paid_amount: row.get(5)?,
        discount: row.get(6)?,
        status: ChallanStatus::parse(&row.get::<_, String>(7)?),
    })
}

// ==========================================
// SqliteSchoolRepository
// ==========================================
pub struct SqliteSchoolRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSchoolRepository {
    /// 打开数据库文件创建实例（表结构由 db::init_schema 负责）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn insert_students_tx(tx: &Transaction, students: &[Student]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO students (
                id, name, roll_number, class_id, status, opening_balance,
                guardian_name, phone, date_of_birth, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )?;

        for student in students {
            stmt.execute(params![
                student.id,
                student.name,
                student.roll_number,
                student.class_id,
                student.status.to_string(),
                student.opening_balance,
                student.guardian_name,
                student.phone,
                student.date_of_birth.map(|d| d.format(DATE_FORMAT).to_string()),
                student.created_at.to_rfc3339(),
                student.updated_at.to_rfc3339(),
            ])?;
        }
        Ok(students.len())
    }

    fn apply_update_tx(tx: &Transaction, update: &StudentUpdate, now: &str) -> RepositoryResult<()> {
        let affected = match &update.change {
            StudentChange::MoveToClass { to_class_id, .. } => tx.execute(
                "UPDATE students SET class_id = ?2, updated_at = ?3 WHERE id = ?1",
                params![update.student_id, to_class_id, now],
            )?,
            StudentChange::Graduate { .. } => tx.execute(
                "UPDATE students SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![update.student_id, StudentStatus::Graduated.to_string(), now],
            )?,
        };

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Student".to_string(),
                id: update.student_id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SchoolRepository for SqliteSchoolRepository {
    async fn list_classes(&self) -> RepositoryResult<Vec<ClassNode>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, section, sort_order FROM classes ORDER BY rowid")?;
        let classes = stmt
            .query_map([], map_class)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(classes)
    }

    async fn list_students(&self) -> RepositoryResult<Vec<Student>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM students ORDER BY rowid", STUDENT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let students = stmt
            .query_map([], map_student)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    async fn get_student(&self, student_id: &str) -> RepositoryResult<Option<Student>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM students WHERE id = ?1", STUDENT_COLUMNS);
        let student = conn
            .query_row(&sql, params![student_id], map_student)
            .optional()?;
        Ok(student)
    }

    async fn list_challans_for_student(
        &self,
        student_id: &str,
    ) -> RepositoryResult<Vec<FeeChallan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, student_id, issue_date, total_amount, previous_balance,
                   paid_amount, discount, status
            FROM fee_challans
            WHERE student_id = ?1
            ORDER BY rowid
            "#,
        )?;
        let challans = stmt
            .query_map(params![student_id], map_challan)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(challans)
    }

    async fn existing_roll_numbers(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT roll_number FROM students")?;
        let rolls = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rolls)
    }

    async fn insert_students(&self, students: Vec<Student>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let count = Self::insert_students_tx(&tx, &students)?;
        tx.commit()?;
        debug!(count = count, "学生批量插入完成");
        Ok(count)
    }

    async fn insert_classes(&self, classes: Vec<ClassNode>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO classes (id, name, section, sort_order) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for class in &classes {
                stmt.execute(params![class.id, class.name, class.section, class.sort_order])?;
            }
        }
        tx.commit()?;
        debug!(count = classes.len(), "班级批量插入完成");
        Ok(classes.len())
    }

    async fn apply_student_updates(&self, updates: Vec<StudentUpdate>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();
        for update in &updates {
            Self::apply_update_tx(&tx, update, &now)?;
        }
        tx.commit()?;
        debug!(count = updates.len(), "升班变更批量写入完成");
        Ok(updates.len())
    }

    async fn insert_challans(&self, challans: Vec<FeeChallan>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO fee_challans (
                    id, student_id, issue_date, total_amount, previous_balance,
                    paid_amount, discount, status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for challan in &challans {
                stmt.execute(params![
                    challan.id,
                    challan.student_id,
                    challan.issue_date.map(|d| d.format(DATE_FORMAT).to_string()),
                    challan.total_amount,
                    challan.previous_balance,
                    challan.paid_amount,
                    challan.discount,
                    challan.status.to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(challans.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn repo() -> SqliteSchoolRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        SqliteSchoolRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn student(id: &str, roll: &str, class_id: &str) -> Student {
        let now = Utc::now();
        Student {
            id: id.to_string(),
            name: format!("Student {}", id),
            roll_number: roll.to_string(),
            class_id: class_id.to_string(),
            status: StudentStatus::Active,
            opening_balance: 0.0,
            guardian_name: None,
            phone: None,
            date_of_birth: NaiveDate::from_ymd_opt(2015, 3, 1),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let repo = repo();
        repo.insert_classes(vec![ClassNode::new("c1", "Class 1").with_section("A")])
            .await
            .unwrap();
        repo.insert_students(vec![student("s1", "R1", "c1")])
            .await
            .unwrap();

        let classes = repo.list_classes().await.unwrap();
        assert_eq!(classes[0].section.as_deref(), Some("A"));

        let loaded = repo.get_student("s1").await.unwrap().unwrap();
        assert_eq!(loaded.roll_number, "R1");
        assert_eq!(loaded.date_of_birth, NaiveDate::from_ymd_opt(2015, 3, 1));
        assert!(repo.get_student("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_rolls_back_on_duplicate_roll_number() {
        let repo = repo();
        repo.insert_classes(vec![ClassNode::new("c1", "Class 1")])
            .await
            .unwrap();

        let err = repo
            .insert_students(vec![student("s1", "R1", "c1"), student("s2", "R1", "c1")])
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
        assert!(repo.list_students().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updates_roll_back_when_student_missing() {
        let repo = repo();
        repo.insert_classes(vec![ClassNode::new("c1", "Class 1"), ClassNode::new("c2", "Class 2")])
            .await
            .unwrap();
        repo.insert_students(vec![student("s1", "R1", "c1")])
            .await
            .unwrap();

        let move_s1 = StudentUpdate {
            student_id: "s1".to_string(),
            change: StudentChange::MoveToClass {
                from_class_id: "c1".to_string(),
                to_class_id: "c2".to_string(),
            },
        };
        let ghost = StudentUpdate {
            student_id: "ghost".to_string(),
            change: StudentChange::Graduate {
                class_id: "c1".to_string(),
            },
        };

        let err = repo
            .apply_student_updates(vec![move_s1.clone(), ghost])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(repo.get_student("s1").await.unwrap().unwrap().class_id, "c1");

        repo.apply_student_updates(vec![move_s1]).await.unwrap();
        assert_eq!(repo.get_student("s1").await.unwrap().unwrap().class_id, "c2");
    }
}
