// ==========================================
// 学校教务管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换 Repository / 导入错误为用户可读的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::domain::access::{Capability, CapabilitySet};
use crate::domain::import::ChunkedWriteOutcome;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 权限错误
    // ==========================================
    #[error("权限不足: 需要 {0}")]
    PermissionDenied(Capability),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 导入 / 写入错误
    // ==========================================
    /// 文件结构错误（空输入 / 缺表头 / 超行数）等整次失败
    #[error("文件导入失败: {0}")]
    Import(#[from] ImportError),

    /// 分块写入中途失败: 已提交的块保留, 剩余块未写入
    #[error("写入中断: 已提交 {committed} 条, 未写入 {remaining} 条: {message}")]
    WriteFailed {
        committed: usize,
        remaining: usize,
        message: String,
    },

    // ==========================================
    // 数据访问 / 配置错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 权限检查
pub fn require(caps: &CapabilitySet, capability: Capability) -> ApiResult<()> {
    if caps.has(capability) {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied(capability))
    }
}

/// 分块写入结果 → 写入条数; 中途失败时携带已提交 / 剩余条数
pub fn write_outcome<E: std::fmt::Display>(outcome: ChunkedWriteOutcome<E>) -> ApiResult<usize> {
    match outcome {
        ChunkedWriteOutcome::Completed { written } => Ok(written),
        ChunkedWriteOutcome::PartiallyCommitted {
            committed,
            remaining,
            error,
            ..
        } => Err(ApiError::WriteFailed {
            committed,
            remaining,
            message: error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_capability() {
        let caps = CapabilitySet::of([Capability::ViewFeeLedger]);
        assert!(require(&caps, Capability::ViewFeeLedger).is_ok());
        assert!(matches!(
            require(&caps, Capability::PromoteStudents),
            Err(ApiError::PermissionDenied(Capability::PromoteStudents))
        ));
    }

    #[test]
    fn test_partial_write_keeps_counts() {
        let outcome: ChunkedWriteOutcome<String> = ChunkedWriteOutcome::PartiallyCommitted {
            committed: 4,
            remaining: 3,
            failed_chunk: 2,
            error: "disk full".to_string(),
        };
        match write_outcome(outcome) {
            Err(ApiError::WriteFailed {
                committed,
                remaining,
                message,
            }) => {
                assert_eq!((committed, remaining), (4, 3));
                assert_eq!(message, "disk full");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
