// ==========================================
// 学校教务管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 逐行校验失败不是错误（记录在 InvalidRecord 中）;
//       这里只定义整次导入级别的失败
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件结构错误（整次导入失败, 先于逐行校验）=====
    #[error("导入数据为空")]
    EmptyInput,

    #[error("缺少必需的表头: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("导入行数过多: {rows} 行（上限 {max} 行）")]
    TooManyRows { rows: usize, max: usize },

    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 记录构建错误 =====
    #[error("记录构建失败 (行 {row}): {message}")]
    RecordBuildError { row: usize, message: String },

    // ===== 写入配置错误 =====
    #[error("无效的块大小: {0}（必须大于 0）")]
    InvalidChunkSize(usize),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ImportError::FileNotFound(err.to_string())
        } else {
            ImportError::FileReadError(err.to_string())
        }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
