// ==========================================
// 学校教务管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入 / 升班流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 导入写入的分块大小
    ///
    /// # 默认值
    /// - 50
    async fn get_import_chunk_size(&self) -> Result<usize, Box<dyn Error>>;

    /// 升班变更写入的分块大小
    ///
    /// # 默认值
    /// - 50
    async fn get_promotion_chunk_size(&self) -> Result<usize, Box<dyn Error>>;

    /// 单次导入允许的最大行数（超出则整次拒绝）
    ///
    /// # 默认值
    /// - 5000
    async fn get_import_max_rows(&self) -> Result<usize, Box<dyn Error>>;
}
