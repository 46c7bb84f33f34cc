// ==========================================
// 学校教务管理系统 - 应用状态
// ==========================================
// 职责: 打开数据库、建表, 组装共享的仓储 / 配置 / API 实例
// ==========================================

use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::api::{ImportApi, LedgerApi, PromotionApi, SettingsApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::SqliteSchoolRepository;

/// 应用状态
///
/// 仓储与配置共享同一个连接
pub struct AppState {
    pub db_path: String,
    pub repo: Arc<SqliteSchoolRepository>,
    pub config: Arc<ConfigManager>,
    pub import_api: ImportApi,
    pub promotion_api: PromotionApi,
    pub ledger_api: LedgerApi,
    pub settings_api: SettingsApi,
}

impl AppState {
    /// 创建应用状态
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    pub fn new(db_path: String) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(&db_path)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        let repo = Arc::new(SqliteSchoolRepository::from_connection(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn)?);

        let import_api = ImportApi::new(repo.clone(), config.clone());
        let promotion_api = PromotionApi::new(repo.clone(), config.clone());
        let ledger_api = LedgerApi::new(repo.clone());
        let settings_api = SettingsApi::new(config.clone());

        info!(db_path = %db_path, "应用状态初始化完成");
        Ok(Self {
            db_path,
            repo,
            config,
            import_api,
            promotion_api,
            ledger_api,
            settings_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 SCHOOL_ADMIN_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("SCHOOL_ADMIN_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./school_admin.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("school-admin");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("school_admin.db");
        }
    }
    path.to_string_lossy().to_string()
}
