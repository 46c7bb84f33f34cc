// ==========================================
// 学校教务管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope, 目前只用 global)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分块写入
    pub const IMPORT_CHUNK_SIZE: &str = "import.chunk_size";
    pub const PROMOTION_CHUNK_SIZE: &str = "promotion.chunk_size";

    // 文件结构限制
    pub const IMPORT_MAX_ROWS: &str = "import.max_rows";

    /// 可由管理员修改的全部键
    pub const ALL: &[&str] = &[IMPORT_CHUNK_SIZE, PROMOTION_CHUNK_SIZE, IMPORT_MAX_ROWS];
}

pub mod defaults {
    pub const CHUNK_SIZE: usize = 50;
    pub const IMPORT_MAX_ROWS: usize = 5000;
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（需已执行 db::init_schema）
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON 对象, 键有序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取正整数配置; 缺失用默认值, 非法（非数字 / 0）告警后用默认值
    fn get_positive_usize(&self, key: &str, default: usize) -> Result<usize, Box<dyn Error>> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                warn!(config_key = key, raw_value = %raw, default = default, "配置值非法, 使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_import_chunk_size(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(config_keys::IMPORT_CHUNK_SIZE, defaults::CHUNK_SIZE)
    }

    async fn get_promotion_chunk_size(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(config_keys::PROMOTION_CHUNK_SIZE, defaults::CHUNK_SIZE)
    }

    async fn get_import_max_rows(&self) -> Result<usize, Box<dyn Error>> {
        self.get_positive_usize(config_keys::IMPORT_MAX_ROWS, defaults::IMPORT_MAX_ROWS)
    }
}
