// ==========================================
// 学校教务管理系统 - 系统设置 API
// ==========================================
// 职责: 配置查询与更新（分块大小 / 导入行数上限）
// 红线: 只接受已知键与正整数值; 需要 ManageSettings 权限
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{require, ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, ImportConfigReader};
use crate::domain::access::{Capability, CapabilitySet};

/// 单个设置项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingItem {
    pub key: String,
    /// 库中存储的原始值（未设置为 None）
    pub stored: Option<String>,
    /// 实际生效值（缺失 / 非法时为默认值）
    pub effective: usize,
}

/// 系统设置API
pub struct SettingsApi {
    config: Arc<ConfigManager>,
}

impl SettingsApi {
    pub fn new(config: Arc<ConfigManager>) -> Self {
        Self { config }
    }

    /// 查询全部设置
    ///
    /// # 返回
    /// - Ok(Vec<SettingItem>): 按已知键顺序
    pub async fn list_settings(&self, caps: &CapabilitySet) -> ApiResult<Vec<SettingItem>> {
        require(caps, Capability::ManageSettings)?;

        let mut items = Vec::with_capacity(config_keys::ALL.len());
        for key in config_keys::ALL {
            let stored = self
                .config
                .get_config_value(key)
                .map_err(|e| ApiError::ConfigError(e.to_string()))?;
            items.push(SettingItem {
                key: key.to_string(),
                stored,
                effective: self.effective_value(key).await?,
            });
        }
        Ok(items)
    }

    /// 更新单个设置
    ///
    /// # 参数
    /// - key: 配置键（须为 config_keys::ALL 之一）
    /// - value: 正整数
    ///
    /// # 错误
    /// - InvalidInput: 未知键或值不是正整数
    pub fn update_setting(&self, caps: &CapabilitySet, key: &str, value: &str) -> ApiResult<()> {
        require(caps, Capability::ManageSettings)?;

        let key = key.trim();
        if !config_keys::ALL.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知配置键: {}", key)));
        }
        let value = value.trim();
        match value.parse::<usize>() {
            Ok(v) if v > 0 => {}
            _ => {
                return Err(ApiError::InvalidInput(format!(
                    "配置 {} 必须是正整数: '{}'",
                    key, value
                )))
            }
        }

        self.config
            .set_value(key, value)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        info!(key = key, value = value, "设置已更新");
        Ok(())
    }

    async fn effective_value(&self, key: &str) -> ApiResult<usize> {
        let value = match key {
            config_keys::IMPORT_CHUNK_SIZE => self.config.get_import_chunk_size().await,
            config_keys::PROMOTION_CHUNK_SIZE => self.config.get_promotion_chunk_size().await,
            config_keys::IMPORT_MAX_ROWS => self.config.get_import_max_rows().await,
            other => return Err(ApiError::InvalidInput(format!("未知配置键: {}", other))),
        };
        value.map_err(|e| ApiError::ConfigError(e.to_string()))
    }
}
