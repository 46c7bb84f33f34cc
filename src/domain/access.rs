// ==========================================
// 学校教务管理系统 - 权限模型
// ==========================================
// 职责: (有效角色, 用户级覆写) → 能力集合
// 红线: 能力集合每次请求解析一次, 显式传入各操作; 不存在全局查找
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Admin,
    Principal,
    Accountant,
    Teacher,
    Clerk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    ImportStudents,
    ImportClasses,
    PromoteStudents,
    ViewFeeLedger,
    ManageSettings,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ImportStudents => write!(f, "import_students"),
            Capability::ImportClasses => write!(f, "import_classes"),
            Capability::PromoteStudents => write!(f, "promote_students"),
            Capability::ViewFeeLedger => write!(f, "view_fee_ledger"),
            Capability::ManageSettings => write!(f, "manage_settings"),
        }
    }
}

impl Role {
    /// 角色默认能力
    pub fn default_capabilities(&self) -> HashSet<Capability> {
        use Capability::*;
        let caps: &[Capability] = match self {
            Role::SuperAdmin | Role::Admin => &[
                ImportStudents,
                ImportClasses,
                PromoteStudents,
                ViewFeeLedger,
                ManageSettings,
            ],
            Role::Principal => &[ImportStudents, ImportClasses, PromoteStudents, ViewFeeLedger],
            Role::Accountant => &[ViewFeeLedger],
            Role::Clerk => &[ImportStudents, ViewFeeLedger],
            Role::Teacher => &[],
        };
        caps.iter().copied().collect()
    }
}

/// 用户级能力覆写（revoked 优先于 granted）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityOverrides {
    #[serde(default)]
    pub granted: HashSet<Capability>,
    #[serde(default)]
    pub revoked: HashSet<Capability>,
}

/// 请求上下文: 存储角色 + 委派角色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    pub user_id: String,
    pub stored_role: Role,
    pub delegated_role: Option<Role>,
}

impl AccessContext {
    /// 有效角色: 存在委派时以委派角色为准
    pub fn effective_role(&self) -> Role {
        self.delegated_role.unwrap_or(self.stored_role)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: HashSet<Capability>,
}

impl CapabilitySet {
    pub fn resolve(role: Role, overrides: &CapabilityOverrides) -> Self {
        let mut capabilities = role.default_capabilities();
        capabilities.extend(overrides.granted.iter().copied());
        for revoked in &overrides.revoked {
            capabilities.remove(revoked);
        }
        Self { capabilities }
    }

    pub fn for_context(ctx: &AccessContext, overrides: &CapabilityOverrides) -> Self {
        Self::resolve(ctx.effective_role(), overrides)
    }

    /// 显式能力集合（测试 / 脚本使用）
    pub fn of(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            capabilities: capabilities.into_iter().collect(),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
