//! 用户档案模型定义

use crate::fc::types::DocumentRef;
use serde::{Deserialize, Serialize};

/// 用户角色：敬拜者关注领袖，领袖发布内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Worshiper,
    Leader,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Worshiper
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Worshiper => "worshiper",
            UserRole::Leader => "leader",
        }
    }
}

/// 用户档案文档
///
/// 档案文档 ID 与认证用户 ID 相同（创建时显式指定），
/// 因此按认证 ID 就能直接 get 到档案。
/// 所有字段带 default：该类型也用作嵌套引用的目标形状，
/// 投影不同时字段可能残缺。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub faith: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(rename = "photoUrl", default)]
    pub photo_url: Option<String>,
}

impl DocumentRef for UserProfile {
    fn document_id(&self) -> &str {
        &self.id
    }
}

/// 角色设置页提交的新档案
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub name: String,
    pub role: UserRole,
    pub faith: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// 档案更新字段；为 None 的字段不提交
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faith: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(rename = "photoUrl", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}
