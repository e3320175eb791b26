//! 关注关系模型定义

use crate::fc::profile::models::UserProfile;
use crate::fc::types::{DocumentRef, Reference};
use serde::{Deserialize, Serialize};

/// 关注文档：敬拜者 → 领袖，每对至多一条
///
/// leader / worshiper 两个引用字段的形状取决于查询投影，
/// 判断归属一律走 [`Reference::matches`]。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Follow {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    pub worshiper: Reference<UserProfile>,
    pub leader: Reference<UserProfile>,
}

impl DocumentRef for Follow {
    fn document_id(&self) -> &str {
        &self.id
    }
}
