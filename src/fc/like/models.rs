//! 点赞模型定义

use crate::fc::profile::models::UserProfile;
use crate::fc::types::{DocStub, DocumentRef, Reference};
use serde::{Deserialize, Serialize};

/// 点赞文档：每个 (user, post) 对至多一条，由服务端创建前的存在性检查保证
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    pub user: Reference<UserProfile>,
    pub post: Reference<DocStub>,
}

impl DocumentRef for Like {
    fn document_id(&self) -> &str {
        &self.id
    }
}
