//! 评论模型定义

use crate::fc::profile::models::UserProfile;
use crate::fc::types::{DocStub, DocumentRef, Reference};
use serde::{Deserialize, Serialize};

/// 评论文档；author 通常以嵌套轻量档案（ID、昵称、头像）返回
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    pub post: Reference<DocStub>,
    pub author: Reference<UserProfile>,
    #[serde(default)]
    pub text: String,
}

impl DocumentRef for Comment {
    fn document_id(&self) -> &str {
        &self.id
    }
}
