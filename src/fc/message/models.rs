//! 消息模型定义

use crate::fc::profile::models::UserProfile;
use crate::fc::types::{DocStub, DocumentRef, Reference};
use serde::{Deserialize, Serialize};

/// 消息文档
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    pub chat: Reference<DocStub>,
    pub sender: Reference<UserProfile>,
    #[serde(default)]
    pub text: String,
}

impl DocumentRef for Message {
    fn document_id(&self) -> &str {
        &self.id
    }
}
