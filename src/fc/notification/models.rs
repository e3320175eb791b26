//! 通知模型定义

use crate::fc::profile::models::UserProfile;
use crate::fc::types::{DocStub, DocumentRef, Reference};
use serde::{Deserialize, Serialize};

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Message,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Follow => "follow",
            NotificationKind::Message => "message",
        }
    }
}

/// 通知文档
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    /// 接收人
    pub to: Reference<UserProfile>,
    /// 触发人（系统通知时为空）
    #[serde(default)]
    pub from: Option<Reference<UserProfile>>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub post: Option<Reference<DocStub>>,
    #[serde(default)]
    pub chat: Option<Reference<DocStub>>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub read: bool,
}

impl DocumentRef for Notification {
    fn document_id(&self) -> &str {
        &self.id
    }
}

/// 待创建的通知；引用字段都以裸 ID 提交
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub to: String,
    pub from: Option<String>,
    pub kind: NotificationKind,
    pub post: Option<String>,
    pub chat: Option<String>,
    pub text: String,
}
