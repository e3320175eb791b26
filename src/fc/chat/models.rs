//! 会话模型定义

use crate::fc::profile::models::UserProfile;
use crate::fc::types::{DocumentRef, Reference};
use serde::{Deserialize, Serialize};

/// 会话文档：敬拜者与领袖之间至多一条，创建前先远端查重
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chat {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    pub worshiper: Reference<UserProfile>,
    pub leader: Reference<UserProfile>,
    /// 反规范化的最近一条消息内容与时间，发消息时尽力更新
    #[serde(rename = "lastMessage", default)]
    pub last_message: Option<String>,
    #[serde(rename = "lastMessageAt", default)]
    pub last_message_at: Option<String>,
}

impl DocumentRef for Chat {
    fn document_id(&self) -> &str {
        &self.id
    }
}

/// "发起聊天"结果里会话 ID 的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSource {
    /// 本地查找表命中，未发任何远端请求
    Cached,
    /// 远端查重找到已有会话
    Found,
    /// 远端新建会话
    Created,
}

/// "发起聊天"的结果：调用方拿会话 ID 去导航
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedChat {
    pub chat_id: String,
    pub source: ChatSource,
}
