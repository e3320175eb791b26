//! 会话远端操作

use crate::fc::chat::models::Chat;
use crate::fc::databases::{DocumentService, UNIQUE_ID};
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 会话远端操作客户端
pub struct ChatApi {
    databases: Arc<dyn DocumentService>,
    collection: String,
}

impl ChatApi {
    pub fn new(databases: Arc<dyn DocumentService>, collection: String) -> Self {
        Self {
            databases,
            collection,
        }
    }

    /// 我参与的全部会话（两侧角色都算），带参与者档案展开，最近活跃在前
    pub async fn list_my_chats(&self, user_id: &str) -> Result<Vec<Chat>> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::or(vec![
                        Query::equal("worshiper", user_id),
                        Query::equal("leader", user_id),
                    ]),
                    Query::select(&["*", "worshiper.*", "leader.*"]),
                    Query::order_desc("$updatedAt"),
                ],
            )
            .await
            .context("查询会话列表失败")?;
        parse_documents(list)
    }

    /// 查找两人之间的会话（每对至多一条）
    pub async fn find_chat_between(
        &self,
        worshiper_id: &str,
        leader_id: &str,
    ) -> Result<Option<Chat>> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::equal("worshiper", worshiper_id),
                    Query::equal("leader", leader_id),
                    Query::limit(1),
                ],
            )
            .await
            .context("查询会话失败")?;
        let chats: Vec<Chat> = parse_documents(list)?;
        Ok(chats.into_iter().next())
    }

    /// 新建会话
    pub async fn create_chat(&self, worshiper_id: &str, leader_id: &str) -> Result<Chat> {
        info!(
            "[ChatAPI] 📡 创建会话，敬拜者: {}, 领袖: {}",
            worshiper_id, leader_id
        );
        let doc = self
            .databases
            .create_document(
                &self.collection,
                UNIQUE_ID,
                json!({ "worshiper": worshiper_id, "leader": leader_id }),
            )
            .await
            .context("创建会话失败")?;
        parse_document(doc)
    }

    /// 更新会话的最近一条消息（反规范化字段，发消息后调用）
    pub async fn update_last_message(
        &self,
        chat_id: &str,
        text: &str,
        at: &str,
    ) -> Result<Chat> {
        let doc = self
            .databases
            .update_document(
                &self.collection,
                chat_id,
                json!({ "lastMessage": text, "lastMessageAt": at }),
            )
            .await
            .context("更新会话最近消息失败")?;
        parse_document(doc)
    }
}
