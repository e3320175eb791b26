//! 消息远端操作

use crate::fc::databases::{DocumentService, UNIQUE_ID};
use crate::fc::message::models::Message;
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 消息远端操作客户端
pub struct MessageApi {
    databases: Arc<dyn DocumentService>,
    collection: String,
}

impl MessageApi {
    pub fn new(databases: Arc<dyn DocumentService>, collection: String) -> Self {
        Self {
            databases,
            collection,
        }
    }

    /// 某会话的全部消息，最早在前
    pub async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::equal("chat", chat_id),
                    Query::order_asc("$createdAt"),
                ],
            )
            .await
            .context("查询消息列表失败")?;
        parse_documents(list)
    }

    /// 发送一条消息
    pub async fn create_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<Message> {
        info!(
            "[MessageAPI] 📡 发送消息，会话: {}, 发送人: {}",
            chat_id, sender_id
        );
        let doc = self
            .databases
            .create_document(
                &self.collection,
                UNIQUE_ID,
                json!({ "chat": chat_id, "sender": sender_id, "text": text }),
            )
            .await
            .context("发送消息失败")?;
        parse_document(doc)
    }
}
