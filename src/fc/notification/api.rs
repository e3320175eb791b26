//! 通知远端操作

use crate::fc::databases::{DocumentService, UNIQUE_ID};
use crate::fc::notification::models::{NewNotification, Notification};
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

/// 通知远端操作客户端
pub struct NotificationApi {
    databases: Arc<dyn DocumentService>,
    collection: String,
}

impl NotificationApi {
    pub fn new(databases: Arc<dyn DocumentService>, collection: String) -> Self {
        Self {
            databases,
            collection,
        }
    }

    /// 创建通知，read 初始为 false
    pub async fn create_notification(&self, new: NewNotification) -> Result<Notification> {
        info!(
            "[NotificationAPI] 📡 创建通知，接收人: {}, 类型: {}",
            new.to,
            new.kind.as_str()
        );

        let mut data = Map::new();
        data.insert("to".to_string(), json!(new.to));
        data.insert("type".to_string(), json!(new.kind.as_str()));
        data.insert("text".to_string(), json!(new.text));
        data.insert("read".to_string(), json!(false));
        if let Some(from) = new.from {
            data.insert("from".to_string(), json!(from));
        }
        if let Some(post) = new.post {
            data.insert("post".to_string(), json!(post));
        }
        if let Some(chat) = new.chat {
            data.insert("chat".to_string(), json!(chat));
        }

        let doc = self
            .databases
            .create_document(&self.collection, UNIQUE_ID, Value::Object(data))
            .await
            .context("创建通知失败")?;
        parse_document(doc)
    }

    /// 列出该用户的通知，最新在前
    pub async fn list_for(&self, user_id: &str) -> Result<Vec<Notification>> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::equal("to", user_id),
                    Query::order_desc("$createdAt"),
                ],
            )
            .await
            .context("查询通知列表失败")?;
        parse_documents(list)
    }

    /// 未读通知数（取 total，不拉取文档本身）
    pub async fn unread_count(&self, user_id: &str) -> Result<i64> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::equal("to", user_id),
                    Query::equal("read", false),
                    Query::limit(1),
                ],
            )
            .await
            .context("查询未读通知数失败")?;
        Ok(list.total)
    }

    /// 标记单条通知为已读
    pub async fn mark_as_read(&self, notification_id: &str) -> Result<Notification> {
        let doc = self
            .databases
            .update_document(&self.collection, notification_id, json!({ "read": true }))
            .await
            .context("标记通知已读失败")?;
        parse_document(doc)
    }
}
