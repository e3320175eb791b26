//! 消息服务层
//!
//! 发送前做空文本与登录守卫；发送成功后尽力更新会话上的
//! 反规范化最近消息字段。实时 create 事件经这里转给监听器。

use crate::fc::chat::api::ChatApi;
use crate::fc::message::api::MessageApi;
use crate::fc::message::listener::MessageListener;
use crate::fc::message::models::Message;
use crate::fc::profile::service::CurrentUser;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 发送失败的用户文案
const SEND_ERROR: &str = "Error sending message";

/// 消息服务
pub struct MessageService {
    api: MessageApi,
    chats: ChatApi,
    current_user: CurrentUser,
    listener: Arc<dyn MessageListener>,
}

impl MessageService {
    pub fn new(
        api: MessageApi,
        chats: ChatApi,
        current_user: CurrentUser,
        listener: Arc<dyn MessageListener>,
    ) -> Self {
        Self {
            api,
            chats,
            current_user,
            listener,
        }
    }

    /// 某会话的全部消息，最早在前
    pub async fn load_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        self.api.list_messages(chat_id).await
    }

    /// 发送消息
    ///
    /// 空白文本、未登录都是静默跳过。发送失败在这里消化并通过
    /// 监听器报错；会话最近消息字段的更新是尽力而为。
    pub async fn send_message(&self, chat_id: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!("[MessageService] 空消息，跳过发送，会话: {}", chat_id);
            return;
        }
        let Some(sender_id) = self.current_user.resolve().await else {
            debug!("[MessageService] 无已登录档案，跳过发送");
            return;
        };

        match self.api.create_message(chat_id, &sender_id, text).await {
            Ok(message) => {
                if let Err(err) = self
                    .chats
                    .update_last_message(chat_id, text, &message.created_at)
                    .await
                {
                    warn!(
                        "[MessageService] 会话最近消息更新失败（忽略），会话: {}, 错误: {:?}",
                        chat_id, err
                    );
                }
                info!(
                    "[MessageService] ✅ 消息已发送，会话: {}, 消息ID: {}",
                    chat_id, message.id
                );
            }
            Err(err) => {
                warn!(
                    "[MessageService] ⚠️ 消息发送失败，会话: {}, 错误: {:?}",
                    chat_id, err
                );
                self.listener
                    .on_send_failed(chat_id.to_string(), SEND_ERROR.to_string())
                    .await;
            }
        }
    }

    /// 处理消息集合上的实时 create 事件负载
    ///
    /// 频道事件已按服务端读权限过滤，这里只负责解析和转发。
    pub async fn handle_realtime_create(&self, payload: Value) {
        match serde_json::from_value::<Message>(payload) {
            Ok(message) => {
                debug!(
                    "[MessageService] 收到实时消息，会话: {}, 消息ID: {}",
                    message.chat.id(),
                    message.id
                );
                self.listener.on_new_message(message).await;
            }
            Err(err) => {
                warn!("[MessageService] 实时消息负载解析失败（忽略）: {:?}", err);
            }
        }
    }
}
