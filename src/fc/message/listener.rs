//! 消息监听器回调接口

use crate::fc::message::models::Message;
use async_trait::async_trait;

/// 消息监听器回调接口
#[async_trait]
pub trait MessageListener: Send + Sync {
    /// 收到新消息（实时 create 事件）
    async fn on_new_message(&self, message: Message);

    /// 消息发送失败；`error` 为可直接展示的文案
    async fn on_send_failed(&self, chat_id: String, error: String);
}

/// 默认空实现（无操作）
pub struct EmptyMessageListener;

#[async_trait]
impl MessageListener for EmptyMessageListener {
    async fn on_new_message(&self, _message: Message) {}
    async fn on_send_failed(&self, _chat_id: String, _error: String) {}
}
