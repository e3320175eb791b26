//! 通知监听器回调接口

use crate::fc::notification::models::Notification;
use async_trait::async_trait;

/// 通知监听器回调接口
#[async_trait]
pub trait NotificationListener: Send + Sync {
    /// 收到发给当前用户的新通知（实时 create 事件，已过滤接收人）
    async fn on_new_notification(&self, notification: Notification);
}

/// 默认空实现（无操作）
pub struct EmptyNotificationListener;

#[async_trait]
impl NotificationListener for EmptyNotificationListener {
    async fn on_new_notification(&self, _notification: Notification) {}
}
