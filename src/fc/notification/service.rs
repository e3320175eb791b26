//! 通知服务层
//!
//! 通知本身无本地状态：列表、未读数、已读标记都直接打到远端；
//! 实时 create 事件先按接收人过滤再转给监听器。

use crate::fc::notification::api::NotificationApi;
use crate::fc::notification::listener::NotificationListener;
use crate::fc::notification::models::{NewNotification, Notification};
use crate::fc::profile::service::CurrentUser;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// 通知服务
pub struct NotificationService {
    api: NotificationApi,
    current_user: CurrentUser,
    listener: Arc<dyn NotificationListener>,
}

impl NotificationService {
    pub fn new(
        api: NotificationApi,
        current_user: CurrentUser,
        listener: Arc<dyn NotificationListener>,
    ) -> Self {
        Self {
            api,
            current_user,
            listener,
        }
    }

    /// 当前用户的通知，最新在前；未登录时返回空列表
    pub async fn load_notifications(&self) -> Result<Vec<Notification>> {
        let Some(user_id) = self.current_user.resolve().await else {
            debug!("[NotificationService] 无已登录档案，跳过通知拉取");
            return Ok(Vec::new());
        };
        self.api.list_for(&user_id).await
    }

    /// 当前用户的未读通知数；未登录时为 0
    pub async fn unread_count(&self) -> Result<i64> {
        let Some(user_id) = self.current_user.resolve().await else {
            return Ok(0);
        };
        self.api.unread_count(&user_id).await
    }

    /// 创建一条通知
    pub async fn create_notification(&self, new: NewNotification) -> Result<Notification> {
        self.api.create_notification(new).await
    }

    /// 标记单条通知为已读，返回更新后的记录
    pub async fn mark_as_read(&self, notification_id: &str) -> Result<Notification> {
        self.api.mark_as_read(notification_id).await
    }

    /// 处理通知集合上的实时 create 事件负载
    ///
    /// 只转发发给当前用户的通知，其余丢弃。
    pub async fn handle_realtime_create(&self, payload: Value) {
        let notification = match serde_json::from_value::<Notification>(payload) {
            Ok(n) => n,
            Err(err) => {
                warn!("[NotificationService] 实时通知负载解析失败（忽略）: {:?}", err);
                return;
            }
        };

        let Some(user_id) = self.current_user.resolve().await else {
            return;
        };
        if !notification.to.matches(&user_id) {
            debug!(
                "[NotificationService] 通知接收人不是当前用户，丢弃: {}",
                notification.id
            );
            return;
        }
        self.listener.on_new_notification(notification).await;
    }
}
