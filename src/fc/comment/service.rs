//! 评论服务层
//!
//! 先把占位评论同步追加进本地帖子状态，再发远端请求；
//! 成功时把临时 ID 换成服务端记录并尽力给帖子领袖发评论通知，
//! 失败时按回执回滚并通过监听器报错。

use crate::fc::comment::api::CommentApi;
use crate::fc::comment::models::Comment;
use crate::fc::ids::temp_id;
use crate::fc::notification::api::NotificationApi;
use crate::fc::notification::models::{NewNotification, NotificationKind};
use crate::fc::post::listener::PostListener;
use crate::fc::profile::service::CurrentUser;
use crate::fc::store::PostStore;
use crate::fc::types::Reference;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 评论错误的用户文案
const COMMENT_ERROR: &str = "Error adding comment";

/// 评论服务
pub struct CommentService {
    api: CommentApi,
    notifications: NotificationApi,
    store: Arc<PostStore>,
    current_user: CurrentUser,
    listener: Arc<dyn PostListener>,
}

impl CommentService {
    pub fn new(
        api: CommentApi,
        notifications: NotificationApi,
        store: Arc<PostStore>,
        current_user: CurrentUser,
        listener: Arc<dyn PostListener>,
    ) -> Self {
        Self {
            api,
            notifications,
            store,
            current_user,
            listener,
        }
    }

    /// 某帖的全部评论，最早在前
    pub async fn load_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        self.api.list_comments(post_id).await
    }

    /// 添加评论
    ///
    /// 空文本、未登录、帖子不在本地列表时都是静默跳过。
    /// 远端失败在这里消化：回滚本地状态并通过监听器报错，不向外传播。
    pub async fn add_comment(&self, post_id: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!("[CommentService] 空评论，跳过，帖子: {}", post_id);
            return;
        }
        let Some(user_id) = self.current_user.resolve().await else {
            debug!("[CommentService] 无已登录档案，跳过评论");
            return;
        };

        let placeholder = Comment {
            id: temp_id(&user_id),
            created_at: chrono::Utc::now().to_rfc3339(),
            post: Reference::Id(post_id.to_string()),
            author: Reference::Id(user_id.clone()),
            text: text.to_string(),
        };
        let Some(receipt) = self.store.apply_comment(post_id, placeholder) else {
            debug!("[CommentService] 帖子不在本地列表，跳过评论: {}", post_id);
            return;
        };
        self.listener.on_post_changed(post_id.to_string()).await;

        match self.api.create_comment(post_id, &user_id, text).await {
            Ok(server_comment) => {
                self.store.commit_comment(&receipt, &server_comment);
                self.listener.on_post_changed(post_id.to_string()).await;
                self.notify_post_leader(post_id, &user_id).await;
                info!(
                    "[CommentService] ✅ 评论完成，帖子: {}, 评论ID: {}",
                    post_id, server_comment.id
                );
            }
            Err(err) => {
                warn!(
                    "[CommentService] ⚠️ 评论远端创建失败，回滚本地状态，帖子: {}, 错误: {:?}",
                    post_id, err
                );
                self.store.rollback_comment(&receipt);
                self.listener.on_post_changed(post_id.to_string()).await;
                self.listener
                    .on_comment_failed(post_id.to_string(), COMMENT_ERROR.to_string())
                    .await;
            }
        }
    }

    /// 给帖子领袖发一条评论通知（尽力而为，失败只记日志）
    ///
    /// 领袖评论自己帖子时不发。
    async fn notify_post_leader(&self, post_id: &str, user_id: &str) {
        let Some(post) = self.store.find_post(post_id) else {
            return;
        };
        let leader_id = post.leader.id().to_string();
        if leader_id.is_empty() || leader_id == user_id {
            return;
        }

        let note = NewNotification {
            to: leader_id.clone(),
            from: Some(user_id.to_string()),
            kind: NotificationKind::Comment,
            post: Some(post_id.to_string()),
            chat: None,
            text: "commented on your post".to_string(),
        };
        if let Err(err) = self.notifications.create_notification(note).await {
            warn!(
                "[CommentService] 评论通知创建失败（忽略），领袖: {}, 错误: {:?}",
                leader_id, err
            );
        }
    }
}
