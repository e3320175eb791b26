//! 关注服务层
//!
//! 关注切换先同步改本地列表给出即时反馈，远端成功后无条件
//! 全量重拉我的关注列表（本地乐观补丁不作为最终状态），
//! 失败则按回执回滚并通过监听器报错。

use crate::fc::follow::api::FollowApi;
use crate::fc::follow::listener::FollowListener;
use crate::fc::follow::models::Follow;
use crate::fc::notification::api::NotificationApi;
use crate::fc::notification::models::{NewNotification, NotificationKind};
use crate::fc::profile::service::CurrentUser;
use crate::fc::store::{FollowStore, FollowToggle};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 关注错误的用户文案
const FOLLOW_ERROR: &str = "Error updating follow";

/// 关注服务
pub struct FollowService {
    api: FollowApi,
    notifications: NotificationApi,
    store: Arc<FollowStore>,
    current_user: CurrentUser,
    listener: Arc<dyn FollowListener>,
}

impl FollowService {
    pub fn new(
        api: FollowApi,
        notifications: NotificationApi,
        store: Arc<FollowStore>,
        current_user: CurrentUser,
        listener: Arc<dyn FollowListener>,
    ) -> Self {
        Self {
            api,
            notifications,
            store,
            current_user,
            listener,
        }
    }

    /// 当前是否已关注该领袖（本地状态判定）
    pub fn is_followed(&self, leader_id: &str) -> bool {
        self.store.is_followed(leader_id)
    }

    /// 该领袖是否有在途的关注切换
    pub fn is_toggling(&self, leader_id: &str) -> bool {
        self.store.is_toggling(leader_id)
    }

    /// 拉取我关注的领袖并替换本地列表
    pub async fn load_my_leaders(&self) -> Result<Vec<Follow>> {
        let Some(user_id) = self.current_user.resolve().await else {
            debug!("[FollowService] 无已登录档案，跳过关注列表拉取");
            return Ok(Vec::new());
        };
        let follows = self.api.list_my_leaders(&user_id).await?;
        self.store.set_my_leaders(follows.clone());
        self.listener.on_follow_list_changed().await;
        Ok(follows)
    }

    /// 拉取关注我的敬拜者并替换本地列表
    pub async fn load_my_worshipers(&self) -> Result<Vec<Follow>> {
        let Some(user_id) = self.current_user.resolve().await else {
            debug!("[FollowService] 无已登录档案，跳过粉丝列表拉取");
            return Ok(Vec::new());
        };
        let follows = self.api.list_my_worshipers(&user_id).await?;
        self.store.set_my_worshipers(follows.clone());
        self.listener.on_follow_list_changed().await;
        Ok(follows)
    }

    /// 切换关注状态
    ///
    /// 未登录、同领袖已有在途切换时静默跳过。
    /// 远端失败在这里消化：回滚本地状态并通过监听器报错，不向外传播。
    pub async fn toggle_follow(&self, leader_id: &str) {
        let Some(user_id) = self.current_user.resolve().await else {
            debug!("[FollowService] 无已登录档案，跳过关注切换");
            return;
        };
        if !self.store.begin_toggle(leader_id) {
            debug!(
                "[FollowService] 关注切换在途，跳过重复触发，领袖: {}",
                leader_id
            );
            return;
        }

        self.run_toggle(leader_id, &user_id).await;
        self.store.finish_toggle(leader_id);
    }

    async fn run_toggle(&self, leader_id: &str, user_id: &str) {
        let receipt = self.store.apply_toggle(user_id, leader_id);
        let following = matches!(receipt, FollowToggle::Followed { .. });
        self.listener
            .on_follow_state_changed(leader_id.to_string(), following)
            .await;

        let outcome = match &receipt {
            FollowToggle::Followed { .. } => {
                match self.api.create_follow(user_id, leader_id).await {
                    Ok(_) => {
                        self.notify_leader(leader_id, user_id).await;
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            FollowToggle::Unfollowed { .. } => self.api.remove_follow(user_id, leader_id).await,
        };

        match outcome {
            Ok(()) => {
                // 成功后无条件重拉权威列表，自愈并发切换或多端操作造成的漂移
                match self.api.list_my_leaders(user_id).await {
                    Ok(follows) => {
                        self.store.set_my_leaders(follows);
                        self.listener.on_follow_list_changed().await;
                        info!(
                            "[FollowService] ✅ 关注切换完成并已重拉列表，领袖: {}",
                            leader_id
                        );
                    }
                    Err(err) => {
                        // 重拉失败不回滚：远端切换已成功，本地乐观状态方向正确
                        warn!(
                            "[FollowService] ⚠️ 关注列表重拉失败，保留乐观状态，错误: {:?}",
                            err
                        );
                    }
                }
            }
            Err(err) => {
                warn!(
                    "[FollowService] ⚠️ 关注远端更新失败，回滚本地状态，领袖: {}, 错误: {:?}",
                    leader_id, err
                );
                self.store.rollback_toggle(&receipt);
                self.listener
                    .on_follow_state_changed(
                        leader_id.to_string(),
                        self.store.is_followed(leader_id),
                    )
                    .await;
                self.listener
                    .on_toggle_failed(leader_id.to_string(), FOLLOW_ERROR.to_string())
                    .await;
            }
        }
    }

    /// 给被关注的领袖发一条关注通知（尽力而为，失败只记日志）
    async fn notify_leader(&self, leader_id: &str, user_id: &str) {
        let note = NewNotification {
            to: leader_id.to_string(),
            from: Some(user_id.to_string()),
            kind: NotificationKind::Follow,
            post: None,
            chat: None,
            text: "You have a new follower".to_string(),
        };
        if let Err(err) = self.notifications.create_notification(note).await {
            warn!(
                "[FollowService] 关注通知创建失败（忽略），领袖: {}, 错误: {:?}",
                leader_id, err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::db::create_test_pool;
    use crate::fc::ids::is_temp_id;
    use crate::fc::kv::KvStore;
    use crate::fc::testing::MemoryDocumentService;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const FOLLOWS: &str = "follows";
    const NOTIFICATIONS: &str = "notifications";

    #[derive(Default)]
    struct RecordingListener {
        events: Mutex<Vec<String>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FollowListener for RecordingListener {
        async fn on_follow_state_changed(&self, leader_id: String, following: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("state:{}:{}", leader_id, following));
        }
        async fn on_follow_list_changed(&self) {
            self.events.lock().unwrap().push("list_changed".into());
        }
        async fn on_toggle_failed(&self, leader_id: String, error: String) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failed:{}:{}", leader_id, error));
        }
    }

    async fn build(
        svc: &Arc<MemoryDocumentService>,
        user: Option<&str>,
    ) -> (FollowService, Arc<FollowStore>, Arc<RecordingListener>) {
        let kv = KvStore::new(create_test_pool().await.unwrap(), None);
        let current = CurrentUser::new(kv);
        current.set(user.map(|u| u.to_string()));

        let store = Arc::new(FollowStore::new());
        let listener = Arc::new(RecordingListener::default());
        let service = FollowService::new(
            FollowApi::new(svc.clone(), FOLLOWS.to_string()),
            NotificationApi::new(svc.clone(), NOTIFICATIONS.to_string()),
            store.clone(),
            current,
            listener.clone(),
        );
        (service, store, listener)
    }

    #[tokio::test]
    async fn test_follow_success_refetches_authoritative_list() {
        let svc = Arc::new(MemoryDocumentService::new());
        let (service, store, listener) = build(&svc, Some("w1")).await;

        service.toggle_follow("l1").await;

        // 远端已有关注文档，本地列表换成了权威结果（非临时 ID）
        assert_eq!(svc.documents(FOLLOWS).len(), 1);
        let leaders = store.my_leaders();
        assert_eq!(leaders.len(), 1);
        assert!(leaders[0].leader.matches("l1"));
        assert!(!is_temp_id(&leaders[0].id));
        assert!(service.is_followed("l1"));

        // 领袖收到关注通知
        let notes = svc.documents(NOTIFICATIONS);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["to"], "l1");
        assert_eq!(notes[0]["type"], "follow");

        // 乐观应用立即可见，之后是权威列表变更
        let events = listener.events();
        assert_eq!(events[0], "state:l1:true");
        assert!(events.contains(&"list_changed".to_string()));
        assert!(!service.is_toggling("l1"));
    }

    #[tokio::test]
    async fn test_follow_failure_reverts_and_reaches_listener() {
        let svc = Arc::new(MemoryDocumentService::new());
        svc.fail_create_on(FOLLOWS);
        let (service, store, listener) = build(&svc, Some("w1")).await;

        service.toggle_follow("l1").await;

        assert!(!service.is_followed("l1"));
        assert!(store.my_leaders().is_empty());
        assert!(svc.documents(FOLLOWS).is_empty());

        let events = listener.events();
        assert_eq!(events[0], "state:l1:true");
        assert!(events.contains(&"state:l1:false".to_string()));
        assert!(events.contains(&format!("failed:l1:{}", FOLLOW_ERROR)));
    }

    #[tokio::test]
    async fn test_unfollow_removes_remote_document() {
        let svc = Arc::new(MemoryDocumentService::new());
        svc.seed(
            FOLLOWS,
            vec![json!({ "$id": "f1", "worshiper": "w1", "leader": "l1" })],
        );
        let (service, store, _) = build(&svc, Some("w1")).await;
        let seeded = service.load_my_leaders().await.unwrap();
        assert_eq!(seeded.len(), 1);

        service.toggle_follow("l1").await;

        assert!(svc.documents(FOLLOWS).is_empty());
        assert!(store.my_leaders().is_empty());
        assert!(!service.is_followed("l1"));
        // 取消关注不产生通知
        assert!(svc.documents(NOTIFICATIONS).is_empty());
    }

    #[tokio::test]
    async fn test_pending_toggle_skips_second_trigger() {
        let svc = Arc::new(MemoryDocumentService::new());
        let (service, store, listener) = build(&svc, Some("w1")).await;

        // 模拟同一领袖已有在途切换
        assert!(store.begin_toggle("l1"));
        service.toggle_follow("l1").await;

        assert!(svc.calls().is_empty());
        assert!(listener.events().is_empty());
        store.finish_toggle("l1");
    }

    #[tokio::test]
    async fn test_toggle_without_profile_is_noop() {
        let svc = Arc::new(MemoryDocumentService::new());
        let (service, store, listener) = build(&svc, None).await;

        service.toggle_follow("l1").await;

        assert!(store.my_leaders().is_empty());
        assert!(svc.calls().is_empty());
        assert!(listener.events().is_empty());
    }

    #[tokio::test]
    async fn test_load_my_worshipers_filters_by_leader() {
        let svc = Arc::new(MemoryDocumentService::new());
        svc.seed(
            FOLLOWS,
            vec![
                json!({ "$id": "f1", "worshiper": "w1", "leader": "me" }),
                json!({ "$id": "f2", "worshiper": "w2", "leader": "other" }),
            ],
        );
        let (service, store, _) = build(&svc, Some("me")).await;

        let worshipers = service.load_my_worshipers().await.unwrap();
        assert_eq!(worshipers.len(), 1);
        assert!(worshipers[0].worshiper.matches("w1"));
        assert_eq!(store.my_worshipers().len(), 1);
    }
}
