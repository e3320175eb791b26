//! 点赞服务层
//!
//! 先同步改本地帖子状态给出即时反馈，再发远端请求；
//! 成功时把临时占位换成服务端记录，失败时按回执回滚并通过监听器报错。

use crate::fc::like::api::LikeApi;
use crate::fc::post::listener::PostListener;
use crate::fc::profile::service::CurrentUser;
use crate::fc::store::{LikeToggle, PostStore};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// 点赞错误的用户文案
const LIKE_ERROR: &str = "Error updating like";

/// 点赞服务
pub struct LikeService {
    api: LikeApi,
    store: Arc<PostStore>,
    current_user: CurrentUser,
    listener: Arc<dyn PostListener>,
}

impl LikeService {
    pub fn new(
        api: LikeApi,
        store: Arc<PostStore>,
        current_user: CurrentUser,
        listener: Arc<dyn PostListener>,
    ) -> Self {
        Self {
            api,
            store,
            current_user,
            listener,
        }
    }

    /// 当前用户是否已点赞（本地状态判定）
    pub async fn is_liked(&self, post_id: &str) -> bool {
        match self.current_user.resolve().await {
            Some(user_id) => self.store.is_liked(post_id, &user_id),
            None => false,
        }
    }

    /// 该帖是否有在途的点赞切换
    pub fn is_toggling(&self, post_id: &str) -> bool {
        self.store.is_like_toggling(post_id)
    }

    /// 当前用户是否已点赞（远端判定）
    pub async fn check_is_liked(&self, post_id: &str) -> Result<bool> {
        match self.current_user.resolve().await {
            Some(user_id) => self.api.check_is_liked(post_id, &user_id).await,
            None => Ok(false),
        }
    }

    /// 切换点赞状态
    ///
    /// 未登录、帖子不在本地列表、同帖已有在途切换时都是静默跳过。
    /// 远端失败在这里消化：回滚本地状态并通过监听器报错，不向外传播。
    pub async fn toggle_like(&self, post_id: &str) {
        let Some(user_id) = self.current_user.resolve().await else {
            debug!("[LikeService] 无已登录档案，跳过点赞切换");
            return;
        };
        if !self.store.begin_like_toggle(post_id) {
            debug!("[LikeService] 点赞切换在途，跳过重复触发，帖子: {}", post_id);
            return;
        }

        self.run_toggle(post_id, &user_id).await;
        self.store.finish_like_toggle(post_id);
    }

    async fn run_toggle(&self, post_id: &str, user_id: &str) {
        let Some(receipt) = self.store.apply_like_toggle(post_id, user_id) else {
            debug!("[LikeService] 帖子不在本地列表，跳过点赞切换: {}", post_id);
            return;
        };
        self.listener.on_post_changed(post_id.to_string()).await;

        let outcome = match &receipt {
            LikeToggle::Added { .. } => match self.api.add_like(post_id, user_id).await {
                Ok(server_like) => {
                    self.store.commit_like(&receipt, &server_like);
                    self.listener.on_post_changed(post_id.to_string()).await;
                    Ok(())
                }
                Err(err) => Err(err),
            },
            LikeToggle::Removed { .. } => self.api.remove_like(post_id, user_id).await,
        };

        if let Err(err) = outcome {
            warn!(
                "[LikeService] ⚠️ 点赞远端更新失败，回滚本地状态，帖子: {}, 错误: {:?}",
                post_id, err
            );
            self.store.rollback_like_toggle(&receipt);
            self.listener.on_post_changed(post_id.to_string()).await;
            self.listener
                .on_like_failed(post_id.to_string(), LIKE_ERROR.to_string())
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::db::create_test_pool;
    use crate::fc::ids::is_temp_id;
    use crate::fc::kv::KvStore;
    use crate::fc::like::models::Like;
    use crate::fc::post::listener::PostListener;
    use crate::fc::post::models::Post;
    use crate::fc::testing::MemoryDocumentService;
    use crate::fc::types::Reference;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const LIKES: &str = "likes";
    const POSTS: &str = "posts";

    /// 记录回调的测试监听器
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
    impl PostListener for RecordingListener {
        async fn on_feed_changed(&self) {
            self.events.lock().unwrap().push("feed_changed".into());
        }
        async fn on_post_changed(&self, post_id: String) {
            self.events
                .lock()
                .unwrap()
                .push(format!("post_changed:{}", post_id));
        }
        async fn on_like_failed(&self, post_id: String, error: String) {
            self.events
                .lock()
                .unwrap()
                .push(format!("like_failed:{}:{}", post_id, error));
        }
        async fn on_comment_failed(&self, post_id: String, error: String) {
            self.events
                .lock()
                .unwrap()
                .push(format!("comment_failed:{}:{}", post_id, error));
        }
    }

    fn local_post(post_id: &str, likes: Vec<Like>) -> Post {
        let count = likes.len() as i64;
        Post {
            id: post_id.to_string(),
            created_at: String::new(),
            leader: Reference::Id("l1".to_string()),
            kind: Default::default(),
            text: None,
            media_url: None,
            likes_count: count,
            comments_count: 0,
            likes,
            comments: Vec::new(),
        }
    }

    async fn build(
        svc: &Arc<MemoryDocumentService>,
        user: Option<&str>,
    ) -> (LikeService, Arc<PostStore>, Arc<RecordingListener>) {
        let kv = KvStore::new(create_test_pool().await.unwrap(), None);
        let current = CurrentUser::new(kv);
        current.set(user.map(|u| u.to_string()));

        let store = Arc::new(PostStore::new());
        let listener = Arc::new(RecordingListener::default());
        let service = LikeService::new(
            LikeApi::new(svc.clone(), LIKES.to_string(), POSTS.to_string()),
            store.clone(),
            current,
            listener.clone(),
        );
        (service, store, listener)
    }

    #[tokio::test]
    async fn test_toggle_like_commits_server_like() {
        let svc = Arc::new(MemoryDocumentService::new());
        svc.seed(POSTS, vec![json!({ "$id": "p1", "likesCount": 0 })]);
        let (service, store, listener) = build(&svc, Some("u1")).await;
        store.set_explore(vec![local_post("p1", vec![])]);

        service.toggle_like("p1").await;

        // 本地占位已换成服务端记录
        let post = store.find_post("p1").unwrap();
        assert_eq!(post.likes.len(), 1);
        assert!(!is_temp_id(&post.likes[0].id));
        assert_eq!(post.likes_count, 1);

        // 远端两步都已执行
        assert_eq!(svc.documents(LIKES).len(), 1);
        assert_eq!(svc.documents(POSTS)[0]["likesCount"], 1);

        // 乐观应用与提交各通知一次
        assert_eq!(
            listener.events(),
            vec!["post_changed:p1".to_string(), "post_changed:p1".to_string()]
        );
        assert!(!service.is_toggling("p1"));
    }

    #[tokio::test]
    async fn test_toggle_like_rolls_back_and_notifies_on_failure() {
        let svc = Arc::new(MemoryDocumentService::new());
        svc.seed(POSTS, vec![json!({ "$id": "p1", "likesCount": 0 })]);
        svc.fail_create_on(LIKES);
        let (service, store, listener) = build(&svc, Some("u1")).await;
        store.set_explore(vec![local_post("p1", vec![])]);
        let original = store.snapshot();

        service.toggle_like("p1").await;

        // 状态已还原，错误通过监听器给出
        assert_eq!(store.snapshot(), original);
        let events = listener.events();
        assert!(events.contains(&format!("like_failed:p1:{}", LIKE_ERROR)));
        assert!(!service.is_toggling("p1"));
    }

    #[tokio::test]
    async fn test_toggle_like_removes_existing_like() {
        let svc = Arc::new(MemoryDocumentService::new());
        svc.seed(POSTS, vec![json!({ "$id": "p1", "likesCount": 1 })]);
        svc.seed(LIKES, vec![json!({ "$id": "l1", "user": "u1", "post": "p1" })]);
        let (service, store, _) = build(&svc, Some("u1")).await;

        let existing = Like {
            id: "l1".to_string(),
            created_at: String::new(),
            user: Reference::Id("u1".to_string()),
            post: Reference::Id("p1".to_string()),
        };
        store.set_explore(vec![local_post("p1", vec![existing])]);

        service.toggle_like("p1").await;

        let post = store.find_post("p1").unwrap();
        assert!(post.likes.is_empty());
        assert_eq!(post.likes_count, 0);
        assert!(svc.documents(LIKES).is_empty());
        assert_eq!(svc.documents(POSTS)[0]["likesCount"], 0);
    }

    #[tokio::test]
    async fn test_toggle_like_without_profile_is_noop() {
        let svc = Arc::new(MemoryDocumentService::new());
        svc.seed(POSTS, vec![json!({ "$id": "p1", "likesCount": 0 })]);
        let (service, store, listener) = build(&svc, None).await;
        store.set_explore(vec![local_post("p1", vec![])]);
        let original = store.snapshot();

        service.toggle_like("p1").await;

        assert_eq!(store.snapshot(), original);
        assert!(svc.calls().is_empty());
        assert!(listener.events().is_empty());
    }

    #[tokio::test]
    async fn test_is_liked_reads_local_state() {
        let svc = Arc::new(MemoryDocumentService::new());
        let (service, store, _) = build(&svc, Some("u1")).await;

        let mine = Like {
            id: "l1".to_string(),
            created_at: String::new(),
            user: Reference::Id("u1".to_string()),
            post: Reference::Id("p1".to_string()),
        };
        store.set_explore(vec![local_post("p1", vec![mine]), local_post("p2", vec![])]);

        assert!(service.is_liked("p1").await);
        assert!(!service.is_liked("p2").await);
    }
}
