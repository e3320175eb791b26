//! 帖子服务层
//!
//! 信息流走缓存优先策略：冷启动先从本地快照恢复上次已知内容，
//! 权威拉取成功后整体替换并回写快照；拉取失败时退回本地快照，
//! 只有连快照都没有才把错误交给调用方。

use crate::fc::kv::{keys, KvStore};
use crate::fc::post::api::PostApi;
use crate::fc::post::listener::PostListener;
use crate::fc::post::models::{Post, PostKind};
use crate::fc::profile::service::CurrentUser;
use crate::fc::store::PostStore;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 帖子服务
pub struct PostService {
    api: PostApi,
    store: Arc<PostStore>,
    kv: KvStore,
    current_user: CurrentUser,
    listener: Arc<dyn PostListener>,
}

impl PostService {
    pub fn new(
        api: PostApi,
        store: Arc<PostStore>,
        kv: KvStore,
        current_user: CurrentUser,
        listener: Arc<dyn PostListener>,
    ) -> Self {
        Self {
            api,
            store,
            kv,
            current_user,
            listener,
        }
    }

    /// 冷启动恢复：把本地信息流快照载入内存状态
    ///
    /// 远端请求还没发出时界面就能渲染上次已知的信息流；
    /// 没有任何快照时什么也不做。
    pub async fn load_cached_feeds(&self) {
        let mut restored = false;
        if let Some(cached) = self.kv.get::<Vec<Post>>(keys::EXPLORE_FEED).await {
            debug!("[PostService] 恢复发现页快照，共 {} 条", cached.len());
            self.store.set_explore(cached);
            restored = true;
        }
        if let Some(cached) = self.kv.get::<Vec<Post>>(keys::REELS_FEED).await {
            debug!("[PostService] 恢复短视频快照，共 {} 条", cached.len());
            self.store.set_reels(cached);
            restored = true;
        }
        if restored {
            self.listener.on_feed_changed().await;
        }
    }

    /// 拉取发现页信息流，失败时退回本地快照
    pub async fn load_explore_feed(&self) -> Result<Vec<Post>> {
        self.load_feed(PostKind::Post).await
    }

    /// 拉取短视频信息流，失败时退回本地快照
    pub async fn load_reels_feed(&self) -> Result<Vec<Post>> {
        self.load_feed(PostKind::Reel).await
    }

    async fn load_feed(&self, kind: PostKind) -> Result<Vec<Post>> {
        let fetched = match kind {
            PostKind::Post => self.api.list_explore().await,
            PostKind::Reel => self.api.list_reels().await,
        };

        match fetched {
            Ok(posts) => {
                info!(
                    "[PostService] ✅ 信息流已更新，类型: {}, 共 {} 条",
                    kind.as_str(),
                    posts.len()
                );
                self.apply_feed(kind, posts.clone());
                self.kv.set_best_effort(feed_cache_key(kind), &posts).await;
                self.listener.on_feed_changed().await;
                Ok(posts)
            }
            Err(err) => {
                warn!(
                    "[PostService] ⚠️ 拉取信息流失败，尝试本地快照，类型: {}, 错误: {:?}",
                    kind.as_str(),
                    err
                );
                match self.kv.get::<Vec<Post>>(feed_cache_key(kind)).await {
                    Some(cached) => {
                        info!(
                            "[PostService] 使用本地快照，类型: {}, 共 {} 条",
                            kind.as_str(),
                            cached.len()
                        );
                        self.apply_feed(kind, cached.clone());
                        self.listener.on_feed_changed().await;
                        Ok(cached)
                    }
                    None => Err(err),
                }
            }
        }
    }

    fn apply_feed(&self, kind: PostKind, posts: Vec<Post>) {
        match kind {
            PostKind::Post => self.store.set_explore(posts),
            PostKind::Reel => self.store.set_reels(posts),
        }
    }

    /// 某个领袖的帖子列表（不进入内存状态，直接返回）
    pub async fn load_leader_posts(
        &self,
        leader_id: &str,
        kind: Option<PostKind>,
    ) -> Result<Vec<Post>> {
        self.api.list_by_leader(leader_id, kind).await
    }

    /// 加载帖子详情（含嵌套点赞/评论）并设为当前帖子
    pub async fn load_post(&self, post_id: &str) -> Result<Post> {
        let post = self.api.get_post(post_id).await?;
        self.store.set_current(Some(post.clone()));
        self.listener.on_post_changed(post_id.to_string()).await;
        Ok(post)
    }

    /// 离开详情页时清除当前帖子
    pub fn clear_current_post(&self) {
        self.store.set_current(None);
    }

    /// 发布帖子或短视频
    ///
    /// 要求已登录档案，且正文与媒体至少有其一。
    pub async fn create_post(
        &self,
        kind: PostKind,
        text: &str,
        media_url: Option<&str>,
    ) -> Result<Post> {
        let Some(profile_id) = self.current_user.resolve().await else {
            return Err(anyhow!("无已登录档案，无法发布帖子"));
        };
        if text.trim().is_empty() && media_url.is_none() {
            return Err(anyhow!("帖子内容为空，需要正文或媒体文件"));
        }

        self.api.create_post(&profile_id, kind, text, media_url).await
    }
}

fn feed_cache_key(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Post => keys::EXPLORE_FEED,
        PostKind::Reel => keys::REELS_FEED,
    }
}
