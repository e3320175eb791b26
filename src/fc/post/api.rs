//! 帖子远端操作

use crate::fc::databases::{DocumentService, UNIQUE_ID};
use crate::fc::post::models::{Post, PostKind};
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// 帖子远端操作客户端
pub struct PostApi {
    databases: Arc<dyn DocumentService>,
    collection: String,
}

impl PostApi {
    pub fn new(databases: Arc<dyn DocumentService>, collection: String) -> Self {
        Self {
            databases,
            collection,
        }
    }

    /// 发现页信息流：全部图文帖，最新在前
    pub async fn list_explore(&self) -> Result<Vec<Post>> {
        self.list_by_kind(PostKind::Post).await
    }

    /// 短视频信息流：全部短视频，最新在前
    pub async fn list_reels(&self) -> Result<Vec<Post>> {
        self.list_by_kind(PostKind::Reel).await
    }

    async fn list_by_kind(&self, kind: PostKind) -> Result<Vec<Post>> {
        debug!("[PostAPI] 拉取信息流，类型: {}", kind.as_str());
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::equal("type", kind.as_str()),
                    Query::order_desc("$createdAt"),
                ],
            )
            .await
            .context("拉取信息流失败")?;
        parse_documents(list)
    }

    /// 某个领袖的帖子列表；`kind` 为空时不按类型过滤
    pub async fn list_by_leader(
        &self,
        leader_id: &str,
        kind: Option<PostKind>,
    ) -> Result<Vec<Post>> {
        let mut queries = vec![Query::equal("leader", leader_id)];
        if let Some(kind) = kind {
            queries.push(Query::equal("type", kind.as_str()));
        }
        queries.push(Query::order_desc("$createdAt"));

        let list = self
            .databases
            .list_documents(&self.collection, &queries)
            .await
            .context("拉取领袖帖子失败")?;
        parse_documents(list)
    }

    /// 按 ID 取单个帖子，展开 leader 与嵌套的 likes/comments
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        let doc = self
            .databases
            .get_document(
                &self.collection,
                post_id,
                &[Query::select(&["*", "leader.*", "likes.*", "comments.*"])],
            )
            .await
            .context("拉取帖子详情失败")?;
        parse_document(doc)
    }

    /// 发布帖子：计数器从零开始，媒体文件 ID 可为空
    pub async fn create_post(
        &self,
        leader_id: &str,
        kind: PostKind,
        text: &str,
        media_url: Option<&str>,
    ) -> Result<Post> {
        info!(
            "[PostAPI] 📡 发布帖子，领袖: {}, 类型: {}",
            leader_id,
            kind.as_str()
        );
        let doc = self
            .databases
            .create_document(
                &self.collection,
                UNIQUE_ID,
                json!({
                    "leader": leader_id,
                    "type": kind.as_str(),
                    "text": text,
                    "mediaUrl": media_url,
                    "likesCount": 0,
                    "commentsCount": 0,
                }),
            )
            .await
            .context("发布帖子失败")?;
        let post: Post = parse_document(doc)?;
        info!("[PostAPI] ✅ 帖子已发布，ID: {}", post.id);
        Ok(post)
    }
}
