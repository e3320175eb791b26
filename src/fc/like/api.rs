//! 点赞远端操作
//!
//! 点赞跨两个文档：likes 集合里的点赞文档和 posts 文档上的
//! likesCount 计数器，远端没有跨集合事务，这里用尽力而为的
//! 补偿动作保持两者一致。

use crate::fc::databases::{DocumentService, UNIQUE_ID};
use crate::fc::like::models::Like;
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 点赞计数器字段名
const LIKES_COUNT: &str = "likesCount";

/// 点赞远端操作客户端
pub struct LikeApi {
    databases: Arc<dyn DocumentService>,
    likes_collection: String,
    posts_collection: String,
}

impl LikeApi {
    pub fn new(
        databases: Arc<dyn DocumentService>,
        likes_collection: String,
        posts_collection: String,
    ) -> Self {
        Self {
            databases,
            likes_collection,
            posts_collection,
        }
    }

    /// 查找该用户对该帖的点赞文档（每对至多一条）
    pub async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>> {
        let list = self
            .databases
            .list_documents(
                &self.likes_collection,
                &[
                    Query::equal("user", user_id),
                    Query::equal("post", post_id),
                    Query::limit(1),
                ],
            )
            .await
            .context("查询点赞记录失败")?;
        let likes: Vec<Like> = parse_documents(list)?;
        Ok(likes.into_iter().next())
    }

    /// 该用户是否已点赞该帖（远端判定）
    pub async fn check_is_liked(&self, post_id: &str, user_id: &str) -> Result<bool> {
        Ok(self.find_like(post_id, user_id).await?.is_some())
    }

    /// 点赞：创建点赞文档，再递增帖子计数器
    ///
    /// 已有点赞时直接返回现有文档，不重复创建。
    /// 计数器递增失败时补偿删除刚创建的点赞文档，然后报错；
    /// 补偿删除本身失败只记日志。
    pub async fn add_like(&self, post_id: &str, user_id: &str) -> Result<Like> {
        if let Some(existing) = self.find_like(post_id, user_id).await? {
            info!(
                "[LikeAPI] 已存在点赞记录，跳过创建，帖子: {}, 用户: {}",
                post_id, user_id
            );
            return Ok(existing);
        }

        info!("[LikeAPI] 📡 创建点赞，帖子: {}, 用户: {}", post_id, user_id);
        let doc = self
            .databases
            .create_document(
                &self.likes_collection,
                UNIQUE_ID,
                json!({ "user": user_id, "post": post_id }),
            )
            .await
            .context("创建点赞文档失败")?;
        let like: Like = parse_document(doc)?;

        if let Err(err) = self
            .databases
            .increment_attribute(&self.posts_collection, post_id, LIKES_COUNT, 1)
            .await
        {
            warn!(
                "[LikeAPI] ⚠️ 点赞计数递增失败，补偿删除点赞文档: {}",
                like.id
            );
            if let Err(del_err) = self
                .databases
                .delete_document(&self.likes_collection, &like.id)
                .await
            {
                error!(
                    "[LikeAPI] 补偿删除失败，点赞文档可能残留: {}, 错误: {:?}",
                    like.id, del_err
                );
            }
            return Err(err.context("点赞计数递增失败"));
        }

        info!("[LikeAPI] ✅ 点赞完成，帖子: {}, 点赞ID: {}", post_id, like.id);
        Ok(like)
    }

    /// 取消点赞：删除点赞文档，再递减帖子计数器
    ///
    /// 递减失败时按删除前的快照原 ID 重建点赞文档；重建再失败时
    /// 计数器与点赞文档会短暂不一致，只记日志，等下一次权威拉取纠正。
    pub async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<()> {
        let Some(like) = self.find_like(post_id, user_id).await? else {
            debug!(
                "[LikeAPI] 无点赞记录可删，帖子: {}, 用户: {}",
                post_id, user_id
            );
            return Ok(());
        };

        info!(
            "[LikeAPI] 📡 删除点赞，帖子: {}, 点赞ID: {}",
            post_id, like.id
        );
        self.databases
            .delete_document(&self.likes_collection, &like.id)
            .await
            .context("删除点赞文档失败")?;

        if let Err(err) = self
            .databases
            .decrement_attribute(&self.posts_collection, post_id, LIKES_COUNT, 1)
            .await
        {
            warn!(
                "[LikeAPI] ⚠️ 点赞计数递减失败，按快照重建点赞文档: {}",
                like.id
            );
            let restore = self
                .databases
                .create_document(
                    &self.likes_collection,
                    &like.id,
                    json!({ "user": like.user.id(), "post": like.post.id() }),
                )
                .await;
            if let Err(restore_err) = restore {
                error!(
                    "[LikeAPI] 重建点赞文档失败，计数与点赞记录暂不一致: {}, 错误: {:?}",
                    like.id, restore_err
                );
            }
            return Err(err.context("点赞计数递减失败"));
        }

        info!("[LikeAPI] ✅ 取消点赞完成，帖子: {}", post_id);
        Ok(())
    }
}
