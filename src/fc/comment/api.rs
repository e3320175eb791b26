//! 评论远端操作

use crate::fc::comment::models::Comment;
use crate::fc::databases::{DocumentService, UNIQUE_ID};
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 评论远端操作客户端
pub struct CommentApi {
    databases: Arc<dyn DocumentService>,
    collection: String,
}

impl CommentApi {
    pub fn new(databases: Arc<dyn DocumentService>, collection: String) -> Self {
        Self {
            databases,
            collection,
        }
    }

    /// 某帖的全部评论，最早在前
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::equal("post", post_id),
                    Query::order_asc("$createdAt"),
                ],
            )
            .await
            .context("拉取评论失败")?;
        parse_documents(list)
    }

    /// 创建评论文档
    pub async fn create_comment(
        &self,
        post_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<Comment> {
        info!(
            "[CommentAPI] 📡 创建评论，帖子: {}, 作者: {}",
            post_id, author_id
        );
        let doc = self
            .databases
            .create_document(
                &self.collection,
                UNIQUE_ID,
                json!({ "post": post_id, "author": author_id, "text": text }),
            )
            .await
            .context("创建评论失败")?;
        let comment: Comment = parse_document(doc)?;
        info!("[CommentAPI] ✅ 评论已创建，ID: {}", comment.id);
        Ok(comment)
    }
}
