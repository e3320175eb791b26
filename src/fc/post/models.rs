//! 帖子模型定义

use crate::fc::comment::models::Comment;
use crate::fc::like::models::Like;
use crate::fc::profile::models::UserProfile;
use crate::fc::types::{deserialize_vec_or_null, DocumentRef, Reference};
use serde::{Deserialize, Serialize};

/// 帖子类型：图文帖或短视频
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Post,
    Reel,
}

impl Default for PostKind {
    fn default() -> Self {
        PostKind::Post
    }
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Post => "post",
            PostKind::Reel => "reel",
        }
    }
}

/// 帖子文档
///
/// likesCount 是反规范化计数器，以远端维护的 likes[] 基数为准；
/// 本地副本只是缓存，乐观更新期间可能短暂偏离。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: String,
    pub leader: Reference<UserProfile>,
    #[serde(rename = "type", default)]
    pub kind: PostKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "mediaUrl", default)]
    pub media_url: Option<String>,
    #[serde(rename = "likesCount", default)]
    pub likes_count: i64,
    #[serde(rename = "commentsCount", default)]
    pub comments_count: i64,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub likes: Vec<Like>,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub comments: Vec<Comment>,
}

impl DocumentRef for Post {
    fn document_id(&self) -> &str {
        &self.id
    }
}
