//! 文件存储 HTTP API 客户端
//!
//! 上传返回不透明的文件 ID；读取侧按媒体类型拼接访问 URL：
//! 视频走 view（原件），图片走 preview（服务端缩放）。

use crate::fc::ids::unique_id;
use crate::fc::types::handle_json_response;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

/// 媒体类型，决定存储桶与访问 URL 形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// 已上传文件的元信息
#[derive(Debug, Clone, Deserialize)]
pub struct StorageFile {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(rename = "sizeOriginal", default)]
    pub size_original: i64,
}

/// 文件存储 REST 客户端
///
/// `client` 应该已经在外部配置好项目与会话请求头
#[derive(Clone)]
pub struct StorageApi {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
}

impl StorageApi {
    /// 创建新的文件存储客户端
    pub fn new(client: reqwest::Client, endpoint: String, project_id: String) -> Self {
        Self {
            client,
            endpoint,
            project_id,
        }
    }

    /// 上传文件到指定存储桶，返回文件元信息（含文件 ID）
    pub async fn upload_file(
        &self,
        bucket_id: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StorageFile> {
        let operation_id = Uuid::new_v4().to_string();
        let file_id = unique_id();
        let url = format!("{}/storage/buckets/{}/files", self.endpoint, bucket_id);

        info!(
            "[StorageAPI] 📡 上传文件，桶: {}, 文件名: {}, {} 字节",
            bucket_id,
            file_name,
            bytes.len()
        );
        debug!("[StorageAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .context("无效的 MIME 类型")?;
        let form = reqwest::multipart::Form::new()
            .text("fileId", file_id)
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .header("X-Request-Id", &operation_id)
            .multipart(form)
            .send()
            .await
            .context("请求失败")?;

        let file: StorageFile = handle_json_response(response, "上传文件").await?;
        info!("[StorageAPI] ✅ 文件已上传，ID: {}", file.id);
        Ok(file)
    }

    /// 文件原件访问 URL（视频播放用）
    pub fn view_url(&self, bucket_id: &str, file_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.endpoint, bucket_id, file_id, self.project_id
        )
    }

    /// 文件预览 URL（图片展示用，服务端缩放）
    pub fn preview_url(&self, bucket_id: &str, file_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/preview?project={}",
            self.endpoint, bucket_id, file_id, self.project_id
        )
    }

    /// 按媒体类型取访问 URL：视频取原件，图片取预览
    pub fn media_url(&self, bucket_id: &str, file_id: &str, kind: MediaKind) -> String {
        match kind {
            MediaKind::Video => self.view_url(bucket_id, file_id),
            MediaKind::Image => self.preview_url(bucket_id, file_id),
        }
    }
}

/// 媒体服务：按用途路由到对应存储桶
///
/// 帖子媒体按类型分桶（图片进图文桶，视频进短视频桶），头像单独一桶。
/// 上传只返回文件 ID，文档里存的就是这个 ID。
#[derive(Clone)]
pub struct MediaService {
    api: StorageApi,
    profile_photos: String,
    post_media: String,
    reels_media: String,
}

impl MediaService {
    pub fn new(
        api: StorageApi,
        profile_photos: String,
        post_media: String,
        reels_media: String,
    ) -> Self {
        Self {
            api,
            profile_photos,
            post_media,
            reels_media,
        }
    }

    /// 上传帖子媒体，返回文件 ID
    pub async fn upload_post_media(
        &self,
        kind: MediaKind,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let bucket = self.post_bucket(kind).to_string();
        let file = self
            .api
            .upload_file(&bucket, file_name, mime_type, bytes)
            .await?;
        Ok(file.id)
    }

    /// 上传头像，返回文件 ID
    pub async fn upload_profile_photo(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let file = self
            .api
            .upload_file(&self.profile_photos, file_name, mime_type, bytes)
            .await?;
        Ok(file.id)
    }

    /// 帖子媒体访问 URL：视频取原件，图片取预览
    pub fn post_media_url(&self, file_id: &str, kind: MediaKind) -> String {
        self.api.media_url(self.post_bucket(kind), file_id, kind)
    }

    /// 头像访问 URL（服务端缩放预览）
    pub fn profile_photo_url(&self, file_id: &str) -> String {
        self.api.preview_url(&self.profile_photos, file_id)
    }

    fn post_bucket(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.post_media,
            MediaKind::Video => &self.reels_media,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> StorageApi {
        StorageApi::new(
            reqwest::Client::new(),
            "https://cloud.example.com/v1".into(),
            "faithconnect".into(),
        )
    }

    #[test]
    fn test_view_and_preview_urls() {
        let api = api();
        assert_eq!(
            api.view_url("reels_media", "f123"),
            "https://cloud.example.com/v1/storage/buckets/reels_media/files/f123/view?project=faithconnect"
        );
        assert_eq!(
            api.preview_url("post_media", "f456"),
            "https://cloud.example.com/v1/storage/buckets/post_media/files/f456/preview?project=faithconnect"
        );
    }

    #[test]
    fn test_media_url_picks_by_kind() {
        let api = api();
        assert!(api
            .media_url("b", "f", MediaKind::Video)
            .contains("/view?"));
        assert!(api
            .media_url("b", "f", MediaKind::Image)
            .contains("/preview?"));
    }

    #[test]
    fn test_media_service_routes_post_media_by_kind() {
        let media = MediaService::new(
            api(),
            "profile_photos".into(),
            "post_media".into(),
            "reels_media".into(),
        );

        // 图片进图文桶并取预览，视频进短视频桶并取原件
        let image_url = media.post_media_url("f1", MediaKind::Image);
        assert!(image_url.contains("/buckets/post_media/"));
        assert!(image_url.contains("/preview?"));

        let video_url = media.post_media_url("f2", MediaKind::Video);
        assert!(video_url.contains("/buckets/reels_media/"));
        assert!(video_url.contains("/view?"));

        let photo_url = media.profile_photo_url("f3");
        assert!(photo_url.contains("/buckets/profile_photos/"));
        assert!(photo_url.contains("/preview?"));
    }
}
