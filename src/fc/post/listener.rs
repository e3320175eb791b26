//! 帖子/信息流监听器回调接口

use async_trait::async_trait;

/// 帖子监听器回调接口：信息流变化与乐观更新结果通过这里通知上层
#[async_trait]
pub trait PostListener: Send + Sync {
    /// 信息流整体变更（权威拉取或缓存加载之后）
    async fn on_feed_changed(&self);

    /// 单个帖子状态变更（乐观转移、提交或回滚之后）
    async fn on_post_changed(&self, post_id: String);

    /// 点赞远端更新失败，本地已回滚；`error` 为可直接展示的文案
    async fn on_like_failed(&self, post_id: String, error: String);

    /// 评论远端创建失败，本地已回滚
    async fn on_comment_failed(&self, post_id: String, error: String);
}

/// 默认空实现（无操作）
pub struct EmptyPostListener;

#[async_trait]
impl PostListener for EmptyPostListener {
    async fn on_feed_changed(&self) {}
    async fn on_post_changed(&self, _post_id: String) {}
    async fn on_like_failed(&self, _post_id: String, _error: String) {}
    async fn on_comment_failed(&self, _post_id: String, _error: String) {}
}
