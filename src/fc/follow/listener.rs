//! 关注监听器回调接口

use async_trait::async_trait;

/// 关注监听器回调接口
#[async_trait]
pub trait FollowListener: Send + Sync {
    /// 单个领袖的关注状态变化（乐观应用或回滚之后）
    async fn on_follow_state_changed(&self, leader_id: String, following: bool);

    /// 关注列表整体变更（权威拉取之后）
    async fn on_follow_list_changed(&self);

    /// 关注切换远端失败，本地已回滚；`error` 为可直接展示的文案
    async fn on_toggle_failed(&self, leader_id: String, error: String);
}

/// 默认空实现（无操作）
pub struct EmptyFollowListener;

#[async_trait]
impl FollowListener for EmptyFollowListener {
    async fn on_follow_state_changed(&self, _leader_id: String, _following: bool) {}
    async fn on_follow_list_changed(&self) {}
    async fn on_toggle_failed(&self, _leader_id: String, _error: String) {}
}
