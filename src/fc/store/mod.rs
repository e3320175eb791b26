//! 乐观更新状态仓库
//!
//! 点赞/关注/评论先同步改内存状态（Optimistic-Applied），远端成功后
//! 提交（Committed，临时 ID 换成服务端 ID），失败则按回执精确回滚
//! （Rolled-Back）。状态只能通过转移函数修改，不暴露裸字段写入。

pub mod follows;
pub mod posts;

// 重新导出主要类型和函数
pub use follows::{follow_index_of, FollowState, FollowStore, FollowToggle};
pub use posts::{like_index_of, CommentAppend, LikeToggle, PostFeedState, PostStore};
