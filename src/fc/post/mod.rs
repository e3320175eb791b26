//! 帖子模块
//!
//! 信息流拉取与缓存优先加载、帖子详情、发布帖子/短视频

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::PostApi;
pub use listener::{EmptyPostListener, PostListener};
pub use models::{Post, PostKind};
pub use service::PostService;
