//! 关注模块
//!
//! 敬拜者与领袖间的关注关系：远端文档操作与乐观切换的服务层

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::FollowApi;
pub use listener::{EmptyFollowListener, FollowListener};
pub use models::Follow;
pub use service::FollowService;
