//! 会话模块
//!
//! 敬拜者与领袖之间的会话：远端文档操作、本地会话 ID 查找表、
//! 缓存优先的"发起聊天"流程

pub mod api;
pub mod dao;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::ChatApi;
pub use dao::ChatCacheDao;
pub use models::{Chat, ChatSource, StartedChat};
pub use service::ChatService;
