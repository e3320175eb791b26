//! 评论模块
//!
//! 评论列表拉取与乐观追加的服务层

pub mod api;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::CommentApi;
pub use models::Comment;
pub use service::CommentService;
