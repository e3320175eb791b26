//! 点赞模块
//!
//! 点赞文档与帖子点赞计数器的两步远端更新，以及乐观切换的服务层

pub mod api;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::LikeApi;
pub use models::Like;
pub use service::LikeService;
