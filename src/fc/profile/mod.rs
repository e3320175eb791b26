//! 用户档案模块
//!
//! 档案创建（角色设置）、读取、更新、领袖列表，以及当前登录用户句柄

pub mod api;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::ProfileApi;
pub use models::{NewProfile, ProfileUpdate, UserProfile, UserRole};
pub use service::{CurrentUser, ProfileService};
