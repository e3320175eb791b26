//! 通知模块
//!
//! 点赞/评论/关注/消息触发的站内通知：创建、列表、未读数、已读标记

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::NotificationApi;
pub use listener::{EmptyNotificationListener, NotificationListener};
pub use models::{NewNotification, Notification, NotificationKind};
pub use service::NotificationService;
