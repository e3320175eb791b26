//! 消息模块
//!
//! 会话内消息的拉取与发送，以及实时新消息的转发

pub mod api;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use api::MessageApi;
pub use listener::{EmptyMessageListener, MessageListener};
pub use models::Message;
pub use service::MessageService;
