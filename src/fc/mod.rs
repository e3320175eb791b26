pub mod auth;
pub mod chat;
pub mod client;
pub mod comment;
pub mod databases;
pub mod db;
pub mod follow;
pub mod ids;
pub mod kv;
pub mod like;
pub mod message;
pub mod notification;
pub mod post;
pub mod profile;
pub mod query;
pub mod realtime;
pub mod storage;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod testing;

// 重新导出认证相关函数
pub use auth::{login_async, register_async};

// 重新导出客户端相关类型
pub use client::{BucketIds, ClientConfig, CollectionIds, FaithConnectClient};
