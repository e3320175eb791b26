pub mod fc;

// 重新导出常用类型和函数，方便外部使用
pub use fc::{
    client::{ClientConfig, CollectionIds, FaithConnectClient},
    login_async, register_async,
    store::{FollowStore, PostStore},
    types::Reference,
};
