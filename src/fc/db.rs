//! 本地缓存库工具：统一创建 SQLite 连接池并执行 sqlx 迁移
//!
//! 约定：本 crate 根目录下存在 `migrations/` 目录，存放所有迁移 SQL 文件
//! （local_kv 键值表、local_chat_ids 会话 ID 查找表）。
//! 通过 `sqlx::migrate!()` 自动管理 schema 升级。

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

/// 创建本地缓存库连接池并执行所有未执行的迁移
pub async fn create_sqlite_pool_with_migration(db_url: &str) -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// 测试用内存库连接池
///
/// 内存库必须限制为单连接：连接池里每个 `sqlite::memory:` 连接
/// 各自是一个独立的空库，多连接下数据会"丢失"。
#[cfg(test)]
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}
