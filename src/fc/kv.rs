//! 本地键值缓存
//!
//! 设备本地的字符串键 JSON 值存储，用于会话/档案快照和信息流快照，
//! 在冷启动时先于远端响应展示上一次的已知状态。
//!
//! 读写都是尽力而为：读失败按缓存未命中处理（返回 None），
//! 写失败返回错误交由调用方记日志，两者都不允许影响主流程。

use anyhow::{Context, Result};
use sqlx::{Pool, Row, Sqlite};
use std::time::Duration;
use tracing::{debug, warn};

/// 约定的缓存键
pub mod keys {
    /// 登录会话快照
    pub const USER_SESSION: &str = "user_session";
    /// 账号信息快照
    pub const USER_INFO: &str = "user_info";
    /// 用户档案快照
    pub const USER_PROFILE: &str = "user_profile";
    /// 发现页信息流快照
    pub const EXPLORE_FEED: &str = "explore_feed_cache";
    /// 短视频信息流快照
    pub const REELS_FEED: &str = "reels_feed_cache";
}

/// 键值缓存存储（基于本地 SQLite 的 local_kv 表）
#[derive(Clone)]
pub struct KvStore {
    db: Pool<Sqlite>,
    /// 条目最大可信时长；None 表示永不过期
    max_age: Option<Duration>,
}

impl KvStore {
    /// 创建键值缓存；`max_age` 为空时条目永不过期
    pub fn new(db: Pool<Sqlite>, max_age: Option<Duration>) -> Self {
        Self { db, max_age }
    }

    /// 读取并反序列化一个缓存值；任何失败（不存在、过期、损坏）都返回 None
    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("[KV] 缓存值反序列化失败，按未命中处理，key: {}, 错误: {:?}", key, e);
                None
            }
        }
    }

    /// 读取原始 JSON 字符串；任何失败都返回 None
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        let row = match sqlx::query("SELECT v, updated_at FROM local_kv WHERE k = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await
        {
            Ok(row) => row?,
            Err(e) => {
                warn!("[KV] 读取缓存失败，按未命中处理，key: {}, 错误: {:?}", key, e);
                return None;
            }
        };

        if let Some(max_age) = self.max_age {
            let updated_at: i64 = row.get("updated_at");
            let age_ms = chrono::Utc::now().timestamp_millis() - updated_at;
            if age_ms > max_age.as_millis() as i64 {
                debug!("[KV] 缓存已过期，key: {}, 存活 {} ms", key, age_ms);
                return None;
            }
        }

        Some(row.get("v"))
    }

    /// 序列化并写入一个缓存值
    pub async fn set<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).context("序列化缓存值失败")?;
        sqlx::query(
            r#"
            INSERT INTO local_kv (k, v, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(k) DO UPDATE SET
                v = excluded.v,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&json)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.db)
        .await
        .context("写入缓存失败")?;
        debug!("[KV] 写入缓存，key: {}, {} 字节", key, json.len());
        Ok(())
    }

    /// 尽力而为写入：失败只记日志，不向上传播
    pub async fn set_best_effort<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.set(key, value).await {
            warn!("[KV] 尽力写入缓存失败，key: {}, 错误: {:?}", key, e);
        }
    }

    /// 删除一个缓存键
    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM local_kv WHERE k = ?")
            .bind(key)
            .execute(&self.db)
            .await
            .context("删除缓存失败")?;
        debug!("[KV] 删除缓存，key: {}", key);
        Ok(())
    }

    /// 清空整个键值缓存（登出时调用）
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM local_kv")
            .execute(&self.db)
            .await
            .context("清空缓存失败")?;
        debug!("[KV] 已清空键值缓存");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::db::create_test_pool;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Snapshot {
        user_id: String,
        name: String,
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let pool = create_test_pool().await.unwrap();
        let kv = KvStore::new(pool, None);

        let snap = Snapshot {
            user_id: "u1".into(),
            name: "Ruth".into(),
        };
        kv.set(keys::USER_PROFILE, &snap).await.unwrap();

        let loaded: Snapshot = kv.get(keys::USER_PROFILE).await.unwrap();
        assert_eq!(loaded, snap);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let pool = create_test_pool().await.unwrap();
        let kv = KvStore::new(pool, None);

        let loaded: Option<Snapshot> = kv.get("no_such_key").await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_corrupted_value_is_cache_miss() {
        let pool = create_test_pool().await.unwrap();
        let kv = KvStore::new(pool.clone(), None);

        sqlx::query("INSERT INTO local_kv (k, v, updated_at) VALUES ('bad', 'not-json{', 0)")
            .execute(&pool)
            .await
            .unwrap();

        let loaded: Option<Snapshot> = kv.get("bad").await;
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let pool = create_test_pool().await.unwrap();
        let kv = KvStore::new(pool, None);

        kv.set("a", &1i64).await.unwrap();
        kv.set("b", &2i64).await.unwrap();

        kv.remove("a").await.unwrap();
        assert!(kv.get::<i64>("a").await.is_none());
        assert_eq!(kv.get::<i64>("b").await, Some(2));

        kv.clear().await.unwrap();
        assert!(kv.get::<i64>("b").await.is_none());
    }

    #[tokio::test]
    async fn test_max_age_expires_entries() {
        let pool = create_test_pool().await.unwrap();

        // 过期策略开启时，旧条目按未命中处理
        let kv = KvStore::new(pool.clone(), Some(Duration::from_millis(50)));
        kv.set("k", &"v".to_string()).await.unwrap();
        assert_eq!(kv.get::<String>("k").await, Some("v".into()));

        // 把 updated_at 改到足够早，模拟过期
        sqlx::query("UPDATE local_kv SET updated_at = updated_at - 10000 WHERE k = 'k'")
            .execute(&pool)
            .await
            .unwrap();
        assert!(kv.get::<String>("k").await.is_none());

        // 无策略时同一条目仍然可读
        let kv_forever = KvStore::new(pool, None);
        assert_eq!(kv_forever.get::<String>("k").await, Some("v".into()));
    }
}
