//! 会话 ID 查找表数据访问层（DAO）
//!
//! (worshiperId, leaderId) → chatId 的本地查找表，
//! 命中时"发起聊天"不需要任何远端往返。
//! 读是尽力而为：任何失败都按未命中处理。

use anyhow::{Context, Result};
use sqlx::{Pool, Row, Sqlite};
use std::time::Duration;
use tracing::{debug, warn};

/// 会话 ID 查找表 DAO（基于本地 SQLite 的 local_chat_ids 表）
#[derive(Clone)]
pub struct ChatCacheDao {
    db: Pool<Sqlite>,
    /// 条目最大可信时长；None 表示永不过期
    max_age: Option<Duration>,
}

/// 查找表的组合键：有序拼接，两侧角色固定
pub fn pair_key(worshiper_id: &str, leader_id: &str) -> String {
    format!("{}_{}", worshiper_id, leader_id)
}

impl ChatCacheDao {
    pub fn new(db: Pool<Sqlite>, max_age: Option<Duration>) -> Self {
        Self { db, max_age }
    }

    /// 读取缓存的会话 ID；不存在、过期或读取失败都返回 None
    pub async fn get_chat_id(&self, worshiper_id: &str, leader_id: &str) -> Option<String> {
        let key = pair_key(worshiper_id, leader_id);
        let row = match sqlx::query(
            "SELECT chat_id, updated_at FROM local_chat_ids WHERE pair_key = ?",
        )
        .bind(&key)
        .fetch_optional(&self.db)
        .await
        {
            Ok(row) => row?,
            Err(e) => {
                warn!(
                    "[ChatDAO] 查找表读取失败，按未命中处理，键: {}, 错误: {:?}",
                    key, e
                );
                return None;
            }
        };

        if let Some(max_age) = self.max_age {
            let updated_at: i64 = row.get("updated_at");
            let age_ms = chrono::Utc::now().timestamp_millis() - updated_at;
            if age_ms > max_age.as_millis() as i64 {
                debug!("[ChatDAO] 查找表条目已过期，键: {}, 存活 {} ms", key, age_ms);
                return None;
            }
        }

        Some(row.get("chat_id"))
    }

    /// 写入（或覆盖）一条会话 ID 映射
    pub async fn save_chat_id(
        &self,
        worshiper_id: &str,
        leader_id: &str,
        chat_id: &str,
    ) -> Result<()> {
        let key = pair_key(worshiper_id, leader_id);
        sqlx::query(
            r#"
            INSERT INTO local_chat_ids (pair_key, chat_id, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(pair_key) DO UPDATE SET
                chat_id = excluded.chat_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&key)
        .bind(chat_id)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.db)
        .await
        .context("写入会话查找表失败")?;
        debug!("[ChatDAO] 写入查找表，键: {}, 会话: {}", key, chat_id);
        Ok(())
    }

    /// 清空查找表（登出时调用）
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM local_chat_ids")
            .execute(&self.db)
            .await
            .context("清空会话查找表失败")?;
        debug!("[ChatDAO] 已清空会话查找表");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fc::db::create_test_pool;

    #[tokio::test]
    async fn test_save_and_get_roundtrip() {
        let dao = ChatCacheDao::new(create_test_pool().await.unwrap(), None);

        assert!(dao.get_chat_id("w1", "l1").await.is_none());

        dao.save_chat_id("w1", "l1", "chat9").await.unwrap();
        assert_eq!(dao.get_chat_id("w1", "l1").await.as_deref(), Some("chat9"));

        // 键是有序的：角色换位不命中
        assert!(dao.get_chat_id("l1", "w1").await.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_entry() {
        let dao = ChatCacheDao::new(create_test_pool().await.unwrap(), None);

        dao.save_chat_id("w1", "l1", "old").await.unwrap();
        dao.save_chat_id("w1", "l1", "new").await.unwrap();
        assert_eq!(dao.get_chat_id("w1", "l1").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_max_age_expires_entries() {
        let pool = create_test_pool().await.unwrap();
        let dao = ChatCacheDao::new(pool.clone(), Some(Duration::from_millis(50)));

        dao.save_chat_id("w1", "l1", "chat9").await.unwrap();
        assert!(dao.get_chat_id("w1", "l1").await.is_some());

        sqlx::query("UPDATE local_chat_ids SET updated_at = updated_at - 10000")
            .execute(&pool)
            .await
            .unwrap();
        assert!(dao.get_chat_id("w1", "l1").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_all_entries() {
        let dao = ChatCacheDao::new(create_test_pool().await.unwrap(), None);

        dao.save_chat_id("w1", "l1", "c1").await.unwrap();
        dao.save_chat_id("w2", "l2", "c2").await.unwrap();
        dao.clear().await.unwrap();

        assert!(dao.get_chat_id("w1", "l1").await.is_none());
        assert!(dao.get_chat_id("w2", "l2").await.is_none());
    }
}
