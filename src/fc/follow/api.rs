//! 关注关系远端操作

use crate::fc::databases::{DocumentService, UNIQUE_ID};
use crate::fc::follow::models::Follow;
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// 关注关系远端操作客户端
pub struct FollowApi {
    databases: Arc<dyn DocumentService>,
    collection: String,
}

impl FollowApi {
    pub fn new(databases: Arc<dyn DocumentService>, collection: String) -> Self {
        Self {
            databases,
            collection,
        }
    }

    /// 我关注的领袖（worshiper = 我）
    pub async fn list_my_leaders(&self, worshiper_id: &str) -> Result<Vec<Follow>> {
        let list = self
            .databases
            .list_documents(&self.collection, &[Query::equal("worshiper", worshiper_id)])
            .await
            .context("查询关注列表失败")?;
        parse_documents(list)
    }

    /// 关注我的敬拜者（leader = 我）
    pub async fn list_my_worshipers(&self, leader_id: &str) -> Result<Vec<Follow>> {
        let list = self
            .databases
            .list_documents(&self.collection, &[Query::equal("leader", leader_id)])
            .await
            .context("查询粉丝列表失败")?;
        parse_documents(list)
    }

    /// 查找某对 (worshiper, leader) 的关注文档（每对至多一条）
    pub async fn find_follow(&self, worshiper_id: &str, leader_id: &str) -> Result<Option<Follow>> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[
                    Query::equal("worshiper", worshiper_id),
                    Query::equal("leader", leader_id),
                    Query::limit(1),
                ],
            )
            .await
            .context("查询关注记录失败")?;
        let follows: Vec<Follow> = parse_documents(list)?;
        Ok(follows.into_iter().next())
    }

    /// 创建关注；已存在时直接返回现有文档
    pub async fn create_follow(&self, worshiper_id: &str, leader_id: &str) -> Result<Follow> {
        if let Some(existing) = self.find_follow(worshiper_id, leader_id).await? {
            info!(
                "[FollowAPI] 已存在关注记录，跳过创建，敬拜者: {}, 领袖: {}",
                worshiper_id, leader_id
            );
            return Ok(existing);
        }

        info!(
            "[FollowAPI] 📡 创建关注，敬拜者: {}, 领袖: {}",
            worshiper_id, leader_id
        );
        let doc = self
            .databases
            .create_document(
                &self.collection,
                UNIQUE_ID,
                json!({ "worshiper": worshiper_id, "leader": leader_id }),
            )
            .await
            .context("创建关注失败")?;
        parse_document(doc)
    }

    /// 取消关注：按 (worshiper, leader) 对查找并删除；不存在时是空操作
    ///
    /// 按对查找而不是按本地条目的文档 ID 删，这样本地条目
    /// 还是临时占位时也能删对。
    pub async fn remove_follow(&self, worshiper_id: &str, leader_id: &str) -> Result<()> {
        let Some(follow) = self.find_follow(worshiper_id, leader_id).await? else {
            debug!(
                "[FollowAPI] 无关注记录可删，敬拜者: {}, 领袖: {}",
                worshiper_id, leader_id
            );
            return Ok(());
        };

        info!(
            "[FollowAPI] 📡 删除关注，文档ID: {}, 领袖: {}",
            follow.id, leader_id
        );
        self.databases
            .delete_document(&self.collection, &follow.id)
            .await
            .context("删除关注失败")?;
        Ok(())
    }
}
