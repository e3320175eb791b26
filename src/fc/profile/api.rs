//! 用户档案远端操作

use crate::fc::databases::DocumentService;
use crate::fc::profile::models::{NewProfile, ProfileUpdate, UserProfile, UserRole};
use crate::fc::query::Query;
use crate::fc::types::{parse_document, parse_documents};
use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 用户档案远端操作客户端
pub struct ProfileApi {
    databases: Arc<dyn DocumentService>,
    collection: String,
}

impl ProfileApi {
    pub fn new(databases: Arc<dyn DocumentService>, collection: String) -> Self {
        Self {
            databases,
            collection,
        }
    }

    /// 角色设置时创建档案；档案文档 ID 显式取认证用户 ID
    pub async fn create_profile(&self, user_id: &str, new: NewProfile) -> Result<UserProfile> {
        info!(
            "[ProfileAPI] 📡 创建用户档案，用户: {}, 角色: {}",
            user_id,
            new.role.as_str()
        );
        let mut data = serde_json::to_value(&new).context("序列化档案失败")?;
        data["userId"] = json!(user_id);

        let doc = self
            .databases
            .create_document(&self.collection, user_id, data)
            .await
            .context("创建用户档案失败")?;
        parse_document(doc)
    }

    /// 按档案 ID（即认证用户 ID）读取档案
    pub async fn get_profile(&self, profile_id: &str) -> Result<UserProfile> {
        let doc = self
            .databases
            .get_document(&self.collection, profile_id, &[])
            .await
            .context("读取用户档案失败")?;
        parse_document(doc)
    }

    /// 部分更新档案
    pub async fn update_profile(
        &self,
        profile_id: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile> {
        info!("[ProfileAPI] 📡 更新用户档案: {}", profile_id);
        let data = serde_json::to_value(&update).context("序列化档案更新失败")?;
        let doc = self
            .databases
            .update_document(&self.collection, profile_id, data)
            .await
            .context("更新用户档案失败")?;
        parse_document(doc)
    }

    /// 列出全部领袖档案
    pub async fn list_leaders(&self) -> Result<Vec<UserProfile>> {
        let list = self
            .databases
            .list_documents(
                &self.collection,
                &[Query::equal("role", UserRole::Leader.as_str())],
            )
            .await
            .context("查询领袖列表失败")?;
        parse_documents(list)
    }
}
