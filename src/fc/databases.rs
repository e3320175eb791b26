//! 文档数据库 HTTP API 客户端
//!
//! 远端服务的文档 CRUD、计数器原子增减都走这里。
//! [`DocumentService`] 是服务边界：生产实现走 REST，
//! 测试使用内存实现注入失败来验证补偿与回滚路径。

use crate::fc::query::{encode_queries, Query};
use crate::fc::types::{handle_empty_response, handle_json_response, DocumentList};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

/// 文档服务边界：按集合操作文档与计数器字段
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// 创建文档；`document_id` 传 `"unique()"` 时由服务端生成 ID
    async fn create_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value>;

    /// 按 ID 读取文档
    async fn get_document(
        &self,
        collection_id: &str,
        document_id: &str,
        queries: &[Query],
    ) -> Result<Value>;

    /// 按查询条件列出文档
    async fn list_documents(
        &self,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList<Value>>;

    /// 部分更新文档
    async fn update_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value>;

    /// 删除文档
    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()>;

    /// 原子递增数值字段
    async fn increment_attribute(
        &self,
        collection_id: &str,
        document_id: &str,
        attribute: &str,
        value: i64,
    ) -> Result<Value>;

    /// 原子递减数值字段
    async fn decrement_attribute(
        &self,
        collection_id: &str,
        document_id: &str,
        attribute: &str,
        value: i64,
    ) -> Result<Value>;
}

/// 文档数据库 REST 客户端
///
/// `client` 应该已经在外部配置好项目与会话请求头
pub struct DatabasesApi {
    client: reqwest::Client,
    endpoint: String,
    database_id: String,
}

impl DatabasesApi {
    /// 创建新的文档数据库客户端
    pub fn new(client: reqwest::Client, endpoint: String, database_id: String) -> Self {
        Self {
            client,
            endpoint,
            database_id,
        }
    }

    fn documents_url(&self, collection_id: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection_id
        )
    }

    fn document_url(&self, collection_id: &str, document_id: &str) -> String {
        format!("{}/{}", self.documents_url(collection_id), document_id)
    }
}

#[async_trait]
impl DocumentService for DatabasesApi {
    async fn create_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.documents_url(collection_id);

        info!("[DatabasesAPI] 📡 创建文档，集合: {}", collection_id);
        debug!("[DatabasesAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("X-Request-Id", &operation_id)
            .json(&json!({
                "documentId": document_id,
                "data": data,
            }))
            .send()
            .await
            .context("请求失败")?;

        let doc: Value = handle_json_response(response, "创建文档").await?;
        info!(
            "[DatabasesAPI] ✅ 文档已创建，集合: {}, ID: {}",
            collection_id,
            doc["$id"].as_str().unwrap_or_default()
        );
        Ok(doc)
    }

    async fn get_document(
        &self,
        collection_id: &str,
        document_id: &str,
        queries: &[Query],
    ) -> Result<Value> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.document_url(collection_id, document_id);

        info!(
            "[DatabasesAPI] 📡 读取文档，集合: {}, ID: {}",
            collection_id, document_id
        );
        debug!("[DatabasesAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let mut request = self.client.get(&url).header("X-Request-Id", &operation_id);
        for q in encode_queries(queries) {
            request = request.query(&[("queries[]", q)]);
        }

        let response = request.send().await.context("请求失败")?;
        handle_json_response(response, "读取文档").await
    }

    async fn list_documents(
        &self,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList<Value>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.documents_url(collection_id);

        info!("[DatabasesAPI] 📡 查询文档列表，集合: {}", collection_id);
        debug!(
            "[DatabasesAPI]   请求URL: {}, 操作ID: {}, 条件数: {}",
            url,
            operation_id,
            queries.len()
        );

        let mut request = self.client.get(&url).header("X-Request-Id", &operation_id);
        for q in encode_queries(queries) {
            request = request.query(&[("queries[]", q)]);
        }

        let response = request.send().await.context("请求失败")?;
        let list: DocumentList<Value> = handle_json_response(response, "查询文档列表").await?;
        info!(
            "[DatabasesAPI] ✅ 文档列表响应，集合: {}, 返回 {} 条 / 共 {} 条",
            collection_id,
            list.documents.len(),
            list.total
        );
        Ok(list)
    }

    async fn update_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.document_url(collection_id, document_id);

        info!(
            "[DatabasesAPI] 📡 更新文档，集合: {}, ID: {}",
            collection_id, document_id
        );
        debug!("[DatabasesAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .patch(&url)
            .header("X-Request-Id", &operation_id)
            .json(&json!({ "data": data }))
            .send()
            .await
            .context("请求失败")?;

        handle_json_response(response, "更新文档").await
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.document_url(collection_id, document_id);

        info!(
            "[DatabasesAPI] 📡 删除文档，集合: {}, ID: {}",
            collection_id, document_id
        );
        debug!("[DatabasesAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .delete(&url)
            .header("X-Request-Id", &operation_id)
            .send()
            .await
            .context("请求失败")?;

        handle_empty_response(response, "删除文档").await
    }

    async fn increment_attribute(
        &self,
        collection_id: &str,
        document_id: &str,
        attribute: &str,
        value: i64,
    ) -> Result<Value> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/{}/increment",
            self.document_url(collection_id, document_id),
            attribute
        );

        info!(
            "[DatabasesAPI] 📡 递增计数器，集合: {}, ID: {}, 字段: {} (+{})",
            collection_id, document_id, attribute, value
        );

        let response = self
            .client
            .patch(&url)
            .header("X-Request-Id", &operation_id)
            .json(&json!({ "value": value }))
            .send()
            .await
            .context("请求失败")?;

        handle_json_response(response, "递增计数器").await
    }

    async fn decrement_attribute(
        &self,
        collection_id: &str,
        document_id: &str,
        attribute: &str,
        value: i64,
    ) -> Result<Value> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/{}/decrement",
            self.document_url(collection_id, document_id),
            attribute
        );

        info!(
            "[DatabasesAPI] 📡 递减计数器，集合: {}, ID: {}, 字段: {} (-{})",
            collection_id, document_id, attribute, value
        );

        let response = self
            .client
            .patch(&url)
            .header("X-Request-Id", &operation_id)
            .json(&json!({ "value": value, "min": 0 }))
            .send()
            .await
            .context("请求失败")?;

        handle_json_response(response, "递减计数器").await
    }
}

/// 由服务端生成文档 ID 的占位值
pub const UNIQUE_ID: &str = "unique()";
