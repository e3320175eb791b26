//! 测试用内存文档服务
//!
//! 实现 [`DocumentService`]，文档存在内存里，支持按集合注入失败、
//! 记录调用序列，用来验证补偿删除、回滚和"缓存命中不发远端请求"。

use crate::fc::databases::DocumentService;
use crate::fc::ids::unique_id;
use crate::fc::query::Query;
use crate::fc::types::DocumentList;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// 内存文档服务
#[derive(Default)]
pub struct MemoryDocumentService {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<String>>,
    fail_create: Mutex<HashSet<String>>,
    fail_list: Mutex<HashSet<String>>,
    fail_increment: AtomicBool,
    fail_decrement: AtomicBool,
}

impl MemoryDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置集合内容；缺 `$id` 的文档自动补一个
    pub fn seed(&self, collection_id: &str, docs: Vec<Value>) {
        let mut collections = self.collections.lock().unwrap();
        let entry = collections.entry(collection_id.to_string()).or_default();
        for mut doc in docs {
            if doc.get("$id").and_then(|v| v.as_str()).unwrap_or("").is_empty() {
                doc["$id"] = Value::String(unique_id());
            }
            if doc.get("$createdAt").is_none() {
                doc["$createdAt"] = Value::String(chrono::Utc::now().to_rfc3339());
            }
            entry.push(doc);
        }
    }

    /// 当前集合内容的克隆
    pub fn documents(&self, collection_id: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 已记录的调用序列（形如 `create:likes`）
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// 统计以给定前缀开头的调用次数
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// 让对某集合的 create 失败
    pub fn fail_create_on(&self, collection_id: &str) {
        self.fail_create
            .lock()
            .unwrap()
            .insert(collection_id.to_string());
    }

    /// 让对某集合的 list 失败
    pub fn fail_list_on(&self, collection_id: &str) {
        self.fail_list
            .lock()
            .unwrap()
            .insert(collection_id.to_string());
    }

    /// 让计数器递增失败（验证补偿删除）
    pub fn set_fail_increment(&self, fail: bool) {
        self.fail_increment.store(fail, Ordering::SeqCst);
    }

    /// 让计数器递减失败（验证尽力恢复）
    pub fn set_fail_decrement(&self, fail: bool) {
        self.fail_decrement.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

/// 相等性判定：关联字段可能是嵌套文档，此时按其 `$id` 比较
fn value_eq(field: &Value, want: &Value) -> bool {
    match field {
        Value::Object(obj) => obj.get("$id").map(|id| id == want).unwrap_or(false),
        other => other == want,
    }
}

/// 过滤条件求值；排序/分页/投影类条件不参与匹配
fn matches(doc: &Value, query: &Query) -> bool {
    match query {
        Query::Equal { attribute, values } => match doc.get(attribute) {
            None | Some(Value::Null) => false,
            Some(field) => values.iter().any(|want| value_eq(field, want)),
        },
        Query::Or(queries) => queries.iter().any(|q| matches(doc, q)),
        _ => true,
    }
}

fn sort_key(doc: &Value, attribute: &str) -> String {
    match doc.get(attribute) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl DocumentService for MemoryDocumentService {
    async fn create_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        self.record(format!("create:{}", collection_id));
        if self.fail_create.lock().unwrap().contains(collection_id) {
            return Err(anyhow!("注入的 create 失败: {}", collection_id));
        }

        let mut doc = data;
        let id = if document_id == crate::fc::databases::UNIQUE_ID {
            unique_id()
        } else {
            document_id.to_string()
        };
        doc["$id"] = Value::String(id);
        let now = chrono::Utc::now().to_rfc3339();
        doc["$createdAt"] = Value::String(now.clone());
        doc["$updatedAt"] = Value::String(now);

        self.collections
            .lock()
            .unwrap()
            .entry(collection_id.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn get_document(
        &self,
        collection_id: &str,
        document_id: &str,
        _queries: &[Query],
    ) -> Result<Value> {
        self.record(format!("get:{}", collection_id));
        self.collections
            .lock()
            .unwrap()
            .get(collection_id)
            .and_then(|docs| docs.iter().find(|d| d["$id"] == document_id).cloned())
            .ok_or_else(|| anyhow!("文档不存在: {}/{}", collection_id, document_id))
    }

    async fn list_documents(
        &self,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList<Value>> {
        self.record(format!("list:{}", collection_id));
        if self.fail_list.lock().unwrap().contains(collection_id) {
            return Err(anyhow!("注入的 list 失败: {}", collection_id));
        }

        let mut docs: Vec<Value> = self
            .collections
            .lock()
            .unwrap()
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|doc| queries.iter().all(|q| matches(doc, q)))
            .collect();
        let total = docs.len() as i64;

        for q in queries {
            match q {
                Query::OrderAsc { attribute } => {
                    docs.sort_by_key(|d| sort_key(d, attribute));
                }
                Query::OrderDesc { attribute } => {
                    docs.sort_by_key(|d| std::cmp::Reverse(sort_key(d, attribute)));
                }
                _ => {}
            }
        }
        for q in queries {
            if let Query::Offset(n) = q {
                docs = docs.into_iter().skip(*n as usize).collect();
            }
        }
        for q in queries {
            if let Query::Limit(n) = q {
                docs.truncate(*n as usize);
            }
        }

        Ok(DocumentList { total, documents: docs })
    }

    async fn update_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        self.record(format!("update:{}", collection_id));
        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection_id)
            .ok_or_else(|| anyhow!("集合不存在: {}", collection_id))?;
        let doc = docs
            .iter_mut()
            .find(|d| d["$id"] == document_id)
            .ok_or_else(|| anyhow!("文档不存在: {}/{}", collection_id, document_id))?;

        if let Value::Object(patch) = data {
            for (k, v) in patch {
                doc[k.as_str()] = v;
            }
        }
        doc["$updatedAt"] = Value::String(chrono::Utc::now().to_rfc3339());
        Ok(doc.clone())
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
        self.record(format!("delete:{}", collection_id));
        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection_id)
            .ok_or_else(|| anyhow!("集合不存在: {}", collection_id))?;
        let before = docs.len();
        docs.retain(|d| d["$id"] != document_id);
        if docs.len() == before {
            return Err(anyhow!("文档不存在: {}/{}", collection_id, document_id));
        }
        Ok(())
    }

    async fn increment_attribute(
        &self,
        collection_id: &str,
        document_id: &str,
        attribute: &str,
        value: i64,
    ) -> Result<Value> {
        self.record(format!("increment:{}:{}", collection_id, attribute));
        if self.fail_increment.load(Ordering::SeqCst) {
            return Err(anyhow!("注入的 increment 失败"));
        }

        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection_id)
            .ok_or_else(|| anyhow!("集合不存在: {}", collection_id))?;
        let doc = docs
            .iter_mut()
            .find(|d| d["$id"] == document_id)
            .ok_or_else(|| anyhow!("文档不存在: {}/{}", collection_id, document_id))?;
        let current = doc[attribute].as_i64().unwrap_or(0);
        doc[attribute] = Value::from(current + value);
        Ok(doc.clone())
    }

    async fn decrement_attribute(
        &self,
        collection_id: &str,
        document_id: &str,
        attribute: &str,
        value: i64,
    ) -> Result<Value> {
        self.record(format!("decrement:{}:{}", collection_id, attribute));
        if self.fail_decrement.load(Ordering::SeqCst) {
            return Err(anyhow!("注入的 decrement 失败"));
        }

        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection_id)
            .ok_or_else(|| anyhow!("集合不存在: {}", collection_id))?;
        let doc = docs
            .iter_mut()
            .find(|d| d["$id"] == document_id)
            .ok_or_else(|| anyhow!("文档不存在: {}/{}", collection_id, document_id))?;
        let current = doc[attribute].as_i64().unwrap_or(0);
        doc[attribute] = Value::from((current - value).max(0));
        Ok(doc.clone())
    }
}
