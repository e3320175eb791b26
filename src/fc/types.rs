//! 共享的远端服务线格式类型与响应处理
//!
//! 远端服务成功时直接返回文档 JSON，失败时返回 `{message, code, type}` 错误体；
//! 列表接口返回 `{total, documents}` 包装。所有 API 模块共用这里的处理函数。

use serde::{Deserialize, Serialize};

/// 文档列表响应包装（`total` 为满足查询条件的总数，不受 limit 影响）
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct DocumentList<T> {
    #[serde(default)]
    pub total: i64,
    #[serde(default, deserialize_with = "deserialize_vec_or_null")]
    pub documents: Vec<T>,
}

/// 远端服务错误体
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: i64,
    #[serde(rename = "type", default)]
    pub error_type: String,
}

/// 能给出自身文档 ID 的类型（供 [`Reference`] 归一化取 ID 用）
pub trait DocumentRef {
    fn document_id(&self) -> &str;
}

/// 嵌套文档的最小形状：只关心 `$id` 时用它做引用目标类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocStub {
    #[serde(rename = "$id", default)]
    pub id: String,
}

impl DocumentRef for DocStub {
    fn document_id(&self) -> &str {
        &self.id
    }
}

/// 文档引用：同一字段在不同查询投影下可能是裸 ID 字符串，也可能是展开后的嵌套文档
///
/// 所有引用形状判断必须经过 [`Reference::id`] / [`Reference::matches`]，
/// 不允许在调用处各自写类型判断。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Reference<T> {
    Embedded(T),
    Id(String),
}

impl<T: DocumentRef> Reference<T> {
    /// 归一化取引用目标的文档 ID
    pub fn id(&self) -> &str {
        match self {
            Reference::Embedded(doc) => doc.document_id(),
            Reference::Id(id) => id,
        }
    }

    /// 引用是否指向给定 ID；空 ID 一律不匹配
    pub fn matches(&self, id: &str) -> bool {
        !id.is_empty() && self.id() == id
    }

    /// 取展开后的嵌套文档（裸 ID 形状时为 None）
    pub fn embedded(&self) -> Option<&T> {
        match self {
            Reference::Embedded(doc) => Some(doc),
            Reference::Id(_) => None,
        }
    }
}

/// 把原始文档 JSON 解析成具体模型
pub fn parse_document<T: serde::de::DeserializeOwned>(doc: serde_json::Value) -> anyhow::Result<T> {
    serde_json::from_value(doc).map_err(|e| anyhow::anyhow!("解析文档失败: {:?}", e))
}

/// 把原始文档列表解析成具体模型列表；任何一条解析失败则整体失败
pub fn parse_documents<T: serde::de::DeserializeOwned>(
    list: DocumentList<serde_json::Value>,
) -> anyhow::Result<Vec<T>> {
    list.documents.into_iter().map(parse_document).collect()
}

/// Vec 反序列化函数（支持 null 值）：字段缺失或为 null 时返回空 Vec
pub fn deserialize_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    let opt: Option<Vec<T>> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// 通用 HTTP JSON 响应处理函数：非 2xx 时解析错误体并转为错误，
/// 2xx 时直接反序列化为目标类型。所有 API 都可以共用此方法。
pub async fn handle_json_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<T> {
    use anyhow::Context;
    use tracing::{debug, error};

    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    debug!("[HTTP] {}响应 Body: {}", operation_name, body_str);

    if !status.is_success() {
        // 尝试解析标准错误体，解析不了就带上原始响应
        if let Ok(err_body) = serde_json::from_slice::<ApiErrorBody>(&body_bytes) {
            error!(
                "[HTTP] {}服务器错误，错误码: {}, 类型: {}, 错误信息: {}",
                operation_name, err_body.code, err_body.error_type, err_body.message
            );
            return Err(anyhow::anyhow!(
                "服务器错误 {}: {}",
                err_body.code,
                err_body.message
            ));
        }
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name, status, body_str
        );
        return Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, body_str));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    let result: T = serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name, e, body_str
        );
        anyhow::anyhow!("反序列化响应失败: {:?}", e)
    })?;

    Ok(result)
}

/// 无响应体的 HTTP 响应处理函数（删除、登出等返回 204 的接口）
pub async fn handle_empty_response(
    response: reqwest::Response,
    operation_name: &str,
) -> anyhow::Result<()> {
    use anyhow::Context;
    use tracing::{debug, error};

    let status = response.status();
    if status.is_success() {
        debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);
        return Ok(());
    }

    let body_bytes = response.bytes().await.context("读取响应 body 失败")?;
    let body_str = String::from_utf8_lossy(&body_bytes);
    if let Ok(err_body) = serde_json::from_slice::<ApiErrorBody>(&body_bytes) {
        error!(
            "[HTTP] {}服务器错误，错误码: {}, 错误信息: {}",
            operation_name, err_body.code, err_body.message
        );
        return Err(anyhow::anyhow!(
            "服务器错误 {}: {}",
            err_body.code,
            err_body.message
        ));
    }
    error!(
        "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
        operation_name, status, body_str
    );
    Err(anyhow::anyhow!("HTTP 错误 {}: {}", status, body_str))
}
