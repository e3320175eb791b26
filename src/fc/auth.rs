//! 账号与会话
//!
//! 登录/注册走邮箱密码会话接口，拿到的会话令牌放在
//! `X-Appwrite-Session` 请求头里供后续所有请求使用。
//! 这里是建连前的裸调用，每次自建 HTTP 客户端；
//! 建连后的带会话客户端在 client 模块组装。

use crate::fc::types::{handle_empty_response, handle_json_response};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

/// 登录会话
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(rename = "userId", default)]
    pub user_id: String,
    /// 会话令牌，后续请求放在 `X-Appwrite-Session` 头里
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub expire: String,
    #[serde(default)]
    pub provider: String,
}

/// 账号信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "$id", default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// 邮箱密码登录，成功返回带令牌的会话
pub async fn login_async(
    endpoint: &str,
    project_id: &str,
    email: &str,
    password: &str,
) -> Result<Session> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/account/sessions/email", endpoint);

    info!("[Auth] 🔐 正在登录...");
    debug!("[Auth]   请求URL: {}, 邮箱: {}, 操作ID: {}", url, email, operation_id);

    let response = client
        .post(&url)
        .header("X-Appwrite-Project", project_id)
        .header("X-Request-Id", &operation_id)
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .context("登录请求失败")?;

    let session: Session = handle_json_response(response, "登录").await?;
    info!("[Auth] ✅ 登录成功，用户: {}", session.user_id);
    Ok(session)
}

/// 注册新账号并立即登录
pub async fn register_async(
    endpoint: &str,
    project_id: &str,
    email: &str,
    password: &str,
) -> Result<Session> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/account", endpoint);

    info!("[Auth] 🔐 正在注册新账号...");
    debug!("[Auth]   请求URL: {}, 邮箱: {}, 操作ID: {}", url, email, operation_id);

    let response = client
        .post(&url)
        .header("X-Appwrite-Project", project_id)
        .header("X-Request-Id", &operation_id)
        .json(&json!({
            "userId": crate::fc::databases::UNIQUE_ID,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .context("注册请求失败")?;

    let account: Account = handle_json_response(response, "注册").await?;
    info!("[Auth] ✅ 注册成功，账号: {}，继续登录", account.id);

    login_async(endpoint, project_id, email, password).await
}

/// 取当前登录账号（校验会话是否仍然有效）
pub async fn get_account(
    endpoint: &str,
    project_id: &str,
    session_secret: &str,
) -> Result<Account> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/account", endpoint);

    debug!("[Auth] 校验会话，请求URL: {}, 操作ID: {}", url, operation_id);

    let response = client
        .get(&url)
        .header("X-Appwrite-Project", project_id)
        .header("X-Appwrite-Session", session_secret)
        .header("X-Request-Id", &operation_id)
        .send()
        .await
        .context("账号请求失败")?;

    handle_json_response(response, "取当前账号").await
}

/// 注销当前会话
pub async fn logout_async(
    endpoint: &str,
    project_id: &str,
    session_secret: &str,
) -> Result<()> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/account/sessions/current", endpoint);

    info!("[Auth] 🔐 注销当前会话...");

    let response = client
        .delete(&url)
        .header("X-Appwrite-Project", project_id)
        .header("X-Appwrite-Session", session_secret)
        .header("X-Request-Id", &operation_id)
        .send()
        .await
        .context("注销请求失败")?;

    handle_empty_response(response, "注销").await?;
    info!("[Auth] ✅ 会话已注销");
    Ok(())
}
