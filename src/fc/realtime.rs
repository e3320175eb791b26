//! 实时订阅协议类型与工具
//!
//! 订阅通道在建连 URL 的查询参数里给出，服务端以 JSON 文本帧推送
//! `{"type":"event","data":{events, channels, timestamp, payload}}`；
//! 文档变更事件名以 `.create` / `.update` / `.delete` 结尾，
//! 消费方只关心 `.create`。建连与收发循环在 client 模块。

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// 心跳间隔：空闲时按此间隔发 WebSocket Ping 保活
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// 实时推送的顶层帧
#[derive(Debug, Deserialize)]
pub struct RealtimeMessage {
    /// 帧类型：connected / event / error / pong
    #[serde(rename = "type")]
    pub msg_type: String,
    /// 帧数据，形状随 msg_type 变化
    #[serde(default)]
    pub data: Option<Value>,
}

/// 文档变更事件（msg_type == "event" 时的 data）
#[derive(Debug, Deserialize)]
pub struct RealtimeEvent {
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub timestamp: f64,
    /// 变更后的文档内容
    #[serde(default)]
    pub payload: Value,
}

impl RealtimeMessage {
    /// 解析一条文本帧；解析失败返回 None（记日志，不中断收取循环）
    pub fn parse(text: &str) -> Option<RealtimeMessage> {
        match serde_json::from_str::<RealtimeMessage>(text) {
            Ok(msg) => Some(msg),
            Err(e) => {
                warn!("[Realtime] 帧解析失败: {:?}, 原始内容: {}", e, text);
                None
            }
        }
    }

    /// 当前帧是否为文档变更事件；是则取出事件体
    pub fn event(&self) -> Option<RealtimeEvent> {
        if self.msg_type != "event" {
            return None;
        }
        let data = self.data.clone()?;
        match serde_json::from_value::<RealtimeEvent>(data) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("[Realtime] 事件体解析失败: {:?}", e);
                None
            }
        }
    }
}

impl RealtimeEvent {
    /// 是否为新建文档事件
    pub fn is_create(&self) -> bool {
        self.events.iter().any(|e| e.ends_with(".create"))
    }

    /// 事件是否来自给定通道
    pub fn on_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}

/// 某集合全部文档的订阅通道名
pub fn collection_channel(database_id: &str, collection_id: &str) -> String {
    format!(
        "databases.{}.collections.{}.documents",
        database_id, collection_id
    )
}

/// 拼接实时订阅建连 URL（项目 ID 与订阅通道都在查询参数里）
pub fn build_realtime_url(realtime_endpoint: &str, project_id: &str, channels: &[String]) -> String {
    let mut url = format!("{}?project={}", realtime_endpoint, project_id);
    for channel in channels {
        url.push_str("&channels[]=");
        url.push_str(channel);
    }
    url
}
