//! 文档 ID 生成工具
//!
//! 远端服务要求自定义文档 ID 为 36 字符以内的字母数字串；
//! 乐观更新使用 `temp-` 前缀的临时 ID，提交成功后被服务端 ID 替换。

use uuid::Uuid;

/// 生成一个可直接用作远端文档 ID 的唯一 ID（32 位小写十六进制）
pub fn unique_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 生成乐观更新占位记录的临时 ID
///
/// 形如 `temp-{tag}-{毫秒时间戳}`，tag 一般取关联实体 ID，
/// 便于日志里直接看出这条占位记录属于谁。
pub fn temp_id(tag: &str) -> String {
    format!("temp-{}-{}", tag, chrono::Utc::now().timestamp_millis())
}

/// 判断一个 ID 是否是本地临时 ID（尚未被服务端 ID 替换）
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with("temp-")
}
