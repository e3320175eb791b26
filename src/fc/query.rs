//! 文档查询条件构造器
//!
//! 远端服务的列表接口通过 `queries[]` 参数接收 JSON 编码的查询串，
//! 形如 `{"method":"equal","attribute":"leader","values":["id"]}`。
//! 这里用枚举表达查询条件，发请求时再编码成线格式；
//! 测试里的内存实现直接对枚举求值，不经过线格式。

use serde_json::{json, Value};

/// 单条查询条件
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// 字段等于给定值之一
    Equal { attribute: String, values: Vec<Value> },
    /// 按字段升序
    OrderAsc { attribute: String },
    /// 按字段降序
    OrderDesc { attribute: String },
    /// 返回条数上限
    Limit(u32),
    /// 跳过前若干条
    Offset(u32),
    /// 字段投影（`*` 为全部标量字段，`leader.*` 为展开 leader 关联）
    Select { fields: Vec<String> },
    /// 任一子条件满足即可
    Or(Vec<Query>),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn order_asc(attribute: impl Into<String>) -> Self {
        Query::OrderAsc {
            attribute: attribute.into(),
        }
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::OrderDesc {
            attribute: attribute.into(),
        }
    }

    pub fn limit(n: u32) -> Self {
        Query::Limit(n)
    }

    pub fn offset(n: u32) -> Self {
        Query::Offset(n)
    }

    pub fn select(fields: &[&str]) -> Self {
        Query::Select {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn or(queries: Vec<Query>) -> Self {
        Query::Or(queries)
    }

    /// 编码成线格式 JSON 值
    pub fn to_value(&self) -> Value {
        match self {
            Query::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::OrderAsc { attribute } => json!({
                "method": "orderAsc",
                "attribute": attribute,
            }),
            Query::OrderDesc { attribute } => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::Limit(n) => json!({
                "method": "limit",
                "values": [n],
            }),
            Query::Offset(n) => json!({
                "method": "offset",
                "values": [n],
            }),
            Query::Select { fields } => json!({
                "method": "select",
                "values": fields,
            }),
            Query::Or(queries) => json!({
                "method": "or",
                "values": queries.iter().map(|q| q.to_value()).collect::<Vec<_>>(),
            }),
        }
    }

    /// 编码成 `queries[]` 参数用的 JSON 字符串
    pub fn to_wire(&self) -> String {
        self.to_value().to_string()
    }
}

/// 把一组查询条件编码成 `queries[]` 参数值列表
pub fn encode_queries(queries: &[Query]) -> Vec<String> {
    queries.iter().map(|q| q.to_wire()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_wire_shape() {
        let q = Query::equal("leader", "abc123");
        let v = q.to_value();
        assert_eq!(v["method"], "equal");
        assert_eq!(v["attribute"], "leader");
        assert_eq!(v["values"][0], "abc123");
    }

    #[test]
    fn test_equal_non_string_value() {
        let q = Query::equal("read", false);
        let v = q.to_value();
        assert_eq!(v["values"][0], false);
    }

    #[test]
    fn test_order_and_limit_wire_shape() {
        assert_eq!(
            Query::order_desc("$createdAt").to_value(),
            serde_json::json!({"method":"orderDesc","attribute":"$createdAt"})
        );
        assert_eq!(
            Query::limit(25).to_value(),
            serde_json::json!({"method":"limit","values":[25]})
        );
    }

    #[test]
    fn test_or_nests_queries() {
        let q = Query::or(vec![
            Query::equal("worshiper", "u1"),
            Query::equal("leader", "u1"),
        ]);
        let v = q.to_value();
        assert_eq!(v["method"], "or");
        assert_eq!(v["values"][0]["attribute"], "worshiper");
        assert_eq!(v["values"][1]["attribute"], "leader");
    }

    #[test]
    fn test_select_projection() {
        let q = Query::select(&["*", "leader.*", "worshiper.*"]);
        let v = q.to_value();
        assert_eq!(v["values"][1], "leader.*");
    }
}
