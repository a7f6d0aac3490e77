//! 行模型：节点字段的展示行、可编辑判定与投影
//!
//! 行由上游图/树层产出，这里只消费：只读展示投影、编辑缓冲投影，
//! 以及从文档值派生默认行集合。行顺序仅用于稳定索引，不承载文档语义

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 保留键：指向详情视图的链接行，永不参与编辑
pub const DETAILS_KEY: &str = "details";

/// 行类型标签（与文档值类型一一对应，序列化为小写标签）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl RowKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Bool,
            Value::Null => Self::Null,
        }
    }

    /// 容器类型的行不可直接编辑，需导航到其自身节点
    pub fn is_container(self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }
}

/// 节点的一个展示行：键（无键即标量节点）、值与类型标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub key: Option<String>,
    pub value: Value,
    pub kind: RowKind,
}

impl Row {
    /// 无键标量行（标量节点的唯一行，行值即节点值）
    pub fn scalar(value: Value) -> Self {
        let kind = RowKind::of(&value);
        Self {
            key: None,
            value,
            kind,
        }
    }

    /// 带键行
    pub fn keyed(key: impl Into<String>, value: Value) -> Self {
        let kind = RowKind::of(&value);
        Self {
            key: Some(key.into()),
            value,
            kind,
        }
    }

    /// 可编辑判定：有键、非容器类型、键不是保留的 details
    pub fn is_editable(&self) -> bool {
        match self.key.as_deref() {
            Some(key) => key != DETAILS_KEY && !self.kind.is_container(),
            None => false,
        }
    }

    /// 行值的文本形式（编辑缓冲的种子；null 的种子为空串）
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// 标量节点形态：恰好一行且该行无键
pub fn is_scalar_node(rows: &[Row]) -> bool {
    rows.len() == 1 && rows[0].key.is_none()
}

/// 只读展示投影
///
/// 无行→`{}`；标量节点→值的裸文本（字符串不带引号）；其余情况取
/// 通过可编辑判定的行构成对象后 pretty 打印
pub fn project_display(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "{}".to_string();
    }
    if is_scalar_node(rows) {
        return match &rows[0].value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    let mut canonical = Map::new();
    for row in rows.iter().filter(|r| r.is_editable()) {
        if let Some(key) = &row.key {
            canonical.insert(key.clone(), row.value.clone());
        }
    }
    serde_json::to_string_pretty(&Value::Object(canonical)).unwrap_or_else(|_| "{}".to_string())
}

/// 编辑缓冲投影：行索引 → 原始文本
///
/// 标量节点种入单个0号条目；复合节点只种入可编辑行。容器行、无键行
/// 与 details 行永不进入缓冲
pub fn project_edit_buffer(rows: &[Row]) -> BTreeMap<usize, String> {
    let mut buffer = BTreeMap::new();
    if is_scalar_node(rows) {
        if !rows[0].kind.is_container() {
            buffer.insert(0, rows[0].value_text());
        }
        return buffer;
    }
    for (index, row) in rows.iter().enumerate() {
        if row.is_editable() {
            buffer.insert(index, row.value_text());
        }
    }
    buffer
}

/// 容器值以轻量预览文本呈现，标量原样保留
fn preview_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::String(format!("{{..}} ({} keys)", map.len())),
        Value::Array(arr) => Value::String(format!("[..] ({} items)", arr.len())),
        scalar => scalar.clone(),
    }
}

/// 从文档中某节点的值派生展示行（上游树层的默认投影）
///
/// 对象→逐字段带键行；数组→以索引字符串为键的行；标量→单个无键行
pub fn derive_rows(value: &Value) -> Vec<Row> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| Row {
                key: Some(key.clone()),
                value: preview_value(child),
                kind: RowKind::of(child),
            })
            .collect(),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(index, child)| Row {
                key: Some(index.to_string()),
                value: preview_value(child),
                kind: RowKind::of(child),
            })
            .collect(),
        scalar => vec![Row::scalar(scalar.clone())],
    }
}
