//! 结构路径：节点寻址、缺失容器补建与按路径回写
//!
//! 路径的文本形式采用 RFC 9535 bracket-notation（根为 `$`），展示与
//! 读侧查询共用同一字符串

use std::fmt;

use jsonpath_rust::JsonPath;
use serde_json::{Map, Value};
use thiserror::Error;

/// 路径段：对象键或数组索引
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// 从文档根到节点位置的有序段序列，空路径即根
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// 根路径（空段序列）
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        self.segments.as_slice()
    }

    /// 追加对象键段（链式构造）
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// 追加数组索引段（链式构造）
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }
}

impl fmt::Display for NodePath {
    /// 根渲染为 `$`，键段渲染为 `["key"]`，索引段渲染为 `[N]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, "[\"{}\"]", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("路径类型不匹配: {0}")]
    TypeMismatch(String),
    #[error("JSONPath错误: {0}")]
    JsonPath(String),
    #[error("路径未匹配到节点: {0}")]
    NotFound(String),
}

/// 值类型名（用于错误信息）
fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "Object",
        Value::Array(_) => "Array",
        Value::String(_) => "String",
        Value::Number(_) => "Number",
        Value::Bool(_) => "Bool",
        Value::Null => "Null",
    }
}

/// 依据下一段的类型补建空容器：下一段是索引则建数组，否则建对象
fn container_for_next(next: Option<&PathSegment>) -> Value {
    match next {
        Some(PathSegment::Index(_)) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

/// 沿单个路径段下行
///
/// 缺失或为null的槽位按下一段的类型补建；与既有容器类型冲突时立即
/// 报错，不做任何隐式转换
fn descend<'a>(
    target: &'a mut Value,
    segment: &PathSegment,
    next: Option<&PathSegment>,
) -> Result<&'a mut Value, PathError> {
    match segment {
        PathSegment::Key(key) => {
            if target.is_null() {
                *target = Value::Object(Map::new());
            }
            match target {
                Value::Object(map) => {
                    let slot = map.entry(key.clone()).or_insert(Value::Null);
                    if slot.is_null() {
                        *slot = container_for_next(next);
                    }
                    Ok(slot)
                }
                other => Err(PathError::TypeMismatch(format!(
                    "键段 \"{}\" 需要Object容器，实际为{}",
                    key,
                    kind_name(other)
                ))),
            }
        }
        PathSegment::Index(index) => {
            if target.is_null() {
                *target = Value::Array(Vec::new());
            }
            match target {
                Value::Array(arr) => {
                    if arr.len() <= *index {
                        arr.resize(*index + 1, Value::Null);
                    }
                    let slot = &mut arr[*index];
                    if slot.is_null() {
                        *slot = container_for_next(next);
                    }
                    Ok(slot)
                }
                other => Err(PathError::TypeMismatch(format!(
                    "索引段 [{}] 需要Array容器，实际为{}",
                    index,
                    kind_name(other)
                ))),
            }
        }
    }
}

/// 将 value 写入 path 寻址的位置
///
/// `key` 为 `None` 时替换寻址到的槽位本身（空路径即替换整个文档根）；
/// 为 `Some` 时对寻址到的容器写入该字段（对象按键写入，数组按数字键
/// 写入）。缺失的中间容器按下一段的类型补建，同一根上的重复调用会
/// 幂等地复用已建容器
pub fn set_at_path(
    doc: &mut Value,
    path: &NodePath,
    key: Option<&str>,
    value: Value,
) -> Result<(), PathError> {
    let segments = path.segments();
    let mut target = doc;
    for (i, segment) in segments.iter().enumerate() {
        target = descend(target, segment, segments.get(i + 1))?;
    }
    match key {
        None => {
            *target = value;
        }
        Some(field) => {
            if target.is_null() {
                *target = Value::Object(Map::new());
            }
            match target {
                Value::Object(map) => {
                    map.insert(field.to_string(), value);
                }
                Value::Array(arr) => {
                    let index: usize = field.parse().map_err(|_| {
                        PathError::TypeMismatch(format!("Array容器需要数字键，实际为 \"{}\"", field))
                    })?;
                    if arr.len() <= index {
                        arr.resize(index + 1, Value::Null);
                    }
                    arr[index] = value;
                }
                other => {
                    return Err(PathError::TypeMismatch(format!(
                        "无法向{}写入字段 \"{}\"",
                        kind_name(other),
                        field
                    )))
                }
            }
        }
    }
    Ok(())
}

/// 按路径提取节点当前值（RFC 9535 查询，取首个命中）
pub fn resolve<'a>(doc: &'a Value, path: &NodePath) -> Result<&'a Value, PathError> {
    let expr = path.to_string();
    let hits: Vec<&Value> = doc
        .query(&expr)
        .map_err(|e| PathError::JsonPath(e.to_string()))?;
    hits.into_iter().next().ok_or(PathError::NotFound(expr))
}

/// 按路径提取节点当前值的 pretty 字符串
pub fn extract_pretty(doc: &Value, path: &NodePath) -> Result<String, PathError> {
    let node = resolve(doc, path)?;
    serde_json::to_string_pretty(node).map_err(|e| PathError::JsonPath(e.to_string()))
}
