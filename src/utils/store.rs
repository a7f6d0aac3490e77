//! 文档存储协作者：格式识别、内容读写与JSON互转
//!
//! 核心只依赖这里的契约，不关心文档最终落在哪里；要求互转满足
//! 往返保真（content_to_json(json_to_content(x)) ≈ x）

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::utils::fs::{read_text_file, write_text_file};

/// 支持的文档存储格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    Json,
    Yaml,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("解析失败: {0}")]
    Parse(String),
    #[error("序列化失败: {0}")]
    Serialize(String),
}

/// 文档存储协作者契约：当前格式、全文读取与持久化
pub trait DocumentStore {
    fn format(&self) -> DocFormat;
    fn contents(&self) -> String;
    fn set_contents(&mut self, contents: String) -> Result<(), StoreError>;
}

/// 按格式将原始文本解析为通用JSON值
pub fn content_to_json(content: &str, format: DocFormat) -> Result<Value, StoreError> {
    match format {
        DocFormat::Json => {
            serde_json::from_str(content).map_err(|e| StoreError::Parse(e.to_string()))
        }
        DocFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| StoreError::Parse(e.to_string()))
        }
    }
}

/// 按格式将JSON值序列化回文本（JSON输出为格式化文本）
pub fn json_to_content(value: &Value, format: DocFormat) -> Result<String, StoreError> {
    match format {
        DocFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize(e.to_string()))
        }
        DocFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| StoreError::Serialize(e.to_string()))
        }
    }
}

/// 按扩展名识别文档格式（未知扩展名按JSON处理）
pub fn detect_format(path: &Path) -> DocFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => DocFormat::Yaml,
        _ => DocFormat::Json,
    }
}

/// 内存文档存储（测试与嵌入场景）
#[derive(Debug, Clone)]
pub struct MemoryStore {
    format: DocFormat,
    contents: String,
}

impl MemoryStore {
    pub fn new(format: DocFormat, contents: impl Into<String>) -> Self {
        Self {
            format,
            contents: contents.into(),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn format(&self) -> DocFormat {
        self.format
    }

    fn contents(&self) -> String {
        self.contents.clone()
    }

    fn set_contents(&mut self, contents: String) -> Result<(), StoreError> {
        self.contents = contents;
        Ok(())
    }
}

/// 文件文档存储：打开时读入全文并按扩展名识别格式，保存时写回磁盘
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    format: DocFormat,
    contents: String,
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let contents = read_text_file(path)?;
        let format = detect_format(path);
        tracing::info!("文档已载入: {}，格式: {:?}", path.display(), format);
        Ok(Self {
            path: path.to_path_buf(),
            format,
            contents,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn format(&self) -> DocFormat {
        self.format
    }

    fn contents(&self) -> String {
        self.contents.clone()
    }

    fn set_contents(&mut self, contents: String) -> Result<(), StoreError> {
        write_text_file(&self.path, &contents)?;
        self.contents = contents;
        Ok(())
    }
}
