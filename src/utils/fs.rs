//! IO helper: safe file read/write for document text

use std::{fs, path::Path};

use crate::utils::store::StoreError;

/// 从文件读取全文（解析交由 store::content_to_json 按格式完成）
pub fn read_text_file(p: &Path) -> Result<String, StoreError> {
    Ok(fs::read_to_string(p)?)
}

/// 将全文写入文件
pub fn write_text_file(p: &Path, contents: &str) -> Result<(), StoreError> {
    fs::write(p, contents)?;
    Ok(())
}
