//! JSON节点编辑核心库
//!
//! 提供值推断、路径寻址与回写、行模型投影和编辑会话控制
//! 会话对象不依赖任何UI框架，文档读写通过DocumentStore协作者完成

pub mod model;
pub mod utils;

// 重新导出主要类型
pub use model::infer::infer;
pub use model::node_path::{extract_pretty, resolve, set_at_path, NodePath, PathError, PathSegment};
pub use model::rows::{
    derive_rows, is_scalar_node, project_display, project_edit_buffer, Row, RowKind, DETAILS_KEY,
};
pub use model::session::{EditError, EditSession, SessionMode, SessionSignal};
pub use utils::store::{
    content_to_json, detect_format, json_to_content, DocFormat, DocumentStore, FileStore,
    MemoryStore, StoreError,
};
