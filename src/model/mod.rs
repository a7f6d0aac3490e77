//! 数据模型层：值推断、路径回写、行投影与编辑会话

pub mod infer;
pub mod node_path;
pub mod rows;
pub mod session;
