//! 编辑会话控制器：查看/编辑状态机与保存流程
//!
//! 会话在其生存期内独占节点的行集合与编辑缓冲；文档读写通过
//! DocumentStore协作者完成。保存失败只影响当次尝试：错误被记录并
//! 返回，会话保持编辑状态等待重试或取消，没有自动重试

use std::collections::BTreeMap;
use std::time::Instant;

use thiserror::Error;

use crate::model::infer::infer;
use crate::model::node_path::{resolve, set_at_path, NodePath, PathError};
use crate::model::rows::{
    derive_rows, is_scalar_node, project_display, project_edit_buffer, Row,
};
use crate::utils::store::{content_to_json, json_to_content, DocumentStore};

#[derive(Error, Debug)]
pub enum EditError {
    #[error("解析失败: {0}")]
    Parse(String),
    #[error("序列化失败: {0}")]
    Serialize(String),
    #[error("持久化失败: {0}")]
    Persist(String),
    #[error("路径错误: {0}")]
    Path(#[from] PathError),
    #[error("状态错误: {0}")]
    State(String),
}

/// 会话状态：查看或编辑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    View,
    Edit,
}

/// 保存成功后向调用方发出的信号，由调用方决定关闭对话框/刷新视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    CloseAndRefresh,
}

/// 单个节点的编辑会话
pub struct EditSession<S: DocumentStore> {
    store: S,
    path: NodePath,
    rows: Vec<Row>,
    buffer: BTreeMap<usize, String>,
    mode: SessionMode,
    save_in_flight: bool,
}

impl<S: DocumentStore> EditSession<S> {
    /// 以给定节点（路径+行集合）开启会话，缓冲立即种入当前行值
    pub fn new(store: S, path: NodePath, rows: Vec<Row>) -> Self {
        let buffer = project_edit_buffer(&rows);
        Self {
            store,
            path,
            rows,
            buffer,
            mode: SessionMode::View,
            save_in_flight: false,
        }
    }

    /// 从文档存储打开节点会话：解析当前文档并按路径派生行集合
    pub fn open(store: S, path: NodePath) -> Result<Self, EditError> {
        let doc = content_to_json(&store.contents(), store.format())
            .map_err(|e| EditError::Parse(e.to_string()))?;
        let rows = derive_rows(resolve(&doc, &path)?);
        Ok(Self::new(store, path, rows))
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn buffer(&self) -> &BTreeMap<usize, String> {
        &self.buffer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 节点路径的展示形式（`$["a"][0]` 风格）
    pub fn formatted_path(&self) -> String {
        self.path.to_string()
    }

    /// 节点的只读展示文本
    pub fn display_text(&self) -> String {
        project_display(&self.rows)
    }

    /// 切换到另一个节点：丢弃未保存的编辑，重新种入缓冲并回到查看态
    pub fn select_node(&mut self, path: NodePath, rows: Vec<Row>) {
        self.path = path;
        self.buffer = project_edit_buffer(&rows);
        self.rows = rows;
        self.mode = SessionMode::View;
        tracing::info!("切换节点: {}", self.path);
    }

    /// 进入编辑态（缓冲在节点载入时已种好，不再改动）
    pub fn enter_edit(&mut self) {
        self.mode = SessionMode::Edit;
    }

    /// 写入一个可编辑行的文本；非编辑态或不可编辑行直接拒绝
    pub fn set_field(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditError> {
        if self.mode != SessionMode::Edit {
            return Err(EditError::State("会话不在编辑状态".into()));
        }
        if !self.buffer.contains_key(&index) {
            return Err(EditError::State(format!("第{}行不可编辑", index)));
        }
        self.buffer.insert(index, text.into());
        Ok(())
    }

    /// 取消编辑：缓冲重置为当前行值，回到查看态
    pub fn cancel(&mut self) {
        self.buffer = project_edit_buffer(&self.rows);
        self.mode = SessionMode::View;
    }

    /// 保存缓冲中的编辑值到整篇文档
    ///
    /// 流程：读取存储内容并解析 → 推断各行编辑值并按路径回写到同一份
    /// 工作文档 → 序列化 → 持久化。标量节点以 `key=None` 替换寻址槽位
    /// 本身；复合节点对每个带缓冲条目的可编辑行写入一个字段。
    /// 进行中的保存未完成前，再次调用会被直接拒绝
    pub fn save(&mut self) -> Result<SessionSignal, EditError> {
        if self.save_in_flight {
            tracing::warn!("上一次保存尚未完成，忽略本次请求: {}", self.path);
            return Err(EditError::State("保存进行中".into()));
        }
        self.save_in_flight = true;
        let start = Instant::now();
        let outcome = self.save_inner();
        self.save_in_flight = false;
        match &outcome {
            Ok(_) => {
                self.mode = SessionMode::View;
                self.buffer = project_edit_buffer(&self.rows);
                tracing::info!(
                    "节点保存成功: {}，耗时: {:.1}ms",
                    self.path,
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            Err(e) => {
                tracing::error!("节点保存失败: {}: {}", self.path, e);
            }
        }
        outcome
    }

    fn save_inner(&mut self) -> Result<SessionSignal, EditError> {
        let format = self.store.format();
        let contents = self.store.contents();
        let mut doc =
            content_to_json(&contents, format).map_err(|e| EditError::Parse(e.to_string()))?;

        if is_scalar_node(&self.rows) {
            let raw = self
                .buffer
                .get(&0)
                .ok_or_else(|| EditError::State("标量节点缺少编辑缓冲".into()))?;
            set_at_path(&mut doc, &self.path, None, infer(raw))?;
        } else {
            for (index, row) in self.rows.iter().enumerate() {
                if !row.is_editable() {
                    continue;
                }
                let (Some(raw), Some(key)) = (self.buffer.get(&index), row.key.as_deref()) else {
                    continue;
                };
                set_at_path(&mut doc, &self.path, Some(key), infer(raw))?;
            }
        }

        let new_contents =
            json_to_content(&doc, format).map_err(|e| EditError::Serialize(e.to_string()))?;
        self.store
            .set_contents(new_contents)
            .map_err(|e| EditError::Persist(e.to_string()))?;
        Ok(SessionSignal::CloseAndRefresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::store::{DocFormat, MemoryStore};
    use serde_json::{json, Value};

    fn parse(contents: &str) -> Value {
        serde_json::from_str(contents).expect("存储内容应是合法JSON")
    }

    #[test]
    fn test_composite_round_trip_preserves_siblings() {
        let store = MemoryStore::new(DocFormat::Json, r#"{"user":{"name":"Bob","age":30}}"#);
        let rows = vec![Row::keyed("name", json!("Alice"))];
        let mut session = EditSession::new(store, NodePath::root().key("user"), rows);
        session.enter_edit();
        session.set_field(0, "Carol").expect("写入应该成功");
        let signal = session.save().expect("保存应该成功");
        assert_eq!(signal, SessionSignal::CloseAndRefresh);
        assert_eq!(session.mode(), SessionMode::View);
        assert_eq!(
            parse(&session.store().contents()),
            json!({"user": {"name": "Carol", "age": 30}})
        );
    }

    #[test]
    fn test_scalar_node_save() {
        let store = MemoryStore::new(DocFormat::Json, r#"{"count":5,"other":1}"#);
        let rows = vec![Row::scalar(json!(5))];
        let mut session = EditSession::new(store, NodePath::root().key("count"), rows);
        session.enter_edit();
        session.set_field(0, "9").expect("写入应该成功");
        session.save().expect("保存应该成功");
        assert_eq!(
            parse(&session.store().contents()),
            json!({"count": 9, "other": 1})
        );
    }

    #[test]
    fn test_scalar_node_at_root_replaces_document() {
        let store = MemoryStore::new(DocFormat::Json, "5");
        let mut session = EditSession::new(store, NodePath::root(), vec![Row::scalar(json!(5))]);
        session.enter_edit();
        session.set_field(0, r#"{"a":1}"#).expect("写入应该成功");
        session.save().expect("保存应该成功");
        assert_eq!(parse(&session.store().contents()), json!({"a": 1}));
    }

    #[test]
    fn test_cancel_then_save_reproduces_document() {
        let original = r#"{"user":{"name":"Bob","age":30}}"#;
        let store = MemoryStore::new(DocFormat::Json, original);
        let rows = vec![Row::keyed("name", json!("Bob")), Row::keyed("age", json!(30))];
        let mut session = EditSession::new(store, NodePath::root().key("user"), rows);
        session.enter_edit();
        session.set_field(0, "Mallory").expect("写入应该成功");
        session.cancel();
        assert_eq!(session.mode(), SessionMode::View);
        assert_eq!(
            session.buffer().get(&0).map(String::as_str),
            Some("Bob"),
            "取消后缓冲应回到当前行值"
        );
        session.save().expect("保存应该成功");
        assert_eq!(parse(&session.store().contents()), parse(original));
    }

    #[test]
    fn test_set_field_rejected_outside_edit_mode() {
        let store = MemoryStore::new(DocFormat::Json, "{}");
        let mut session =
            EditSession::new(store, NodePath::root(), vec![Row::keyed("a", json!(1))]);
        assert!(matches!(session.set_field(0, "2"), Err(EditError::State(_))));
    }

    #[test]
    fn test_set_field_rejected_for_non_editable_row() {
        let store = MemoryStore::new(DocFormat::Json, "{}");
        let rows = vec![Row::keyed("a", json!(1)), Row::keyed("items", json!([1]))];
        let mut session = EditSession::new(store, NodePath::root(), rows);
        session.enter_edit();
        assert!(
            matches!(session.set_field(1, "x"), Err(EditError::State(_))),
            "容器行不可写入"
        );
    }

    #[test]
    fn test_save_failure_keeps_edit_mode() {
        // 文档中的user是数组，键段下行会触发路径类型冲突
        let store = MemoryStore::new(DocFormat::Json, r#"{"user":[1,2]}"#);
        let rows = vec![Row::keyed("name", json!("x"))];
        let mut session =
            EditSession::new(store, NodePath::root().key("user").key("profile"), rows);
        session.enter_edit();
        session.set_field(0, "y").expect("写入应该成功");
        let result = session.save();
        assert!(matches!(result, Err(EditError::Path(_))));
        assert_eq!(session.mode(), SessionMode::Edit, "失败后会话应保持编辑状态");
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let store = MemoryStore::new(DocFormat::Json, "{broken");
        let mut session =
            EditSession::new(store, NodePath::root(), vec![Row::keyed("a", json!(1))]);
        session.enter_edit();
        assert!(matches!(session.save(), Err(EditError::Parse(_))));
        assert_eq!(session.mode(), SessionMode::Edit);
    }

    #[test]
    fn test_open_derives_rows_from_document() {
        let store = MemoryStore::new(DocFormat::Json, r#"{"user":{"name":"Bob","age":30}}"#);
        let session =
            EditSession::open(store, NodePath::root().key("user")).expect("打开应该成功");
        assert_eq!(session.rows().len(), 2);
        assert_eq!(session.formatted_path(), "$[\"user\"]");
        assert_eq!(session.buffer().len(), 2);
        assert!(session.display_text().contains("Bob"), "展示文本应包含当前字段值");
    }

    #[test]
    fn test_select_node_discards_pending_edits() {
        let store = MemoryStore::new(DocFormat::Json, r#"{"a":1,"b":2}"#);
        let mut session =
            EditSession::new(store, NodePath::root().key("a"), vec![Row::scalar(json!(1))]);
        session.enter_edit();
        session.set_field(0, "99").expect("写入应该成功");
        session.select_node(NodePath::root().key("b"), vec![Row::scalar(json!(2))]);
        assert_eq!(session.mode(), SessionMode::View);
        assert_eq!(
            session.buffer().get(&0).map(String::as_str),
            Some("2"),
            "切换节点应丢弃在途编辑"
        );
    }

    #[test]
    fn test_structured_json_rehydrates_into_leaf() {
        let store = MemoryStore::new(DocFormat::Json, r#"{"user":{"tags":"old"}}"#);
        let rows = vec![Row::keyed("tags", json!("old"))];
        let mut session = EditSession::new(store, NodePath::root().key("user"), rows);
        session.enter_edit();
        session.set_field(0, "[1,2]").expect("写入应该成功");
        session.save().expect("保存应该成功");
        assert_eq!(
            parse(&session.store().contents()),
            json!({"user": {"tags": [1, 2]}})
        );
    }

    #[test]
    fn test_empty_field_saves_null() {
        let store = MemoryStore::new(DocFormat::Json, r#"{"user":{"note":"x"}}"#);
        let rows = vec![Row::keyed("note", json!("x"))];
        let mut session = EditSession::new(store, NodePath::root().key("user"), rows);
        session.enter_edit();
        session.set_field(0, "").expect("写入应该成功");
        session.save().expect("保存应该成功");
        assert_eq!(
            parse(&session.store().contents()),
            json!({"user": {"note": null}})
        );
    }
}
