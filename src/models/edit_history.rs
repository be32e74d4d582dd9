//! 编辑历史（栈模型）
//!
//! 与 Git/DAG 模型不同，这里只有 append/pop：
//! - undo 弹出最近一次编辑
//! - redo 重新压入被撤销的那一次编辑
//! - 存储的 Edit 共享且不可变，历史只增删引用

use super::edit::Edit;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct EditHistory {
    edits: Vec<Arc<Edit>>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self { edits: Vec::new() }
    }

    pub fn push(&mut self, edit: Arc<Edit>) {
        self.edits.push(edit);
    }

    /// Removes the most recent edit. `None` when the history is empty.
    pub fn pop(&mut self) -> Option<Arc<Edit>> {
        self.edits.pop()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn last(&self) -> Option<&Arc<Edit>> {
        self.edits.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter().map(|e| e.as_ref())
    }

    /// Owned copy of the current history, oldest first.
    pub fn snapshot(&self) -> Vec<Edit> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/edit_history.rs"]
mod tests;
