//! Mini-Word: a transactional rich-text editor core
//!
//! This crate provides the core editing engine with:
//! - Rope-based document model for O(log n) edits
//! - A transaction/transform pipeline (`editing`) describing edits as an
//!   invertible step algebra with composable position maps
//! - Selective undo/redo (`history`): two branches of inverted steps that
//!   can be rebased onto remote changes without discarding local undoable
//!   events, the way a collaborative editor needs

pub mod document;
pub mod editing;
pub mod history;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmEditor;

// Re-export primary types
pub use document::{BlockKind, BlockMeta, Document, ListMarker, ParagraphId};
pub use editing::{Affinity, Cursor, DocPosition, EditOp, EditResult, Selection};
pub use history::{HistoryConfig, HistoryPlugin};

use std::rc::Rc;

use editing::{EditorState, SelectionBookmark, Transaction, Transform};
use history::HistoryState;

/// The main editor state: a document/selection pair plus the history
/// plugin wired up to record and undo/redo every transaction passed
/// through [`Editor::dispatch`].
pub struct Editor {
    state: EditorState,
    history_plugin: Rc<HistoryPlugin>,
    history: HistoryState,
    time: u64,
}

impl Editor {
    /// Create a new, empty editor with the default history configuration.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create an editor with initial text content.
    pub fn with_text(text: &str) -> Self {
        let mut editor = Self::new();
        editor.state.doc = Document::from_text(text);
        editor
    }

    /// Create an editor with a custom history configuration.
    pub fn with_config(config: HistoryConfig) -> Self {
        let history_plugin = HistoryPlugin::new(config);
        let plugins: Vec<Rc<dyn editing::PluginSpec>> = vec![history_plugin.clone()];
        let state = EditorState::new(Document::new(), Selection::default(), plugins);
        let history = HistoryState::empty();
        Self {
            state,
            history_plugin,
            history,
            time: 0,
        }
    }

    /// Route a transaction through the history plugin and apply its
    /// transform to the document, advancing the editor's internal clock.
    fn dispatch(&mut self, tr: Transaction) {
        let old_state = &self.state;
        let preserve = self.history_plugin.preserve_items(old_state);
        self.history =
            history::engine::apply_transaction(&tr, old_state, &self.history, self.history_plugin.config(), preserve);

        self.state.doc = tr.transform.doc().clone();
        self.state.selection = tr
            .selection_after
            .map(|bookmark| bookmark.resolve(&self.state.doc))
            .unwrap_or_else(|| Selection::collapsed(self.state.doc.offset_to_position(editing::AbsoluteOffset(0))));
    }

    fn next_time(&mut self) -> u64 {
        self.time += 1;
        self.time
    }

    /// Insert text at the current cursor position (or replacing the
    /// current selection), recorded as a normal undoable edit.
    pub fn insert_text(&mut self, text: &str) {
        let (start, end) = self.selection_offsets();
        let mut transform = Transform::new(self.state.doc.clone());
        if start.0 != end.0 {
            transform.maybe_step(EditOp::delete(start.0, end.0));
        }
        let pos = start;
        transform.maybe_step(EditOp::Insert {
            position: pos,
            text: text.to_string(),
        });

        let new_cursor = SelectionBookmark::new(
            editing::AbsoluteOffset(pos.0 + text.len()),
            editing::AbsoluteOffset(pos.0 + text.len()),
        );
        let time = self.next_time();
        let mut tr = Transaction::new(transform, time);
        tr.selection_after = Some(new_cursor);
        self.dispatch(tr);
    }

    /// Insert a paragraph break (Enter key) at the cursor.
    pub fn insert_paragraph(&mut self) {
        self.insert_text("\n");
    }

    /// Delete one grapheme backward or forward of the cursor, or the
    /// current selection if non-empty. Returns `false` if there was
    /// nothing to delete.
    pub fn delete(&mut self, backward: bool) -> bool {
        let (start, end) = self.selection_offsets();
        let (del_start, del_end) = if start.0 != end.0 {
            (start, end)
        } else if backward {
            if start.0 == 0 {
                return false;
            }
            (self.state.doc.prev_grapheme_offset(start), start)
        } else {
            let next = self.state.doc.next_grapheme_offset(start);
            if next == start {
                return false;
            }
            (start, next)
        };

        let mut transform = Transform::new(self.state.doc.clone());
        transform.maybe_step(EditOp::delete(del_start.0, del_end.0));

        let new_cursor = SelectionBookmark::new(editing::AbsoluteOffset(del_start.0), editing::AbsoluteOffset(del_start.0));
        let time = self.next_time();
        let mut tr = Transaction::new(transform, time);
        tr.selection_after = Some(new_cursor);
        self.dispatch(tr);
        true
    }

    /// Move the cursor by one grapheme, optionally extending the
    /// selection.
    pub fn move_cursor(&mut self, forward: bool, extend_selection: bool) {
        let offset = self.state.doc.position_to_offset(&self.state.selection.active);
        let new_offset = if forward {
            self.state.doc.next_grapheme_offset(offset)
        } else {
            self.state.doc.prev_grapheme_offset(offset)
        };
        let new_pos = self.state.doc.offset_to_position(new_offset);
        if extend_selection {
            self.state.selection.extend_to(new_pos);
        } else {
            self.state.selection = Selection::collapsed(new_pos);
        }
    }

    /// Select the entire document.
    pub fn select_all(&mut self) {
        let start = self.state.doc.offset_to_position(editing::AbsoluteOffset(0));
        let end = self.state.doc.offset_to_position(editing::AbsoluteOffset(self.state.doc.len()));
        self.state.selection = Selection::new(start, end);
    }

    /// Collapse the current selection to its active end.
    pub fn clear_selection(&mut self) {
        self.state.selection = Selection::collapsed(self.state.selection.active);
    }

    fn selection_offsets(&self) -> (editing::AbsoluteOffset, editing::AbsoluteOffset) {
        let (start, end) = self.state.selection.ordered();
        (
            self.state.doc.position_to_offset(&start),
            self.state.doc.position_to_offset(&end),
        )
    }

    /// Undo the most recent event. Returns `false` if there is nothing to
    /// undo.
    pub fn undo(&mut self) -> bool {
        let time = self.next_time();
        let Some(tr) = history::engine::undo(&self.state, &self.history, &self.history_plugin, time) else {
            return false;
        };
        self.dispatch(tr);
        true
    }

    /// Redo the most recently undone event. Returns `false` if there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let time = self.next_time();
        let Some(tr) = history::engine::redo(&self.state, &self.history, &self.history_plugin, time) else {
            return false;
        };
        self.dispatch(tr);
        true
    }

    /// Annotate the next recorded edit to start a fresh undo event rather
    /// than grouping with whatever came immediately before it.
    pub fn close_history(&mut self) {
        let time = self.next_time();
        let mut tr = Transaction::new(Transform::new(self.state.doc.clone()), time);
        history::engine::close_history(&mut tr);
        self.history = history::engine::apply_transaction(
            &tr,
            &self.state,
            &self.history,
            self.history_plugin.config(),
            self.history_plugin.preserve_items(&self.state),
        );
    }

    pub fn undo_depth(&self) -> usize {
        history::undo_depth(&self.history)
    }

    pub fn redo_depth(&self) -> usize {
        history::redo_depth(&self.history)
    }

    /// Get document text
    pub fn text(&self) -> String {
        self.state.doc.text()
    }

    pub fn doc(&self) -> &Document {
        &self.state.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_editor() {
        let editor = Editor::new();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_insert_text() {
        let mut editor = Editor::new();
        editor.insert_text("Hello, World!");
        assert_eq!(editor.text(), "Hello, World!");
    }

    #[test]
    fn test_undo_redo() {
        let mut editor = Editor::new();
        editor.insert_text("Hello");
        assert_eq!(editor.text(), "Hello");

        editor.undo();
        assert_eq!(editor.text(), "");

        editor.redo();
        assert_eq!(editor.text(), "Hello");
    }

    #[test]
    fn test_grouped_typing_undoes_in_one_step() {
        let mut editor = Editor::new();
        editor.insert_text("a");
        editor.insert_text("b");
        editor.insert_text("c");
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.undo_depth(), 1);

        editor.undo();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_close_history_forces_separate_events() {
        let mut editor = Editor::new();
        editor.insert_text("a");
        editor.close_history();
        editor.insert_text("b");
        assert_eq!(editor.undo_depth(), 2);

        editor.undo();
        assert_eq!(editor.text(), "a");
        editor.undo();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_delete_backward() {
        let mut editor = Editor::new();
        editor.insert_text("Hello");
        editor.close_history();
        assert!(editor.delete(true));
        assert_eq!(editor.text(), "Hell");
    }
}
