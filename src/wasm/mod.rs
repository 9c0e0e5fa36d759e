//! WASM bindings for the editor

use wasm_bindgen::prelude::*;
use serde::{Deserialize, Serialize};
use crate::Editor;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM-exposed editor wrapper
#[wasm_bindgen]
pub struct WasmEditor {
    editor: Editor,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create a new, empty editor.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { editor: Editor::new() }
    }

    /// Create an editor with initial text content.
    #[wasm_bindgen(js_name = withText)]
    pub fn with_text(text: &str) -> Self {
        Self { editor: Editor::with_text(text) }
    }

    /// Insert text at current cursor position (replacing the selection,
    /// if any).
    #[wasm_bindgen(js_name = insertText)]
    pub fn insert_text(&mut self, text: &str) {
        self.editor.insert_text(text);
    }

    /// Insert a paragraph break (Enter key)
    #[wasm_bindgen(js_name = insertParagraph)]
    pub fn insert_paragraph(&mut self) {
        self.editor.insert_paragraph();
    }

    /// Delete backward (backspace)
    #[wasm_bindgen(js_name = deleteBackward)]
    pub fn delete_backward(&mut self) -> bool {
        self.editor.delete(true)
    }

    /// Delete forward (delete key)
    #[wasm_bindgen(js_name = deleteForward)]
    pub fn delete_forward(&mut self) -> bool {
        self.editor.delete(false)
    }

    /// Move cursor by one grapheme, optionally extending the selection
    #[wasm_bindgen(js_name = moveCursor)]
    pub fn move_cursor(&mut self, forward: bool, extend_selection: bool) {
        self.editor.move_cursor(forward, extend_selection);
    }

    /// Undo last recorded event. Returns whether anything was undone.
    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    /// Redo last undone event. Returns whether anything was redone.
    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    /// Force the next recorded edit to open a new undo event.
    #[wasm_bindgen(js_name = closeHistory)]
    pub fn close_history(&mut self) {
        self.editor.close_history();
    }

    /// Number of undoable events.
    #[wasm_bindgen(js_name = undoDepth)]
    pub fn undo_depth(&self) -> usize {
        self.editor.undo_depth()
    }

    /// Number of redoable events.
    #[wasm_bindgen(js_name = redoDepth)]
    pub fn redo_depth(&self) -> usize {
        self.editor.redo_depth()
    }

    /// Get full document text
    #[wasm_bindgen(js_name = getText)]
    pub fn get_text(&self) -> String {
        self.editor.text()
    }

    /// Get cursor/selection info (returns JSON)
    #[wasm_bindgen(js_name = getCursorInfo)]
    pub fn get_cursor_info(&self) -> JsValue {
        let selection = self.editor.selection();
        let info = CursorInfo {
            para_id: selection.active.para_id.0,
            offset: selection.active.offset,
            has_selection: !selection.is_collapsed(),
        };
        serde_wasm_bindgen::to_value(&info).unwrap_or(JsValue::NULL)
    }

    /// Select all text
    #[wasm_bindgen(js_name = selectAll)]
    pub fn select_all(&mut self) {
        self.editor.select_all();
    }

    /// Clear selection, collapsing to its active end
    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.editor.clear_selection();
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable cursor/selection info for JS
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorInfo {
    pub para_id: u64,
    pub offset: usize,
    pub has_selection: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_undo_round_trips() {
        let mut editor = WasmEditor::new();
        editor.insert_text("hi");
        assert_eq!(editor.get_text(), "hi");
        assert!(editor.undo());
        assert_eq!(editor.get_text(), "");
        assert!(editor.redo());
        assert_eq!(editor.get_text(), "hi");
    }
}
