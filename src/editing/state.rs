//! Editor-level state: the document/selection pair plugins observe, and the
//! transactions that move from one state to the next.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::document::Document;
use crate::editing::cursor::{Selection, SelectionBookmark};
use crate::editing::rebase::RebasedTransform;
use crate::editing::transform::Transform;

/// A plugin observes every transaction and carries its own opaque state
/// alongside the editor's. The history engine is itself implemented as one
/// of these; `is_history_plugin`/`is_collab_plugin` let the engine single
/// itself out, and let it detect a collaboration plugin so it knows to keep
/// every item instead of compressing the done/undone branches.
pub trait PluginSpec {
    fn init(&self, state: &EditorState) -> Box<dyn Any>;
    fn apply(
        &self,
        tr: &Transaction,
        value: Box<dyn Any>,
        old_state: &EditorState,
        new_state: &EditorState,
    ) -> Box<dyn Any>;

    fn is_history_plugin(&self) -> bool {
        false
    }

    fn is_collab_plugin(&self) -> bool {
        false
    }
}

/// The document and selection a set of plugins observe.
#[derive(Clone)]
pub struct EditorState {
    pub doc: Document,
    pub selection: Selection,
    pub plugins: Vec<Rc<dyn PluginSpec>>,
}

impl EditorState {
    pub fn new(doc: Document, selection: Selection, plugins: Vec<Rc<dyn PluginSpec>>) -> Self {
        Self {
            doc,
            selection,
            plugins,
        }
    }

    /// Whether any attached plugin requires every history item to be kept
    /// (no compression, no dropping of map-only items) because it might
    /// still need to rebase against them.
    pub fn has_collab_plugin(&self) -> bool {
        self.plugins.iter().any(|p| p.is_collab_plugin())
    }
}

/// Payload attached to a transaction that was produced by an undo/redo
/// command. Its `state` is the plugin-private history state to install
/// directly, bypassing normal transaction processing.
pub struct HistoryMeta {
    pub redo: bool,
    pub state: Box<dyn Any>,
}

impl fmt::Debug for HistoryMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryMeta").field("redo", &self.redo).finish_non_exhaustive()
    }
}

/// Marks a transaction as having been appended to an existing one rather
/// than started fresh (e.g. a plugin normalizing the result of an
/// undo/redo). `redo` records which branch the appended steps belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendedInfo {
    pub redo: bool,
}

/// Metadata a transaction carries that the history engine inspects to
/// decide how to classify it. Modeled as concrete typed fields rather than
/// a string-keyed bag: every value the engine reads from a transaction in
/// practice falls into one of these five buckets.
#[derive(Debug)]
pub struct TransactionMeta {
    pub history: Option<HistoryMeta>,
    pub close_history: bool,
    pub add_to_history: bool,
    pub appended_transaction: Option<AppendedInfo>,
    pub rebased: Option<RebasedTransform>,
}

impl Default for TransactionMeta {
    fn default() -> Self {
        Self {
            history: None,
            close_history: false,
            add_to_history: true,
            appended_transaction: None,
            rebased: None,
        }
    }
}

/// A set of document changes plus the bookkeeping the history engine and
/// other plugins need to process it.
#[derive(Debug)]
pub struct Transaction {
    pub transform: Transform,
    pub time: u64,
    pub selection_after: Option<SelectionBookmark>,
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(transform: Transform, time: u64) -> Self {
        Self {
            transform,
            time,
            selection_after: None,
            meta: TransactionMeta::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transform.steps().is_empty()
    }
}
