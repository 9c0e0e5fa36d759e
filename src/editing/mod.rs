//! Editing model: cursor, selection, edit operations, position mapping,
//! and the transform/state machinery the history engine operates on.

mod cursor;
mod mapping;
mod operation;
mod position_map;
mod rebase;
mod state;
mod transform;

pub use cursor::{Affinity, Cursor, DocPosition, Selection, SelectionBookmark};
pub use mapping::Mapping;
pub use operation::{AbsoluteOffset, EditOp, EditResult};
pub use position_map::{Bias, MapRange, PositionMap};
pub use rebase::RebasedTransform;
pub use state::{AppendedInfo, EditorState, HistoryMeta, PluginSpec, Transaction, TransactionMeta};
pub use transform::Transform;
