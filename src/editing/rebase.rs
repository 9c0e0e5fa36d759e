//! Minimal concrete shape for the collaboration layer's rebase output.
//!
//! The collaboration plugin itself — the OT/CRDT machinery that resolves
//! conflicting remote edits — is out of scope here (see the crate's module
//! docs). What the history engine needs from it is narrow: for each item it
//! asked to have rebased, either a surviving new forward map (plus, if the
//! item carried an edit, the edit's new inverse) or nothing, if the edit was
//! absorbed by a conflicting remote change.

use crate::editing::mapping::Mapping;
use crate::editing::operation::EditOp;

/// What a collaboration plugin hands the engine after rebasing the tail of
/// a branch onto remote changes.
///
/// `mapping` holds, in order: the `rebased_count` old forward maps for the
/// items being rebased, followed by whatever new maps (remote edits and the
/// surviving rebased steps themselves) resulted from the rebase, with
/// mirrors wiring each surviving old index to its new counterpart via
/// [`Mapping::get_mirror`]. `inverted_steps` runs parallel to `mapping`;
/// only slots that correspond to a surviving step are `Some`.
#[derive(Debug, Clone)]
pub struct RebasedTransform {
    pub rebased_count: usize,
    pub mapping: Mapping,
    pub inverted_steps: Vec<Option<EditOp>>,
}

impl RebasedTransform {
    pub fn new(rebased_count: usize, mapping: Mapping, inverted_steps: Vec<Option<EditOp>>) -> Self {
        Self {
            rebased_count,
            mapping,
            inverted_steps,
        }
    }
}
