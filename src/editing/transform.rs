//! A transform accumulates a sequence of edit steps applied to a document,
//! remembering enough about each one (the pre-edit snapshot, the step, its
//! inverse, and the position map it induced) to undo it later.

use crate::document::Document;
use crate::editing::mapping::Mapping;
use crate::editing::operation::EditOp;
use crate::editing::position_map::PositionMap;

#[derive(Debug, Clone)]
pub struct Transform {
    doc: Document,
    steps: Vec<EditOp>,
    inverted_steps: Vec<EditOp>,
    /// Snapshot of the document immediately before each step. Cheap to keep
    /// around: the rope shares structure with whatever didn't change.
    docs: Vec<Document>,
    mapping: Mapping,
}

impl Transform {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            steps: Vec::new(),
            inverted_steps: Vec::new(),
            docs: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn steps(&self) -> &[EditOp] {
        &self.steps
    }

    pub fn inverted_steps(&self) -> &[EditOp] {
        &self.inverted_steps
    }

    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Attempt to apply `op`. Returns `false` without mutating anything if
    /// the op's range doesn't fit the current document.
    pub fn maybe_step(&mut self, op: EditOp) -> bool {
        if !self.doc.validate_edit(&op) {
            return false;
        }

        let pre_doc = self.doc.clone();
        let inverted = pre_doc.compute_reverse(&op);
        let map = op.get_map();

        self.doc.apply_edit(op.clone());

        self.docs.push(pre_doc);
        self.steps.push(op);
        self.inverted_steps.push(inverted);
        self.mapping.append_map(map, None);
        true
    }

    /// The position map induced by the most recently applied step, if any.
    pub fn last_map(&self) -> Option<&PositionMap> {
        self.mapping.maps().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::EditOp;

    #[test]
    fn maybe_step_applies_valid_insert() {
        let mut transform = Transform::new(Document::from_text("Hello"));
        assert!(transform.maybe_step(EditOp::insert(5, " World")));
        assert_eq!(transform.doc().text(), "Hello World");
        assert_eq!(transform.steps().len(), 1);
    }

    #[test]
    fn maybe_step_rejects_out_of_range_delete() {
        let mut transform = Transform::new(Document::from_text("Hi"));
        assert!(!transform.maybe_step(EditOp::delete(0, 100)));
        assert_eq!(transform.doc().text(), "Hi");
        assert!(transform.steps().is_empty());
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut transform = Transform::new(Document::from_text("Hello"));
        transform.maybe_step(EditOp::insert(5, " World"));
        assert_eq!(transform.docs()[0].text(), "Hello");
    }
}
