//! Transaction classification and the undo/redo command entry points.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use crate::editing::{
    Bias, EditorState, HistoryMeta, Mapping, PluginSpec, PositionMap, SelectionBookmark,
    Transaction,
};
use crate::history::branch::Branch;
use crate::history::state::HistoryState;

/// Tuning knobs for the history plugin, mirroring the host's plain
/// configuration structs (no config-file or env-var layer).
#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    pub depth: usize,
    pub new_group_delay_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            depth: 100,
            new_group_delay_ms: 500,
        }
    }
}

/// The history plugin: owns the config, and a one-entry cache of whether a
/// collaboration plugin is installed (keyed by the identity-proxy of the
/// plugin list's length — a deterministic predicate, re-derived whenever
/// the plugin set's size changes).
pub struct HistoryPlugin {
    config: HistoryConfig,
    preserve_items_memo: Cell<Option<(usize, bool)>>,
}

impl HistoryPlugin {
    pub fn new(config: HistoryConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            preserve_items_memo: Cell::new(None),
        })
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn preserve_items(&self, state: &EditorState) -> bool {
        let key = state.plugins.len();
        if let Some((cached_key, value)) = self.preserve_items_memo.get() {
            if cached_key == key {
                return value;
            }
        }
        let value = state.has_collab_plugin();
        self.preserve_items_memo.set(Some((key, value)));
        value
    }
}

impl PluginSpec for HistoryPlugin {
    fn init(&self, _state: &EditorState) -> Box<dyn Any> {
        Box::new(HistoryState::empty())
    }

    fn apply(
        &self,
        tr: &Transaction,
        value: Box<dyn Any>,
        old_state: &EditorState,
        _new_state: &EditorState,
    ) -> Box<dyn Any> {
        let history = value
            .downcast::<HistoryState>()
            .expect("history plugin state has the wrong type");
        let preserve = self.preserve_items(old_state);
        let next = apply_transaction(tr, old_state, &history, &self.config, preserve);
        Box::new(next)
    }

    fn is_history_plugin(&self) -> bool {
        true
    }
}

/// Route a transaction to the right branch operation and produce the next
/// `HistoryState`. See the module-level classification precedence: history-
/// originated, close-history, empty, appended-by-history, rebased, normal
/// recorded edit, non-recorded.
pub fn apply_transaction(
    tr: &Transaction,
    old_state: &EditorState,
    history: &HistoryState,
    config: &HistoryConfig,
    preserve_items: bool,
) -> HistoryState {
    if let Some(meta) = &tr.meta.history {
        if let Some(state) = meta.state.downcast_ref::<HistoryState>() {
            return state.clone();
        }
    }

    let mut history = history.clone();

    if tr.meta.close_history {
        history.prev_ranges = None;
        history.prev_time = 0;
    }

    if tr.is_empty() {
        return history;
    }

    if let Some(appended) = tr.meta.appended_transaction {
        if appended.redo {
            history.done = history
                .done
                .add_transform(&tr.transform, None, config.depth, preserve_items);
            history.prev_ranges = last_map_ranges(tr.transform.mapping());
        } else {
            history.undone = history
                .undone
                .add_transform(&tr.transform, None, config.depth, preserve_items);
            history.prev_ranges = None;
        }
        return history;
    }

    if let Some(rebased) = &tr.meta.rebased {
        history.done = history.done.rebased(rebased);
        history.undone = history.undone.rebased(rebased);
        history.prev_ranges = history
            .prev_ranges
            .as_deref()
            .map(|ranges| remap_ranges(ranges, tr.transform.mapping()));
        return history;
    }

    if tr.meta.add_to_history {
        let first_range = first_map_range(tr.transform.mapping());
        let new_event = history.prev_time == 0
            || tr.time.saturating_sub(history.prev_time) > config.new_group_delay_ms
            || !ranges_adjacent(history.prev_ranges.as_deref(), first_range);

        let selection_bookmark = if new_event {
            Some(SelectionBookmark::from_selection(&old_state.doc, &old_state.selection))
        } else {
            None
        };

        history.done = history.done.add_transform(
            &tr.transform,
            selection_bookmark,
            config.depth,
            preserve_items,
        );
        if new_event {
            history.undone = Branch::new();
        }
        history.prev_ranges = last_map_ranges(tr.transform.mapping());
        history.prev_time = tr.time;
        return history;
    }

    let maps: Vec<PositionMap> = tr.transform.mapping().maps().to_vec();
    history.done = history.done.add_maps(&maps);
    history.undone = history.undone.add_maps(&maps);
    history.prev_ranges = history
        .prev_ranges
        .as_deref()
        .map(|ranges| remap_ranges(ranges, tr.transform.mapping()));
    history
}

/// The affected range of the *first* map in a mapping, in pre-transform
/// (current-document) coordinates.
fn first_map_range(mapping: &Mapping) -> Option<(usize, usize)> {
    let map = mapping.maps().first()?;
    let mut range: Option<(usize, usize)> = None;
    map.for_each_range(|old_start, old_end, _new_start, _new_end| {
        range = Some(match range {
            None => (old_start, old_end),
            Some((s, e)) => (s.min(old_start), e.max(old_end)),
        });
    });
    range
}

/// The affected ranges of the *last* map in a mapping, in post-transform
/// (current-document) coordinates, flattened as `[from0, to0, from1, to1, ...]`.
fn last_map_ranges(mapping: &Mapping) -> Option<Vec<usize>> {
    let map = mapping.maps().last()?;
    let mut out = Vec::new();
    map.for_each_range(|_old_start, _old_end, new_start, new_end| {
        out.push(new_start);
        out.push(new_end);
    });
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn remap_ranges(ranges: &[usize], mapping: &Mapping) -> Vec<usize> {
    ranges.iter().map(|&pos| mapping.map_pos(pos, Bias::After)).collect()
}

/// Ranges `[a,b]` and `[c,d]` are adjacent iff `a <= d && b >= c`. `prev` may
/// hold several ranges; any one of them being adjacent to `new` is enough.
fn ranges_adjacent(prev: Option<&[usize]>, new: Option<(usize, usize)>) -> bool {
    let (Some(prev), Some((c, d))) = (prev, new) else {
        return false;
    };
    prev.chunks(2).any(|pair| match pair {
        [a, b] => *a <= d && *b >= c,
        _ => false,
    })
}

/// Pop the last event off `done` (or `undone` for redo), dispatching the
/// transform that undoes it and pushing its reverse onto the other branch
/// so the action can be redone/undone again.
fn run_command(
    state: &EditorState,
    history: &HistoryState,
    plugin: &HistoryPlugin,
    time: u64,
    redo: bool,
) -> Option<Transaction> {
    let source = if redo { &history.undone } else { &history.done };
    if source.event_count() == 0 {
        return None;
    }
    let preserve_items = plugin.preserve_items(state);
    let popped = source.pop_event(&state.doc, preserve_items)?;

    let current_selection = SelectionBookmark::from_selection(&state.doc, &state.selection);
    let mut next_history = history.clone();
    let destination_pushed = if redo { &history.done } else { &history.undone }.add_transform(
        &popped.transform,
        Some(current_selection),
        plugin.config().depth,
        preserve_items,
    );

    if redo {
        next_history.undone = popped.remaining;
        next_history.done = destination_pushed;
    } else {
        next_history.done = popped.remaining;
        next_history.undone = destination_pushed;
    }
    next_history.prev_ranges = None;
    next_history.prev_time = 0;

    let mut tr = Transaction::new(popped.transform, time);
    tr.selection_after = popped.selection;
    tr.meta.add_to_history = false;
    tr.meta.history = Some(HistoryMeta {
        redo,
        state: Box::new(next_history),
    });
    Some(tr)
}

pub fn undo(
    state: &EditorState,
    history: &HistoryState,
    plugin: &HistoryPlugin,
    time: u64,
) -> Option<Transaction> {
    run_command(state, history, plugin, time, false)
}

pub fn redo(
    state: &EditorState,
    history: &HistoryState,
    plugin: &HistoryPlugin,
    time: u64,
) -> Option<Transaction> {
    run_command(state, history, plugin, time, true)
}

pub fn undo_depth(history: &HistoryState) -> usize {
    history.done.event_count()
}

pub fn redo_depth(history: &HistoryState) -> usize {
    history.undone.event_count()
}

/// Annotate a transaction so the next recorded edit starts a new event
/// instead of grouping with whatever came before.
pub fn close_history(tr: &mut Transaction) {
    tr.meta.close_history = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::editing::{AppendedInfo, EditOp, Selection, Transform};

    fn plugin() -> Rc<HistoryPlugin> {
        HistoryPlugin::new(HistoryConfig::default())
    }

    fn state_with(doc: Document, plugins: Vec<Rc<dyn PluginSpec>>) -> EditorState {
        EditorState::new(doc, Selection::default(), plugins)
    }

    #[test]
    fn recorded_edits_outside_the_group_delay_open_separate_events() {
        let history_plugin = plugin();
        let history = HistoryState::empty();

        let mut t1 = Transform::new(Document::from_text(""));
        t1.maybe_step(EditOp::insert(0, "a"));
        let state0 = state_with(Document::from_text(""), vec![history_plugin.clone()]);
        let tr1 = Transaction::new(t1, 0);
        let history = apply_transaction(&tr1, &state0, &history, history_plugin.config(), false);
        assert_eq!(undo_depth(&history), 1);

        let mut t2 = Transform::new(Document::from_text("a"));
        t2.maybe_step(EditOp::insert(1, "b"));
        let state1 = state_with(Document::from_text("a"), vec![history_plugin.clone()]);
        let mut tr2 = Transaction::new(t2, 10_000);
        tr2.time = 10_000;
        let history = apply_transaction(&tr2, &state1, &history, history_plugin.config(), false);
        assert_eq!(undo_depth(&history), 2);
    }

    #[test]
    fn adjacent_quick_edits_group_into_one_event() {
        let history_plugin = plugin();
        let mut history = HistoryState::empty();

        let mut text = String::new();
        // Start at a non-zero timestamp: `prev_time == 0` is the sentinel for
        // "no prior edit", so a first edit literally timestamped 0 would make
        // every following edit look like it has no predecessor to group with.
        for (i, time) in [(0u64, 1_000u64), (1, 1_100), (2, 1_200)] {
            let mut t = Transform::new(Document::from_text(&text));
            t.maybe_step(EditOp::insert(i as usize, "x"));
            text.push('x');
            let state = state_with(Document::from_text(&text[..i as usize]), vec![history_plugin.clone()]);
            let tr = Transaction::new(t, time);
            history = apply_transaction(&tr, &state, &history, history_plugin.config(), false);
        }
        assert_eq!(undo_depth(&history), 1);
    }

    #[test]
    fn close_history_forces_a_new_event() {
        let history_plugin = plugin();
        let mut history = HistoryState::empty();

        let mut t1 = Transform::new(Document::from_text(""));
        t1.maybe_step(EditOp::insert(0, "a"));
        let state0 = state_with(Document::from_text(""), vec![history_plugin.clone()]);
        let tr1 = Transaction::new(t1, 0);
        history = apply_transaction(&tr1, &state0, &history, history_plugin.config(), false);

        let mut t2 = Transform::new(Document::from_text("a"));
        t2.maybe_step(EditOp::insert(1, "b"));
        let state1 = state_with(Document::from_text("a"), vec![history_plugin.clone()]);
        let mut tr2 = Transaction::new(t2, 50);
        close_history(&mut tr2);
        history = apply_transaction(&tr2, &state1, &history, history_plugin.config(), false);

        assert_eq!(undo_depth(&history), 2);
    }

    #[test]
    fn non_recorded_transaction_tracks_maps_without_opening_an_event() {
        let history_plugin = plugin();
        let mut history = HistoryState::empty();

        let mut t1 = Transform::new(Document::from_text(""));
        t1.maybe_step(EditOp::insert(0, "X"));
        let state0 = state_with(Document::from_text(""), vec![history_plugin.clone()]);
        let tr1 = Transaction::new(t1, 0);
        history = apply_transaction(&tr1, &state0, &history, history_plugin.config(), false);
        assert_eq!(undo_depth(&history), 1);

        let mut t2 = Transform::new(Document::from_text("X"));
        t2.maybe_step(EditOp::insert(0, "Y"));
        let state1 = state_with(Document::from_text("X"), vec![history_plugin.clone()]);
        let mut tr2 = Transaction::new(t2, 10);
        tr2.meta.add_to_history = false;
        history = apply_transaction(&tr2, &state1, &history, history_plugin.config(), false);

        assert_eq!(undo_depth(&history), 1);
        assert_eq!(history.done.empty_item_count(), 1);
    }

    #[test]
    fn undo_then_redo_round_trips_through_the_dispatch_loop() {
        let history_plugin = plugin();
        let mut history = HistoryState::empty();

        let mut t1 = Transform::new(Document::from_text(""));
        t1.maybe_step(EditOp::insert(0, "a"));
        let state0 = state_with(Document::from_text(""), vec![history_plugin.clone()]);
        let tr1 = Transaction::new(t1, 0);
        history = apply_transaction(&tr1, &state0, &history, history_plugin.config(), false);

        let state_after = state_with(Document::from_text("a"), vec![history_plugin.clone()]);
        let undo_tr = undo(&state_after, &history, &history_plugin, 100).expect("one event to undo");
        assert_eq!(undo_tr.transform.doc().text(), "");

        let history_meta = undo_tr.meta.history.as_ref().unwrap();
        let history_after_undo = history_meta
            .state
            .downcast_ref::<HistoryState>()
            .unwrap()
            .clone();
        assert_eq!(undo_depth(&history_after_undo), 0);
        assert_eq!(redo_depth(&history_after_undo), 1);

        let state_undone = state_with(Document::from_text(""), vec![history_plugin.clone()]);
        let redo_tr = redo(&state_undone, &history_after_undo, &history_plugin, 200).expect("one event to redo");
        assert_eq!(redo_tr.transform.doc().text(), "a");
    }

    #[test]
    fn appended_transaction_routes_to_the_originating_branch() {
        let history_plugin = plugin();
        let mut history = HistoryState::empty();

        let mut t1 = Transform::new(Document::from_text(""));
        t1.maybe_step(EditOp::insert(0, "a"));
        let state0 = state_with(Document::from_text(""), vec![history_plugin.clone()]);
        let tr1 = Transaction::new(t1, 0);
        history = apply_transaction(&tr1, &state0, &history, history_plugin.config(), false);

        let mut t2 = Transform::new(Document::from_text("a"));
        t2.maybe_step(EditOp::insert(1, "!"));
        let state1 = state_with(Document::from_text("a"), vec![history_plugin.clone()]);
        let mut tr2 = Transaction::new(t2, 5);
        tr2.meta.appended_transaction = Some(AppendedInfo { redo: true });
        history = apply_transaction(&tr2, &state1, &history, history_plugin.config(), false);

        // appended steps join the existing event, not a new one.
        assert_eq!(undo_depth(&history), 1);
    }
}
