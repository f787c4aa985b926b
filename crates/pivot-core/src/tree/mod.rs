//! Conversation tree flattening.
//!
//! Transforms the entry forest plus the active leaf into an ordered list of
//! renderable rows carrying layout metadata (indent, connectors, gutters).
//!
//! ## Design
//!
//! - **Source of truth**: the `Vec<Entry>` log; rows are derived on every
//!   snapshot and never patched incrementally
//! - **Active branch first**: at every fork the child leading to the leaf is
//!   visited first, independent of log order
//! - **Two passes**: the full tree is laid out, then the visible subset is
//!   laid out again, since connectors depend on visible sibling counts
//! - **Orphan handling**: entries whose parent is missing appear as roots

mod forest;
mod layout;
mod path;
mod preview;

use std::collections::{BTreeMap, HashMap};

use pivot_types::{Entry, EntryKind, EntryType, Role};
use serde::{Deserialize, Serialize};

pub use self::path::{default_leaf, path_to_leaf};
use self::forest::Forest;
use self::layout::{Layout, layout_full, relayout_visible};
use crate::correlate::ToolCallIndex;

/// Which entries the tree view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeFilter {
    /// Conversation entries: hides metadata records and assistant messages
    /// made only of tool calls.
    #[default]
    Default,
    /// Like `Default`, without tool results.
    NoTools,
    UserOnly,
    LabeledOnly,
    /// Every entry, metadata included.
    All,
}

impl TreeFilter {
    pub const ALL: [TreeFilter; 5] = [
        TreeFilter::Default,
        TreeFilter::NoTools,
        TreeFilter::UserOnly,
        TreeFilter::LabeledOnly,
        TreeFilter::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TreeFilter::Default => "default",
            TreeFilter::NoTools => "no-tools",
            TreeFilter::UserOnly => "user-only",
            TreeFilter::LabeledOnly => "labeled-only",
            TreeFilter::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == value.trim())
    }

    /// Next mode, wrapping around.
    #[must_use]
    pub fn cycle(self) -> Self {
        let pos = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    fn shows(self, entry: &Entry, labeled: bool) -> bool {
        let conversational = || {
            !entry.entry_type().is_metadata()
                && !entry.message().is_some_and(|m| m.is_tool_calls_only())
        };
        match self {
            TreeFilter::All => true,
            TreeFilter::Default => conversational(),
            TreeFilter::NoTools => conversational() && entry.role() != Some(Role::ToolResult),
            TreeFilter::UserOnly => entry.role() == Some(Role::User),
            TreeFilter::LabeledOnly => labeled,
        }
    }
}

/// A vertical continuation glyph at one ancestor fork column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gutter {
    /// Display column (in indent levels) of the ancestor's connector.
    pub position: usize,
    /// False once the ancestor's last sibling has been emitted.
    pub show: bool,
}

/// One visible entry with its layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub id: String,
    pub parent_id: Option<String>,
    pub entry_type: EntryType,
    pub role: Option<Role>,
    pub preview: String,
    pub label: Option<String>,
    /// On the path from the root to the active leaf.
    pub on_active_path: bool,
    /// The active leaf itself.
    pub is_leaf: bool,
    pub indent: usize,
    pub show_connector: bool,
    pub is_last: bool,
    pub gutters: Vec<Gutter>,
    /// Root of a multi-root forest, nested under the implicit top level.
    pub is_virtual_root_child: bool,
}

impl TreeRow {
    /// Indent level as drawn: multi-root forests drop the virtual level.
    pub fn display_indent(&self, multiple_roots: bool) -> usize {
        if multiple_roots {
            self.indent.saturating_sub(1)
        } else {
            self.indent
        }
    }

    /// Whether a `├─`/`└─` connector is drawn in front of the row.
    pub fn draws_connector(&self) -> bool {
        self.show_connector && !self.is_virtual_root_child
    }
}

/// Flattened tree ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeView {
    pub rows: Vec<TreeRow>,
    pub multiple_roots: bool,
    /// Parent links of every entry, visible or not.
    parent_by_id: BTreeMap<String, Option<String>>,
    row_by_id: HashMap<String, usize>,
}

impl TreeView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.row_by_id.get(id).copied()
    }

    /// Index of the row for `id`, or of its nearest visible ancestor.
    pub fn nearest_visible_index(&self, id: &str) -> Option<usize> {
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(id) = current {
            if let Some(idx) = self.index_of(id) {
                return Some(idx);
            }
            hops += 1;
            if hops > self.parent_by_id.len() {
                return None;
            }
            current = self.parent_by_id.get(id).and_then(Option::as_deref);
        }
        None
    }

    /// Index of the active leaf row, if visible.
    pub fn leaf_index(&self) -> Option<usize> {
        self.rows.iter().position(|row| row.is_leaf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    pub filter: TreeFilter,
    pub preview_max_chars: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            filter: TreeFilter::Default,
            preview_max_chars: crate::config::Config::DEFAULT_PREVIEW_MAX_CHARS,
        }
    }
}

/// Flattens `entries` with the default filter and preview width.
pub fn flatten(entries: &[Entry], leaf_id: Option<&str>) -> TreeView {
    flatten_with(entries, leaf_id, &FlattenOptions::default())
}

/// Flattens `entries` into rows, active branch first.
///
/// Pure and deterministic. An unknown or missing `leaf_id` marks no row as
/// active.
pub fn flatten_with(entries: &[Entry], leaf_id: Option<&str>, opts: &FlattenOptions) -> TreeView {
    if entries.is_empty() {
        return TreeView::default();
    }

    let forest = Forest::build(entries);
    let leaf = leaf_id.and_then(|id| forest.lookup(id));

    let contains_active = forest.contains_leaf(leaf);
    let full = layout_full(&forest, &contains_active);

    let labels = collect_labels(entries);
    let visible: Vec<bool> = forest
        .entries
        .iter()
        .map(|entry| opts.filter.shows(entry, labels.contains_key(entry.id.as_str())))
        .collect();
    let layout = relayout_visible(&forest, &full, &visible);

    // Forward scan in traversal order: a result may reference any call
    // emitted before it.
    let calls =
        ToolCallIndex::from_entries(full.slots.iter().map(|slot| forest.entries[slot.idx]));
    let on_path = forest.ancestry(leaf);

    let rows = build_rows(&forest, &layout, &calls, &labels, &on_path, leaf, opts);
    let row_by_id = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| (row.id.clone(), idx))
        .collect();

    TreeView {
        rows,
        multiple_roots: layout.multiple_roots,
        row_by_id,
        parent_by_id: forest
            .entries
            .iter()
            .map(|entry| (entry.id.clone(), entry.parent_id.clone()))
            .collect(),
    }
}

fn build_rows(
    forest: &Forest<'_>,
    layout: &Layout,
    calls: &ToolCallIndex,
    labels: &HashMap<&str, &str>,
    on_path: &[bool],
    leaf: Option<usize>,
    opts: &FlattenOptions,
) -> Vec<TreeRow> {
    layout
        .slots
        .iter()
        .map(|slot| {
            let entry = forest.entries[slot.idx];
            TreeRow {
                id: entry.id.clone(),
                parent_id: entry.parent_id.clone(),
                entry_type: entry.entry_type(),
                role: entry.role(),
                preview: preview::entry_preview(entry, calls, opts.preview_max_chars),
                label: labels.get(entry.id.as_str()).map(|l| (*l).to_string()),
                on_active_path: on_path[slot.idx],
                is_leaf: leaf == Some(slot.idx),
                indent: slot.indent,
                show_connector: slot.show_connector,
                is_last: slot.is_last,
                gutters: slot.gutters.clone(),
                is_virtual_root_child: slot.is_virtual_root_child,
            }
        })
        .collect()
}

/// Current label per target id: latest label entry wins, null clears.
fn collect_labels(entries: &[Entry]) -> HashMap<&str, &str> {
    let mut labels = HashMap::new();
    for entry in entries {
        if let EntryKind::Label { target_id, label } = &entry.kind {
            match label.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => {
                    labels.insert(target_id.as_str(), label);
                }
                _ => {
                    labels.remove(target_id.as_str());
                }
            }
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pivot_types::{AgentMessage, ContentBlock, UserContent};
    use serde_json::json;

    use super::*;

    fn user(id: &str, parent: Option<&str>) -> Entry {
        Entry::new(
            id,
            parent,
            EntryKind::Message {
                message: AgentMessage::User {
                    content: UserContent::Text(format!("user {id}")),
                },
            },
        )
    }

    fn assistant(id: &str, parent: Option<&str>) -> Entry {
        Entry::new(
            id,
            parent,
            EntryKind::Message {
                message: AgentMessage::Assistant {
                    content: vec![ContentBlock::Text {
                        text: format!("assistant {id}"),
                    }],
                    stop_reason: None,
                },
            },
        )
    }

    fn tool_calls_only(id: &str, parent: Option<&str>, call_id: &str) -> Entry {
        Entry::new(
            id,
            parent,
            EntryKind::Message {
                message: AgentMessage::Assistant {
                    content: vec![ContentBlock::ToolCall {
                        id: call_id.to_string(),
                        name: "bash".to_string(),
                        arguments: json!({"command": "ls -la"}),
                    }],
                    stop_reason: Some("toolUse".to_string()),
                },
            },
        )
    }

    fn tool_result(id: &str, parent: Option<&str>, call_id: &str) -> Entry {
        Entry::new(
            id,
            parent,
            EntryKind::Message {
                message: AgentMessage::ToolResult {
                    tool_call_id: call_id.to_string(),
                    tool_name: Some("bash".to_string()),
                    content: vec![],
                    is_error: false,
                    details: None,
                },
            },
        )
    }

    fn label(id: &str, parent: Option<&str>, target: &str, text: Option<&str>) -> Entry {
        Entry::new(
            id,
            parent,
            EntryKind::Label {
                target_id: target.to_string(),
                label: text.map(str::to_string),
            },
        )
    }

    fn row_ids(view: &TreeView) -> Vec<&str> {
        view.rows.iter().map(|row| row.id.as_str()).collect()
    }

    fn active_ids(view: &TreeView) -> HashSet<&str> {
        view.rows
            .iter()
            .filter(|row| row.on_active_path)
            .map(|row| row.id.as_str())
            .collect()
    }

    fn row<'a>(view: &'a TreeView, id: &str) -> &'a TreeRow {
        &view.rows[view.index_of(id).unwrap()]
    }

    #[test]
    fn test_empty_forest_yields_no_rows() {
        let view = flatten(&[], Some("a"));
        assert!(view.is_empty());
        assert!(!view.multiple_roots);
    }

    #[test]
    fn test_active_child_is_ordered_first() {
        let entries = vec![
            user("a", None),
            assistant("b", Some("a")),
            assistant("c", Some("a")),
        ];
        let view = flatten(&entries, Some("c"));

        assert_eq!(row_ids(&view), ["a", "c", "b"]);
        assert_eq!(active_ids(&view), HashSet::from(["a", "c"]));
        assert!(row(&view, "c").is_leaf);
        assert!(!row(&view, "b").on_active_path);
        assert!(!row(&view, "c").is_last);
        assert!(row(&view, "b").is_last);
    }

    #[test]
    fn test_chain_has_no_indent_or_connectors() {
        let mut entries = vec![user("e0", None)];
        for i in 1..10 {
            let parent = format!("e{}", i - 1);
            entries.push(assistant(&format!("e{i}"), Some(parent.as_str())));
        }
        let view = flatten(&entries, Some("e9"));

        assert_eq!(view.rows.len(), 10);
        for row in &view.rows {
            assert_eq!(row.indent, 0);
            assert!(!row.show_connector);
            assert!(row.gutters.is_empty());
            assert!(row.on_active_path);
        }
    }

    #[test]
    fn test_fork_indents_each_child_one_level() {
        let entries = vec![
            user("root", None),
            assistant("k1", Some("root")),
            assistant("k2", Some("root")),
            assistant("k3", Some("root")),
            user("deep", Some("k3")),
        ];
        let view = flatten(&entries, Some("deep"));

        assert_eq!(row_ids(&view), ["root", "k3", "deep", "k1", "k2"]);
        for id in ["k1", "k2", "k3"] {
            assert_eq!(row(&view, id).indent, 1);
            assert!(row(&view, id).show_connector);
        }
        assert_eq!(row(&view, "deep").indent, 2);
        assert_eq!(
            row(&view, "deep").gutters,
            vec![Gutter {
                position: 0,
                show: true
            }]
        );
    }

    #[test]
    fn test_unknown_leaf_marks_nothing_active() {
        let entries = vec![user("a", None), assistant("b", Some("a"))];
        for leaf in [None, Some("missing")] {
            let view = flatten(&entries, leaf);
            assert!(active_ids(&view).is_empty());
            assert!(view.leaf_index().is_none());
            assert_eq!(row_ids(&view), ["a", "b"]);
        }
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let entries = vec![
            user("a", None),
            assistant("b", Some("a")),
            assistant("c", Some("a")),
            user("d", Some("b")),
            user("e", None),
        ];
        let first = flatten(&entries, Some("d"));
        let second = flatten(&entries, Some("d"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_multiple_roots_are_virtual_children() {
        let entries = vec![user("r1", None), user("r2", None), assistant("x", Some("r2"))];
        let view = flatten(&entries, Some("x"));

        assert!(view.multiple_roots);
        assert_eq!(row_ids(&view), ["r2", "x", "r1"]);
        let r2 = row(&view, "r2");
        assert!(r2.is_virtual_root_child);
        assert!(!r2.draws_connector());
        assert_eq!(r2.display_indent(view.multiple_roots), 0);
        assert_eq!(row(&view, "x").display_indent(view.multiple_roots), 1);
    }

    #[test]
    fn test_orphan_becomes_root() {
        let entries = vec![user("a", None), user("o", Some("gone"))];
        let view = flatten(&entries, None);
        assert!(view.multiple_roots);
        assert_eq!(row_ids(&view), ["a", "o"]);
    }

    #[test]
    fn test_default_filter_hides_tool_only_assistant_and_metadata() {
        let entries = vec![
            user("u", None),
            tool_calls_only("t", Some("u"), "call_1"),
            tool_result("r", Some("t"), "call_1"),
            label("l", Some("r"), "u", Some("start")),
            assistant("a", Some("l")),
        ];
        let view = flatten(&entries, Some("a"));

        assert_eq!(row_ids(&view), ["u", "r", "a"]);
        for row in &view.rows {
            assert_eq!(row.indent, 0);
            assert!(!row.show_connector);
        }
        assert_eq!(row(&view, "r").preview, "[bash: ls -la]");
        assert_eq!(row(&view, "u").label.as_deref(), Some("start"));
    }

    #[test]
    fn test_filtering_never_changes_active_set() {
        let entries = vec![
            user("u", None),
            tool_calls_only("t", Some("u"), "call_1"),
            tool_result("r", Some("t"), "call_1"),
            assistant("a", Some("r")),
            user("side", Some("u")),
        ];
        let ancestors: HashSet<&str> = HashSet::from(["u", "t", "r", "a"]);

        for filter in TreeFilter::ALL {
            let opts = FlattenOptions {
                filter,
                ..FlattenOptions::default()
            };
            let view = flatten_with(&entries, Some("a"), &opts);
            let visible: HashSet<&str> = row_ids(&view).into_iter().collect();
            let expected: HashSet<&str> = ancestors.intersection(&visible).copied().collect();
            assert_eq!(active_ids(&view), expected, "filter {}", filter.as_str());
        }
    }

    #[test]
    fn test_hidden_children_leave_a_visible_leaf() {
        // b's only child is metadata: under the default filter b lays out as a leaf.
        let entries = vec![
            user("a", None),
            assistant("b", Some("a")),
            Entry::new(
                "m",
                Some("b"),
                EntryKind::ModelChange {
                    provider: "p".to_string(),
                    model_id: "m".to_string(),
                },
            ),
            assistant("c", Some("a")),
        ];
        let view = flatten(&entries, Some("m"));
        assert_eq!(row_ids(&view), ["a", "b", "c"]);
        assert!(row(&view, "b").on_active_path);
        assert!(view.leaf_index().is_none());
        assert_eq!(view.nearest_visible_index("m"), view.index_of("b"));

        let all = flatten_with(
            &entries,
            Some("m"),
            &FlattenOptions {
                filter: TreeFilter::All,
                ..FlattenOptions::default()
            },
        );
        assert_eq!(row_ids(&all), ["a", "b", "m", "c"]);
        assert_eq!(all.rows[all.leaf_index().unwrap()].preview, "[model: p/m]");
    }

    #[test]
    fn test_long_hidden_run_attaches_to_visible_ancestor() {
        // root -> 5000 model changes -> 5000 users: the users chain straight off root.
        let mut entries = vec![user("root", None)];
        let mut parent = "root".to_string();
        for i in 0..5000 {
            let id = format!("m{i}");
            entries.push(Entry::new(
                &id,
                Some(parent.as_str()),
                EntryKind::ModelChange {
                    provider: "p".to_string(),
                    model_id: "m".to_string(),
                },
            ));
            parent = id;
        }
        for i in 0..5000 {
            let id = format!("u{i}");
            entries.push(user(&id, Some(parent.as_str())));
            parent = id;
        }

        let view = flatten(&entries, Some(parent.as_str()));
        assert_eq!(view.rows.len(), 5001);
        assert!(
            view.rows
                .iter()
                .all(|row| row.indent == 0 && !row.show_connector)
        );
        assert_eq!(row(&view, "u0").parent_id.as_deref(), Some("m4999"));
        assert_eq!(view.index_of("u0"), Some(1));
        assert_eq!(view.nearest_visible_index("m2500"), Some(0));
        assert_eq!(view.leaf_index(), Some(5000));
    }

    #[test]
    fn test_user_only_relays_out_siblings() {
        // a -> {x (assistant) -> u1, y (assistant) -> u2}: visible u-rows fork under a.
        let entries = vec![
            user("a", None),
            assistant("x", Some("a")),
            user("u1", Some("x")),
            assistant("y", Some("a")),
            user("u2", Some("y")),
        ];
        let view = flatten_with(
            &entries,
            Some("u1"),
            &FlattenOptions {
                filter: TreeFilter::UserOnly,
                ..FlattenOptions::default()
            },
        );
        assert_eq!(row_ids(&view), ["a", "u1", "u2"]);
        assert_eq!(row(&view, "u1").indent, 1);
        assert!(row(&view, "u1").show_connector);
        assert!(row(&view, "u2").is_last);
    }

    #[test]
    fn test_labels_latest_wins_and_null_clears() {
        let entries = vec![
            user("a", None),
            assistant("b", Some("a")),
            label("l1", Some("b"), "a", Some("first")),
            label("l2", Some("l1"), "a", Some("second")),
            label("l3", Some("l2"), "b", Some("temp")),
            label("l4", Some("l3"), "b", None),
        ];
        let view = flatten(&entries, Some("l4"));
        assert_eq!(row(&view, "a").label.as_deref(), Some("second"));
        assert_eq!(row(&view, "b").label, None);

        let labeled = flatten_with(
            &entries,
            Some("l4"),
            &FlattenOptions {
                filter: TreeFilter::LabeledOnly,
                ..FlattenOptions::default()
            },
        );
        assert_eq!(row_ids(&labeled), ["a"]);
    }

    #[test]
    fn test_tool_result_resolves_call_from_earlier_branch_position() {
        // The call lives two levels up, not on the immediate parent.
        let entries = vec![
            user("u", None),
            tool_calls_only("t", Some("u"), "call_9"),
            user("interleaved", Some("t")),
            tool_result("r", Some("interleaved"), "call_9"),
            tool_result("lost", Some("r"), "call_unknown"),
        ];
        let view = flatten(&entries, Some("lost"));
        assert_eq!(row(&view, "r").preview, "[bash: ls -la]");
        assert_eq!(row(&view, "lost").preview, crate::correlate::FALLBACK_TOOL_LABEL);
    }

    #[test]
    fn test_filter_parse_and_cycle() {
        assert_eq!(TreeFilter::parse("no-tools"), Some(TreeFilter::NoTools));
        assert_eq!(TreeFilter::parse("bogus"), None);
        assert_eq!(TreeFilter::All.cycle(), TreeFilter::Default);
        assert_eq!(TreeFilter::Default.cycle(), TreeFilter::NoTools);
    }
}
